//! Active channel body
//!
//! Renders the styled markup of the selected channel, wrapped to the panel
//! width. Scrolling works in wrapped rows, so the row count is estimated from
//! each line's display width.

use super::scrollbar::{render_scrollbar, ScrollbarStyle};
use crate::tui::app::App;
use crate::tui::scroll::FocusablePanel;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let viewport = area.height.saturating_sub(2) as usize;
    let active = app.active;
    let focused = app.focused == FocusablePanel::Channel;

    let title = format!(" {} ", app.active_title());

    let theme = app.theme.clone();
    let lines: Vec<Line<'static>> = app.body_lines().to_vec();
    let rows = wrapped_rows(&lines, inner_width);

    let Some(scroll) = app.channel_scroll.get_mut(active) else {
        return;
    };
    scroll.update_dimensions(rows, viewport);
    let offset = scroll.offset();

    let border = if focused {
        theme.border_focused
    } else {
        theme.border
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(border))
        .title(title);

    let body = if lines.is_empty() {
        Paragraph::new("Waiting for messages…")
            .style(Style::default().fg(theme.help).add_modifier(Modifier::ITALIC))
    } else {
        Paragraph::new(Text::from(lines))
            .style(Style::default().fg(theme.fg))
            .wrap(Wrap { trim: false })
            .scroll((offset.min(u16::MAX as usize) as u16, 0))
    };

    f.render_widget(body.block(block), area);
    render_scrollbar(f, area, scroll, ScrollbarStyle::Arrows);
}

/// Terminal rows the lines occupy once wrapped at `width` columns
pub fn wrapped_rows(lines: &[Line], width: usize) -> usize {
    if width == 0 {
        return lines.len();
    }
    lines
        .iter()
        .map(|line| line.width().div_ceil(width).max(1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_rows() {
        let lines = vec![
            Line::from("short"),
            Line::from(""),
            Line::from("x".repeat(25)),
        ];
        assert_eq!(wrapped_rows(&lines, 10), 1 + 1 + 3);
        assert_eq!(wrapped_rows(&lines, 0), 3);
    }
}
