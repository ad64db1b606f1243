//! Channel tab bar
//!
//! One tab per channel: number key, caption with `&` mnemonics removed, and
//! the unread badge in its own color.

use crate::tui::app::{App, TabTitle};
use crate::tui::layout::Breakpoint;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Tabs,
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Caption width cap on narrow terminals
const COMPACT_CAPTION_WIDTH: usize = 8;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let compact = !Breakpoint::from_width(area.width).at_least(Breakpoint::Normal);

    let titles: Vec<Line> = app
        .tab_titles()
        .into_iter()
        .enumerate()
        .map(|(i, title)| tab_line(i, &title, compact, theme.badge))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.active)
        .style(Style::default().fg(theme.tab_inactive))
        .highlight_style(
            Style::default()
                .fg(theme.tab_active)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("│", Style::default().fg(theme.border)));

    f.render_widget(tabs, area);
}

fn tab_line(
    index: usize,
    title: &TabTitle,
    compact: bool,
    badge: ratatui::style::Color,
) -> Line<'static> {
    let caption = if compact {
        truncate(&title.caption, COMPACT_CAPTION_WIDTH)
    } else {
        title.caption.clone()
    };

    let mut spans = Vec::with_capacity(3);
    if index < 9 {
        spans.push(Span::raw(format!("{} ", index + 1)));
    }
    spans.push(Span::raw(caption));
    if title.unread > 0 {
        spans.push(Span::styled(
            format!(" ({})", title.unread),
            Style::default().fg(badge).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }

    let budget = max.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
