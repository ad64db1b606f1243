//! System logs pane
//!
//! Shows the viewer's own tracing output (bind results, resets, dropped
//! datagrams) captured by the TUI log layer. The pane owns its scroll state;
//! entries are passed in each frame since the buffer is shared with the
//! logging system.

use super::scrollbar::{render_scrollbar, ScrollbarStyle};
use crate::logging::{LogEntry, LogLevel};
use crate::tui::app::App;
use crate::tui::scroll::{FocusablePanel, ScrollState};
use crate::tui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub struct LogsPanel {
    scroll: ScrollState,
}

impl LogsPanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::new(),
        }
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollState {
        &mut self.scroll
    }

    /// Sync with the current entries (call each frame)
    pub fn sync_entries(&mut self, entries: &[LogEntry], viewport_height: usize) {
        self.scroll.update_dimensions(entries.len(), viewport_height);
    }

    pub fn render_with_entries(
        &self,
        f: &mut Frame,
        area: Rect,
        entries: &[LogEntry],
        theme: &Theme,
        focused: bool,
    ) {
        let (start, end) = self.scroll.visible_range();
        let items: Vec<ListItem> = entries[start..end]
            .iter()
            .map(|entry| ListItem::new(format_log_entry(entry)).style(level_style(entry.level, theme)))
            .collect();

        let border = if focused {
            theme.border_focused
        } else {
            theme.border
        };

        let title = if self.scroll.auto_follow {
            " System "
        } else {
            " System [scroll] "
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(theme.border_type)
                .border_style(Style::default().fg(border))
                .title(title),
        );

        f.render_widget(list, area);
        render_scrollbar(f, area, &self.scroll, ScrollbarStyle::Minimal);
    }
}

impl Default for LogsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn format_log_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {:5} {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.level.as_str(),
        entry.message
    )
}

fn level_style(level: LogLevel, theme: &Theme) -> Style {
    match level {
        LogLevel::Error => Style::default()
            .fg(theme.log_error)
            .add_modifier(Modifier::BOLD),
        LogLevel::Warn => Style::default().fg(theme.log_warn),
        LogLevel::Info => Style::default().fg(theme.log_info),
        LogLevel::Debug => Style::default().fg(theme.log_debug),
        LogLevel::Trace => Style::default().fg(theme.log_trace),
    }
}

/// Render the logs pane owned by the app
pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let height = area.height.saturating_sub(2) as usize;
    let entries = app.log_buffer.get_all();
    let focused = app.focused == FocusablePanel::Logs;

    app.logs_panel.sync_entries(&entries, height);
    app.logs_panel
        .render_with_entries(f, area, &entries, &app.theme, focused);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    #[test]
    fn test_format_log_entry() {
        let entry = LogEntry {
            timestamp: Local::now(),
            level: LogLevel::Warn,
            message: "Cannot bind to 127.0.0.1:1947".to_string(),
        };
        let line = format_log_entry(&entry);
        assert!(line.starts_with('['));
        assert!(line.contains("WARN  Cannot bind"));
    }
}
