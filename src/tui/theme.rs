// TUI color palette
//
// Uses the terminal's ANSI palette so the viewer follows whatever scheme the
// terminal is configured with. Markup styles from log text bring their own
// RGB colors on top of this.

use ratatui::style::Color;
use ratatui::widgets::BorderType;

#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub fg: Color,
    pub border: Color,
    pub border_focused: Color,
    pub border_type: BorderType,

    // Tabs
    pub tab_active: Color,
    pub tab_inactive: Color,
    pub badge: Color,

    // Status bar
    pub status_bar: Color,
    pub status_ok: Color,
    pub status_error: Color,
    pub help: Color,

    pub highlight: Color,

    // Log levels
    pub log_error: Color,
    pub log_warn: Color,
    pub log_info: Color,
    pub log_debug: Color,
    pub log_trace: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Reset,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            border_type: BorderType::Rounded,

            tab_active: Color::Cyan,
            tab_inactive: Color::Gray,
            badge: Color::Yellow,

            status_bar: Color::Gray,
            status_ok: Color::Green,
            status_error: Color::Red,
            help: Color::DarkGray,

            highlight: Color::Magenta,

            log_error: Color::Red,
            log_warn: Color::Yellow,
            log_info: Color::Green,
            log_debug: Color::Blue,
            log_trace: Color::DarkGray,
        }
    }
}
