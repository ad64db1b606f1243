//! Scrollbar drawn on the right edge of a bordered panel

use crate::tui::scroll::ScrollState;
use ratatui::{
    layout::{Margin, Rect},
    widgets::{Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

#[derive(Debug, Clone, Copy, Default)]
pub enum ScrollbarStyle {
    /// Arrows at top and bottom (↑ ↓)
    Arrows,
    /// Thumb only
    #[default]
    Minimal,
}

/// Render a vertical scrollbar if the content overflows the viewport
pub fn render_scrollbar(f: &mut Frame, area: Rect, scroll: &ScrollState, style: ScrollbarStyle) {
    if !scroll.needs_scrollbar() {
        return;
    }

    let scrollbar = match style {
        ScrollbarStyle::Arrows => Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓")),
        ScrollbarStyle::Minimal => Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None),
    };

    // ScrollbarState wants how far the content can scroll, not its length
    let content_length = scroll.total().saturating_sub(scroll.viewport());
    let mut state = ScrollbarState::new(content_length).position(scroll.offset());

    // Stay inside the rounded corners
    let track = area.inner(Margin {
        vertical: 1,
        horizontal: 0,
    });
    f.render_stateful_widget(scrollbar, track, &mut state);
}
