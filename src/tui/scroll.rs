// Scroll state for TUI panels
//
// Each panel owns one ScrollState. Content size and viewport are synced every
// frame; auto-follow keeps the newest lines in view until the user scrolls
// up, and scrolling back to the bottom turns it on again.

/// Scroll state for a single panel
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Line index at the top of the viewport
    offset: usize,

    /// Total number of lines in content
    total: usize,

    /// Number of lines visible in viewport
    viewport: usize,

    /// Keep the view pinned to the bottom as content grows
    pub auto_follow: bool,
}

impl ScrollState {
    /// Create new scroll state with auto-follow enabled
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            auto_follow: true,
        }
    }

    /// Update content and viewport dimensions (call each render frame)
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;

        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Scroll up by one line; the user takes control
    pub fn scroll_up(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            self.auto_follow = false;
        }
    }

    /// Scroll down by one line; re-enables auto-follow at the bottom
    pub fn scroll_down(&mut self) {
        if self.offset < self.max_offset() {
            self.offset += 1;
        }
        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    pub fn page_up(&mut self) {
        let page = self.viewport.max(1);
        self.offset = self.offset.saturating_sub(page);
        self.auto_follow = false;
    }

    pub fn page_down(&mut self) {
        let page = self.viewport.max(1);
        self.offset = (self.offset + page).min(self.max_offset());
        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.auto_follow = false;
    }

    /// Jump to bottom (and enable auto-follow)
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.auto_follow = true;
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Visible range (start_index, end_index)
    pub fn visible_range(&self) -> (usize, usize) {
        let start = self.offset;
        let end = (self.offset + self.viewport).min(self.total);
        (start, end)
    }

    /// Check if content overflows viewport (scrollbar needed)
    pub fn needs_scrollbar(&self) -> bool {
        self.total > self.viewport
    }

    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}

/// Panels that receive scroll input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusablePanel {
    /// Active channel body (default focus)
    #[default]
    Channel,
    /// System logs pane
    Logs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_follow_on_new_content() {
        let mut scroll = ScrollState::new();
        assert!(scroll.auto_follow);

        scroll.update_dimensions(10, 5);
        assert_eq!(scroll.offset(), 5);

        scroll.update_dimensions(15, 5);
        assert_eq!(scroll.offset(), 10);
    }

    #[test]
    fn test_scroll_up_disables_auto_follow() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(20, 5);

        scroll.scroll_up();
        assert!(!scroll.auto_follow);
        assert_eq!(scroll.offset(), 14);

        // Growing content no longer moves the view
        scroll.update_dimensions(30, 5);
        assert_eq!(scroll.offset(), 14);
    }

    #[test]
    fn test_scroll_down_to_bottom_re_enables_follow() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(7, 5);
        scroll.scroll_up();
        scroll.scroll_up();
        assert_eq!(scroll.offset(), 0);

        scroll.scroll_down();
        assert!(!scroll.auto_follow);
        scroll.scroll_down();
        assert!(scroll.auto_follow);
        assert_eq!(scroll.offset(), 2);
    }

    #[test]
    fn test_shrinking_content_clamps_offset() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        scroll.scroll_to_top();
        scroll.page_down();
        scroll.page_down();
        assert_eq!(scroll.offset(), 20);

        // A reset empties the channel
        scroll.update_dimensions(0, 10);
        assert_eq!(scroll.offset(), 0);
        assert_eq!(scroll.visible_range(), (0, 0));
    }

    #[test]
    fn test_visible_range() {
        let mut scroll = ScrollState::new();
        scroll.update_dimensions(100, 10);
        assert_eq!(scroll.visible_range(), (90, 100));

        scroll.scroll_to_top();
        assert_eq!(scroll.visible_range(), (0, 10));
        assert!(scroll.needs_scrollbar());
    }
}
