// Components module - UI building blocks
//
// - Channel tabs: one tab per channel with unread badges
// - Channel panel: styled body of the active channel
// - Logs panel: the viewer's own log entries
// - Status bar: listener, timeout, unread total, key help
// - Toast: short-lived confirmation overlay

pub mod channel_panel;
pub mod channel_tabs;
pub mod logs_panel;
pub mod scrollbar;
pub mod status_bar;
pub mod toast;

pub use toast::Toast;
