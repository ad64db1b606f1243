// TUI application state
//
// Holds what the renderer needs between frames: the shared dispatcher (read
// under its lock each frame), the listener server for rebinds, per-channel
// scroll positions, and transient UI state such as the toast.

use super::components::logs_panel::LogsPanel;
use super::components::toast::Toast;
use super::scroll::{FocusablePanel, ScrollState};
use super::theme::Theme;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::engine::dispatcher::{self, SharedDispatcher};
use crate::listener::{ListenerStatus, Server};
use crate::logging::LogBuffer;
use crate::markup;
use ratatui::style::Style;
use ratatui::text::Line;
use std::sync::Arc;
use std::time::Instant;

/// Longest idle timeout settable from the keyboard
const MAX_TIMEOUT_SECS: u64 = 3600;

/// Work the event loop has to await on the app's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    ReloadConfig,
}

/// Rendered markup of one channel at one dispatcher revision
struct BodyCache {
    channel: usize,
    revision: u64,
    lines: Vec<Line<'static>>,
}

/// Tab title data for one channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabTitle {
    pub caption: String,
    pub unread: u32,
}

/// Main application state for the TUI
pub struct App {
    pub dispatcher: SharedDispatcher,
    pub server: Server,
    pub config: Config,
    /// Command-line overrides re-applied on every config reload
    run_args: RunArgs,

    pub log_buffer: LogBuffer,
    pub theme: Theme,

    /// Index of the channel shown in the body
    pub active: usize,
    pub focused: FocusablePanel,
    pub show_logs: bool,
    pub show_help: bool,

    /// One scroll state per channel
    pub channel_scroll: Vec<ScrollState>,
    pub logs_panel: LogsPanel,

    pub toast: Option<Toast>,
    pub should_quit: bool,
    pub started_at: Instant,

    body_cache: Option<BodyCache>,
}

impl App {
    pub fn new(
        dispatcher: SharedDispatcher,
        server: Server,
        config: Config,
        run_args: RunArgs,
        log_buffer: LogBuffer,
    ) -> Self {
        let channels = dispatcher::lock(&dispatcher).channels().len();
        Self {
            dispatcher,
            server,
            config,
            run_args,
            log_buffer,
            theme: Theme::default(),
            active: 0,
            focused: FocusablePanel::Channel,
            show_logs: false,
            show_help: true,
            channel_scroll: vec![ScrollState::new(); channels],
            logs_panel: LogsPanel::new(),
            toast: None,
            should_quit: false,
            started_at: Instant::now(),
            body_cache: None,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_scroll.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Channel navigation
    // ─────────────────────────────────────────────────────────────────────

    pub fn next_channel(&mut self) {
        if self.channel_count() > 0 {
            self.active = (self.active + 1) % self.channel_count();
        }
    }

    pub fn prev_channel(&mut self) {
        if self.channel_count() > 0 {
            self.active = (self.active + self.channel_count() - 1) % self.channel_count();
        }
    }

    /// Select by 0-based index; out-of-range is ignored
    pub fn select_channel(&mut self, index: usize) {
        if index < self.channel_count() {
            self.active = index;
        }
    }

    /// Captions (mnemonics stripped) and unread counts for the tab bar
    pub fn tab_titles(&self) -> Vec<TabTitle> {
        dispatcher::lock(&self.dispatcher)
            .channels()
            .get_all()
            .iter()
            .map(|channel| TabTitle {
                caption: strip_mnemonic(channel.caption()),
                unread: channel.unread(),
            })
            .collect()
    }

    /// Panel title of the active channel, e.g. `User (3)`
    pub fn active_title(&self) -> String {
        dispatcher::lock(&self.dispatcher)
            .channels()
            .caption_with_badge(self.active)
            .map(|caption| strip_mnemonic(&caption))
            .unwrap_or_default()
    }

    /// Rendered lines of the active channel; each fragment is a paragraph
    pub fn body_lines(&mut self) -> &[Line<'static>] {
        let guard = dispatcher::lock(&self.dispatcher);
        let revision = guard.revision();

        let stale = self
            .body_cache
            .as_ref()
            .map_or(true, |c| c.channel != self.active || c.revision != revision);

        if stale {
            let lines = guard
                .channels()
                .get(self.active)
                .map(|channel| {
                    channel
                        .fragments()
                        .iter()
                        .flat_map(|fragment| markup::render(fragment, Style::default()))
                        .collect()
                })
                .unwrap_or_default();
            drop(guard);

            self.body_cache = Some(BodyCache {
                channel: self.active,
                revision,
                lines,
            });
        } else {
            drop(guard);
        }

        self.body_cache
            .as_ref()
            .map(|c| c.lines.as_slice())
            .unwrap_or_default()
    }

    /// Active channel as plain text, one line per fragment line
    pub fn copy_channel_plain(&self) -> Option<String> {
        let guard = dispatcher::lock(&self.dispatcher);
        let channel = guard.channels().get(self.active)?;
        if channel.is_empty() {
            return None;
        }
        Some(
            channel
                .fragments()
                .iter()
                .map(|fragment| markup::to_plain(fragment))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Focus and scrolling
    // ─────────────────────────────────────────────────────────────────────

    pub fn toggle_logs(&mut self) {
        self.show_logs = !self.show_logs;
        if !self.show_logs {
            self.focused = FocusablePanel::Channel;
        }
    }

    /// Cycle focus between the channel body and the logs pane (if shown)
    pub fn focus_next(&mut self) {
        self.focused = match self.focused {
            FocusablePanel::Channel if self.show_logs => FocusablePanel::Logs,
            _ => FocusablePanel::Channel,
        };
    }

    /// Scroll state of the focused panel
    pub fn focused_scroll(&mut self) -> Option<&mut ScrollState> {
        match self.focused {
            FocusablePanel::Channel => self.channel_scroll.get_mut(self.active),
            FocusablePanel::Logs => Some(self.logs_panel.scroll_mut()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Channel state actions
    // ─────────────────────────────────────────────────────────────────────

    /// Empty every channel now
    pub fn clear_channels(&mut self) {
        dispatcher::lock(&self.dispatcher).clear_now();
        tracing::info!("Channels cleared");
        self.show_toast("Channels cleared");
    }

    pub fn toggle_timeout(&mut self) {
        self.config.timeout.enabled = !self.config.timeout.enabled;
        self.apply_timeout();
    }

    /// Change the timeout by `delta` seconds, clamped to a sane range
    pub fn adjust_timeout(&mut self, delta: i64) {
        let seconds = self
            .config
            .timeout
            .seconds
            .saturating_add_signed(delta)
            .min(MAX_TIMEOUT_SECS);
        if seconds == self.config.timeout.seconds {
            return;
        }
        self.config.timeout.seconds = seconds;
        self.apply_timeout();
    }

    fn apply_timeout(&mut self) {
        let timeout = self.config.timeout.clone();
        dispatcher::lock(&self.dispatcher).configure_timeout(timeout.enabled, timeout.seconds);

        let label = if timeout.enabled {
            format!("Timeout {}s", timeout.seconds)
        } else {
            "Timeout off".to_string()
        };
        tracing::info!("{}", label);

        match Config::save_timeout(&self.config.timeout) {
            Ok(()) => self.show_toast(label),
            Err(e) => {
                tracing::warn!("Could not save settings: {:#}", e);
                self.show_toast(format!("{} (not saved)", label));
            }
        }
    }

    /// Re-read the config file and apply what can change at runtime
    ///
    /// Address or port changes rebind the listener; timeout and styles are
    /// applied in place. Captions stay as producers last set them.
    pub async fn reload_config(&mut self) {
        let mut fresh = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Config reload failed: {:#}", e);
                self.show_toast("✗ Config reload failed");
                return;
            }
        };
        self.run_args.apply(&mut fresh);
        fresh.enable_tui = self.config.enable_tui;
        fresh.demo_mode = self.config.demo_mode;

        let rebind = fresh.server_address != self.config.server_address
            || fresh.server_port != self.config.server_port
            || !self.server.status().is_listening();

        {
            let mut d = dispatcher::lock(&self.dispatcher);
            d.configure_timeout(fresh.timeout.enabled, fresh.timeout.seconds);
            d.set_styles(Arc::new(fresh.style_table()));
        }

        self.config = fresh;
        tracing::info!("Config reloaded");

        if rebind {
            let address = self.config.server_address.clone();
            let port = self.config.server_port;
            match self.server.start(&address, port).await {
                Ok(addr) => self.show_toast(format!("✓ Listening at {}", addr)),
                Err(e) => self.show_toast(format!("✗ {}", e)),
            }
        } else {
            self.show_toast("✓ Config reloaded");
        }
    }

    pub fn listener_status(&self) -> &ListenerStatus {
        self.server.status()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Toast and clock
    // ─────────────────────────────────────────────────────────────────────

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast::new(message));
    }

    /// Drop the toast once it expired (called on tick)
    pub fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    /// Uptime as HH:MM:SS
    pub fn uptime(&self) -> String {
        let secs = self.started_at.elapsed().as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Remove `&` mnemonic markers: `&User` -> `User`, `R&&D` -> `R&D`
pub fn strip_mnemonic(caption: &str) -> String {
    let mut out = String::with_capacity(caption.len());
    let mut chars = caption.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if chars.peek() == Some(&'&') {
                out.push('&');
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}
