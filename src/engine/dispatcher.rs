//! Datagram dispatcher
//!
//! Applies decoded payloads to the channel registry. The dispatcher owns the
//! registry, the formatter and the idle-reset controller, and is their only
//! writer. It is shared with the renderer behind a single mutex
//! ([`SharedDispatcher`]) so a payload, including the reset it triggers, is
//! always applied under one lock acquisition.

use super::channels::ChannelRegistry;
use super::idle::IdleReset;
use super::payload::Payload;
use super::style::{Formatter, StyleTable};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Dispatcher shared between the listener (writer) and the renderer (reader)
pub type SharedDispatcher = Arc<Mutex<Dispatcher>>;

/// Lock the shared dispatcher, recovering the state if a holder panicked
pub fn lock(shared: &SharedDispatcher) -> MutexGuard<'_, Dispatcher> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Summary of what one payload changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// A pending idle reset was applied before the payload
    pub reset: bool,
    /// Number of captions replaced
    pub captions: usize,
    /// Channels that received text, with the formatted fragment each got
    pub appended: Vec<(usize, String)>,
    /// Entry indices with no matching channel
    pub ignored: Vec<usize>,
}

impl DispatchOutcome {
    /// Indices of the channels that received text
    pub fn appended_channels(&self) -> Vec<usize> {
        self.appended.iter().map(|(index, _)| *index).collect()
    }

    /// Whether anything visible changed
    pub fn changed(&self) -> bool {
        self.reset || self.captions > 0 || !self.appended.is_empty()
    }
}

pub struct Dispatcher {
    channels: ChannelRegistry,
    formatter: Formatter,
    idle: IdleReset,
    /// Bumped on every visible change so renderers can skip identical frames
    revision: u64,
}

impl Dispatcher {
    pub fn new(
        captions: Vec<String>,
        styles: Arc<StyleTable>,
        timeout_enabled: bool,
        timeout_secs: u64,
    ) -> Self {
        Self {
            channels: ChannelRegistry::new(captions),
            formatter: Formatter::new(styles),
            idle: IdleReset::new(timeout_enabled, timeout_secs),
            revision: 0,
        }
    }

    /// Wrap in the shared handle used by the listener and the TUI
    pub fn into_shared(self) -> SharedDispatcher {
        Arc::new(Mutex::new(self))
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    pub fn idle(&self) -> &IdleReset {
        &self.idle
    }

    pub fn styles(&self) -> &Arc<StyleTable> {
        self.formatter.styles()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply one decoded payload
    pub fn on_payload(&mut self, payload: &Payload, now: Instant) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        // A reset marked by the idle deadline is applied before new content
        if self.idle.take_pending() {
            self.channels.reset_all();
            outcome.reset = true;
            tracing::debug!("Idle timeout elapsed, channels cleared for new payload");
        }

        for (index, caption) in payload.captions.iter().enumerate() {
            if !self.channels.set_caption(index, caption) {
                break;
            }
            outcome.captions += 1;
        }

        for (&index, raw) in &payload.entries {
            if raw.is_empty() {
                continue;
            }
            if index >= self.channels.len() {
                tracing::trace!("Dropping fragment for unknown channel {}", index + 1);
                outcome.ignored.push(index);
                continue;
            }
            let text = self.formatter.format(raw);
            if self.channels.append(index, &text) {
                outcome.appended.push((index, text));
            }
        }

        self.idle.restart(now);

        if outcome.changed() {
            self.revision += 1;
        }
        outcome
    }

    /// Fire the idle deadline if it elapsed. Returns true when it fired.
    ///
    /// Firing only marks the reset as pending; channels keep their content.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        let fired = self.idle.poll(now);
        if fired {
            tracing::trace!("Idle deadline reached, reset pending");
        }
        fired
    }

    /// Next instant the listener should wake for the idle deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.idle.deadline()
    }

    /// Clear all channels immediately and drop any pending reset
    pub fn clear_now(&mut self) {
        self.channels.reset_all();
        self.idle.cancel();
        self.revision += 1;
    }

    /// Apply timeout settings without touching channel content
    pub fn configure_timeout(&mut self, enabled: bool, timeout_secs: u64) {
        self.idle.set_timeout_secs(timeout_secs);
        self.idle.set_enabled(enabled);
    }

    /// Swap the style table; already appended text keeps its old styling
    pub fn set_styles(&mut self, styles: Arc<StyleTable>) {
        self.formatter.set_styles(styles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::channels::Channel;
    use std::time::Duration;

    fn dispatcher(n: usize, styles: &[(&str, &str)]) -> Dispatcher {
        let captions = (1..=n).map(|i| format!("Log {}", i)).collect();
        let styles = Arc::new(StyleTable::from_pairs(styles.iter().copied()));
        Dispatcher::new(captions, styles, true, 2)
    }

    fn payload(json: &str) -> Payload {
        Payload::decode(json.as_bytes()).unwrap()
    }

    fn snapshot(d: &Dispatcher) -> Vec<Channel> {
        d.channels().get_all().to_vec()
    }

    fn captions(d: &Dispatcher) -> Vec<String> {
        d.channels()
            .get_all()
            .iter()
            .map(|c| c.caption().to_string())
            .collect()
    }

    #[test]
    fn test_example_scenario() {
        let mut d = dispatcher(2, &[("h1", "color:#ff0000")]);
        let outcome = d.on_payload(
            &payload(r#"{"tabs":["A","B"],"log1":"<h1>hi</h1>"}"#),
            Instant::now(),
        );

        let channels = d.channels();
        assert_eq!(
            channels.buffer(0).as_deref(),
            Some("<span style=\"color:#ff0000\">hi</span>")
        );
        assert_eq!(channels.get(0).map(Channel::unread), Some(1));
        assert_eq!(channels.buffer(1).as_deref(), Some(""));
        assert_eq!(channels.get(1).map(Channel::unread), Some(0));
        assert_eq!(channels.caption_with_badge(0).as_deref(), Some("A (1)"));
        assert_eq!(channels.caption_with_badge(1).as_deref(), Some("B"));
        assert_eq!(
            outcome.appended,
            [(0, "<span style=\"color:#ff0000\">hi</span>".to_string())]
        );
        assert_eq!(outcome.captions, 2);
    }

    #[test]
    fn test_empty_or_absent_entries_leave_channel_unchanged() {
        let mut d = dispatcher(3, &[]);
        let now = Instant::now();
        d.on_payload(&payload(r#"{"log2":"seed"}"#), now);
        let before = snapshot(&d);

        let outcome = d.on_payload(&payload(r#"{"log1":"","log3":""}"#), now);

        assert_eq!(snapshot(&d), before);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_append_adds_formatted_text_and_one_unread() {
        let mut d = dispatcher(2, &[("time", "color:gray")]);
        let now = Instant::now();
        d.on_payload(&payload(r#"{"log2":"first "}"#), now);

        d.on_payload(&payload(r#"{"log2":"<time>[1]</time>"}"#), now);

        let channel = d.channels().get(1).unwrap();
        assert_eq!(
            channel.buffer(),
            "first <span style=\"color:gray\">[1]</span>"
        );
        assert_eq!(channel.unread(), 2);
    }

    #[test]
    fn test_caption_partiality() {
        let mut d = dispatcher(3, &[]);
        let now = Instant::now();

        d.on_payload(&payload(r#"{"tabs":["X"]}"#), now);
        assert_eq!(captions(&d), ["X", "Log 2", "Log 3"]);

        let outcome = d.on_payload(&payload(r#"{"tabs":["P","Q","R","S","T"]}"#), now);
        assert_eq!(captions(&d), ["P", "Q", "R"]);
        assert_eq!(outcome.captions, 3);
    }

    #[test]
    fn test_out_of_range_entries_are_ignored() {
        let mut d = dispatcher(2, &[]);
        let outcome = d.on_payload(
            &payload(r#"{"log5":"lost","log1":"kept"}"#),
            Instant::now(),
        );

        assert_eq!(outcome.appended_channels(), [0]);
        assert_eq!(outcome.ignored, [4]);
        assert_eq!(d.channels().total_unread(), 1);
    }

    #[test]
    fn test_lazy_reset_without_followup_keeps_state() {
        let mut d = dispatcher(2, &[]);
        let t0 = Instant::now();
        d.on_payload(&payload(r#"{"log1":"stale"}"#), t0);
        let before = snapshot(&d);

        assert!(d.on_deadline(t0 + Duration::from_secs(2)));
        assert!(d.idle().is_pending());

        // No payload arrives: nothing is cleared, however long we wait
        assert!(!d.on_deadline(t0 + Duration::from_secs(3600)));
        assert_eq!(snapshot(&d), before);
    }

    #[test]
    fn test_lazy_reset_clears_before_applying_next_payload() {
        let mut d = dispatcher(2, &[]);
        let t0 = Instant::now();
        d.on_payload(
            &payload(r#"{"tabs":["A","B"],"log1":"old","log2":"old"}"#),
            t0,
        );
        d.on_deadline(t0 + Duration::from_secs(2));

        let outcome = d.on_payload(
            &payload(r#"{"log2":"new"}"#),
            t0 + Duration::from_secs(5),
        );

        assert!(outcome.reset);
        assert_eq!(d.channels().buffer(0).as_deref(), Some(""));
        assert_eq!(d.channels().buffer(1).as_deref(), Some("new"));
        assert_eq!(d.channels().caption_with_badge(0).as_deref(), Some("A"));
        assert_eq!(d.channels().caption_with_badge(1).as_deref(), Some("B (1)"));
        assert!(!d.idle().is_pending());
    }

    #[test]
    fn test_payload_restarts_deadline() {
        let mut d = dispatcher(1, &[]);
        let t0 = Instant::now();
        d.on_payload(&payload(r#"{"log1":"a"}"#), t0);
        d.on_payload(&payload(r#"{"log1":"b"}"#), t0 + Duration::from_secs(1));

        assert!(!d.on_deadline(t0 + Duration::from_secs(2)));
        assert_eq!(d.next_deadline(), Some(t0 + Duration::from_secs(3)));
    }

    #[test]
    fn test_disable_mid_armed_never_resets() {
        let mut d = dispatcher(1, &[]);
        let t0 = Instant::now();
        d.on_payload(&payload(r#"{"log1":"a"}"#), t0);

        d.configure_timeout(false, 2);
        assert_eq!(d.next_deadline(), None);

        d.on_payload(&payload(r#"{"log1":"b"}"#), t0 + Duration::from_secs(1));
        assert!(!d.on_deadline(t0 + Duration::from_secs(86_400)));
        let outcome = d.on_payload(
            &payload(r#"{"log1":"c"}"#),
            t0 + Duration::from_secs(86_401),
        );

        assert!(!outcome.reset);
        assert_eq!(d.channels().buffer(0).as_deref(), Some("abc"));
    }

    #[test]
    fn test_configure_timeout_keeps_channel_state() {
        let mut d = dispatcher(1, &[]);
        d.on_payload(&payload(r#"{"log1":"a"}"#), Instant::now());
        let before = snapshot(&d);

        d.configure_timeout(true, 30);

        assert_eq!(snapshot(&d), before);
        assert_eq!(d.idle().timeout_secs(), 30);
    }

    #[test]
    fn test_clear_now_drops_pending_reset() {
        let mut d = dispatcher(1, &[]);
        let t0 = Instant::now();
        d.on_payload(&payload(r#"{"log1":"a"}"#), t0);
        d.on_deadline(t0 + Duration::from_secs(2));

        d.clear_now();

        assert!(!d.idle().is_pending());
        assert_eq!(d.channels().total_unread(), 0);
    }

    #[test]
    fn test_style_swap_only_affects_new_text() {
        let mut d = dispatcher(1, &[("h1", "color:red")]);
        let now = Instant::now();
        d.on_payload(&payload(r#"{"log1":"<h1>a</h1>"}"#), now);

        d.set_styles(Arc::new(StyleTable::from_pairs([("h1", "color:blue")])));
        d.on_payload(&payload(r#"{"log1":"<h1>b</h1>"}"#), now);

        assert_eq!(
            d.channels().buffer(0).as_deref(),
            Some("<span style=\"color:red\">a</span><span style=\"color:blue\">b</span>")
        );
    }

    #[test]
    fn test_revision_tracks_visible_changes() {
        let mut d = dispatcher(1, &[]);
        let now = Instant::now();
        d.on_payload(&payload(r#"{"log1":""}"#), now);
        assert_eq!(d.revision(), 0);

        d.on_payload(&payload(r#"{"log1":"x"}"#), now);
        assert_eq!(d.revision(), 1);
    }
}
