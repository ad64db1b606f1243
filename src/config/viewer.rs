//! Viewer configuration: idle timeout, channel captions, markup styles

use serde::Deserialize;
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Timeout
// ─────────────────────────────────────────────────────────────────────────────

/// Idle-reset timeout settings
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutConfig {
    /// Clear all channels on the first datagram after an idle period
    pub enabled: bool,
    /// Idle period in whole seconds
    pub seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seconds: 2,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileTimeout {
    pub enabled: Option<bool>,
    pub seconds: Option<u64>,
}

impl TimeoutConfig {
    pub fn from_file(file: Option<FileTimeout>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            enabled: file.enabled.unwrap_or(defaults.enabled),
            seconds: file.seconds.unwrap_or(defaults.seconds),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Channels
// ─────────────────────────────────────────────────────────────────────────────

/// Number of channels when nothing is configured
pub const DEFAULT_CHANNEL_COUNT: usize = 5;

/// Initial channel captions; the list length fixes the channel count
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelsConfig {
    pub captions: Vec<String>,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            captions: (1..=DEFAULT_CHANNEL_COUNT)
                .map(|i| format!("Log {}", i))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileChannels {
    pub captions: Option<Vec<String>>,
}

impl ChannelsConfig {
    /// An empty caption list falls back to the defaults (at least one channel)
    pub fn from_file(file: Option<FileChannels>) -> Self {
        match file.and_then(|f| f.captions) {
            Some(captions) if !captions.is_empty() => Self { captions },
            _ => Self::default(),
        }
    }

    pub fn count(&self) -> usize {
        self.captions.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Styles
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in markup styles
pub fn default_styles() -> BTreeMap<String, String> {
    [
        ("time", "color:#9e9e9e"),
        ("pre", "font-family:monospace;color:#c8e1ff"),
        ("var", "color:#9ee7ff"),
        ("h1", "color:#ff9e9e;font-weight:bold"),
        ("h2", "color:#fffa9e;font-weight:bold"),
        ("h3", "color:#9eff9e;font-weight:bold"),
        ("h4", "color:#9ee7ff"),
        ("h5", "color:#d09eff"),
        ("h6", "color:#9e9e9e;font-style:italic"),
    ]
    .into_iter()
    .map(|(tag, style)| (tag.to_string(), style.to_string()))
    .collect()
}
