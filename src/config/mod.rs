//! Configuration for the log viewer
//!
//! Configuration is loaded in order of precedence:
//! 1. Command-line flags (applied by `cli`)
//! 2. Environment variables
//! 3. Config file (~/.config/maurina/config.toml)
//! 4. Built-in defaults (lowest priority)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod observability;
mod serialization;
mod viewer;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (maintain public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use observability::{FileLogging, LogRotation, LoggingConfig};
pub use viewer::{default_styles, ChannelsConfig, FileChannels, FileTimeout, TimeoutConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Default listen port
pub const DEFAULT_PORT: u16 = 1947;

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// IPv4/IPv6 address or hostname the UDP listener binds to
    pub server_address: String,

    /// UDP port the listener binds to
    pub server_port: u16,

    /// Idle-reset timeout
    pub timeout: TimeoutConfig,

    /// Channel captions (one per channel; the count fixes N)
    pub channels: ChannelsConfig,

    /// Markup tag -> inline style
    pub styles: BTreeMap<String, String>,

    /// Whether to enable the TUI (can be disabled for headless mode)
    pub enable_tui: bool,

    /// Demo mode: send sample traffic to our own listener
    pub demo_mode: bool,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_ADDRESS.to_string(),
            server_port: DEFAULT_PORT,
            timeout: TimeoutConfig::default(),
            channels: ChannelsConfig::default(),
            styles: default_styles(),
            enable_tui: true,
            demo_mode: false,
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub server_address: Option<String>,
    pub server_port: Option<u16>,

    /// Optional [timeout] section
    pub timeout: Option<FileTimeout>,

    /// Optional [channels] section
    pub channels: Option<FileChannels>,

    /// Optional [styles] section; replaces the default table when present
    pub styles: Option<BTreeMap<String, String>>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/maurina/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("maurina").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        // Write config (ignore errors - config is optional)
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Read and parse the config file; a missing file means defaults
    fn load_file_config() -> Result<FileConfig> {
        let Some(path) = Self::config_path() else {
            return Ok(FileConfig::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse_file_config(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FileConfig::default()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file {}", path.display())),
        }
    }

    pub(crate) fn parse_file_config(contents: &str) -> Result<FileConfig> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration: file -> env vars -> defaults
    ///
    /// A config file that exists but cannot be parsed is an error: silently
    /// falling back to defaults would bind the wrong port without a hint.
    pub fn load() -> Result<Self> {
        let file = Self::load_file_config()?;
        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    /// Merge file values and environment lookups over the defaults
    pub(crate) fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        // Listen address: env > file > default
        let server_address = env("MAURINA_ADDRESS")
            .or(file.server_address)
            .unwrap_or(defaults.server_address);

        // Listen port: env > file > default
        let server_port = env("MAURINA_PORT")
            .and_then(|v| v.parse().ok())
            .or(file.server_port)
            .unwrap_or(defaults.server_port);

        // TUI toggle: env only (runtime flag)
        let enable_tui = env("MAURINA_NO_TUI")
            .map(|v| v != "1" && v.to_lowercase() != "true")
            .unwrap_or(true);

        // Demo mode: env only (runtime flag)
        let demo_mode = env("MAURINA_DEMO")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        // Timeout seconds: env > file > default
        let mut timeout = TimeoutConfig::from_file(file.timeout);
        if let Some(seconds) = env("MAURINA_TIMEOUT").and_then(|v| v.parse().ok()) {
            timeout.seconds = seconds;
        }

        let channels = ChannelsConfig::from_file(file.channels);

        // Styles: a [styles] section replaces the defaults wholesale so
        // users can remove a tag by leaving it out
        let styles = file
            .styles
            .map(|table| {
                table
                    .into_iter()
                    .map(|(tag, style)| (tag.to_lowercase(), style))
                    .collect()
            })
            .unwrap_or(defaults.styles);

        let logging = LoggingConfig::from_file(file.logging);

        Self {
            server_address,
            server_port,
            timeout,
            channels,
            styles,
            enable_tui,
            demo_mode,
            logging,
        }
    }

    /// Save current configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("Could not determine config path")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        std::fs::write(&path, self.to_toml())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// File contents with `timeout` swapped in, ignoring environment overrides
    pub(crate) fn with_timeout(file: FileConfig, timeout: &TimeoutConfig) -> Self {
        let mut on_disk = Self::resolve(file, |_| None);
        on_disk.timeout = timeout.clone();
        on_disk
    }

    /// Persist the timeout section; everything else stays as it is on disk
    pub fn save_timeout(timeout: &TimeoutConfig) -> Result<()> {
        Self::with_timeout(Self::load_file_config()?, timeout).save()
    }

    /// `address:port` as shown to the operator
    pub fn listen_label(&self) -> String {
        format!("{}:{}", self.server_address, self.server_port)
    }

    /// Build the style table used by the formatter
    pub fn style_table(&self) -> crate::engine::StyleTable {
        crate::engine::StyleTable::from_pairs(&self.styles)
    }
}
