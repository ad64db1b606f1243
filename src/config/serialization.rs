//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// TOML basic string with escaping
fn quoted(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

/// Bare key when possible, quoted otherwise
fn key(s: &str) -> String {
    let bare = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        s.to_string()
    } else {
        quoted(s)
    }
}

impl Config {
    /// Serialize `[styles]` entries, one per line
    pub(super) fn styles_to_toml(&self) -> String {
        let mut output = String::new();
        for (tag, style) in &self.styles {
            output.push_str(&format!("{} = {}\n", key(tag), quoted(style)));
        }
        output
    }

    /// Serialize config to TOML string
    pub fn to_toml(&self) -> String {
        let captions = self
            .channels
            .captions
            .iter()
            .map(|c| quoted(c))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"# maurina configuration

# UDP listener (MAURINA_ADDRESS / MAURINA_PORT override these)
server_address = {address}
server_port = {port}

# Clear every channel on the first datagram after this much silence
[timeout]
enabled = {timeout_enabled}
seconds = {timeout_seconds}

# One caption per channel; the number of captions is the number of channels.
# Senders may rename channels at runtime via "tabs".
[channels]
captions = [{captions}]

# Markup tag -> inline style. <tag>..</tag> in log text is rewritten to a
# styled span (or a styled <pre> for the "pre" tag). Tags are case-insensitive.
[styles]
{styles}
# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# File logging (in addition to TUI buffer or stdout)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix}
"#,
            address = quoted(&self.server_address),
            port = self.server_port,
            timeout_enabled = self.timeout.enabled,
            timeout_seconds = self.timeout.seconds,
            captions = captions,
            styles = self.styles_to_toml(),
            log_level = quoted(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.to_string_lossy()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = quoted(&self.logging.file_prefix),
        )
    }
}
