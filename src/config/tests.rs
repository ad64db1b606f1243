//! Configuration tests
//!
//! Round-trip guards for the config file format plus precedence checks for
//! file values against environment overrides.

use super::*;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// Verify that serialized config can be parsed back.
#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed = Config::parse_file_config(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );

    let resolved = Config::resolve(parsed.unwrap(), no_env);
    assert_eq!(resolved, config);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.server_address = "0.0.0.0".to_string();
    config.server_port = 9000;
    config.timeout = TimeoutConfig {
        enabled: false,
        seconds: 15,
    };
    config.channels.captions = vec!["User \"main\"".into(), "Errors".into()];
    config.styles.insert("my.tag".into(), "color:red".into());
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;

    let toml_str = config.to_toml();
    let parsed = Config::parse_file_config(&toml_str).unwrap();
    let resolved = Config::resolve(parsed, no_env);

    assert_eq!(resolved, config);
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults and precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_defaults() {
    let config = Config::resolve(FileConfig::default(), no_env);

    assert_eq!(config.server_address, DEFAULT_ADDRESS);
    assert_eq!(config.server_port, DEFAULT_PORT);
    assert!(config.timeout.enabled);
    assert_eq!(config.timeout.seconds, 2);
    assert_eq!(config.channels.count(), 5);
    assert_eq!(config.channels.captions[0], "Log 1");
    assert!(config.styles.contains_key("pre"));
    assert!(config.enable_tui);
    assert!(!config.demo_mode);
    assert_eq!(config.listen_label(), "127.0.0.1:1947");
}

#[test]
fn test_env_overrides_file() {
    let file = Config::parse_file_config(
        r#"
server_address = "10.0.0.1"
server_port = 5000

[timeout]
seconds = 7
"#,
    )
    .unwrap();

    let config = Config::resolve(
        file,
        env_from(&[
            ("MAURINA_PORT", "6000"),
            ("MAURINA_TIMEOUT", "3"),
            ("MAURINA_NO_TUI", "1"),
            ("MAURINA_DEMO", "true"),
        ]),
    );

    assert_eq!(config.server_address, "10.0.0.1");
    assert_eq!(config.server_port, 6000);
    assert_eq!(config.timeout.seconds, 3);
    assert!(config.timeout.enabled);
    assert!(!config.enable_tui);
    assert!(config.demo_mode);
}

#[test]
fn test_unparseable_env_port_falls_back_to_file() {
    let file = Config::parse_file_config("server_port = 5000").unwrap();
    let config = Config::resolve(file, env_from(&[("MAURINA_PORT", "not-a-port")]));
    assert_eq!(config.server_port, 5000);
}

#[test]
fn test_empty_captions_fall_back_to_defaults() {
    let file = Config::parse_file_config("[channels]\ncaptions = []").unwrap();
    let config = Config::resolve(file, no_env);
    assert_eq!(config.channels, ChannelsConfig::default());
}

#[test]
fn test_styles_section_replaces_defaults() {
    let file = Config::parse_file_config("[styles]\nH1 = \"color:red\"").unwrap();
    let config = Config::resolve(file, no_env);

    assert_eq!(config.styles.len(), 1);
    assert_eq!(config.styles["h1"], "color:red");
    assert_eq!(config.style_table().len(), 1);
}

#[test]
fn test_malformed_file_is_an_error() {
    assert!(Config::parse_file_config("server_port = \"high\"").is_err());
    assert!(Config::parse_file_config("[timeout\nseconds = 1").is_err());
}

#[test]
fn test_unknown_rotation_is_daily() {
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
    assert_eq!(LogRotation::parse("HOURLY"), LogRotation::Hourly);
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisting TUI changes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_saved_timeout_keeps_file_values_over_env() {
    let contents = "server_address = \"0.0.0.0\"\nserver_port = 5000\n\n[timeout]\nseconds = 3\n";
    let env = env_from(&[("MAURINA_PORT", "9999"), ("MAURINA_ADDRESS", "10.0.0.1")]);

    let mut running = Config::resolve(Config::parse_file_config(contents).unwrap(), env);
    assert_eq!(running.server_port, 9999);
    running.timeout.enabled = false;
    running.timeout.seconds = 7;

    let written = Config::with_timeout(Config::parse_file_config(contents).unwrap(), &running.timeout)
        .to_toml();
    let reread = Config::resolve(Config::parse_file_config(&written).unwrap(), no_env);

    assert_eq!(reread.server_port, 5000);
    assert_eq!(reread.server_address, "0.0.0.0");
    assert!(!reread.timeout.enabled);
    assert_eq!(reread.timeout.seconds, 7);
}
