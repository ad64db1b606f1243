// Startup module - banner and listener status
//
// Printed before the TUI takes over the screen (or at the top of headless
// output), and mirrored to the log so it also lands in the System pane and
// in log files.

use crate::config::{Config, VERSION};
use crate::listener::ListenerStatus;

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const MAGENTA: &str = "\x1b[35m";
}

/// One-line summary of the idle timeout
pub fn timeout_label(config: &Config) -> String {
    if config.timeout.enabled {
        format!("reset after {}s idle", config.timeout.seconds)
    } else {
        "off".to_string()
    }
}

/// Print the startup banner
pub fn print_startup(config: &Config, status: &ListenerStatus) {
    use colors::*;

    println!();
    println!("  {BOLD}{CYAN}Maurina{RESET} {DIM}v{VERSION}{RESET}");
    println!("  {DIM}Multi-channel UDP log viewer{RESET}");
    println!();

    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("  {DIM}Config:{RESET} {GREEN}✓{RESET} {}", path.display());
        } else {
            println!("  {DIM}Config:{RESET} {DIM}(using defaults){RESET}");
        }
    }
    println!(
        "  {DIM}Channels:{RESET} {}",
        config.channels.captions.join(", ")
    );
    println!("  {DIM}Timeout:{RESET} {}", timeout_label(config));
    println!();

    match status {
        ListenerStatus::Listening(_) => {
            println!("  {MAGENTA}▸{RESET} {BOLD}{}{RESET}", status.label());
        }
        _ => println!("  {RED}✗{RESET} {}", status.label()),
    }
    if config.demo_mode {
        println!("  {YELLOW}▸{RESET} {YELLOW}Demo mode active{RESET} {DIM}(sample traffic){RESET}");
    }
    println!();
}

/// Log the same information through tracing
pub fn log_startup(config: &Config, status: &ListenerStatus) {
    tracing::info!("Maurina v{} starting on {}", VERSION, config.listen_label());
    tracing::info!(
        "{} channels, timeout {}",
        config.channels.count(),
        timeout_label(config)
    );
    match status {
        ListenerStatus::Listening(_) => tracing::info!("{}", status.label()),
        _ => tracing::error!("{}", status.label()),
    }
    if config.demo_mode {
        tracing::info!("Running in DEMO MODE - sending sample traffic");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_label() {
        let mut config = Config::default();
        assert_eq!(timeout_label(&config), "reset after 2s idle");

        config.timeout.enabled = false;
        assert_eq!(timeout_label(&config), "off");
    }
}
