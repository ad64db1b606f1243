// CLI module - command-line argument parsing and handlers
//
// Without a subcommand the viewer runs; flags override the loaded config.
// Subcommands:
// - config --show|--reset|--edit|--path: configuration management
// - send: push a message to a running viewer

use crate::config::{Config, VERSION};
use crate::connector::Connector;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{Read, Write};
use std::process::Command;

/// Maurina - multi-channel UDP log viewer
#[derive(Parser)]
#[command(name = "maurina")]
#[command(version = VERSION)]
#[command(about = "Multi-channel UDP log viewer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Overrides for running the viewer
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Address to listen on
    #[arg(long)]
    pub address: Option<String>,

    /// UDP port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Run headless: print received log text instead of the TUI
    #[arg(long)]
    pub no_tui: bool,

    /// Send sample traffic to our own listener
    #[arg(long)]
    pub demo: bool,
}

impl RunArgs {
    /// Apply flags on top of file/env configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(address) = &self.address {
            config.server_address = address.clone();
        }
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if self.no_tui {
            config.enable_tui = false;
        }
        if self.demo {
            config.demo_mode = true;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Send a message to a running viewer
    Send {
        /// Channel number (1-based)
        #[arg(short, long, default_value_t = 1)]
        channel: usize,

        /// Prefix the message with the current time
        #[arg(short, long)]
        time: bool,

        /// Viewer address (defaults to the configured listen address)
        #[arg(long)]
        address: Option<String>,

        /// Viewer port (defaults to the configured listen port)
        #[arg(long)]
        port: Option<u16>,

        /// Message text; read from stdin when omitted
        message: Vec<String>,
    },
}

/// Handle CLI commands
///
/// Returns the run overrides when the viewer should start, or `None` when a
/// subcommand was handled and the process should exit.
pub async fn handle_cli() -> Result<Option<RunArgs>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            path,
        }) => {
            if path {
                handle_config_path()?;
            } else if show {
                handle_config_show()?;
            } else if reset {
                handle_config_reset()?;
            } else if edit {
                handle_config_edit()?;
            } else {
                // No flag provided, show help
                println!("Usage: maurina config [--show|--reset|--edit|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --edit    Open config file in $EDITOR");
                println!("  --path    Show config file path");
            }
            Ok(None)
        }
        Some(Commands::Send {
            channel,
            time,
            address,
            port,
            message,
        }) => {
            handle_send(channel, time, address, port, message).await?;
            Ok(None)
        }
        None => Ok(Some(cli.run)),
    }
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::load()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    Config::default().save()?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

fn handle_config_edit() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| {
            format!(
                "Failed to launch editor '{}' (set $EDITOR to your preferred editor)",
                editor
            )
        })?;

    if !status.success() {
        bail!("Editor exited with status: {}", status);
    }
    Ok(())
}

async fn handle_send(
    channel: usize,
    time: bool,
    address: Option<String>,
    port: Option<u16>,
    message: Vec<String>,
) -> Result<()> {
    let config = Config::load()?;

    let Some(index) = channel.checked_sub(1) else {
        bail!("Channels are numbered from 1");
    };

    let message = if message.is_empty() {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read message from stdin")?;
        input.trim_end_matches(['\r', '\n']).to_string()
    } else {
        message.join(" ")
    };

    let address = address.unwrap_or(config.server_address);
    let port = port.unwrap_or(config.server_port);

    let mut connector = Connector::new(&address, port, config.channels.captions)
        .await
        .with_context(|| format!("Failed to open connector to {}:{}", address, port))?
        .with_time(time);

    connector
        .log(index, &message)
        .await
        .with_context(|| format!("Failed to send to {}:{}", address, port))?;
    tracing::debug!(
        "Sent {} datagram(s) to {}",
        connector.sent(),
        connector.target()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::parse_from(["maurina", "--port", "9000", "--no-tui"]);
        assert!(cli.command.is_none());

        let mut config = Config::default();
        cli.run.apply(&mut config);
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.server_address, "127.0.0.1");
        assert!(!config.enable_tui);
        assert!(!config.demo_mode);
    }

    #[test]
    fn test_send_args() {
        let cli = Cli::parse_from(["maurina", "send", "-c", "2", "--time", "hello", "world"]);
        match cli.command {
            Some(Commands::Send {
                channel,
                time,
                message,
                ..
            }) => {
                assert_eq!(channel, 2);
                assert!(time);
                assert_eq!(message, ["hello", "world"]);
            }
            _ => panic!("expected send subcommand"),
        }
    }
}
