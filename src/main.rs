// Maurina - multi-channel UDP log viewer
//
// Producers (web apps, scripts, `maurina send`) fire JSON datagrams at a UDP
// port; each datagram may rename channels and append HTML-ish fragments to
// them. The viewer shows every channel as a tab and empties them all once a
// new burst starts after an idle period, so each request reads on its own.
//
// Architecture:
// - Listener (tokio UdpSocket): receives datagrams, runs the idle deadline
// - Engine: payload decoding, style expansion, channel registry, idle reset
// - TUI (ratatui): tabs, styled channel bodies, status and system logs
// - Headless mode: dispatch outcomes printed through tracing

mod cli;
mod config;
mod connector;
mod demo;
mod engine;
mod listener;
mod logging;
mod markup;
mod startup;
mod tui;

use anyhow::Result;
use config::Config;
use engine::dispatcher::{self, DispatchOutcome, SharedDispatcher};
use engine::Dispatcher;
use listener::Server;
use logging::LogBuffer;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

#[tokio::main]
async fn main() -> Result<()> {
    // Subcommands (config, send) run and exit here
    let Some(run_args) = cli::handle_cli().await? else {
        return Ok(());
    };

    Config::ensure_config_exists();

    let mut config = Config::load()?;
    run_args.apply(&mut config);

    // TUI mode captures logs into a buffer so they don't garble the screen
    let log_buffer = LogBuffer::new();
    let _log_guard = logging::init(
        &config.logging,
        config.enable_tui.then(|| log_buffer.clone()),
    );

    let dispatcher = Dispatcher::new(
        config.channels.captions.clone(),
        Arc::new(config.style_table()),
        config.timeout.enabled,
        config.timeout.seconds,
    )
    .into_shared();

    // Only headless mode consumes dispatch outcomes; the TUI reads the
    // dispatcher directly every frame
    let (events_tx, events_rx) = if config.enable_tui {
        (None, None)
    } else {
        let (tx, rx) = mpsc::channel(1000);
        (Some(tx), Some(rx))
    };

    let mut server = Server::new(dispatcher.clone(), events_tx);
    let bound = server
        .start(&config.server_address, config.server_port)
        .await
        .ok();

    if !config.enable_tui {
        startup::print_startup(&config, server.status());
    }
    startup::log_startup(&config, server.status());

    let (demo_shutdown_tx, demo_shutdown_rx) = oneshot::channel();
    let demo_handle = match (config.demo_mode, bound) {
        (true, Some(addr)) => Some(tokio::spawn(demo::run_demo(
            demo_target(addr),
            demo_shutdown_rx,
        ))),
        (true, None) => {
            tracing::warn!("Demo mode needs a listening socket; not starting it");
            None
        }
        _ => None,
    };

    if config.enable_tui {
        let mut app = tui::app::App::new(
            dispatcher.clone(),
            server,
            config,
            run_args,
            log_buffer,
        );
        if let Err(e) = tui::run_tui(&mut app).await {
            eprintln!("TUI error: {:#}", e);
        }
        server = app.server;
    } else if let Some(events_rx) = events_rx {
        tokio::select! {
            _ = print_outcomes(dispatcher.clone(), events_rx) => {}
            signal = tokio::signal::ctrl_c() => signal?,
        }
    }

    tracing::info!("Shutting down");
    let _ = demo_shutdown_tx.send(());
    if let Some(handle) = demo_handle {
        let _ = handle.await;
    }
    server.stop().await;

    Ok(())
}

/// Where the demo producer sends: unspecified bind addresses mean loopback
fn demo_target(bound: SocketAddr) -> SocketAddr {
    let ip = match bound.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    SocketAddr::new(ip, bound.port())
}

/// Headless output: one log line per appended fragment, plus resets
async fn print_outcomes(dispatcher: SharedDispatcher, mut events_rx: mpsc::Receiver<DispatchOutcome>) {
    while let Some(outcome) = events_rx.recv().await {
        if outcome.reset {
            tracing::info!("── channels reset after idle ──");
        }
        for line in outcome_lines(&dispatcher, &outcome) {
            tracing::info!("{}", line);
        }
    }
}

/// `[caption] text` for every fragment the outcome carries
///
/// The text comes from the outcome itself; the registry may already hold
/// later fragments or have been reset by the time the printer runs.
fn outcome_lines(dispatcher: &SharedDispatcher, outcome: &DispatchOutcome) -> Vec<String> {
    let guard = dispatcher::lock(dispatcher);
    outcome
        .appended
        .iter()
        .map(|(index, fragment)| {
            let caption = guard
                .channels()
                .get(*index)
                .map(|channel| tui::app::strip_mnemonic(channel.caption()))
                .unwrap_or_else(|| format!("Log {}", index + 1));
            format!("[{}] {}", caption, markup::to_plain(fragment))
        })
        .collect()
}
