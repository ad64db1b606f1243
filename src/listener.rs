//! UDP listener
//!
//! Owns the bound datagram socket. Each datagram is decoded and handed to the
//! dispatcher before the next one is read, and the same task services the
//! idle-reset deadline, so payloads and deadline firings never interleave.
//!
//! [`Server`] wraps the listener task so it can be torn down and rebound when
//! the address or port changes.

use crate::engine::dispatcher::{self, DispatchOutcome, SharedDispatcher};
use crate::engine::Payload;
use std::fmt;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Largest possible UDP payload
const MAX_DATAGRAM: usize = 65_535;

// ─────────────────────────────────────────────────────────────────────────────
// Errors and status
// ─────────────────────────────────────────────────────────────────────────────

/// The socket could not be bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    /// `address:port` as requested
    pub address: String,
    pub reason: String,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot bind to {}: {}", self.address, self.reason)
    }
}

impl std::error::Error for BindError {}

/// Listener state shown in the status bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListenerStatus {
    #[default]
    Stopped,
    Listening(SocketAddr),
    Failed(BindError),
}

impl ListenerStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Stopped => "Not listening".to_string(),
            Self::Listening(addr) => format!("Listening at {}", addr),
            Self::Failed(e) => format!("Bind failed: {}", e.reason),
        }
    }

    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listener
// ─────────────────────────────────────────────────────────────────────────────

/// A bound socket, not yet receiving
#[derive(Debug)]
pub struct Listener {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to `address:port`; `address` may be an IP literal or a hostname
    pub async fn bind(address: &str, port: u16) -> Result<Self, BindError> {
        let bind_error = |reason: String| BindError {
            address: format!("{}:{}", address, port),
            reason,
        };

        let socket = UdpSocket::bind((address, port))
            .await
            .map_err(|e| bind_error(e.to_string()))?;
        let local_addr = socket.local_addr().map_err(|e| bind_error(e.to_string()))?;

        Ok(Self { socket, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receive and dispatch until `shutdown` fires (or its sender is dropped)
    ///
    /// Every dispatch outcome is offered to `events` without waiting; a full
    /// or closed channel never stalls the socket.
    pub async fn run(
        self,
        dispatcher: SharedDispatcher,
        events: Option<mpsc::Sender<DispatchOutcome>>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let deadline = dispatcher::lock(&dispatcher).next_deadline();

            tokio::select! {
                _ = &mut shutdown => break,

                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        let Some(outcome) = handle_datagram(&dispatcher, &buf[..len], peer) else {
                            continue;
                        };
                        if let Some(tx) = &events {
                            let _ = tx.try_send(outcome);
                        }
                    }
                    // ICMP port-unreachable and friends surface here on some
                    // platforms; the socket itself stays usable
                    Err(e) => tracing::debug!("UDP receive error: {}", e),
                },

                _ = sleep_until(deadline) => {
                    dispatcher::lock(&dispatcher).on_deadline(Instant::now());
                }
            }
        }

        tracing::debug!("Listener on {} stopped", self.local_addr);
    }
}

/// Decode and dispatch one datagram. Malformed input is dropped.
fn handle_datagram(
    dispatcher: &SharedDispatcher,
    bytes: &[u8],
    peer: SocketAddr,
) -> Option<DispatchOutcome> {
    let payload = match Payload::decode(bytes) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!("Dropping {} byte datagram from {}: {}", bytes.len(), peer, e);
            return None;
        }
    };

    let outcome = dispatcher::lock(dispatcher).on_payload(&payload, Instant::now());
    tracing::trace!(
        "Datagram from {}: reset={} captions={} appended={:?}",
        peer,
        outcome.reset,
        outcome.captions,
        outcome.appended_channels()
    );
    Some(outcome)
}

/// Sleep until the deadline, or forever when there is none
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server (restartable listener task)
// ─────────────────────────────────────────────────────────────────────────────

struct Running {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns the running listener task and its bind status
pub struct Server {
    dispatcher: SharedDispatcher,
    events: Option<mpsc::Sender<DispatchOutcome>>,
    running: Option<Running>,
    status: ListenerStatus,
}

impl Server {
    pub fn new(
        dispatcher: SharedDispatcher,
        events: Option<mpsc::Sender<DispatchOutcome>>,
    ) -> Self {
        Self {
            dispatcher,
            events,
            running: None,
            status: ListenerStatus::Stopped,
        }
    }

    pub fn status(&self) -> &ListenerStatus {
        &self.status
    }

    /// Tear down any running listener and bind anew
    ///
    /// A successful bind clears every channel. A failed bind leaves channel
    /// state alone and the server not listening.
    pub async fn start(&mut self, address: &str, port: u16) -> Result<SocketAddr, BindError> {
        self.stop().await;

        let listener = match Listener::bind(address, port).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::warn!("{}", e);
                self.status = ListenerStatus::Failed(e.clone());
                return Err(e);
            }
        };

        let local_addr = listener.local_addr();
        dispatcher::lock(&self.dispatcher).clear_now();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(listener.run(
            self.dispatcher.clone(),
            self.events.clone(),
            shutdown_rx,
        ));

        self.running = Some(Running {
            shutdown: shutdown_tx,
            task,
        });
        self.status = ListenerStatus::Listening(local_addr);
        tracing::info!("Listening at {}", local_addr);

        Ok(local_addr)
    }

    /// Stop the listener task and wait for the socket to close
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(());
            let _ = running.task.await;
        }
        self.status = ListenerStatus::Stopped;
    }
}
