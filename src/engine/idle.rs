//! Idle-reset controller
//!
//! A restartable deadline plus a pending-reset flag. Every processed payload
//! restarts the deadline; when it elapses with no further traffic the flag is
//! raised. Nothing is cleared at that moment: the dispatcher consumes the
//! flag when the *next* payload arrives, so the previous conversation stays
//! on screen until new data replaces it.
//!
//! The controller never sleeps itself. It stores at most one absolute
//! deadline; the listener loop sleeps until [`IdleReset::deadline`] and then
//! calls [`IdleReset::poll`]. Restarting overwrites the stored deadline, so
//! two deadlines can never be pending at once.

use std::time::Duration;
use tokio::time::Instant;

/// Observable controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleState {
    /// No deadline scheduled
    Idle,
    /// Deadline pending
    Armed { deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct IdleReset {
    enabled: bool,
    timeout: Duration,
    deadline: Option<Instant>,
    pending_reset: bool,
}

impl IdleReset {
    pub fn new(enabled: bool, timeout_secs: u64) -> Self {
        Self {
            enabled,
            timeout: Duration::from_secs(timeout_secs),
            deadline: None,
            pending_reset: false,
        }
    }

    pub fn state(&self) -> IdleState {
        match self.deadline {
            Some(deadline) => IdleState::Armed { deadline },
            None => IdleState::Idle,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    pub fn is_pending(&self) -> bool {
        self.pending_reset
    }

    /// (Re)schedule the deadline at `now + timeout`; no-op while disabled
    pub fn restart(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.deadline = Some(now + self.timeout);
    }

    /// Fire the deadline if it has elapsed. Returns true when it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.enabled && now >= deadline => {
                self.deadline = None;
                self.pending_reset = true;
                true
            }
            _ => false,
        }
    }

    /// Consume the pending-reset flag
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending_reset)
    }

    /// Drop any scheduled deadline and any unconsumed reset
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending_reset = false;
    }

    /// Turn the mechanism off: cancels the deadline and any unconsumed reset
    pub fn disable(&mut self) {
        self.enabled = false;
        self.cancel();
    }

    /// Turn the mechanism on; the next `restart` arms it
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }

    /// Change the timeout; applies from the next `restart`
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout = Duration::from_secs(secs);
    }
}
