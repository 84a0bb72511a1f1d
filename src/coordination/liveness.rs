// SPDX-License-Identifier: GPL-3.0-only

//! Remote client liveness
//!
//! A client counts as connected while it keeps pinging. Promotion happens
//! synchronously in the ping handler; only [`ClientLivenessMonitor`] demotes.

use super::clock::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Default)]
struct LivenessState {
    last_ping: Option<Instant>,
    connected: bool,
}

/// Point-in-time view of [`ClientLiveness`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessSnapshot {
    pub connected: bool,
    /// Age of the last ping, `None` if no client ever pinged
    pub last_ping_age: Option<Duration>,
}

/// Whether a remote UI is actively polling
#[derive(Debug)]
pub struct ClientLiveness {
    clock: Arc<dyn Clock>,
    state: Mutex<LivenessState>,
}

impl ClientLiveness {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(LivenessState::default()),
        }
    }

    /// A ping arrived: the client is connected as of now
    pub fn mark_alive(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.last_ping = Some(now);
        if !state.connected {
            info!("Client connected");
        }
        state.connected = true;
    }

    /// Record client contact without promoting it to connected
    ///
    /// Used by the capture pipeline: a capture proves someone is around, but
    /// only a ping marks a UI as connected.
    pub fn refresh(&self) {
        let now = self.clock.now();
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last_ping = Some(now);
    }

    /// Demote the client if its last ping is older than `timeout`
    ///
    /// Returns `true` when this call changed the state to disconnected.
    pub fn expire_stale(&self, timeout: Duration) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(last_ping) = state.last_ping else {
            return false;
        };

        if now.saturating_duration_since(last_ping) > timeout && state.connected {
            state.connected = false;
            return true;
        }
        false
    }

    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .connected
    }

    pub fn snapshot(&self) -> LivenessSnapshot {
        let now = self.clock.now();
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        LivenessSnapshot {
            connected: state.connected,
            last_ping_age: state.last_ping.map(|t| now.saturating_duration_since(t)),
        }
    }
}

/// Periodic demotion of clients that stopped pinging
#[derive(Debug, Clone)]
pub struct ClientLivenessMonitor {
    liveness: Arc<ClientLiveness>,
    timeout: Duration,
}

impl ClientLivenessMonitor {
    pub fn new(liveness: Arc<ClientLiveness>, timeout: Duration) -> Self {
        Self { liveness, timeout }
    }

    /// One evaluation; returns `true` if the client was demoted
    pub fn tick(&self) -> bool {
        let demoted = self.liveness.expire_stale(self.timeout);
        if demoted {
            let last_ping_age = self.liveness.snapshot().last_ping_age;
            info!(timeout = ?self.timeout, ?last_ping_age, "Client timeout detected");
        }
        demoted
    }
}
