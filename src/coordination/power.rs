// SPDX-License-Identifier: GPL-3.0-only

//! Idle and inactivity-shutdown state machine
//!
//! ```text
//!            idle > T_idle                 idle > T_shutdown && !connected
//!   Active ─────────────────▶ Idle ───────────────────────────────▶ ShutdownTriggered
//!     ▲                        │                                    (terminal, fires once)
//!     └────── activity ────────┘
//! ```
//!
//! Both transitions are evaluated on every tick, idle first. A long silence
//! can therefore force the LEDs off and trigger the shutdown in one tick.
//!
//! An idle episode ends with the first activity after it began, whether or
//! not a tick observed the unit as active in between.

use super::activity::ActivityClock;
use super::liveness::ClientLiveness;
use crate::config::PowerSettings;
use crate::hardware::led::{set_logged, toggle_logged};
use crate::hardware::{Led, PowerControl};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Power progression reported by `/device_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    Active,
    Idle,
    ShutdownTriggered,
}

/// Thresholds and warning pattern
#[derive(Debug, Clone)]
pub struct PowerPolicy {
    pub idle_threshold: Duration,
    pub shutdown_threshold: Duration,
    pub check_interval: Duration,
    pub warning_toggles: u32,
    pub warning_period: Duration,
}

impl From<&PowerSettings> for PowerPolicy {
    fn from(settings: &PowerSettings) -> Self {
        Self {
            idle_threshold: settings.idle_threshold(),
            shutdown_threshold: settings.shutdown_threshold(),
            check_interval: settings.check_interval(),
            warning_toggles: settings.warning_toggles,
            warning_period: settings.warning_period(),
        }
    }
}

#[derive(Debug, Default)]
struct PowerFlags {
    idle_mode: bool,
    /// Last activity seen when the current idle episode began
    idle_entry: Option<Instant>,
    shutdown_fired: bool,
    /// Power-off command reported success; nothing left to evaluate
    halted: bool,
}

/// Periodic evaluator for idle mode and inactivity shutdown
pub struct PowerStateMachine {
    activity: Arc<ActivityClock>,
    liveness: Arc<ClientLiveness>,
    status_leds: [Arc<dyn Led>; 2],
    power: Arc<dyn PowerControl>,
    policy: PowerPolicy,
    flags: Mutex<PowerFlags>,
}

impl PowerStateMachine {
    pub fn new(
        activity: Arc<ActivityClock>,
        liveness: Arc<ClientLiveness>,
        status_leds: [Arc<dyn Led>; 2],
        power: Arc<dyn PowerControl>,
        policy: PowerPolicy,
    ) -> Self {
        Self {
            activity,
            liveness,
            status_leds,
            power,
            policy,
            flags: Mutex::new(PowerFlags::default()),
        }
    }

    pub fn policy(&self) -> &PowerPolicy {
        &self.policy
    }

    /// Current state without evaluating anything
    pub fn state(&self) -> PowerState {
        let flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
        if flags.shutdown_fired {
            PowerState::ShutdownTriggered
        } else if flags.idle_mode {
            PowerState::Idle
        } else {
            PowerState::Active
        }
    }

    pub fn idle_mode_active(&self) -> bool {
        self.flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .idle_mode
    }

    /// Whether the evaluator has nothing left to do
    pub fn is_halted(&self) -> bool {
        self.flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .halted
    }

    /// One evaluation
    ///
    /// Runs the shutdown warning and the power-off command inline when the
    /// shutdown condition is met, so a firing tick takes as long as the
    /// warning pattern.
    pub fn tick(&self) -> PowerState {
        let last_active = self.activity.last_active();
        let idle = self.activity.idle_duration();

        let fire_shutdown = {
            let mut flags = self.flags.lock().unwrap_or_else(PoisonError::into_inner);
            if flags.halted {
                return PowerState::ShutdownTriggered;
            }

            // Any touch ends the episode, even one no tick saw as non-idle
            if flags.idle_mode
                && (idle <= self.policy.idle_threshold || flags.idle_entry != Some(last_active))
            {
                debug!("Activity detected, leaving idle mode");
                flags.idle_mode = false;
                flags.idle_entry = None;
            }

            if idle > self.policy.idle_threshold && !flags.idle_mode {
                info!(idle_secs = idle.as_secs(), "Entering idle mode, turning status LEDs off");
                for led in &self.status_leds {
                    if led.is_active() {
                        set_logged(led.as_ref(), false);
                    }
                }
                flags.idle_mode = true;
                flags.idle_entry = Some(last_active);
            }

            let due = !flags.shutdown_fired
                && idle > self.policy.shutdown_threshold
                && !self.liveness.is_connected();
            if due {
                flags.shutdown_fired = true;
            }
            due
        };

        if fire_shutdown {
            warn!(idle_secs = idle.as_secs(), "Inactivity shutdown triggered");
            self.warn_and_power_off();
        }

        self.state()
    }

    fn warn_and_power_off(&self) {
        for _ in 0..self.policy.warning_toggles {
            for led in &self.status_leds {
                toggle_logged(led.as_ref());
            }
            thread::sleep(self.policy.warning_period);
        }

        match self.power.power_off() {
            Ok(()) => {
                self.flags
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .halted = true;
            }
            // Not retried: the flag stays set and idle handling carries on
            Err(e) => error!(error = %e, "Inactivity power-off failed"),
        }
    }
}
