// SPDX-License-Identifier: GPL-3.0-only

//! Background thread lifecycle
//!
//! Starts the periodic evaluators and the button watchers. Threads are never
//! joined: they run until the process exits.

use super::commands::ButtonRole;
use super::context::DeviceContext;
use crate::config::{ButtonSpec, Wiring};
use crate::hardware::ButtonWatcher;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Action returned by a periodic tick to control the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Sleep and tick again
    Continue,
    /// Leave the loop for good
    Stop,
}

/// A named loop sleeping a fixed interval between ticks
pub struct PeriodicLoop {
    name: String,
    thread_handle: JoinHandle<()>,
}

impl PeriodicLoop {
    /// Start `tick_fn` on its own thread, first tick after one `interval`
    ///
    /// A panic inside a tick is caught and logged; the loop carries on with
    /// the next tick.
    pub fn start<F>(name: &str, interval: Duration, mut tick_fn: F) -> std::io::Result<Self>
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let name_clone = name.to_string();

        info!(name = %name, ?interval, "Starting periodic loop");

        let thread_handle = thread::Builder::new().name(name.to_string()).spawn(move || {
            debug!(name = %name_clone, "Loop thread started");

            loop {
                thread::sleep(interval);

                match catch_unwind(AssertUnwindSafe(&mut tick_fn)) {
                    Ok(LoopAction::Continue) => {}
                    Ok(LoopAction::Stop) => {
                        debug!(name = %name_clone, "Loop requested stop");
                        break;
                    }
                    Err(_) => error!(name = %name_clone, "Loop tick panicked, continuing"),
                }
            }

            info!(name = %name_clone, "Loop thread exiting");
        })?;

        Ok(Self {
            name: name.to_string(),
            thread_handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        !self.thread_handle.is_finished()
    }
}

/// Owner of every background thread
pub struct Supervisor {
    loops: Vec<PeriodicLoop>,
    buttons: Vec<ButtonWatcher>,
}

impl Supervisor {
    /// Start the power monitor, the liveness monitor and the button watchers
    ///
    /// A button whose pin cannot be opened is logged and left unwatched.
    pub fn start(context: &Arc<DeviceContext>, wiring: &Wiring) -> std::io::Result<Self> {
        let mut loops = Vec::with_capacity(2);

        let machine = Arc::clone(&context.power_machine);
        let interval = machine.policy().check_interval;
        loops.push(PeriodicLoop::start("power-monitor", interval, move || {
            machine.tick();
            if machine.is_halted() {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        })?);

        let monitor = context.liveness_monitor.clone();
        loops.push(PeriodicLoop::start(
            "liveness-monitor",
            context.liveness_interval,
            move || {
                monitor.tick();
                LoopAction::Continue
            },
        )?);

        let buttons = [
            (ButtonRole::UvA, wiring.uv_a_button.as_ref(), None),
            (ButtonRole::UvB, wiring.uv_b_button.as_ref(), None),
            (
                ButtonRole::Capture,
                wiring.capture_button.as_ref(),
                Some(wiring.capture_hold()),
            ),
        ]
        .into_iter()
        .filter_map(|(role, spec, hold)| watch_button(context, role, spec?, hold))
        .collect();

        Ok(Self { loops, buttons })
    }

    pub fn loops(&self) -> &[PeriodicLoop] {
        &self.loops
    }

    pub fn buttons(&self) -> &[ButtonWatcher] {
        &self.buttons
    }
}

fn watch_button(
    context: &Arc<DeviceContext>,
    role: ButtonRole,
    spec: &ButtonSpec,
    hold: Option<Duration>,
) -> Option<ButtonWatcher> {
    match ButtonWatcher::start(
        role.name(),
        spec.pin,
        spec.active_low,
        hold,
        context.button_handler(role),
    ) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(button = role.name(), pin = spec.pin, error = %e, "Button not watched");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loop_survives_panicking_tick_and_stops() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let periodic = PeriodicLoop::start("test-loop", Duration::from_millis(1), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                panic!("first tick fails");
            }
            if n >= 3 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        })
        .unwrap();

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while periodic.is_running() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        assert!(!periodic.is_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 4);
        assert_eq!(periodic.name(), "test-loop");
    }
}
