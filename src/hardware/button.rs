// SPDX-License-Identifier: GPL-3.0-only

//! Push buttons on sysfs GPIO inputs
//!
//! Each watched button gets its own polling thread. Raw levels go through a
//! [`ButtonTracker`], which debounces them and turns them into press, release
//! and hold events. Handlers run synchronously on the button's thread, so a
//! long handler (a held-button capture) delays only that button.

use super::gpio::{Direction, GpioPin};
use crate::constants;
use crate::errors::GpioError;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Event emitted by a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
    /// Button stayed down for the hold time (once per press)
    Held,
}

/// Debounce and hold detection over sampled levels
#[derive(Debug, Clone)]
pub struct ButtonTracker {
    debounce: Duration,
    hold_time: Option<Duration>,
    /// Accepted (debounced) state
    pressed: bool,
    pressed_since: Option<Instant>,
    hold_fired: bool,
    /// Raw level waiting to become stable
    candidate: Option<(bool, Instant)>,
}

impl ButtonTracker {
    pub fn new(debounce: Duration, hold_time: Option<Duration>) -> Self {
        Self {
            debounce,
            hold_time,
            pressed: false,
            pressed_since: None,
            hold_fired: false,
            candidate: None,
        }
    }

    /// Feed one sample; `pressed` is the logical (polarity-corrected) level
    pub fn sample(&mut self, pressed: bool, now: Instant) -> Option<ButtonEvent> {
        if pressed != self.pressed {
            let since = match self.candidate {
                Some((level, since)) if level == pressed => since,
                _ => {
                    self.candidate = Some((pressed, now));
                    now
                }
            };

            if now.duration_since(since) < self.debounce {
                return None;
            }

            self.candidate = None;
            self.pressed = pressed;
            return if pressed {
                self.pressed_since = Some(now);
                self.hold_fired = false;
                Some(ButtonEvent::Pressed)
            } else {
                self.pressed_since = None;
                Some(ButtonEvent::Released)
            };
        }

        self.candidate = None;

        if let (true, Some(hold), Some(since)) = (self.pressed, self.hold_time, self.pressed_since) {
            if !self.hold_fired && now.duration_since(since) >= hold {
                self.hold_fired = true;
                return Some(ButtonEvent::Held);
            }
        }

        None
    }
}

/// Callback invoked on the button thread
pub type ButtonHandler = Arc<dyn Fn(ButtonEvent) + Send + Sync>;

/// A button whose pin is being polled
///
/// The watcher thread is never joined; it runs until process exit.
pub struct ButtonWatcher {
    name: String,
    _thread: JoinHandle<()>,
}

impl ButtonWatcher {
    /// Export `pin` as an input and start polling it
    pub fn start(
        name: &str,
        pin: u32,
        active_low: bool,
        hold_time: Option<Duration>,
        handler: ButtonHandler,
    ) -> Result<Self, GpioError> {
        let gpio = GpioPin::export(pin, Direction::In)?;
        let name_clone = name.to_string();

        info!(name, pin, active_low, ?hold_time, "Watching button");

        let thread = thread::Builder::new()
            .name(format!("button-{}", name))
            .spawn(move || poll_loop(&name_clone, gpio, active_low, hold_time, handler))
            .map_err(|source| GpioError::Setup { pin, source })?;

        Ok(Self {
            name: name.to_string(),
            _thread: thread,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn poll_loop(
    name: &str,
    gpio: GpioPin,
    active_low: bool,
    hold_time: Option<Duration>,
    handler: ButtonHandler,
) {
    let mut tracker = ButtonTracker::new(constants::BUTTON_DEBOUNCE, hold_time);
    let mut read_failing = false;

    loop {
        match gpio.read() {
            Ok(level) => {
                if read_failing {
                    info!(name, "Button readable again");
                    read_failing = false;
                }
                let pressed = level != active_low;
                if let Some(event) = tracker.sample(pressed, Instant::now()) {
                    debug!(name, ?event, "Button event");
                    handler(event);
                }
            }
            Err(e) => {
                if !read_failing {
                    warn!(name, error = %e, "Failed to read button");
                    read_failing = true;
                }
            }
        }

        thread::sleep(constants::BUTTON_POLL_INTERVAL);
    }
}
