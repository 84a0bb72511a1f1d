// SPDX-License-Identifier: GPL-3.0-only

//! Commands issued by HTTP handlers and physical buttons

use super::context::DeviceContext;
use super::power::PowerState;
use crate::hardware::led::toggle_logged;
use crate::hardware::{ButtonEvent, ButtonHandler, Led};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// The two user-switchable UV status LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLed {
    /// `led1`, UV-A
    Led1,
    /// `led2`, UV-B
    Led2,
}

/// Physical buttons and what they drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonRole {
    UvA,
    UvB,
    Capture,
}

impl ButtonRole {
    pub fn name(self) -> &'static str {
        match self {
            ButtonRole::UvA => "uv_a",
            ButtonRole::UvB => "uv_b",
            ButtonRole::Capture => "capture",
        }
    }
}

/// Both UV LED states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UvStatus {
    #[serde(rename = "UV_A")]
    pub uv_a: bool,
    #[serde(rename = "UV_B")]
    pub uv_b: bool,
}

/// Read-only view for `/device_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub online: bool,
    pub version: String,
    pub idle_mode: bool,
    pub client_connected: bool,
    pub power_state: PowerState,
}

impl DeviceContext {
    fn status_led(&self, which: StatusLed) -> &dyn Led {
        match which {
            StatusLed::Led1 => self.uv_a.as_ref(),
            StatusLed::Led2 => self.uv_b.as_ref(),
        }
    }

    /// A remote client checked in
    pub fn ping(&self) {
        self.liveness.mark_alive();
        self.activity.touch();
        self.blink.trigger();
    }

    /// Start a capture in the background
    ///
    /// Returns whether the capture thread was started, never its outcome.
    pub fn trigger_capture(&self) -> bool {
        self.capture.spawn_capture()
    }

    /// Flip one status LED and report its new state
    pub fn toggle_led(&self, which: StatusLed) -> io::Result<bool> {
        self.activity.touch();
        let led = self.status_led(which);
        let active = led.toggle()?;
        debug!(led = led.name(), active, "LED toggled");
        Ok(active)
    }

    pub fn led_status(&self, which: StatusLed) -> bool {
        self.status_led(which).is_active()
    }

    pub fn uv_status(&self) -> UvStatus {
        UvStatus {
            uv_a: self.uv_a.is_active(),
            uv_b: self.uv_b.is_active(),
        }
    }

    pub fn device_status(&self) -> DeviceStatus {
        let liveness = self.liveness.snapshot();
        DeviceStatus {
            online: true,
            version: self.version.clone(),
            idle_mode: self.power_machine.idle_mode_active(),
            client_connected: liveness.connected,
            power_state: self.power_machine.state(),
        }
    }

    /// Power off after the configured delay, leaving time to answer the request
    ///
    /// Independent of the inactivity state machine.
    pub fn request_poweroff(&self) -> io::Result<()> {
        let power = Arc::clone(&self.power);
        let delay = self.poweroff_delay;
        warn!(?delay, "Power-off requested");

        thread::Builder::new()
            .name("poweroff".into())
            .spawn(move || {
                thread::sleep(delay);
                if let Err(e) = power.power_off() {
                    error!(error = %e, "Requested power-off failed");
                }
            })?;
        Ok(())
    }

    /// Callback for a watched button
    ///
    /// UV buttons toggle their LED on press. The capture button keeps the unit
    /// awake on press and runs a capture on the button thread when held.
    pub fn button_handler(self: &Arc<Self>, role: ButtonRole) -> ButtonHandler {
        let context = Arc::clone(self);
        Arc::new(move |event| match (role, event) {
            (_, ButtonEvent::Released) => {}
            (ButtonRole::UvA, ButtonEvent::Pressed) => {
                context.activity.touch();
                toggle_logged(context.uv_a.as_ref());
            }
            (ButtonRole::UvB, ButtonEvent::Pressed) => {
                context.activity.touch();
                toggle_logged(context.uv_b.as_ref());
            }
            (ButtonRole::Capture, ButtonEvent::Pressed) => context.activity.touch(),
            (ButtonRole::Capture, ButtonEvent::Held) => {
                info!("Capture button held");
                // Logged inside
                let _ = context.capture.capture_still();
            }
            (_, ButtonEvent::Held) => {}
        })
    }
}
