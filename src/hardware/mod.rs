// SPDX-License-Identifier: GPL-3.0-only

//! Hardware adapters
//!
//! Thin drivers for the physical parts of the unit, each behind a trait so the
//! coordination layer can run against in-memory doubles:
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              coordination layer                │
//! └──────┬──────────────┬──────────────┬──────────┘
//!        │              │              │
//! ┌──────┴──────┐ ┌─────┴─────┐ ┌──────┴───────┐
//! │CameraDriver │ │    Led    │ │ PowerControl │
//! │ (V4L2)      │ │ (GPIO,    │ │ (poweroff    │
//! │             │ │  sysfs)   │ │  command)    │
//! └─────────────┘ └───────────┘ └──────────────┘
//! ```
//!
//! Startup never fails on missing hardware: [`Hardware::probe`] logs the
//! problem and substitutes a degraded stand-in, so a unit with a dead camera
//! still answers pings and still powers itself off.

pub mod button;
pub mod camera;
pub mod gpio;
pub mod led;
pub mod power;
pub mod v4l2;
pub mod v4l2_controls;

pub use button::{ButtonEvent, ButtonHandler, ButtonTracker, ButtonWatcher};
pub use camera::{CameraDriver, CameraResult, Frame, PixelFormat, UnavailableCamera};
pub use led::{GpioLed, Led, SysfsLed, VirtualLed};
pub use power::{PowerControl, SystemPowerControl};

use crate::config::{Config, LedSpec};
use std::sync::Arc;
use tracing::{error, info};

/// Everything the controller drives
pub struct Hardware {
    pub camera: Box<dyn CameraDriver>,
    /// First UV status LED (`led1`)
    pub uv_a: Arc<dyn Led>,
    /// Second UV status LED (`led2`)
    pub uv_b: Arc<dyn Led>,
    /// Capture/feedback indicator
    pub indicator: Arc<dyn Led>,
    pub power: Arc<dyn PowerControl>,
}

impl Hardware {
    /// Open the configured hardware, degrading on failure
    pub fn probe(config: &Config) -> Self {
        let camera: Box<dyn CameraDriver> = match v4l2::V4l2Camera::open(&config.camera) {
            Ok(camera) => {
                info!(camera = %camera.describe(), "Camera ready");
                Box::new(camera)
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize camera, continuing without it");
                Box::new(UnavailableCamera::new(e.to_string()))
            }
        };

        Self {
            camera,
            uv_a: open_led(&config.wiring.uv_a_led, "uv_a"),
            uv_b: open_led(&config.wiring.uv_b_led, "uv_b"),
            indicator: open_led(&config.wiring.indicator_led, "indicator"),
            power: Arc::new(SystemPowerControl::new(config.power.poweroff_command.clone())),
        }
    }
}

/// Open one LED, falling back to a virtual LED
fn open_led(spec: &LedSpec, role: &str) -> Arc<dyn Led> {
    let opened: Result<Arc<dyn Led>, _> = match spec {
        LedSpec::Gpio { pin, active_high } => {
            GpioLed::open(*pin, *active_high).map(|led| Arc::new(led) as Arc<dyn Led>)
        }
        LedSpec::Sysfs { name } => SysfsLed::open(name).map(|led| Arc::new(led) as Arc<dyn Led>),
        LedSpec::Virtual => return Arc::new(VirtualLed::new(role)),
    };

    opened.unwrap_or_else(|e| {
        error!(role, error = %e, "Failed to initialize LED, using a virtual one");
        Arc::new(VirtualLed::new(role))
    })
}
