// SPDX-License-Identifier: GPL-3.0-only

//! LED control
//!
//! Three kinds of LED sit behind the [`Led`] trait:
//! - [`GpioLed`]: a plain GPIO output pin (UV status LEDs, indicator)
//! - [`SysfsLed`]: an LED class device at `/sys/class/leds/<name>`
//! - [`VirtualLed`]: in-memory state, used when hardware is missing
//!
//! Every implementation keeps its logical state under a mutex so `toggle`
//! is atomic with respect to concurrent HTTP handlers and button threads.

use super::gpio::{Direction, GpioPin};
use crate::errors::GpioError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{info, warn};

const LEDS_ROOT: &str = "/sys/class/leds";

/// A single on/off light
pub trait Led: Send + Sync {
    /// Switch the LED on or off
    fn set(&self, on: bool) -> io::Result<()>;

    /// Invert the LED and return the new state
    fn toggle(&self) -> io::Result<bool>;

    /// Whether the LED is currently lit
    fn is_active(&self) -> bool;

    /// Name used in logs
    fn name(&self) -> &str;

    fn on(&self) -> io::Result<()> {
        self.set(true)
    }

    fn off(&self) -> io::Result<()> {
        self.set(false)
    }
}

/// Set an LED, logging instead of propagating failures
///
/// Feedback LEDs are best-effort: a stuck GPIO must not abort a capture or a
/// power transition.
pub fn set_logged(led: &dyn Led, on: bool) {
    if let Err(e) = led.set(on) {
        warn!(led = led.name(), on, error = %e, "Failed to set LED");
    }
}

/// Toggle an LED, logging instead of propagating failures
pub fn toggle_logged(led: &dyn Led) {
    if let Err(e) = led.toggle() {
        warn!(led = led.name(), error = %e, "Failed to toggle LED");
    }
}

/// LED on a sysfs GPIO output
#[derive(Debug)]
pub struct GpioLed {
    pin: GpioPin,
    active_high: bool,
    name: String,
    state: Mutex<bool>,
}

impl GpioLed {
    /// Export the pin as an output and switch the LED off
    pub fn open(pin_number: u32, active_high: bool) -> Result<Self, GpioError> {
        let pin = GpioPin::export(pin_number, Direction::Out)?;
        Self::from_pin(pin, active_high)
    }

    /// Wrap an already exported pin
    pub fn from_pin(pin: GpioPin, active_high: bool) -> Result<Self, GpioError> {
        let led = Self {
            name: format!("gpio{}", pin.number()),
            pin,
            active_high,
            state: Mutex::new(false),
        };
        led.write_level(false).map_err(|source| GpioError::Setup {
            pin: led.pin.number(),
            source,
        })?;
        Ok(led)
    }

    fn write_level(&self, on: bool) -> io::Result<()> {
        self.pin.write(on == self.active_high)
    }
}

impl Led for GpioLed {
    fn set(&self, on: bool) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_level(on)?;
        *state = on;
        Ok(())
    }

    fn toggle(&self) -> io::Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = !*state;
        self.write_level(next)?;
        *state = next;
        Ok(next)
    }

    fn is_active(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// LED class device, e.g. `/sys/class/leds/green:status`
#[derive(Debug)]
pub struct SysfsLed {
    /// Sysfs path, e.g. `/sys/class/leds/green:status`
    path: PathBuf,
    /// Value written for "on" (from `max_brightness`)
    max_brightness: u32,
    /// Directory basename
    name: String,
    state: Mutex<bool>,
}

impl SysfsLed {
    /// Open `/sys/class/leds/<name>`
    pub fn open(name: &str) -> Result<Self, GpioError> {
        Self::open_at(&Path::new(LEDS_ROOT).join(name))
    }

    /// Open an LED class directory at an explicit path
    pub fn open_at(led_path: &Path) -> Result<Self, GpioError> {
        let name = led_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| led_path.display().to_string());
        let unavailable = |reason: String| GpioError::LedUnavailable {
            name: name.clone(),
            reason,
        };

        let max_brightness_path = led_path.join("max_brightness");
        let max_brightness = std::fs::read_to_string(&max_brightness_path)
            .map_err(|e| unavailable(format!("cannot read max_brightness: {}", e)))?
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| unavailable("invalid max_brightness value".to_string()))?;

        // Verify we can write to brightness
        std::fs::OpenOptions::new()
            .write(true)
            .open(led_path.join("brightness"))
            .map_err(|e| unavailable(format!("brightness not writable: {}", e)))?;

        info!(name = %name, max_brightness, "Opened LED class device");

        let led = Self {
            path: led_path.to_path_buf(),
            max_brightness,
            name: name.clone(),
            state: Mutex::new(false),
        };
        led.write_brightness(false)
            .map_err(|e| unavailable(format!("initial write failed: {}", e)))?;
        Ok(led)
    }

    fn write_brightness(&self, on: bool) -> io::Result<()> {
        let value = if on { self.max_brightness } else { 0 };
        std::fs::write(self.path.join("brightness"), value.to_string())
    }
}

impl Led for SysfsLed {
    fn set(&self, on: bool) -> io::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.write_brightness(on)?;
        *state = on;
        Ok(())
    }

    fn toggle(&self) -> io::Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = !*state;
        self.write_brightness(next)?;
        *state = next;
        Ok(next)
    }

    fn is_active(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Names of all LED class devices on this system
pub fn discover_led_classes() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(LEDS_ROOT) else {
        warn!(root = LEDS_ROOT, "Cannot read LED class directory, discovery skipped");
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

/// LED without hardware
#[derive(Debug)]
pub struct VirtualLed {
    name: String,
    state: Mutex<bool>,
}

impl VirtualLed {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(false),
        }
    }
}

impl Led for VirtualLed {
    fn set(&self, on: bool) -> io::Result<()> {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = on;
        Ok(())
    }

    fn toggle(&self) -> io::Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = !*state;
        Ok(*state)
    }

    fn is_active(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
