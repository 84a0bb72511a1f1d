// SPDX-License-Identifier: GPL-3.0-only

//! Linux sysfs GPIO pins
//!
//! Pins are exported through `/sys/class/gpio/export` on first use and then
//! driven through their `value` file.

use crate::errors::GpioError;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const GPIO_ROOT: &str = "/sys/class/gpio";

/// udev needs a moment to fix permissions on a freshly exported pin
const EXPORT_SETTLE: Duration = Duration::from_millis(100);

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// An exported sysfs GPIO pin
#[derive(Debug, Clone)]
pub struct GpioPin {
    number: u32,
    value_path: PathBuf,
}

impl GpioPin {
    /// Export `number` (if needed) and set its direction
    pub fn export(number: u32, direction: Direction) -> Result<Self, GpioError> {
        Self::export_under(Path::new(GPIO_ROOT), number, direction)
    }

    /// Export a pin below an alternative sysfs root
    pub fn export_under(root: &Path, number: u32, direction: Direction) -> Result<Self, GpioError> {
        let pin_dir = root.join(format!("gpio{}", number));
        let setup_err = |source: io::Error| GpioError::Setup {
            pin: number,
            source,
        };

        if !pin_dir.exists() {
            debug!(pin = number, "Exporting GPIO");
            std::fs::write(root.join("export"), number.to_string()).map_err(setup_err)?;
            std::thread::sleep(EXPORT_SETTLE);
        }

        std::fs::write(pin_dir.join("direction"), direction.as_str()).map_err(setup_err)?;

        info!(pin = number, direction = direction.as_str(), "GPIO ready");

        Ok(Self {
            number,
            value_path: pin_dir.join("value"),
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Read the raw level
    pub fn read(&self) -> io::Result<bool> {
        let raw = std::fs::read_to_string(&self.value_path)?;
        match raw.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected GPIO value {:?}", other),
            )),
        }
    }

    /// Drive the raw level
    pub fn write(&self, high: bool) -> io::Result<()> {
        std::fs::write(&self.value_path, if high { "1" } else { "0" })
    }
}
