// SPDX-License-Identifier: GPL-3.0-only

//! Device configuration
//!
//! The configuration is a JSON document; every field is optional and falls
//! back to the defaults in [`crate::constants`]. Durations are stored as whole
//! seconds or milliseconds so the file stays hand-editable.

use crate::constants::{self, Rotation};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Name of the per-user configuration directory
const CONFIG_DIR_NAME: &str = "uvcam";

/// Name of the configuration file inside [`CONFIG_DIR_NAME`]
const CONFIG_FILE_NAME: &str = "config.json";

/// How an LED is wired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedSpec {
    /// Plain GPIO output pin driven through sysfs
    Gpio {
        /// BCM pin number
        pin: u32,
        /// Whether a high level lights the LED
        active_high: bool,
    },
    /// LED class device at `/sys/class/leds/<name>`
    Sysfs {
        /// Directory name under `/sys/class/leds`
        name: String,
    },
    /// No hardware, state kept in memory
    Virtual,
}

/// How a push button is wired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSpec {
    /// BCM pin number
    pub pin: u32,
    /// Whether a low level means "pressed" (pull-up wiring)
    pub active_low: bool,
}

/// Physical wiring of the unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wiring {
    /// First UV status LED (`led1`, reported as `UV_A`)
    pub uv_a_led: LedSpec,
    /// Second UV status LED (`led2`, reported as `UV_B`)
    pub uv_b_led: LedSpec,
    /// Capture/feedback indicator LED
    pub indicator_led: LedSpec,
    /// Button toggling the first UV LED
    pub uv_a_button: Option<ButtonSpec>,
    /// Button toggling the second UV LED
    pub uv_b_button: Option<ButtonSpec>,
    /// Capture button (press keeps awake, hold captures)
    pub capture_button: Option<ButtonSpec>,
    /// Hold time on the capture button before a capture fires
    pub capture_hold_ms: u64,
}

impl Default for Wiring {
    fn default() -> Self {
        Self {
            uv_a_led: LedSpec::Gpio {
                pin: 18,
                active_high: false,
            },
            uv_b_led: LedSpec::Gpio {
                pin: 23,
                active_high: false,
            },
            indicator_led: LedSpec::Gpio {
                pin: 15,
                active_high: true,
            },
            uv_a_button: Some(ButtonSpec {
                pin: 2,
                active_low: true,
            }),
            uv_b_button: Some(ButtonSpec {
                pin: 3,
                active_low: true,
            }),
            capture_button: Some(ButtonSpec {
                pin: 4,
                active_low: true,
            }),
            capture_hold_ms: constants::DEFAULT_BUTTON_HOLD_TIME.as_millis() as u64,
        }
    }
}

impl Wiring {
    /// Hold time on the capture button
    pub fn capture_hold(&self) -> Duration {
        Duration::from_millis(self.capture_hold_ms)
    }
}

/// Camera settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// V4L2 device node
    pub device: String,
    /// Requested frame width (before rotation)
    pub width: u32,
    /// Requested frame height (before rotation)
    pub height: u32,
    /// Rotation applied to stream frames and stills
    pub rotation: Rotation,
    /// JPEG quality used whenever a frame has to be re-encoded
    pub jpeg_quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device: constants::DEFAULT_CAMERA_DEVICE.to_string(),
            width: constants::DEFAULT_FRAME_WIDTH,
            height: constants::DEFAULT_FRAME_HEIGHT,
            rotation: Rotation::default(),
            jpeg_quality: constants::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Idle dimming and auto-shutdown settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerSettings {
    /// Idle seconds before the UV LEDs are forced off
    pub idle_threshold_secs: u64,
    /// Idle seconds before the unit powers off (no live client)
    pub shutdown_threshold_secs: u64,
    /// Seconds between power evaluations
    pub check_interval_secs: u64,
    /// LED toggles in the pre-shutdown warning
    pub warning_toggles: u32,
    /// Milliseconds between warning toggles
    pub warning_period_ms: u64,
    /// Milliseconds between a power-off request and the command
    pub poweroff_delay_ms: u64,
    /// Program and arguments that power the unit off
    pub poweroff_command: Vec<String>,
}

impl Default for PowerSettings {
    fn default() -> Self {
        Self {
            idle_threshold_secs: constants::DEFAULT_IDLE_THRESHOLD.as_secs(),
            shutdown_threshold_secs: constants::DEFAULT_SHUTDOWN_THRESHOLD.as_secs(),
            check_interval_secs: constants::DEFAULT_POWER_CHECK_INTERVAL.as_secs(),
            warning_toggles: constants::DEFAULT_SHUTDOWN_WARNING_TOGGLES,
            warning_period_ms: constants::DEFAULT_SHUTDOWN_WARNING_PERIOD.as_millis() as u64,
            poweroff_delay_ms: constants::DEFAULT_POWEROFF_DELAY.as_millis() as u64,
            poweroff_command: constants::DEFAULT_POWEROFF_COMMAND
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl PowerSettings {
    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn shutdown_threshold(&self) -> Duration {
        Duration::from_secs(self.shutdown_threshold_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn warning_period(&self) -> Duration {
        Duration::from_millis(self.warning_period_ms)
    }

    pub fn poweroff_delay(&self) -> Duration {
        Duration::from_millis(self.poweroff_delay_ms)
    }
}

/// Client watchdog settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessSettings {
    /// Seconds without a ping before a client counts as gone
    pub client_timeout_secs: u64,
    /// Seconds between liveness evaluations
    pub check_interval_secs: u64,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            client_timeout_secs: constants::DEFAULT_CLIENT_TIMEOUT.as_secs(),
            check_interval_secs: constants::DEFAULT_LIVENESS_CHECK_INTERVAL.as_secs(),
        }
    }
}

impl LivenessSettings {
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// Indicator LED feedback settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSettings {
    /// On/off cycles per blink sequence
    pub blink_count: u32,
    /// Milliseconds for each half of a blink cycle
    pub blink_period_ms: u64,
    /// Milliseconds the indicator stays lit after a capture
    pub capture_hold_ms: u64,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            blink_count: constants::DEFAULT_BLINK_COUNT,
            blink_period_ms: constants::DEFAULT_BLINK_PERIOD.as_millis() as u64,
            capture_hold_ms: constants::DEFAULT_CAPTURE_FEEDBACK_HOLD.as_millis() as u64,
        }
    }
}

impl FeedbackSettings {
    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_period_ms)
    }

    pub fn capture_hold(&self) -> Duration {
        Duration::from_millis(self.capture_hold_ms)
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen address
    pub bind_address: String,
    /// Directory for captured stills
    pub image_dir: PathBuf,
    /// Camera settings
    pub camera: CameraSettings,
    /// LED and button wiring
    pub wiring: Wiring,
    /// Idle dimming and auto-shutdown
    pub power: PowerSettings,
    /// Client watchdog
    pub liveness: LivenessSettings,
    /// Indicator feedback
    pub feedback: FeedbackSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: constants::DEFAULT_BIND_ADDRESS.to_string(),
            image_dir: PathBuf::from(constants::DEFAULT_IMAGE_DIR),
            camera: CameraSettings::default(),
            wiring: Wiring::default(),
            power: PowerSettings::default(),
            liveness: LivenessSettings::default(),
            feedback: FeedbackSettings::default(),
        }
    }
}

impl Config {
    /// Default location of the configuration file (`~/.config/uvcam/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(default) if default.is_file() => Self::from_file(&default),
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                source,
            },
            other => other,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse a configuration document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { path: None, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the controller cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.power.shutdown_threshold_secs < self.power.idle_threshold_secs {
            return Err(ConfigError::Invalid(format!(
                "shutdown threshold ({}s) is shorter than idle threshold ({}s)",
                self.power.shutdown_threshold_secs, self.power.idle_threshold_secs
            )));
        }
        if self.power.check_interval_secs == 0 || self.liveness.check_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "check intervals must be at least one second".to_string(),
            ));
        }
        if self.power.poweroff_command.is_empty() {
            return Err(ConfigError::Invalid(
                "poweroff command must not be empty".to_string(),
            ));
        }
        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "jpeg quality {} is outside 1-100",
                self.camera.jpeg_quality
            )));
        }
        Ok(())
    }
}
