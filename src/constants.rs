// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! Defaults for every tunable in [`crate::config::Config`] live here so the
//! config defaults, the CLI help text and the tests agree on one value.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ===== Power management =====

/// Idle time after which both UV status LEDs are forced off
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(300);

/// Idle time after which the unit powers itself off (when no client is live)
pub const DEFAULT_SHUTDOWN_THRESHOLD: Duration = Duration::from_secs(900);

/// Interval between power state evaluations
pub const DEFAULT_POWER_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Number of LED toggles in the pre-shutdown warning
pub const DEFAULT_SHUTDOWN_WARNING_TOGGLES: u32 = 5;

/// Delay between LED toggles in the pre-shutdown warning
pub const DEFAULT_SHUTDOWN_WARNING_PERIOD: Duration = Duration::from_millis(200);

/// Delay before a requested power-off, so the HTTP response can be flushed
pub const DEFAULT_POWEROFF_DELAY: Duration = Duration::from_secs(1);

/// Command used to power the unit off
pub const DEFAULT_POWEROFF_COMMAND: [&str; 2] = ["sudo", "poweroff"];

// ===== Client liveness =====

/// Age of the last ping after which a client is considered gone
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between liveness evaluations
pub const DEFAULT_LIVENESS_CHECK_INTERVAL: Duration = Duration::from_secs(25);

// ===== Visual feedback =====

/// Number of on/off cycles in one indicator blink sequence
pub const DEFAULT_BLINK_COUNT: u32 = 6;

/// Duration of each half (on, then off) of a blink cycle
pub const DEFAULT_BLINK_PERIOD: Duration = Duration::from_millis(200);

/// Minimum time the indicator stays lit after a still capture
pub const DEFAULT_CAPTURE_FEEDBACK_HOLD: Duration = Duration::from_millis(500);

// ===== Buttons =====

/// Hold time on the capture button that triggers a still capture
pub const DEFAULT_BUTTON_HOLD_TIME: Duration = Duration::from_secs(2);

/// Polling interval for sysfs GPIO button inputs
pub const BUTTON_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A level must be stable this long before it is accepted as a press/release
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(30);

// ===== Camera & media =====

/// Default V4L2 capture device
pub const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";

/// Default preview/stream width (portrait sensor orientation)
pub const DEFAULT_FRAME_WIDTH: u32 = 720;

/// Default preview/stream height
pub const DEFAULT_FRAME_HEIGHT: u32 = 1280;

/// Default JPEG quality for re-encoded frames
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Number of memory-mapped V4L2 buffers
pub const V4L2_BUFFER_COUNT: u32 = 4;

/// Upper bound on a single autofocus cycle
pub const AUTOFOCUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Poll interval while waiting for autofocus to settle
pub const AUTOFOCUS_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Back-off after a failed stream frame grab
pub const STREAM_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Encoded frames buffered per stream connection
pub const STREAM_CHANNEL_CAPACITY: usize = 2;

/// Multipart boundary used by the video feed
pub const STREAM_BOUNDARY: &str = "frame";

// ===== Storage =====

/// Default directory for captured stills (relative to the working directory)
pub const DEFAULT_IMAGE_DIR: &str = "img";

/// File name prefix for captured stills
pub const CAPTURE_FILE_PREFIX: &str = "RF_pic_";

/// Timestamp format embedded in captured still names
pub const CAPTURE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// Extensions listed by the image store
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Default page size for image listings
pub const DEFAULT_PAGE_SIZE: usize = 10;

// ===== HTTP =====

/// Default listen address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

/// Physical rotation applied to camera output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Sensor output is used as-is
    None,
    /// Rotate 90 degrees clockwise (sensor mounted sideways)
    #[default]
    Cw90,
    /// Rotate 180 degrees
    Cw180,
    /// Rotate 270 degrees clockwise
    Cw270,
}

impl Rotation {
    /// Rotation in degrees clockwise
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 90,
            Rotation::Cw180 => 180,
            Rotation::Cw270 => 270,
        }
    }
}
