// SPDX-License-Identifier: GPL-3.0-only

//! Camera driver abstraction
//!
//! Everything that touches the physical camera goes through [`CameraDriver`].
//! Drivers are never used directly by request handlers; the
//! [`CameraArbiter`](crate::coordination::CameraArbiter) owns the only
//! instance and hands out exclusive access.

use crate::errors::CameraError;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Result type for camera operations
pub type CameraResult<T> = Result<T, CameraError>;

/// Pixel layout of a frame's data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Complete JPEG bitstream (MJPEG capture)
    Jpeg,
    /// Packed 8-bit RGB, no row padding
    Rgb8,
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Frame bytes, layout given by `format`
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// When the frame was dequeued
    pub captured_at: Instant,
}

/// Physical camera operations
///
/// All methods are blocking. Timeouts are the driver's business; callers treat
/// a call as "eventually returns".
pub trait CameraDriver: Send {
    /// Run one autofocus cycle
    ///
    /// Returns `true` when focus was reached, `false` when the cycle failed or
    /// the camera has no autofocus. Never fatal for the caller.
    fn autofocus_cycle(&mut self) -> bool;

    /// Capture a full still and write it as JPEG to `path`
    fn capture_still(&mut self, path: &Path) -> CameraResult<()>;

    /// Grab the next preview frame
    fn capture_frame(&mut self) -> CameraResult<Frame>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Stand-in used when the camera failed to initialise
///
/// Keeps the rest of the controller (LEDs, buttons, power management) running
/// while every camera operation reports the original failure.
#[derive(Debug, Clone)]
pub struct UnavailableCamera {
    reason: String,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CameraDriver for UnavailableCamera {
    fn autofocus_cycle(&mut self) -> bool {
        false
    }

    fn capture_still(&mut self, _path: &Path) -> CameraResult<()> {
        Err(CameraError::Unavailable(self.reason.clone()))
    }

    fn capture_frame(&mut self) -> CameraResult<Frame> {
        Err(CameraError::Unavailable(self.reason.clone()))
    }

    fn describe(&self) -> String {
        format!("unavailable ({})", self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_camera_reports_reason() {
        let mut camera = UnavailableCamera::new("no /dev/video0");
        assert!(!camera.autofocus_cycle());

        let err = camera.capture_frame().unwrap_err();
        assert!(err.to_string().contains("no /dev/video0"));
        assert!(camera.capture_still(Path::new("/tmp/x.jpeg")).is_err());
    }
}
