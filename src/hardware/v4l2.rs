// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera driver
//!
//! Captures MJPEG through a memory-mapped `v4l` stream. Preview frames are
//! handed out as JPEG bitstreams; stills are the next fresh frame after an
//! autofocus scan, rotated and written as JPEG.

use super::camera::{CameraDriver, CameraResult, Frame, PixelFormat};
use super::v4l2_controls::{self, FocusOutcome};
use crate::config::CameraSettings;
use crate::constants::{self, Rotation};
use crate::errors::CameraError;
use crate::media;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// MJPEG camera on a V4L2 device node
pub struct V4l2Camera {
    device_path: String,
    stream: MmapStream<'static>,
    width: u32,
    height: u32,
    rotation: Rotation,
    jpeg_quality: u8,
    // Keeps the device handle open for the lifetime of the stream
    _device: Device,
}

impl V4l2Camera {
    /// Open the configured device and start streaming
    pub fn open(settings: &CameraSettings) -> CameraResult<Self> {
        let path = settings.device.as_str();
        info!(
            device_path = path,
            width = settings.width,
            height = settings.height,
            "Opening V4L2 camera"
        );

        let device = Device::with_path(path).map_err(|e| {
            CameraError::InitializationFailed(format!("Failed to open {}: {}", path, e))
        })?;

        let mjpg = FourCC::new(b"MJPG");
        let requested = Format::new(settings.width, settings.height, mjpg);
        let actual = device.set_format(&requested).map_err(|e| {
            CameraError::InitializationFailed(format!("Failed to set format: {}", e))
        })?;

        if actual.fourcc != mjpg {
            return Err(CameraError::InitializationFailed(format!(
                "Device does not offer MJPEG (got {:?})",
                actual.fourcc
            )));
        }

        info!(
            width = actual.width,
            height = actual.height,
            fourcc = ?actual.fourcc,
            "V4L2 format configured"
        );

        if v4l2_controls::has_control(path, v4l2_controls::V4L2_CID_FOCUS_AUTO) {
            // Continuous autofocus between explicit scans
            if let Err(e) = v4l2_controls::set_control(path, v4l2_controls::V4L2_CID_FOCUS_AUTO, 1) {
                warn!(error = %e, "Could not enable continuous autofocus");
            }
        }

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, constants::V4L2_BUFFER_COUNT)
            .map_err(|e| {
                CameraError::InitializationFailed(format!("Failed to create stream: {}", e))
            })?;

        Ok(Self {
            device_path: path.to_string(),
            stream,
            width: actual.width,
            height: actual.height,
            rotation: settings.rotation,
            jpeg_quality: settings.jpeg_quality,
            _device: device,
        })
    }

    fn next_frame(&mut self) -> CameraResult<Frame> {
        let (buf, meta) = self
            .stream
            .next()
            .map_err(|e| CameraError::FrameGrab(e.to_string()))?;

        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            return Err(CameraError::FrameGrab("Empty buffer".to_string()));
        }

        Ok(Frame {
            width: self.width,
            height: self.height,
            data: Arc::from(&buf[..used]),
            format: PixelFormat::Jpeg,
            captured_at: Instant::now(),
        })
    }
}

impl CameraDriver for V4l2Camera {
    fn autofocus_cycle(&mut self) -> bool {
        let outcome = v4l2_controls::autofocus_once(
            &self.device_path,
            constants::AUTOFOCUS_TIMEOUT,
            constants::AUTOFOCUS_POLL_INTERVAL,
        );
        if outcome == FocusOutcome::Unsupported {
            debug!(device_path = %self.device_path, "No one-shot autofocus on this device");
        }
        outcome.is_success()
    }

    fn capture_still(&mut self, path: &Path) -> CameraResult<()> {
        // Buffers queued before the focus scan hold out-of-focus frames
        for _ in 0..constants::V4L2_BUFFER_COUNT {
            self.next_frame()?;
        }

        let frame = self.next_frame()?;
        let jpeg = media::encode_frame(&frame, self.rotation, self.jpeg_quality)?;
        std::fs::write(path, &jpeg)?;

        debug!(path = %path.display(), bytes = jpeg.len(), "Still written");
        Ok(())
    }

    fn capture_frame(&mut self) -> CameraResult<Frame> {
        self.next_frame()
    }

    fn describe(&self) -> String {
        format!("V4L2 {} ({}x{} MJPEG)", self.device_path, self.width, self.height)
    }
}

/// List V4L2 capture device nodes (`/dev/video*`)
pub fn enumerate_devices() -> Vec<(String, String)> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };

    let mut devices: Vec<(String, String)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with("video") {
                return None;
            }
            let path = entry.path().to_string_lossy().to_string();
            let card = Device::with_path(&path)
                .and_then(|dev| dev.query_caps())
                .map(|caps| caps.card)
                .unwrap_or_else(|_| "unknown".to_string());
            Some((path, card))
        })
        .collect();

    devices.sort();
    devices
}
