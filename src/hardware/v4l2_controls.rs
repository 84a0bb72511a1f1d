// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 focus control interface
//!
//! Raw `VIDIOC_*_CTRL` ioctls for the camera-class focus controls. The `v4l`
//! crate covers streaming; one-shot autofocus needs the
//! `AUTO_FOCUS_START`/`AUTO_FOCUS_STATUS` pair, which it does not wrap.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ===== V4L2 Control Class Bases =====
const V4L2_CTRL_CLASS_CAMERA: u32 = 0x009a0000;
const V4L2_CID_CAMERA_CLASS_BASE: u32 = V4L2_CTRL_CLASS_CAMERA | 0x900;

// ===== V4L2 Control IDs (Camera Class) =====

/// Continuous autofocus enable
pub const V4L2_CID_FOCUS_AUTO: u32 = V4L2_CID_CAMERA_CLASS_BASE + 12;
/// Start a single autofocus scan (button control)
pub const V4L2_CID_AUTO_FOCUS_START: u32 = V4L2_CID_CAMERA_CLASS_BASE + 28;
/// Abort a running autofocus scan (button control)
pub const V4L2_CID_AUTO_FOCUS_STOP: u32 = V4L2_CID_CAMERA_CLASS_BASE + 29;
/// Autofocus progress bitmask (read-only)
pub const V4L2_CID_AUTO_FOCUS_STATUS: u32 = V4L2_CID_CAMERA_CLASS_BASE + 30;

// ===== V4L2 Autofocus Status Bits =====

/// Scan in progress
pub const V4L2_AUTO_FOCUS_STATUS_BUSY: i32 = 1 << 0;
/// Focus reached
pub const V4L2_AUTO_FOCUS_STATUS_REACHED: i32 = 1 << 1;
/// Scan failed
pub const V4L2_AUTO_FOCUS_STATUS_FAILED: i32 = 1 << 2;

// ===== V4L2 Control Flags =====
const V4L2_CTRL_FLAG_DISABLED: u32 = 0x0001;

// ===== V4L2 ioctl Numbers =====
// Calculated as: (dir << 30) | (size << 16) | ('V' << 8) | nr
// where dir: 2=READ, 1=WRITE, 3=READ|WRITE

/// Get control value (v4l2_control: 8 bytes)
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;
/// Set control value (v4l2_control: 8 bytes)
const VIDIOC_S_CTRL: libc::c_ulong = 0xC008561C;
/// Query control info (v4l2_queryctrl: 68 bytes)
const VIDIOC_QUERYCTRL: libc::c_ulong = 0xC0445624;

#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

#[repr(C)]
struct V4l2Queryctrl {
    id: u32,
    ctrl_type: u32,
    name: [u8; 32],
    minimum: i32,
    maximum: i32,
    step: i32,
    default_value: i32,
    flags: u32,
    reserved: [u32; 2],
}

/// Outcome of a one-shot autofocus scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusOutcome {
    /// Lens settled on a focus position
    Reached,
    /// Driver reported a failed scan
    Failed,
    /// Scan still busy when the timeout elapsed
    TimedOut,
    /// Device has no one-shot autofocus
    Unsupported,
}

impl FocusOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FocusOutcome::Reached)
    }
}

/// Check if a control is available on the device
pub fn has_control(device_path: &str, control_id: u32) -> bool {
    let Ok(file) = File::open(device_path) else {
        return false;
    };

    let mut qctrl = V4l2Queryctrl {
        id: control_id,
        ctrl_type: 0,
        name: [0; 32],
        minimum: 0,
        maximum: 0,
        step: 0,
        default_value: 0,
        flags: 0,
        reserved: [0; 2],
    };

    let result = unsafe {
        libc::ioctl(
            file.as_raw_fd(),
            VIDIOC_QUERYCTRL,
            &mut qctrl as *mut V4l2Queryctrl,
        )
    };

    result >= 0 && qctrl.flags & V4L2_CTRL_FLAG_DISABLED == 0
}

/// Get current value of a control
pub fn get_control(device_path: &str, control_id: u32) -> Option<i32> {
    let file = File::open(device_path).ok()?;

    let mut ctrl = V4l2Control {
        id: control_id,
        value: 0,
    };

    let result =
        unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_G_CTRL, &mut ctrl as *mut V4l2Control) };

    if result < 0 {
        debug!(device_path, control_id, "Failed to get V4L2 control");
        return None;
    }

    Some(ctrl.value)
}

/// Set value of a control
pub fn set_control(device_path: &str, control_id: u32, value: i32) -> std::io::Result<()> {
    let file = File::open(device_path)?;

    let mut ctrl = V4l2Control {
        id: control_id,
        value,
    };

    let result =
        unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_S_CTRL, &mut ctrl as *mut V4l2Control) };

    if result < 0 {
        let errno = std::io::Error::last_os_error();
        warn!(device_path, control_id, value, ?errno, "Failed to set V4L2 control");
        return Err(errno);
    }

    Ok(())
}

/// Run one autofocus scan and wait for it to settle
///
/// Blocks for at most `timeout`. Continuous autofocus, when present, is left
/// as it was; the driver resumes it after the scan.
pub fn autofocus_once(device_path: &str, timeout: Duration, poll: Duration) -> FocusOutcome {
    if !has_control(device_path, V4L2_CID_AUTO_FOCUS_START) {
        return FocusOutcome::Unsupported;
    }

    if set_control(device_path, V4L2_CID_AUTO_FOCUS_START, 1).is_err() {
        return FocusOutcome::Failed;
    }

    // Drivers without a status control focus synchronously in S_CTRL
    if !has_control(device_path, V4L2_CID_AUTO_FOCUS_STATUS) {
        return FocusOutcome::Reached;
    }

    let started = Instant::now();
    loop {
        let status = get_control(device_path, V4L2_CID_AUTO_FOCUS_STATUS).unwrap_or(0);
        if let Some(outcome) = interpret_status(status) {
            debug!(device_path, ?outcome, elapsed = ?started.elapsed(), "Autofocus settled");
            return outcome;
        }
        if started.elapsed() >= timeout {
            let _ = set_control(device_path, V4L2_CID_AUTO_FOCUS_STOP, 1);
            return FocusOutcome::TimedOut;
        }
        std::thread::sleep(poll);
    }
}

/// Map an `AUTO_FOCUS_STATUS` bitmask to a final outcome, `None` while busy
fn interpret_status(status: i32) -> Option<FocusOutcome> {
    if status & V4L2_AUTO_FOCUS_STATUS_BUSY != 0 {
        None
    } else if status & V4L2_AUTO_FOCUS_STATUS_FAILED != 0 {
        Some(FocusOutcome::Failed)
    } else if status & V4L2_AUTO_FOCUS_STATUS_REACHED != 0 {
        Some(FocusOutcome::Reached)
    } else {
        // Idle without a verdict: the scan ended without reporting
        Some(FocusOutcome::Failed)
    }
}
