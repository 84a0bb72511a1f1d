// SPDX-License-Identifier: GPL-3.0-only

//! Exclusive access to the one physical camera

use crate::hardware::CameraDriver;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Who currently holds the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraHolder {
    /// A `/video_feed` producer grabbing one preview frame
    Streamer,
    /// The still-capture pipeline (autofocus + still)
    Capturer,
}

impl fmt::Display for CameraHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraHolder::Streamer => write!(f, "streamer"),
            CameraHolder::Capturer => write!(f, "capturer"),
        }
    }
}

/// Mutual-exclusion gateway to the camera
///
/// The driver is only reachable through [`CameraArbiter::with_camera`].
/// Acquisition blocks without timeout and without fairness. A panic inside a
/// holder poisons the lock; the next holder recovers it and carries on, since
/// the driver has no invariants a half-finished call could break.
pub struct CameraArbiter {
    camera: Mutex<Box<dyn CameraDriver>>,
    holder: Mutex<Option<CameraHolder>>,
}

impl CameraArbiter {
    pub fn new(camera: Box<dyn CameraDriver>) -> Self {
        Self {
            camera: Mutex::new(camera),
            holder: Mutex::new(None),
        }
    }

    /// Run `f` with exclusive ownership of the camera
    ///
    /// Ownership is released on every exit path of `f`, including panics.
    pub fn with_camera<T>(
        &self,
        holder: CameraHolder,
        f: impl FnOnce(&mut dyn CameraDriver) -> T,
    ) -> T {
        let mut camera = self.camera.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropped before `camera`, so the holder is cleared while still exclusive
        let _mark = HolderMark::set(&self.holder, holder);
        f(camera.as_mut())
    }

    /// Holder kind at this instant, for diagnostics
    pub fn current_holder(&self) -> Option<CameraHolder> {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CameraArbiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraArbiter")
            .field("holder", &self.current_holder())
            .finish_non_exhaustive()
    }
}

struct HolderMark<'a> {
    slot: &'a Mutex<Option<CameraHolder>>,
}

impl<'a> HolderMark<'a> {
    fn set(slot: &'a Mutex<Option<CameraHolder>>, holder: CameraHolder) -> Self {
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(holder);
        debug!(%holder, "Camera acquired");
        Self { slot }
    }
}

impl Drop for HolderMark<'_> {
    fn drop(&mut self) {
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(holder) = previous {
            debug!(%holder, "Camera released");
        }
    }
}
