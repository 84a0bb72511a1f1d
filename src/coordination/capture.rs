// SPDX-License-Identifier: GPL-3.0-only

//! Still capture with autofocus and LED feedback

use super::activity::ActivityClock;
use super::arbiter::{CameraArbiter, CameraHolder};
use super::liveness::ClientLiveness;
use crate::errors::CaptureError;
use crate::hardware::Led;
use crate::hardware::led::set_logged;
use crate::storage::ImageStore;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

/// Autofocus, capture and feedback for one still
pub struct CapturePipeline {
    arbiter: Arc<CameraArbiter>,
    activity: Arc<ActivityClock>,
    liveness: Arc<ClientLiveness>,
    indicator: Arc<dyn Led>,
    store: ImageStore,
    feedback_hold: Duration,
}

impl CapturePipeline {
    pub fn new(
        arbiter: Arc<CameraArbiter>,
        activity: Arc<ActivityClock>,
        liveness: Arc<ClientLiveness>,
        indicator: Arc<dyn Led>,
        store: ImageStore,
        feedback_hold: Duration,
    ) -> Self {
        Self {
            arbiter,
            activity,
            liveness,
            indicator,
            store,
            feedback_hold,
        }
    }

    /// Capture one still into the image store
    ///
    /// Blocks for the autofocus cycle, the capture and the feedback hold. The
    /// indicator is switched off afterwards whatever the outcome.
    pub fn capture_still(&self) -> Result<PathBuf, CaptureError> {
        self.liveness.refresh();
        self.activity.touch();

        set_logged(self.indicator.as_ref(), true);
        let _feedback = FeedbackGuard {
            led: self.indicator.as_ref(),
            hold: self.feedback_hold,
        };

        let result = self.capture_into_store();
        match &result {
            Ok(path) => info!(path = %path.display(), "Captured still"),
            Err(e) => error!(error = %e, "Capture failed"),
        }
        result
    }

    fn capture_into_store(&self) -> Result<PathBuf, CaptureError> {
        let root = self.store.root();
        std::fs::create_dir_all(root).map_err(|source| CaptureError::Storage {
            path: root.to_path_buf(),
            source,
        })?;
        let path = self.store.claim_capture_path(Local::now())?;

        let written = self.arbiter.with_camera(CameraHolder::Capturer, |camera| {
            info!("Starting autofocus cycle");
            if camera.autofocus_cycle() {
                info!("Autofocus complete");
            } else {
                warn!("Autofocus cycle failed or was skipped");
            }
            camera.capture_still(&path)
        });

        if let Err(e) = written {
            self.store.release(&path);
            return Err(e.into());
        }
        Ok(path)
    }

    /// Run a capture on its own thread and return immediately
    ///
    /// The outcome is only logged.
    pub fn spawn_capture(self: &Arc<Self>) -> bool {
        let pipeline = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("capture".into())
            .spawn(move || {
                // Already logged inside
                let _ = pipeline.capture_still();
            });

        if let Err(e) = spawned {
            error!(error = %e, "Failed to spawn capture thread");
            return false;
        }
        true
    }
}

/// Holds the indicator on for the feedback time, then turns it off
struct FeedbackGuard<'a> {
    led: &'a dyn Led,
    hold: Duration,
}

impl Drop for FeedbackGuard<'_> {
    fn drop(&mut self) {
        thread::sleep(self.hold);
        set_logged(self.led, false);
    }
}
