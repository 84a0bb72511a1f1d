// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use uvcam::Config;
use uvcam::config::LedSpec;
use uvcam::coordination::{Clock, DeviceContext, ManualClock};
use uvcam::errors::{CameraError, ShutdownError};
use uvcam::hardware::{
    CameraDriver, CameraResult, Frame, Hardware, Led, PixelFormat, PowerControl, VirtualLed,
};
use uvcam::storage::ImageStore;

/// Shared view into a [`MockCamera`] after it moved into the arbiter
#[derive(Debug)]
pub struct CameraProbe {
    pub autofocus_ok: AtomicBool,
    pub fail_stills: AtomicBool,
    pub fail_frames: AtomicBool,
    pub autofocus_calls: AtomicUsize,
    pub stills: AtomicUsize,
    pub frames: AtomicUsize,
    in_use: AtomicUsize,
    pub overlapped: AtomicBool,
}

impl Default for CameraProbe {
    fn default() -> Self {
        Self {
            autofocus_ok: AtomicBool::new(true),
            fail_stills: AtomicBool::new(false),
            fail_frames: AtomicBool::new(false),
            autofocus_calls: AtomicUsize::new(0),
            stills: AtomicUsize::new(0),
            frames: AtomicUsize::new(0),
            in_use: AtomicUsize::new(0),
            overlapped: AtomicBool::new(false),
        }
    }
}

impl CameraProbe {
    /// Mark the camera busy for the duration of a call, flagging overlaps
    fn enter(&self) -> InUse<'_> {
        if self.in_use.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        InUse(self)
    }
}

struct InUse<'a>(&'a CameraProbe);

impl Drop for InUse<'_> {
    fn drop(&mut self) {
        self.0.in_use.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory camera producing small RGB frames
pub struct MockCamera {
    probe: Arc<CameraProbe>,
}

impl MockCamera {
    pub fn new() -> (Self, Arc<CameraProbe>) {
        let probe = Arc::new(CameraProbe::default());
        (
            Self {
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }
}

impl CameraDriver for MockCamera {
    fn autofocus_cycle(&mut self) -> bool {
        let _busy = self.probe.enter();
        self.probe.autofocus_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.autofocus_ok.load(Ordering::SeqCst)
    }

    fn capture_still(&mut self, path: &Path) -> CameraResult<()> {
        let _busy = self.probe.enter();
        if self.probe.fail_stills.load(Ordering::SeqCst) {
            return Err(CameraError::FrameGrab("simulated sensor fault".to_string()));
        }
        std::fs::write(path, b"\xFF\xD8mock\xFF\xD9")?;
        self.probe.stills.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn capture_frame(&mut self) -> CameraResult<Frame> {
        let _busy = self.probe.enter();
        if self.probe.fail_frames.load(Ordering::SeqCst) {
            return Err(CameraError::FrameGrab("simulated timeout".to_string()));
        }
        self.probe.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Frame {
            width: 8,
            height: 4,
            data: Arc::from(vec![128u8; 8 * 4 * 3]),
            format: PixelFormat::Rgb8,
            captured_at: Instant::now(),
        })
    }

    fn describe(&self) -> String {
        "mock camera".to_string()
    }
}

/// Power control that only counts
#[derive(Debug, Default)]
pub struct RecordingPower {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl PowerControl for RecordingPower {
    fn power_off(&self) -> Result<(), ShutdownError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShutdownError::NoCommand);
        }
        Ok(())
    }
}

impl RecordingPower {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A controller wired to doubles and a manual clock
pub struct Rig {
    pub clock: Arc<ManualClock>,
    pub context: Arc<DeviceContext>,
    pub camera: Arc<CameraProbe>,
    pub power: Arc<RecordingPower>,
    pub uv_a: Arc<VirtualLed>,
    pub uv_b: Arc<VirtualLed>,
    pub indicator: Arc<VirtualLed>,
    pub image_dir: PathBuf,
}

/// Default configuration with fast feedback timings
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.image_dir = std::env::temp_dir().join(format!("uvcam-test-{}", uuid::Uuid::new_v4()));
    config.wiring.uv_a_led = LedSpec::Virtual;
    config.wiring.uv_b_led = LedSpec::Virtual;
    config.wiring.indicator_led = LedSpec::Virtual;
    config.power.warning_period_ms = 1;
    config.power.poweroff_delay_ms = 10;
    config.feedback.blink_period_ms = 5;
    config.feedback.capture_hold_ms = 50;
    config
}

pub fn rig() -> Rig {
    rig_with(test_config())
}

pub fn rig_with(config: Config) -> Rig {
    let clock = Arc::new(ManualClock::new());
    let (camera, probe) = MockCamera::new();
    let power = Arc::new(RecordingPower::default());
    let uv_a = Arc::new(VirtualLed::new("uv_a"));
    let uv_b = Arc::new(VirtualLed::new("uv_b"));
    let indicator = Arc::new(VirtualLed::new("indicator"));

    let hardware = Hardware {
        camera: Box::new(camera),
        uv_a: Arc::clone(&uv_a) as Arc<dyn Led>,
        uv_b: Arc::clone(&uv_b) as Arc<dyn Led>,
        indicator: Arc::clone(&indicator) as Arc<dyn Led>,
        power: Arc::clone(&power) as Arc<dyn PowerControl>,
    };

    let store = ImageStore::open(&config.image_dir).unwrap();
    let context = Arc::new(DeviceContext::new(
        hardware,
        &config,
        Arc::clone(&clock) as Arc<dyn Clock>,
        store,
    ));

    Rig {
        clock,
        context,
        camera: probe,
        power,
        uv_a,
        uv_b,
        indicator,
        image_dir: config.image_dir,
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
