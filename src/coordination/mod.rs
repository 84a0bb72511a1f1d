// SPDX-License-Identifier: GPL-3.0-only

//! Concurrency core of the controller
//!
//! Shared state is split over a few small locks, never one global lock:
//!
//! - [`ActivityClock`]: last meaningful interaction, drives idle and shutdown
//! - [`ClientLiveness`]: whether a remote UI is still pinging
//! - [`CameraArbiter`]: exclusive access to the single camera
//! - [`BlinkSignal`]: single-flight indicator pulses
//!
//! [`PowerStateMachine`] and [`ClientLivenessMonitor`] are ticked by the
//! [`Supervisor`]; [`CapturePipeline`] runs on request or button hold.

pub mod activity;
pub mod arbiter;
pub mod blink;
pub mod capture;
pub mod clock;
pub mod commands;
pub mod context;
pub mod liveness;
pub mod power;
pub mod supervisor;

pub use activity::ActivityClock;
pub use arbiter::{CameraArbiter, CameraHolder};
pub use blink::BlinkSignal;
pub use capture::CapturePipeline;
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{ButtonRole, DeviceStatus, StatusLed, UvStatus};
pub use context::DeviceContext;
pub use liveness::{ClientLiveness, ClientLivenessMonitor, LivenessSnapshot};
pub use power::{PowerPolicy, PowerState, PowerStateMachine};
pub use supervisor::{LoopAction, PeriodicLoop, Supervisor};
