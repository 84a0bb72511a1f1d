// SPDX-License-Identifier: GPL-3.0-only

//! uvcam - always-on controller for a UV imaging unit
//!
//! Drives one camera, two UV status LEDs, a capture indicator LED and three
//! buttons, and exposes them over a small HTTP API. The unit powers itself
//! off after a long stretch without activity.
//!
//! # Architecture
//!
//! - [`hardware`]: camera, LED, button and power-off drivers behind traits
//! - [`coordination`]: shared state, camera arbitration, idle/shutdown and
//!   liveness evaluators, capture pipeline
//! - [`server`]: axum routes over the coordination layer
//! - [`media`]: JPEG encoding of frames
//! - [`storage`]: image directory naming, listing and lookup
//! - [`config`]: JSON configuration

pub mod config;
pub mod constants;
pub mod coordination;
pub mod errors;
pub mod hardware;
pub mod media;
pub mod server;
pub mod storage;

pub use config::Config;
pub use coordination::DeviceContext;
pub use errors::{AppError, AppResult};

/// Build version, `<crate version>+<git hash>` when built from a checkout
pub fn version() -> &'static str {
    env!("UVCAM_VERSION")
}
