// SPDX-License-Identifier: GPL-3.0-only

//! Media encoding used by the stream and the still pipeline
//!
//! - [`jpeg`]: frame rotation and JPEG encoding

pub mod jpeg;

pub use jpeg::encode_frame;
