// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use uvcam::constants::{self, Rotation};

#[test]
fn test_rotation_values() {
    assert_eq!(Rotation::None.degrees(), 0);
    assert_eq!(Rotation::Cw90.degrees(), 90);
    assert_eq!(Rotation::Cw180.degrees(), 180);
    assert_eq!(Rotation::Cw270.degrees(), 270);
}

#[test]
fn test_sideways_mount_is_default() {
    assert_eq!(Rotation::default(), Rotation::Cw90);
}

#[test]
fn test_shutdown_comes_after_idle() {
    assert!(constants::DEFAULT_SHUTDOWN_THRESHOLD > constants::DEFAULT_IDLE_THRESHOLD);
    // The client timeout must outlast at least two liveness checks
    assert!(constants::DEFAULT_CLIENT_TIMEOUT >= constants::DEFAULT_LIVENESS_CHECK_INTERVAL * 2);
}

#[test]
fn test_image_extensions_cover_capture_format() {
    assert!(constants::IMAGE_EXTENSIONS.contains(&"jpeg"));
    assert_eq!(constants::DEFAULT_PAGE_SIZE, 10);
}
