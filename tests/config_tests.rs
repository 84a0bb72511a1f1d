// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use std::time::Duration;
use uvcam::Config;
use uvcam::config::LedSpec;
use uvcam::constants::Rotation;
use uvcam::errors::ConfigError;

#[test]
fn test_config_default_timings() {
    let config = Config::default();

    assert_eq!(config.power.idle_threshold(), Duration::from_secs(300));
    assert_eq!(config.power.shutdown_threshold(), Duration::from_secs(900));
    assert_eq!(config.power.check_interval(), Duration::from_secs(5));
    assert_eq!(config.power.poweroff_delay(), Duration::from_secs(1));
    assert_eq!(config.liveness.client_timeout(), Duration::from_secs(60));
    assert_eq!(config.liveness.check_interval(), Duration::from_secs(25));
    assert_eq!(config.feedback.blink_count, 6);
    assert_eq!(config.feedback.capture_hold(), Duration::from_millis(500));
    assert_eq!(config.wiring.capture_hold(), Duration::from_secs(2));
}

#[test]
fn test_config_default_passes_validation() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("uvcam-config-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.json");

    let mut config = Config::default();
    config.bind_address = "127.0.0.1:8080".to_string();
    config.camera.rotation = Rotation::None;
    config.wiring.indicator_led = LedSpec::Sysfs {
        name: "led0".to_string(),
    };
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    let loaded = Config::load(Some(&path)).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_config_missing_explicit_file_is_an_error() {
    let path = std::env::temp_dir().join(format!("uvcam-missing-{}.json", uuid::Uuid::new_v4()));
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_config_virtual_led_spec() {
    let config =
        Config::from_json(r#"{ "wiring": { "uv_a_led": { "kind": "virtual" } } }"#).unwrap();
    assert_eq!(config.wiring.uv_a_led, LedSpec::Virtual);
    // Untouched siblings keep their defaults
    assert!(config.wiring.capture_button.is_some());
}

#[test]
fn test_config_rejects_bad_quality() {
    let result = Config::from_json(r#"{ "camera": { "jpeg_quality": 0 } }"#);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
