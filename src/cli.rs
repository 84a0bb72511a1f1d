// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Running the controller (HTTP server, background monitors, buttons)
//! - Taking a single capture
//! - Listing hardware
//! - Printing the effective configuration

use std::sync::Arc;
use tracing::{error, info};
use uvcam::coordination::{DeviceContext, Supervisor, SystemClock};
use uvcam::hardware::led::{self, set_logged};
use uvcam::hardware::{Hardware, v4l2};
use uvcam::server::{self, AppState};
use uvcam::storage::ImageStore;
use uvcam::Config;

/// Probe hardware and build the shared context
fn build_context(config: &Config) -> Result<Arc<DeviceContext>, Box<dyn std::error::Error>> {
    let store = ImageStore::open(&config.image_dir)?;
    let hardware = Hardware::probe(config);
    Ok(Arc::new(DeviceContext::new(
        hardware,
        config,
        Arc::new(SystemClock),
        store,
    )))
}

/// Run the controller until the process is killed
pub fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!(version = uvcam::version(), "Starting uvcam");

    let context = build_context(&config)?;

    // UV LEDs start lit
    set_logged(context.uv_a.as_ref(), true);
    set_logged(context.uv_b.as_ref(), true);

    let supervisor = Supervisor::start(&context, &config.wiring)?;
    let loops: Vec<&str> = supervisor.loops().iter().map(|l| l.name()).collect();
    let buttons: Vec<&str> = supervisor.buttons().iter().map(|b| b.name()).collect();
    info!(?loops, ?buttons, "Background tasks running");

    ctrlc::set_handler(|| {
        info!("Interrupted, exiting");
        std::process::exit(0);
    })?;

    let state = AppState::new(Arc::clone(&context), &config.camera);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::serve(state, &config.bind_address))?;

    Ok(())
}

/// Run one capture pass and print the saved path
pub fn capture_once(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let context = build_context(&config)?;

    match context.capture.capture_still() {
        Ok(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Capture failed");
            Err(e.into())
        }
    }
}

/// List video devices and LED class devices
pub fn list_hardware() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = v4l2::enumerate_devices();
    if cameras.is_empty() {
        println!("No video devices found.");
    } else {
        println!("Video devices:");
        for (path, card) in &cameras {
            println!("  {}  {}", path, card);
        }
    }
    println!();

    let leds = led::discover_led_classes();
    if leds.is_empty() {
        println!("No LED class devices found.");
    } else {
        println!("LED class devices:");
        for name in &leds {
            println!("  {}", name);
        }
    }

    Ok(())
}

/// Print the effective configuration as JSON
pub fn print_config(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
