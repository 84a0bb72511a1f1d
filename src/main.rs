// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uvcam::Config;

mod cli;

#[derive(Parser)]
#[command(name = "uvcam")]
#[command(about = "Always-on controller for a UV imaging unit")]
#[command(version = uvcam::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (default: ~/.config/uvcam/config.json if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// HTTP listen address, overrides the configuration
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Image directory, overrides the configuration
    #[arg(long, global = true)]
    image_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the controller (default)
    Serve,

    /// Take one still and print its path
    Capture,

    /// List video devices and LEDs
    Hardware,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=uvcam=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }
    if let Some(image_dir) = cli.image_dir {
        config.image_dir = image_dir;
    }

    match cli.command {
        None | Some(Commands::Serve) => cli::serve(config),
        Some(Commands::Capture) => cli::capture_once(config),
        Some(Commands::Hardware) => cli::list_hardware(),
        Some(Commands::Config) => cli::print_config(&config),
    }
}
