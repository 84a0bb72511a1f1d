// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the device controller

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Still capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),
    /// GPIO/LED errors
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
    /// Power-off errors
    #[error("Shutdown error: {0}")]
    Shutdown(#[from] ShutdownError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Image store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Other I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),
}

/// Camera-specific errors
#[derive(Debug, Error)]
pub enum CameraError {
    /// Camera failed to initialise at startup
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Camera is not usable (degraded mode)
    #[error("Camera unavailable: {0}")]
    Unavailable(String),
    /// A frame could not be grabbed
    #[error("Frame grab failed: {0}")]
    FrameGrab(String),
    /// Frame could not be converted or encoded
    #[error("Encoding failed: {0}")]
    Encoding(String),
    /// Device or file I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Still capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The camera driver failed the capture
    #[error("Capture failed: {0}")]
    Camera(#[from] CameraError),
    /// Target path could not be prepared
    #[error("Could not prepare {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// No file name could be reserved in the image store
    #[error("Could not reserve a file name: {0}")]
    Store(#[from] StorageError),
}

/// Image store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested name is not a plain file name
    #[error("Invalid file name: {0}")]
    InvalidName(String),
    /// Page or page size below 1
    #[error("Invalid pagination: {0}")]
    InvalidPage(String),
    /// No such image
    #[error("File not found: {0}")]
    NotFound(String),
    /// Filesystem failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// GPIO errors
#[derive(Debug, Error)]
pub enum GpioError {
    /// Pin could not be exported or configured
    #[error("GPIO {pin} setup failed: {source}")]
    Setup {
        pin: u32,
        #[source]
        source: std::io::Error,
    },
    /// LED class device is missing or unusable
    #[error("LED {name} unavailable: {reason}")]
    LedUnavailable { name: String, reason: String },
}

/// Power-off command errors
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The configured command is empty
    #[error("No power-off command configured")]
    NoCommand,
    /// The command could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The command ran but reported failure
    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Document is not valid configuration JSON
    #[error("Cannot parse configuration{}: {source}", path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    Parse {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },
    /// Values are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
