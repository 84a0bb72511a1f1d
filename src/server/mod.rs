// SPDX-License-Identifier: GPL-3.0-only

//! HTTP command surface
//!
//! A thin axum layer over [`DeviceContext`]: handlers translate requests into
//! commands and serialize the answers. Blocking filesystem work goes through
//! `spawn_blocking`; camera streaming runs on its own threads.

pub mod error;
pub mod routes;
pub mod stream;

pub use error::{ApiError, ApiResult};
pub use stream::StreamSettings;

use crate::config::CameraSettings;
use crate::coordination::DeviceContext;
use crate::errors::{AppError, AppResult};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub device: Arc<DeviceContext>,
    pub stream: StreamSettings,
}

impl AppState {
    pub fn new(device: Arc<DeviceContext>, camera: &CameraSettings) -> Self {
        Self {
            device,
            stream: StreamSettings {
                rotation: camera.rotation,
                jpeg_quality: camera.jpeg_quality,
            },
        }
    }
}

/// Build the router with every route
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(routes::ping))
        .route("/device_status", get(routes::device_status))
        .route("/capture", get(routes::capture).post(routes::capture))
        .route("/list_files", get(routes::list_files))
        .route("/images/{*filename}", get(routes::image))
        .route("/led1_status", get(routes::led1_status))
        .route("/led2_status", get(routes::led2_status))
        .route("/uv_status", get(routes::uv_status))
        .route("/led1_toggle", get(routes::led1_toggle))
        .route("/led2_toggle", get(routes::led2_toggle))
        .route("/poweroff", get(routes::poweroff))
        .route("/video_feed", get(routes::video_feed))
        .with_state(state)
}

/// Serve HTTP until the process exits
pub async fn serve(state: AppState, bind_address: &str) -> AppResult<()> {
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind {}: {}", bind_address, e)))?;

    info!(address = %bind_address, "HTTP server listening");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}
