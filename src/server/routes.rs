// SPDX-License-Identifier: GPL-3.0-only

//! Route handlers
//!
//! Only `/ping`, the toggles and `/capture` count as activity. Status reads,
//! listings, downloads and the video feed leave the idle timers alone.

use super::AppState;
use super::error::{ApiError, ApiResult};
use super::stream;
use crate::constants::DEFAULT_PAGE_SIZE;
use crate::coordination::{DeviceStatus, StatusLed, UvStatus};
use crate::storage::{FilePage, content_type_for};
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
pub struct LedState {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

pub async fn ping(State(state): State<AppState>) -> Json<Value> {
    state.device.ping();
    Json(json!({ "status": "pong", "code": 200 }))
}

pub async fn device_status(State(state): State<AppState>) -> Json<DeviceStatus> {
    Json(state.device.device_status())
}

pub async fn capture(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if !state.device.trigger_capture() {
        return Err(ApiError::Internal("Could not start capture".to_string()));
    }
    Ok(Json(json!({ "status": "capture_started" })))
}

pub async fn list_files(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<FilePage>> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let page = page_param("page", params.page, 1)?;
    let per_page = page_param("per_page", params.per_page, DEFAULT_PAGE_SIZE)?;

    let store = state.device.store.clone();
    let listing = tokio::task::spawn_blocking(move || store.list(page, per_page)).await??;
    Ok(Json(listing))
}

fn page_param(name: &str, value: Option<i64>, default: usize) -> ApiResult<usize> {
    match value {
        None => Ok(default),
        Some(v) if v >= 1 => usize::try_from(v)
            .map_err(|_| ApiError::Validation(format!("{name} is out of range"))),
        Some(v) => Err(ApiError::Validation(format!(
            "{name} must be at least 1, got {v}"
        ))),
    }
}

pub async fn image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let store = state.device.store.clone();
    let name = filename.clone();
    let bytes = tokio::task::spawn_blocking(move || -> ApiResult<Vec<u8>> {
        let path = store.resolve(&name)?;
        Ok(std::fs::read(path)?)
    })
    .await??;

    Ok(([(CONTENT_TYPE, content_type_for(&filename))], bytes).into_response())
}

pub async fn led1_status(State(state): State<AppState>) -> Json<LedState> {
    Json(LedState {
        active: state.device.led_status(StatusLed::Led1),
    })
}

pub async fn led2_status(State(state): State<AppState>) -> Json<LedState> {
    Json(LedState {
        active: state.device.led_status(StatusLed::Led2),
    })
}

pub async fn uv_status(State(state): State<AppState>) -> Json<UvStatus> {
    Json(state.device.uv_status())
}

pub async fn led1_toggle(State(state): State<AppState>) -> ApiResult<Json<LedState>> {
    let active = state.device.toggle_led(StatusLed::Led1)?;
    Ok(Json(LedState { active }))
}

pub async fn led2_toggle(State(state): State<AppState>) -> ApiResult<Json<LedState>> {
    let active = state.device.toggle_led(StatusLed::Led2)?;
    Ok(Json(LedState { active }))
}

pub async fn poweroff(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.device.request_poweroff()?;
    Ok(Json(json!({ "status": "powering_off" })))
}

pub async fn video_feed(State(state): State<AppState>) -> Response {
    stream::video_feed(state.device.arbiter.clone(), state.stream)
}
