// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the HTTP routes

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{Rig, rig, wait_for};
use futures::StreamExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, SystemTime};
use tower::ServiceExt;
use uvcam::hardware::Led;
use uvcam::server::{self, AppState};

fn app(rig: &Rig) -> Router {
    let camera = uvcam::config::CameraSettings::default();
    server::router(AppState::new(Arc::clone(&rig.context), &camera))
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Method::GET, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn write_image(rig: &Rig, name: &str, age_secs: u64) {
    let path = rig.image_dir.join(name);
    std::fs::write(&path, b"\xFF\xD8data\xFF\xD9").unwrap();
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

#[tokio::test]
async fn test_ping() {
    let rig = rig();
    rig.clock.advance(Duration::from_secs(40));

    let (status, body) = get_json(app(&rig), "/ping").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "pong", "code": 200 }));
    assert!(rig.context.liveness.is_connected());
    assert_eq!(rig.context.activity.idle_duration(), Duration::ZERO);
}

#[tokio::test]
async fn test_device_status_is_passive() {
    let rig = rig();
    rig.clock.advance(Duration::from_secs(40));

    let (status, body) = get_json(app(&rig), "/device_status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["online"], json!(true));
    assert_eq!(body["idle_mode"], json!(false));
    assert_eq!(body["client_connected"], json!(false));
    assert_eq!(body["power_state"], json!("active"));
    assert_eq!(body["version"], json!(uvcam::version()));
    assert_eq!(
        rig.context.activity.idle_duration(),
        Duration::from_secs(40)
    );
}

#[tokio::test]
async fn test_capture_accepts_get_and_post() {
    let rig = rig();

    let (status, _, body) = send(app(&rig), Method::POST, "/capture").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "status": "capture_started" }));

    let (status, _) = get_json(app(&rig), "/capture").await;
    assert_eq!(status, StatusCode::OK);

    assert!(wait_for(Duration::from_secs(5), || {
        rig.camera.stills.load(Ordering::SeqCst) == 2
    }));
}

#[tokio::test]
async fn test_list_files_pagination() {
    let rig = rig();
    write_image(&rig, "a.jpeg", 30);
    write_image(&rig, "b.png", 20);
    write_image(&rig, "c.gif", 10);
    write_image(&rig, "readme.txt", 0);

    let (status, body) = get_json(app(&rig), "/list_files?page=1&per_page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "page": 1, "per_page": 2, "total": 3, "files": ["c.gif", "b.png"] })
    );

    let (_, body) = get_json(app(&rig), "/list_files").await;
    assert_eq!(body["per_page"], json!(10));
    assert_eq!(body["files"], json!(["c.gif", "b.png", "a.jpeg"]));
}

#[tokio::test]
async fn test_list_files_rejects_bad_parameters() {
    let rig = rig();

    let (status, body) = get_json(app(&rig), "/list_files?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("VALIDATION_ERROR"));

    let (status, body) = get_json(app(&rig), "/list_files?per_page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_image_download() {
    let rig = rig();
    write_image(&rig, "shot.jpeg", 0);

    let (status, headers, body) = send(app(&rig), Method::GET, "/images/shot.jpeg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(body, b"\xFF\xD8data\xFF\xD9".to_vec());

    let (status, body) = get_json(app(&rig), "/images/missing.jpeg").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], json!("NOT_FOUND"));

    let (status, _) = get_json(app(&rig), "/images/..%2Fsecret.jpeg").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_led_toggle_and_status() {
    let rig = rig();
    rig.clock.advance(Duration::from_secs(40));

    let (_, body) = get_json(app(&rig), "/led1_status").await;
    assert_eq!(body, json!({ "active": false }));
    assert_eq!(
        rig.context.activity.idle_duration(),
        Duration::from_secs(40)
    );

    let (status, body) = get_json(app(&rig), "/led1_toggle").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "active": true }));
    assert_eq!(rig.context.activity.idle_duration(), Duration::ZERO);

    let (_, body) = get_json(app(&rig), "/led2_toggle").await;
    assert_eq!(body, json!({ "active": true }));
    let (_, body) = get_json(app(&rig), "/led2_toggle").await;
    assert_eq!(body, json!({ "active": false }));

    let (_, body) = get_json(app(&rig), "/uv_status").await;
    assert_eq!(body, json!({ "UV_A": true, "UV_B": false }));
    assert!(rig.uv_a.is_active());
}

#[tokio::test]
async fn test_poweroff_route() {
    let rig = rig();

    let (status, body) = get_json(app(&rig), "/poweroff").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "powering_off" }));
    assert!(wait_for(Duration::from_secs(5), || rig.power.count() == 1));
}

#[tokio::test]
async fn test_video_feed_streams_multipart_jpeg() {
    let rig = rig();
    rig.clock.advance(Duration::from_secs(40));

    let response = app(&rig)
        .oneshot(
            Request::builder()
                .uri("/video_feed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "multipart/x-mixed-replace; boundary=frame"
    );

    let mut chunks = response.into_body().into_data_stream();
    let first = chunks.next().await.unwrap().unwrap();
    let header = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
    assert!(first.starts_with(header));
    // JPEG start-of-image marker follows the part header
    assert_eq!(&first[header.len()..header.len() + 2], &[0xFF, 0xD8]);
    assert!(first.ends_with(b"\r\n"));

    let second = chunks.next().await.unwrap().unwrap();
    assert!(second.starts_with(header));

    // Streaming never counts as activity
    assert_eq!(
        rig.context.activity.idle_duration(),
        Duration::from_secs(40)
    );
    drop(chunks);
}

#[tokio::test]
async fn test_video_feed_retries_failed_grabs() {
    let rig = rig();
    rig.camera.fail_frames.store(true, Ordering::SeqCst);

    let response = app(&rig)
        .oneshot(
            Request::builder()
                .uri("/video_feed")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let mut chunks = response.into_body().into_data_stream();

    let camera = Arc::clone(&rig.camera);
    tokio::time::sleep(Duration::from_millis(250)).await;
    camera.fail_frames.store(false, Ordering::SeqCst);

    let first = tokio::time::timeout(Duration::from_secs(5), chunks.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(first.starts_with(b"--frame\r\n"));
}
