// SPDX-License-Identifier: GPL-3.0-only

//! MJPEG preview over `multipart/x-mixed-replace`
//!
//! Each connection gets its own producer thread. The producer holds the
//! camera for one frame grab at a time, encodes outside the arbiter and
//! pushes parts into a small channel. When the client goes away the receiver
//! is dropped, the next send fails and the producer exits.

use crate::constants::{Rotation, STREAM_BOUNDARY, STREAM_CHANNEL_CAPACITY, STREAM_RETRY_DELAY};
use crate::coordination::{CameraArbiter, CameraHolder};
use crate::media;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc::{self, Sender};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

type PartSender = Sender<Result<Vec<u8>, Infallible>>;

/// How preview frames are encoded
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    pub rotation: Rotation,
    pub jpeg_quality: u8,
}

/// Wrap one JPEG image as a multipart part
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{STREAM_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + 2);
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

/// Start a producer and return the streaming response
pub fn video_feed(arbiter: Arc<CameraArbiter>, settings: StreamSettings) -> Response {
    let stream_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    let spawned = thread::Builder::new()
        .name(format!("stream-{}", &stream_id.to_string()[..8]))
        .spawn(move || produce(stream_id, &arbiter, settings, &tx));

    if let Err(e) = spawned {
        // Body ends immediately since `tx` is gone
        error!(%stream_id, error = %e, "Failed to spawn stream producer");
    }

    let body = Body::from_stream(ReceiverStream::new(rx));
    (
        [
            (
                CONTENT_TYPE,
                format!("multipart/x-mixed-replace; boundary={STREAM_BOUNDARY}"),
            ),
            (CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response()
}

fn produce(stream_id: Uuid, arbiter: &CameraArbiter, settings: StreamSettings, tx: &PartSender) {
    info!(%stream_id, "Stream client connected");
    let mut failing = false;
    let mut sent: u64 = 0;

    loop {
        if tx.is_closed() {
            break;
        }

        let grabbed = arbiter.with_camera(CameraHolder::Streamer, |camera| camera.capture_frame());

        let frame = match grabbed {
            Ok(frame) => {
                failing = false;
                frame
            }
            Err(e) => {
                if !failing {
                    warn!(%stream_id, error = %e, "Frame grab failed, retrying");
                    failing = true;
                }
                thread::sleep(STREAM_RETRY_DELAY);
                continue;
            }
        };

        let jpeg = match media::encode_frame(&frame, settings.rotation, settings.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                debug!(%stream_id, error = %e, "Dropping frame that failed to encode");
                continue;
            }
        };

        if tx.blocking_send(Ok(multipart_part(&jpeg))).is_err() {
            break;
        }
        sent += 1;
        trace!(
            %stream_id,
            age_ms = frame.captured_at.elapsed().as_millis() as u64,
            "Frame sent"
        );
    }

    info!(%stream_id, frames = sent, "Stream client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multipart_part_layout() {
        let part = multipart_part(b"JPEG");
        assert_eq!(
            part,
            b"--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n".to_vec()
        );
    }
}
