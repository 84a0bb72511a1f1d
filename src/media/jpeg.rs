// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for stream frames and stills
//!
//! MJPEG frames that need no rotation are passed through untouched; anything
//! else is decoded to RGB, rotated and re-encoded.

use crate::constants::Rotation;
use crate::errors::CameraError;
use crate::hardware::camera::{Frame, PixelFormat};
use image::{ImageFormat, RgbImage, imageops};
use tracing::debug;

/// Encode a frame as JPEG, applying `rotation`
pub fn encode_frame(frame: &Frame, rotation: Rotation, quality: u8) -> Result<Vec<u8>, CameraError> {
    if frame.format == PixelFormat::Jpeg && rotation == Rotation::None {
        return Ok(frame.data.to_vec());
    }

    let image = to_rgb(frame)?;
    let rotated = rotate(image, rotation);
    debug!(
        width = rotated.width(),
        height = rotated.height(),
        degrees = rotation.degrees(),
        "Re-encoding frame"
    );
    encode_rgb(&rotated, quality)
}

/// Decode a frame into an RGB image
fn to_rgb(frame: &Frame) -> Result<RgbImage, CameraError> {
    match frame.format {
        PixelFormat::Jpeg => image::load_from_memory_with_format(&frame.data, ImageFormat::Jpeg)
            .map(|img| img.to_rgb8())
            .map_err(|e| CameraError::Encoding(format!("JPEG decode failed: {}", e))),
        PixelFormat::Rgb8 => RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())
            .ok_or_else(|| {
                CameraError::Encoding(format!(
                    "RGB buffer of {} bytes does not match {}x{}",
                    frame.data.len(),
                    frame.width,
                    frame.height
                ))
            }),
    }
}

fn rotate(image: RgbImage, rotation: Rotation) -> RgbImage {
    match rotation {
        Rotation::None => image,
        Rotation::Cw90 => imageops::rotate90(&image),
        Rotation::Cw180 => imageops::rotate180(&image),
        Rotation::Cw270 => imageops::rotate270(&image),
    }
}

/// Encode an RGB image as JPEG
pub fn encode_rgb(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality);
    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CameraError::Encoding(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}
