//! Observation encoding: raw RGB frame -> PNG -> base64 text.

use base64::Engine;
use image::ImageEncoder;
use thiserror::Error;

use crate::types::Frame;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("frame buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("png encode: {0}")]
    Png(#[from] image::ImageError),
}

/// Encode a frame as PNG bytes.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, EncodeError> {
    let expected = frame.expected_len();
    if frame.pixels.len() != expected {
        return Err(EncodeError::SizeMismatch {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.pixels.len(),
        });
    }

    let mut png_data = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_data);
    encoder.write_image(
        &frame.pixels,
        frame.width,
        frame.height,
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(png_data)
}

/// Encode a frame as a base64 PNG string, ready to embed in a message.
pub fn encode(frame: &Frame) -> Result<String, EncodeError> {
    let png_data = encode_png(frame)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png_data))
}
