//! Frame payload decoding: base64 (optionally data-URL wrapped) to pixels.

use crate::types::PipelineError;
use base64::Engine as _;
use image::imageops::FilterType;
use image::RgbImage;

/// Resolution frames are normalized to before landmark extraction.
pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 240;

/// Strip an optional data-URL header (`data:image/...;base64,`).
///
/// Anything before the first comma is treated as a header; a comma can
/// never appear in base64 itself.
pub fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, encoded)) => encoded,
        None => payload,
    }
}

/// Decode one frame payload into a normalized RGB image.
pub fn decode_frame(payload: &str) -> Result<RgbImage, PipelineError> {
    let encoded = strip_data_url(payload.trim());
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
    let decoded = image::load_from_memory(&bytes)?;
    let resized = decoded.resize_exact(FRAME_WIDTH, FRAME_HEIGHT, FilterType::Triangle);
    Ok(resized.to_rgb8())
}
