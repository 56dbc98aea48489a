use std::io::Cursor;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

pub const DEFAULT_MAX_SIZE_MB: f64 = 10.0;
pub const MIN_RESIZED_DIMENSION: u32 = 256;

/// Headroom for the gap between the PNG estimate and what actually gets uploaded.
const SAFETY_MARGIN: f64 = 0.9;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size of the image once PNG-encoded, in MiB.
pub fn estimate_encoded_size_mb(image: &DynamicImage) -> Result<f64> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("failed to PNG-encode image for size estimate")?;
    Ok(buffer.get_ref().len() as f64 / BYTES_PER_MB)
}

/// Target dimensions for an image estimated at `current_mb` that must fit in
/// `max_mb`. Both sides shrink by the same factor and never drop below 256px.
pub fn scaled_dimensions(width: u32, height: u32, current_mb: f64, max_mb: f64) -> (u32, u32) {
    let factor = (max_mb / current_mb).sqrt() * SAFETY_MARGIN;
    let scale = |side: u32| -> u32 {
        let scaled = (f64::from(side) * factor).floor() as u32;
        scaled.max(MIN_RESIZED_DIMENSION)
    };
    (scale(width), scale(height))
}

/// Downscales once with Lanczos3 when the PNG estimate exceeds `max_size_mb`.
/// The result is not re-measured.
pub fn resize_to_limit(image: DynamicImage, max_size_mb: f64) -> Result<DynamicImage> {
    let current_mb = estimate_encoded_size_mb(&image)?;
    if current_mb <= max_size_mb {
        return Ok(image);
    }
    let (width, height) =
        scaled_dimensions(image.width(), image.height(), current_mb, max_size_mb);
    debug!(
        current_mb,
        max_size_mb,
        from = %format!("{}x{}", image.width(), image.height()),
        to = %format!("{width}x{height}"),
        "resizing image to fit upload limit"
    );
    Ok(image.resize_exact(width, height, FilterType::Lanczos3))
}
