//! Image normalization helpers used before uploading to, and after failing
//! to hear back from, the generation API.

pub mod color;
pub mod geometry;
pub mod placeholder;
pub mod resize;

pub use color::ensure_rgb;
pub use geometry::{
    calculate_aspect_ratio, validate_image_dimensions, DimensionCheck, ASPECT_RATIOS,
    MAX_DIMENSION, MAX_PIXELS, MIN_DIMENSION,
};
pub use placeholder::{create_default_error_image, create_error_image};
pub use resize::{
    estimate_encoded_size_mb, resize_to_limit, scaled_dimensions, DEFAULT_MAX_SIZE_MB,
};
