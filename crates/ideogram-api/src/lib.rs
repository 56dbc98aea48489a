//! Thin blocking wrapper around the Ideogram image-generation API.
//!
//! Lookups degrade to `None` instead of failing; see [`IdeogramClient`].

pub mod client;
pub mod config;
pub mod errors;
pub mod pricing;

pub use client::{IdeogramClient, KeyStatus};
pub use config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_TIMEOUT, USER_AGENT};
pub use errors::{parse_api_error, parse_api_error_response};
pub use pricing::{calculate_cost, format_generation_info, RenderSpeed, FALLBACK_PRICE_USD};
