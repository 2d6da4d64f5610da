//! Aspect-ratio normalization: pure Rust, on in-memory bytes.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decide** | [`decide_aspect`]: accept `0.8..=1.9`, else pad to 0.9 or 1.8 |
//! | **Pad** | white `RgbImage` canvas + `imageops::overlay`, centered |
//! | **Re-encode** | original format (`jpg` → `jpeg`) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for ratio and canvas math (unit testable)
//! - **Parameters**: Data structures describing the pad operation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: [`normalize`] and friends, combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, ImageBackend, NormalizeError};
pub use calculations::{
    AspectDecision, LANDSCAPE_TARGET_RATIO, MAX_ACCEPTED_RATIO, MIN_ACCEPTED_RATIO,
    PORTRAIT_TARGET_RATIO, aspect_ratio, calculate_canvas, centering_offset, decide_aspect,
};
pub use operations::{
    ImageBuffer, encoder_name, extension_from_url, normalize, plan_padding, resolve_format,
};
pub use params::{BACKGROUND_WHITE, PadParams, Quality};
pub use rust_backend::RustBackend;
