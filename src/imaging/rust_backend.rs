//! Pure Rust image backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Sniff format | `image::guess_format` |
//! | Decode | `image::load_from_memory` |
//! | Canvas + paste | `RgbImage::from_pixel` + `imageops::overlay` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG, GIF, WebP | `write_to` with the matching `ImageFormat` |

use super::backend::{Dimensions, ImageBackend, NormalizeError};
use super::params::PadParams;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use std::io::Cursor;

/// Encoder names with compiled-in codecs, and the format each maps to.
const FORMATS: &[(&str, ImageFormat)] = &[
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
];

/// Returns the encoder names this backend can write.
pub fn supported_formats() -> Vec<&'static str> {
    FORMATS.iter().map(|(name, _)| *name).collect()
}

fn format_for(name: &str) -> Result<ImageFormat, NormalizeError> {
    FORMATS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, f)| *f)
        .ok_or_else(|| NormalizeError::UnsupportedFormat(name.to_string()))
}

fn name_for(format: ImageFormat) -> Option<&'static str> {
    FORMATS.iter().find(|(_, f)| *f == format).map(|(n, _)| *n)
}

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, NormalizeError> {
    image::load_from_memory(bytes).map_err(|e| NormalizeError::Decode(e.to_string()))
}

fn encode(canvas: RgbImage, format: ImageFormat, quality: u32) -> Result<Vec<u8>, NormalizeError> {
    let mut out = Cursor::new(Vec::new());
    let img = DynamicImage::ImageRgb8(canvas);
    let result = match format {
        ImageFormat::Jpeg => {
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality as u8))
        }
        other => img.write_to(&mut out, other),
    };
    result.map_err(|e| NormalizeError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, NormalizeError> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| NormalizeError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn sniff_format(&self, bytes: &[u8]) -> Option<String> {
        image::guess_format(bytes)
            .ok()
            .and_then(name_for)
            .map(str::to_string)
    }

    fn pad(&self, bytes: &[u8], params: &PadParams) -> Result<Vec<u8>, NormalizeError> {
        let format = format_for(&params.format)?;
        let source = decode(bytes)?.to_rgb8();

        let mut canvas = RgbImage::from_pixel(
            params.canvas_width,
            params.canvas_height,
            Rgb(params.background),
        );
        image::imageops::overlay(
            &mut canvas,
            &source,
            i64::from(params.offset_x),
            i64::from(params.offset_y),
        );

        encode(canvas, format, params.quality.value())
    }
}
