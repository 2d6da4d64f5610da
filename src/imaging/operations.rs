//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they take an
//! [`ImageBuffer`], decide via [`decide_aspect`] whether it needs padding, and
//! call the backend only when it does.

use super::backend::{ImageBackend, NormalizeError};
use super::calculations::{AspectDecision, centering_offset, decide_aspect};
use super::params::{BACKGROUND_WHITE, PadParams, Quality};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;

/// Encoded image bytes plus their decoded dimensions and encoder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Encoder name, e.g. `"jpeg"`, `"png"`.
    pub format: String,
}

impl ImageBuffer {
    /// Identify `bytes` with the backend and wrap them.
    ///
    /// Zero-sized images are rejected as undecodable.
    pub fn load(
        backend: &(impl ImageBackend + ?Sized),
        bytes: Vec<u8>,
        format: &str,
    ) -> Result<Self> {
        let dims = backend.identify(&bytes)?;
        if dims.width == 0 || dims.height == 0 {
            return Err(NormalizeError::Decode(format!(
                "image has zero size ({}x{})",
                dims.width, dims.height
            )));
        }
        Ok(Self {
            bytes,
            width: dims.width,
            height: dims.height,
            format: encoder_name(format),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn decision(&self) -> AspectDecision {
        decide_aspect(self.width, self.height)
    }

    pub fn mime_type(&self) -> String {
        format!("image/{}", self.format)
    }
}

/// Normalize a file extension to an encoder name (`jpg` → `jpeg`).
///
/// Everything else passes through lowercased.
pub fn encoder_name(extension: &str) -> String {
    let ext = extension.to_ascii_lowercase();
    if ext == "jpg" { "jpeg".to_string() } else { ext }
}

/// Extension of the last path segment of `url`, ignoring query and fragment.
pub fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Resolve the encoder name for a downloaded image: URL extension first,
/// byte signature as a fallback.
pub fn resolve_format(
    backend: &(impl ImageBackend + ?Sized),
    url: &str,
    bytes: &[u8],
) -> Result<String> {
    extension_from_url(url)
        .map(|ext| encoder_name(&ext))
        .or_else(|| backend.sniff_format(bytes))
        .ok_or_else(|| NormalizeError::UnsupportedFormat(format!("cannot tell format of {url}")))
}

/// Plan the padding for `image` without executing it.
///
/// Returns `None` when the aspect ratio is already accepted.
pub fn plan_padding(image: &ImageBuffer, quality: Quality) -> Option<PadParams> {
    let AspectDecision::Resize { width, height } = image.decision() else {
        return None;
    };
    let (offset_x, offset_y) = centering_offset((width, height), image.dimensions());
    Some(PadParams {
        canvas_width: width,
        canvas_height: height,
        offset_x,
        offset_y,
        background: BACKGROUND_WHITE,
        format: image.format.clone(),
        quality,
    })
}

/// Letterbox `image` into the accepted aspect band.
///
/// Accepted images are returned untouched (same bytes). Otherwise the image
/// is pasted, centered, onto a white canvas of the target ratio and
/// re-encoded in its original format.
pub fn normalize(
    backend: &(impl ImageBackend + ?Sized),
    image: ImageBuffer,
    quality: Quality,
) -> Result<ImageBuffer> {
    let Some(params) = plan_padding(&image, quality) else {
        return Ok(image);
    };

    tracing::info!(
        from_width = image.width,
        from_height = image.height,
        to_width = params.canvas_width,
        to_height = params.canvas_height,
        "padding image to accepted aspect ratio"
    );
    let bytes = backend.pad(&image.bytes, &params)?;

    Ok(ImageBuffer {
        bytes,
        width: params.canvas_width,
        height: params.canvas_height,
        format: image.format,
    })
}
