//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations the normalizer needs:
//! identify, sniff_format, and pad. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Everything works on in-memory encoded bytes; nothing touches disk.

use super::params::PadParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Read pixel dimensions from encoded bytes.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, NormalizeError>;

    /// Encoder name guessed from the byte signature, if recognised.
    fn sniff_format(&self, bytes: &[u8]) -> Option<String>;

    /// Decode, paste onto a filled canvas, and re-encode.
    fn pad(&self, bytes: &[u8], params: &PadParams) -> Result<Vec<u8>, NormalizeError>;
}
