//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides whether
//! and how an image is padded) and the [`backend`](super::backend) (which does
//! the pixel work), so a mock backend can stand in during tests.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Canvas fill behind the padded image.
pub const BACKGROUND_WHITE: [u8; 3] = [255, 255, 255];

/// Full specification for a letterbox operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PadParams {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Where the source's top-left corner lands on the canvas.
    pub offset_x: u32,
    pub offset_y: u32,
    pub background: [u8; 3],
    /// Encoder name, e.g. `"jpeg"` or `"png"`.
    pub format: String,
    pub quality: Quality,
}
