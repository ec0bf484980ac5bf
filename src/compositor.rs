//! Compositing of captured frames over background images.
//!
//! The compositor flattens one capture into one image: the background (if
//! any) is scaled to the frame's dimensions and drawn first, then the frame
//! is drawn over it fully opaque. Nothing is keyed out of the frame; the
//! overlay covers the full canvas. Output dimensions always follow the
//! frame, which carries the resolution the camera actually granted.
//!
//! Both layers are decoded and drawn before anything is published, so a
//! caller can never observe a half-composed canvas.

use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

use crate::camera::Frame;

/// A flattened, PNG-encoded photo ready for the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeImage {
    /// PNG-encoded bytes
    pub png: Vec<u8>,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
}

/// Errors that can occur while composing a photo.
#[derive(Debug)]
pub enum CompositionError {
    /// Frame buffer does not match its declared dimensions
    BadFrame(String),
    /// Background file exists but cannot be decoded
    BadBackground { id: String, message: String },
    /// PNG encoding failed
    EncodeFailed(String),
}

impl std::fmt::Display for CompositionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositionError::BadFrame(msg) => write!(f, "Invalid camera frame: {}", msg),
            CompositionError::BadBackground { id, message } => {
                write!(f, "Background '{}' could not be decoded: {}", id, message)
            }
            CompositionError::EncodeFailed(msg) => write!(f, "Failed to encode photo: {}", msg),
        }
    }
}

impl std::error::Error for CompositionError {}

/// Flatten a frame over an optional background into raw pixels.
///
/// With no background the result is exactly the frame's pixels. With a
/// background, the background is scaled to the frame's dimensions and drawn
/// under the frame; the frame is opaque, so it covers the whole canvas (a
/// full overlay, not a cut-out).
pub fn flatten(
    frame: &Frame,
    background: Option<&DynamicImage>,
) -> Result<RgbImage, CompositionError> {
    let expected = frame.width as usize * frame.height as usize * frame.bytes_per_pixel();
    if frame.data.len() != expected {
        return Err(CompositionError::BadFrame(format!(
            "{}x{} frame carries {} bytes, expected {}",
            frame.width,
            frame.height,
            frame.data.len(),
            expected
        )));
    }

    let frame_img = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(
        || CompositionError::BadFrame("frame buffer rejected by image container".to_string()),
    )?;

    let Some(background) = background else {
        return Ok(frame_img);
    };

    // Background under, frame over, both at the frame's dimensions
    let mut canvas = background
        .resize_exact(frame.width, frame.height, FilterType::Triangle)
        .to_rgb8();
    image::imageops::overlay(&mut canvas, &frame_img, 0, 0);

    Ok(canvas)
}

/// Encode flattened pixels as a PNG composite.
pub fn encode_png(pixels: &RgbImage) -> Result<CompositeImage, CompositionError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CompositionError::EncodeFailed(e.to_string()))?;

    Ok(CompositeImage {
        png,
        width: pixels.width(),
        height: pixels.height(),
    })
}

/// Flatten and encode in one step.
///
/// Deterministic: identical frame and background bytes produce identical
/// composite bytes. With `background == None` the output is byte-identical
/// to a direct re-encode of the frame.
pub fn compose(
    frame: &Frame,
    background: Option<&DynamicImage>,
) -> Result<CompositeImage, CompositionError> {
    let pixels = flatten(frame, background)?;
    encode_png(&pixels)
}
