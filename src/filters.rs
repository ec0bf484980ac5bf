//! Display filters for the photo preview.
//!
//! A filter is a named color transform the viewer applies to the preview
//! while a photo is in review. The composite image itself stays unfiltered;
//! saving bakes the active filter into the pixels (matching what the user
//! sees in the preview at that moment).

use image::RgbImage;

/// Named color filter that can be applied to a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoFilter {
    /// No color transform, the photo as captured
    #[default]
    None,
    /// Luminance-weighted grayscale
    Grayscale,
    /// Warm brown sepia tone
    Sepia,
    /// Negative (each channel inverted)
    Invert,
}

impl PhotoFilter {
    /// Parse a filter name from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "grayscale" | "greyscale" => Some(Self::Grayscale),
            "sepia" => Some(Self::Sepia),
            "invert" => Some(Self::Invert),
            _ => None,
        }
    }

    /// Check if this filter changes any pixels.
    pub fn is_active(&self) -> bool {
        *self != Self::None
    }

    /// Apply the filter to an image, producing the transformed pixels.
    ///
    /// `None` returns the input unchanged. The coefficient sets follow the
    /// CSS filter definitions so the baked result matches the preview.
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        match self {
            Self::None => img.clone(),
            Self::Grayscale => map_pixels(img, |[r, g, b]| {
                let luma = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;
                let y = clamp_channel(luma);
                [y, y, y]
            }),
            Self::Sepia => map_pixels(img, |[r, g, b]| {
                let (r, g, b) = (r as f32, g as f32, b as f32);
                [
                    clamp_channel(0.393 * r + 0.769 * g + 0.189 * b),
                    clamp_channel(0.349 * r + 0.686 * g + 0.168 * b),
                    clamp_channel(0.272 * r + 0.534 * g + 0.131 * b),
                ]
            }),
            Self::Invert => map_pixels(img, |[r, g, b]| [255 - r, 255 - g, 255 - b]),
        }
    }
}

impl std::fmt::Display for PhotoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Grayscale => write!(f, "grayscale"),
            Self::Sepia => write!(f, "sepia"),
            Self::Invert => write!(f, "invert"),
        }
    }
}

/// All filters the booth offers, in display order.
pub const ALL_FILTERS: [PhotoFilter; 4] = [
    PhotoFilter::None,
    PhotoFilter::Grayscale,
    PhotoFilter::Sepia,
    PhotoFilter::Invert,
];

fn map_pixels(img: &RgbImage, f: impl Fn([u8; 3]) -> [u8; 3]) -> RgbImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0 = f(pixel.0);
    }
    out
}

fn clamp_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
