//! Named background registry.
//!
//! Backgrounds are scenery images drawn under the captured frame. Each id in
//! the fixed set maps to `<dir>/<id>.jpg` (or `.png`); "none", unknown ids,
//! and missing files all resolve to no background so a stale selection can
//! never fail a capture.

use image::DynamicImage;
use std::path::{Path, PathBuf};

use crate::compositor::CompositionError;

/// Background id meaning "no background".
pub const NO_BACKGROUND: &str = "none";

/// The background ids the booth offers, in display order.
pub const BACKGROUND_IDS: [&str; 6] = ["none", "beach", "cityscape", "forest", "party", "space"];

/// Registry of background images rooted at a directory.
#[derive(Debug, Clone)]
pub struct BackgroundSet {
    dir: PathBuf,
}

impl BackgroundSet {
    /// Create a registry rooted at `dir`. The directory does not need to
    /// exist; lookups in a missing directory resolve to no background.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this registry reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check whether an id belongs to the offered set.
    pub fn is_known(id: &str) -> bool {
        BACKGROUND_IDS.contains(&id)
    }

    /// Resolve a background id to an image file path, if one exists.
    ///
    /// Tries `.jpg` then `.png`. Returns `None` for "none", unknown ids,
    /// and known ids whose file is absent.
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        if id == NO_BACKGROUND || !Self::is_known(id) {
            return None;
        }

        for ext in ["jpg", "png"] {
            let path = self.dir.join(format!("{}.{}", id, ext));
            if path.exists() {
                return Some(path);
            }
        }
        None
    }

    /// Load the background image for an id.
    ///
    /// `Ok(None)` means "compose without a background" (id is "none",
    /// unknown, or has no file). A file that exists but cannot be decoded is
    /// a `CompositionError`; callers fall back to the no-background path.
    pub fn load(&self, id: &str) -> Result<Option<DynamicImage>, CompositionError> {
        let Some(path) = self.resolve(id) else {
            if id != NO_BACKGROUND && Self::is_known(id) {
                log::debug!("background '{}' has no file under {:?}", id, self.dir);
            }
            return Ok(None);
        };

        match image::open(&path) {
            Ok(img) => Ok(Some(img)),
            Err(e) => Err(CompositionError::BadBackground {
                id: id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_id_set() {
        assert!(BackgroundSet::is_known("none"));
        assert!(BackgroundSet::is_known("beach"));
        assert!(BackgroundSet::is_known("space"));
        assert!(!BackgroundSet::is_known("volcano"));
        assert_eq!(BACKGROUND_IDS[0], NO_BACKGROUND);
    }

    #[test]
    fn test_resolve_none_is_always_empty() {
        let set = BackgroundSet::new("/nonexistent");
        assert!(set.resolve("none").is_none());
    }

    #[test]
    fn test_resolve_unknown_id() {
        let set = BackgroundSet::new("/nonexistent");
        assert!(set.resolve("volcano").is_none());
    }

    #[test]
    fn test_load_missing_file_is_no_background() {
        let set = BackgroundSet::new("/nonexistent");
        let result = set.load("beach").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_undecodable_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("beach.jpg"), b"not an image").unwrap();

        let set = BackgroundSet::new(dir.path());
        match set.load("beach") {
            Err(CompositionError::BadBackground { id, .. }) => assert_eq!(id, "beach"),
            other => panic!("Expected BadBackground, got {:?}", other),
        }
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        img.save(dir.path().join("beach.png")).unwrap();

        let set = BackgroundSet::new(dir.path());
        let loaded = set.load("beach").unwrap().expect("background should load");
        assert_eq!(loaded.to_rgb8().get_pixel(0, 0).0, [10, 20, 30]);
    }
}
