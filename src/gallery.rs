//! Gallery sink for finished photos.
//!
//! The session hands each saved photo to a [`GallerySink`] together with its
//! suggested `photobooth_<N>` name and never hears back: a sink that fails
//! logs the problem itself and the session moves on.

use std::path::{Path, PathBuf};

use crate::compositor::CompositeImage;

/// Receives finished photos. Fire-and-forget from the session's view.
pub trait GallerySink {
    /// Take ownership of a finished photo.
    ///
    /// `suggested_filename` has no extension; the sink appends whatever
    /// matches its storage.
    fn add(&mut self, image: CompositeImage, suggested_filename: &str);
}

/// One photo retained by an in-memory gallery.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    /// Suggested filename the photo arrived under
    pub filename: String,
    /// The photo itself
    pub image: CompositeImage,
}

/// Gallery that keeps photos in memory, in arrival order.
///
/// This is the in-page gallery: photos live for the session and are never
/// removed by the core.
#[derive(Debug, Default)]
pub struct MemoryGallery {
    entries: Vec<GalleryEntry>,
}

impl MemoryGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// All photos, oldest first.
    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Number of photos held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GallerySink for MemoryGallery {
    fn add(&mut self, image: CompositeImage, suggested_filename: &str) {
        self.entries.push(GalleryEntry {
            filename: suggested_filename.to_string(),
            image,
        });
    }
}

/// Gallery that writes each photo as `<name>.png` into a directory.
///
/// The directory is created on first use. Write failures are logged and
/// dropped; a full disk must not take down the booth.
#[derive(Debug, Clone)]
pub struct DirGallery {
    dir: PathBuf,
}

impl DirGallery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory photos are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, image: &CompositeImage, name: &str) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}.png", name));
        std::fs::write(&path, &image.png)?;
        Ok(path)
    }
}

impl GallerySink for DirGallery {
    fn add(&mut self, image: CompositeImage, suggested_filename: &str) {
        match self.write(&image, suggested_filename) {
            Ok(path) => log::info!("photo written to {:?}", path),
            Err(e) => log::error!("failed to write {}: {}", suggested_filename, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_image() -> CompositeImage {
        CompositeImage {
            png: vec![1, 2, 3, 4],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn test_memory_gallery_keeps_arrival_order() {
        let mut gallery = MemoryGallery::new();
        assert!(gallery.is_empty());

        gallery.add(tiny_image(), "photobooth_1");
        gallery.add(tiny_image(), "photobooth_2");

        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.entries()[0].filename, "photobooth_1");
        assert_eq!(gallery.entries()[1].filename, "photobooth_2");
    }

    #[test]
    fn test_dir_gallery_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut gallery = DirGallery::new(dir.path());

        gallery.add(tiny_image(), "photobooth_1");

        let path = dir.path().join("photobooth_1.png");
        assert!(path.exists());
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_dir_gallery_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("photos/today");
        let mut gallery = DirGallery::new(&nested);

        gallery.add(tiny_image(), "photobooth_1");
        assert!(nested.join("photobooth_1.png").exists());
    }

    #[test]
    fn test_dir_gallery_write_failure_does_not_panic() {
        // A file where the directory should be makes create_dir_all fail
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"file in the way").unwrap();

        let mut gallery = DirGallery::new(&blocked);
        gallery.add(tiny_image(), "photobooth_1"); // must not panic
    }
}
