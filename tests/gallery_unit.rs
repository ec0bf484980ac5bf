//! Tests for the gallery sinks and the save hand-off.

use std::time::Instant;

use photobooth::camera::{Frame, FrameFormat};
use photobooth::compositor::{encode_png, flatten};
use photobooth::gallery::{DirGallery, GallerySink, MemoryGallery};
use photobooth::session::{CountdownTick, ReviewShot, Session};

fn make_frame(width: u32, height: u32) -> Frame {
    Frame {
        data: vec![80; (width * height * 3) as usize],
        width,
        height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    }
}

fn capture(session: &mut Session) {
    assert!(session.request_capture());
    while session.tick_countdown() != CountdownTick::Smile {}
    assert!(session.smile_elapsed());
    let frame = make_frame(4, 4);
    let pixels = flatten(&frame, None).unwrap();
    let composite = encode_png(&pixels).unwrap();
    assert!(session.publish_shot(ReviewShot {
        frame,
        pixels,
        composite,
    }));
}

#[test]
fn test_saved_photos_land_in_dir_gallery() {
    let dir = tempfile::tempdir().unwrap();
    let mut gallery = DirGallery::new(dir.path());
    let mut session = Session::new();

    capture(&mut session);
    let saved = session.save().unwrap().unwrap();
    gallery.add(saved.image.clone(), &saved.filename);

    let path = dir.path().join("photobooth_1.png");
    assert!(path.exists());

    // Round-trips as a valid PNG with the composite's dimensions
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes, saved.image.png);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!(decoded.width(), saved.image.width);
    assert_eq!(decoded.height(), saved.image.height);
}

#[test]
fn test_gallery_accumulates_without_mutation() {
    let mut gallery = MemoryGallery::new();
    let mut session = Session::new();

    capture(&mut session);
    let first = session.save().unwrap().unwrap();
    let first_bytes = first.image.png.clone();
    gallery.add(first.image, &first.filename);

    capture(&mut session);
    let second = session.save().unwrap().unwrap();
    gallery.add(second.image, &second.filename);

    // Earlier entries are untouched by later saves
    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery.entries()[0].image.png, first_bytes);
    assert_eq!(gallery.entries()[0].filename, "photobooth_1");
    assert_eq!(gallery.entries()[1].filename, "photobooth_2");
}

#[test]
fn test_suggested_filename_has_no_extension() {
    let mut session = Session::new();
    capture(&mut session);
    let saved = session.save().unwrap().unwrap();

    // The core suggests a bare name; sinks append their own extension
    assert_eq!(saved.filename, "photobooth_1");
    assert!(!saved.filename.contains('.'));
}
