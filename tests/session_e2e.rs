//! End-to-end tests for the booth session cycle.
//!
//! These drive the state machine the way the event loop does (request,
//! ticks, smile delay, publish, save/retake) and verify the observable
//! booth behavior: idempotent capture requests, the asymmetric selection
//! reset, sequential filenames, and stale-timer immunity.

use std::time::Instant;

use photobooth::camera::{Frame, FrameFormat};
use photobooth::compositor::{compose, encode_png, flatten};
use photobooth::filters::PhotoFilter;
use photobooth::gallery::{GallerySink, MemoryGallery};
use photobooth::session::{CountdownTick, Phase, ReviewShot, Session};

fn make_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..width * height {
        data.extend_from_slice(&rgb);
    }
    Frame {
        data,
        width,
        height,
        format: FrameFormat::Rgb,
        timestamp: Instant::now(),
    }
}

/// Compose a shot the way the event loop does after the smile delay.
fn make_shot(frame: Frame, background: Option<&image::DynamicImage>) -> ReviewShot {
    let pixels = flatten(&frame, background).unwrap();
    let composite = encode_png(&pixels).unwrap();
    ReviewShot {
        frame,
        pixels,
        composite,
    }
}

/// Run one full capture: request, countdown, smile, publish.
fn capture(session: &mut Session, background: Option<&image::DynamicImage>) {
    assert!(session.request_capture(), "capture should start from live");
    loop {
        match session.tick_countdown() {
            CountdownTick::Counting { .. } => {}
            CountdownTick::Smile => break,
            CountdownTick::Ignored => panic!("countdown tick ignored mid-capture"),
        }
    }
    assert!(session.smile_elapsed());
    let shot = make_shot(make_frame(4, 4, [50, 60, 70]), background);
    assert!(session.publish_shot(shot));
}

fn beach_background() -> image::DynamicImage {
    image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        16,
        16,
        image::Rgb([240, 220, 150]),
    ))
}

// ==================== Capture Guard Tests ====================

#[test]
fn test_capture_request_during_countdown_is_noop() {
    let mut session = Session::new();
    assert!(session.request_capture());

    let phase_before = *session.phase();
    assert!(!session.request_capture());
    assert_eq!(*session.phase(), phase_before, "no duplicate countdown");
}

#[test]
fn test_capture_request_during_review_is_noop() {
    let mut session = Session::new();
    capture(&mut session, None);
    assert_eq!(*session.phase(), Phase::Reviewing);

    assert!(!session.request_capture());
    assert_eq!(*session.phase(), Phase::Reviewing);
}

#[test]
fn test_voice_and_button_share_the_guard() {
    // Both triggers call the same entry point; a voice trigger during a
    // countdown started by the button is ignored like any duplicate.
    let mut session = Session::new();
    assert!(session.request_capture()); // button
    assert!(!session.request_capture()); // voice arrives mid-countdown
}

// ==================== Countdown Timing Tests ====================

#[test]
fn test_countdown_sequence() {
    let mut session = Session::new();
    session.request_capture();

    assert_eq!(
        session.tick_countdown(),
        CountdownTick::Counting { remaining: 2 }
    );
    assert_eq!(
        session.tick_countdown(),
        CountdownTick::Counting { remaining: 1 }
    );
    assert_eq!(session.tick_countdown(), CountdownTick::Smile);
    assert_eq!(*session.phase(), Phase::Smile);
}

#[test]
fn test_custom_countdown_length() {
    let mut session = Session::with_countdown(5);
    session.request_capture();
    assert_eq!(*session.phase(), Phase::CountingDown { remaining: 5 });

    let mut ticks = 0;
    while session.tick_countdown() != CountdownTick::Smile {
        ticks += 1;
        assert!(ticks < 10, "countdown never finished");
    }
    assert_eq!(ticks, 4, "5-second countdown takes 5 ticks to the flash");
}

#[test]
fn test_stale_tick_after_retake_does_not_restart() {
    let mut session = Session::new();
    capture(&mut session, None);
    session.retake();

    // A countdown timer that outlived the cycle fires now
    assert_eq!(session.tick_countdown(), CountdownTick::Ignored);
    assert!(!session.smile_elapsed());
    assert_eq!(*session.phase(), Phase::Live);
}

// ==================== Selection Reset Tests ====================

#[test]
fn test_retake_resets_filter_not_background() {
    let mut session = Session::new();
    session.select_background("forest");
    capture(&mut session, None);
    session.select_filter(PhotoFilter::Grayscale);

    assert!(session.retake());
    assert_eq!(session.selection().filter, PhotoFilter::None);
    assert_eq!(session.selection().background, "forest");
}

#[test]
fn test_save_also_resets_filter_not_background() {
    let mut session = Session::new();
    session.select_background("party");
    capture(&mut session, None);
    session.select_filter(PhotoFilter::Invert);

    session.save().unwrap().expect("save should produce a photo");
    assert_eq!(session.selection().filter, PhotoFilter::None);
    assert_eq!(session.selection().background, "party");
}

// ==================== Save Counter Tests ====================

#[test]
fn test_filenames_strictly_increase() {
    let mut session = Session::new();
    let mut gallery = MemoryGallery::new();

    for expected in 1..=4u32 {
        capture(&mut session, None);
        let saved = session.save().unwrap().unwrap();
        assert_eq!(saved.filename, format!("photobooth_{}", expected));
        gallery.add(saved.image, &saved.filename);
    }

    let names: Vec<_> = gallery.entries().iter().map(|e| &e.filename).collect();
    assert_eq!(
        names,
        ["photobooth_1", "photobooth_2", "photobooth_3", "photobooth_4"]
    );
}

#[test]
fn test_retake_does_not_consume_a_number() {
    let mut session = Session::new();

    capture(&mut session, None);
    session.retake();
    assert_eq!(session.next_photo_number(), 1);

    capture(&mut session, None);
    let saved = session.save().unwrap().unwrap();
    assert_eq!(saved.filename, "photobooth_1");
}

// ==================== Background Scenario Tests ====================

#[test]
fn test_beach_background_persists_across_photos() {
    // Select beach, capture, save; the reset keeps the background, so
    // photo #2 is also a beach photo without re-selecting.
    let beach = beach_background();
    let mut session = Session::new();
    let mut gallery = MemoryGallery::new();

    session.select_background("beach");
    capture(&mut session, Some(&beach));
    let first = session.save().unwrap().unwrap();
    gallery.add(first.image, &first.filename);
    assert_eq!(session.next_photo_number(), 2);

    // No re-selection; background must still be beach
    assert_eq!(session.selection().background, "beach");
    capture(&mut session, Some(&beach));
    let second = session.save().unwrap().unwrap();
    gallery.add(second.image, &second.filename);

    assert_eq!(gallery.len(), 2);
    assert_eq!(gallery.entries()[0].filename, "photobooth_1");
    assert_eq!(gallery.entries()[1].filename, "photobooth_2");
    assert_eq!(session.next_photo_number(), 3);
}

#[test]
fn test_last_background_before_capture_wins() {
    let mut session = Session::new();
    session.select_background("beach");
    session.select_background("space");
    // The machine records only the latest selection for the next capture
    assert_eq!(session.selection().background, "space");
}

// ==================== Filter Bake-In Tests ====================

#[test]
fn test_filter_does_not_change_composite_until_save() {
    let mut session = Session::new();
    capture(&mut session, None);

    let before = session.review_shot().unwrap().composite.clone();
    session.select_filter(PhotoFilter::Sepia);
    let after = session.review_shot().unwrap().composite.clone();
    assert_eq!(before, after, "selecting a filter must not rewrite bytes");

    let saved = session.save().unwrap().unwrap();
    assert_ne!(saved.image.png, before.png, "save bakes the filter in");
}

#[test]
fn test_saved_bytes_match_unfiltered_composite_when_no_filter() {
    let mut session = Session::new();
    capture(&mut session, None);
    let composite = session.review_shot().unwrap().composite.clone();

    let saved = session.save().unwrap().unwrap();
    assert_eq!(saved.image, composite);
}

#[test]
fn test_baked_filter_matches_direct_application() {
    let frame = make_frame(4, 4, [50, 60, 70]);
    let mut session = Session::new();

    session.request_capture();
    while session.tick_countdown() != CountdownTick::Smile {}
    session.smile_elapsed();
    session.publish_shot(make_shot(frame.clone(), None));
    session.select_filter(PhotoFilter::Grayscale);

    let saved = session.save().unwrap().unwrap();

    // The same transform applied by hand produces the same bytes
    let pixels = flatten(&frame, None).unwrap();
    let expected = encode_png(&PhotoFilter::Grayscale.apply(&pixels)).unwrap();
    assert_eq!(saved.image, expected);
}

// ==================== Composite Consistency Tests ====================

#[test]
fn test_reviewed_composite_equals_compose_output() {
    let frame = make_frame(6, 4, [10, 20, 30]);
    let beach = beach_background();

    let mut session = Session::new();
    session.select_background("beach");
    session.request_capture();
    while session.tick_countdown() != CountdownTick::Smile {}
    session.smile_elapsed();
    session.publish_shot(make_shot(frame.clone(), Some(&beach)));

    let expected = compose(&frame, Some(&beach)).unwrap();
    assert_eq!(session.review_shot().unwrap().composite, expected);
}
