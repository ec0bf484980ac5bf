//! Session state machine for the capture/composite/review cycle.

use image::RgbImage;

use crate::camera::Frame;
use crate::compositor::{encode_png, CompositeImage, CompositionError};
use crate::filters::PhotoFilter;

use super::selection::Selection;

/// Seconds shown when a countdown begins.
pub const COUNTDOWN_START: u32 = 3;

/// The booth's visible mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Live camera preview; capture can be requested
    Live,
    /// Counting down to the shot; `remaining` is the number on screen
    CountingDown { remaining: u32 },
    /// The ready flash ("Smile!") between the countdown and the shot
    Smile,
    /// The instant of capture, while the frame is snapshotted and composed
    Capturing,
    /// A composed photo is on screen awaiting save or retake
    Reviewing,
}

/// What a countdown tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownTick {
    /// Tick arrived outside a countdown (stale timer); nothing happened
    Ignored,
    /// Countdown advanced; `remaining` is the new number to show
    Counting { remaining: u32 },
    /// Countdown finished; show the ready flash and arm the smile delay
    Smile,
}

/// What a background selection requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    /// Recorded for the next capture; nothing on screen changes
    Recorded,
    /// A photo is in review; re-compose it with the new background
    Recompose,
}

/// The raw frame and composite currently under review.
///
/// Exactly one of these exists at a time, owned by the session. The pixels
/// are retained so a background change in review can re-flatten and a save
/// can bake the filter without decoding the PNG again.
#[derive(Debug, Clone)]
pub struct ReviewShot {
    /// The frame as captured
    pub frame: Frame,
    /// Flattened (background + frame) pixels, unfiltered
    pub pixels: RgbImage,
    /// PNG encoding of `pixels`
    pub composite: CompositeImage,
}

/// A saved photo on its way to the gallery.
#[derive(Debug, Clone)]
pub struct SavedPhoto {
    /// Final image bytes, filter baked in if one was active
    pub image: CompositeImage,
    /// Suggested filename, `photobooth_<N>`
    pub filename: String,
}

/// The photo-booth session state machine.
///
/// Owns the phase, the selection, the photo counter, and the shot in
/// review. All timing lives outside: the event loop calls
/// [`tick_countdown`](Session::tick_countdown) once per countdown second
/// and [`smile_elapsed`](Session::smile_elapsed) after the ready flash.
/// Ticks landing in the wrong phase are ignored, so a timer that outlives
/// a reset cannot corrupt the session.
#[derive(Debug)]
pub struct Session {
    phase: Phase,
    selection: Selection,
    /// Seconds a countdown starts from
    countdown_start: u32,
    /// Number the next saved photo gets; starts at 1, never reused
    next_photo: u32,
    /// False while the camera is unavailable; capture requests are refused
    capture_enabled: bool,
    shot: Option<ReviewShot>,
}

impl Session {
    /// Create a session in live view with default selections.
    pub fn new() -> Self {
        Self::with_countdown(COUNTDOWN_START)
    }

    /// Create a session whose countdowns start from `seconds`.
    ///
    /// Zero is clamped to one so a capture always shows at least one
    /// countdown number before the ready flash.
    pub fn with_countdown(seconds: u32) -> Self {
        Self {
            phase: Phase::Live,
            selection: Selection::default(),
            countdown_start: seconds.max(1),
            next_photo: 1,
            capture_enabled: true,
            shot: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Current filter/background selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The number the next saved photo will get.
    pub fn next_photo_number(&self) -> u32 {
        self.next_photo
    }

    /// Whether capture requests are currently honored.
    pub fn capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Enable or disable capture, e.g. while the camera is unavailable.
    ///
    /// Disabling never aborts a countdown already underway; it only refuses
    /// new requests.
    pub fn set_capture_enabled(&mut self, enabled: bool) {
        self.capture_enabled = enabled;
    }

    /// The shot under review, if any.
    pub fn review_shot(&self) -> Option<&ReviewShot> {
        self.shot.as_ref()
    }

    /// Request a capture (button press or voice trigger).
    ///
    /// Starts the countdown only from live view with capture enabled;
    /// duplicate requests while counting down, flashing, capturing, or
    /// reviewing are ignored. Returns whether a countdown started.
    pub fn request_capture(&mut self) -> bool {
        if self.phase != Phase::Live || !self.capture_enabled {
            log::debug!("capture request ignored in phase {:?}", self.phase);
            return false;
        }

        self.phase = Phase::CountingDown {
            remaining: self.countdown_start,
        };
        log::info!("countdown started at {}", self.countdown_start);
        true
    }

    /// Seconds a countdown starts from.
    pub fn countdown_start(&self) -> u32 {
        self.countdown_start
    }

    /// Advance the countdown by one second.
    ///
    /// Outside a countdown this is a no-op (`Ignored`), which is what makes
    /// a stale timer harmless: after any reset the phase has moved on and
    /// the late tick falls through here.
    pub fn tick_countdown(&mut self) -> CountdownTick {
        let Phase::CountingDown { remaining } = self.phase else {
            return CountdownTick::Ignored;
        };

        let remaining = remaining.saturating_sub(1);
        if remaining == 0 {
            self.phase = Phase::Smile;
            log::info!("countdown finished, showing ready flash");
            CountdownTick::Smile
        } else {
            self.phase = Phase::CountingDown { remaining };
            CountdownTick::Counting { remaining }
        }
    }

    /// The ready flash has been on screen for its delay; take the shot now.
    ///
    /// Returns true exactly once per capture cycle. A duplicate or stale
    /// smile timer finds the phase already moved to `Capturing` and gets
    /// false.
    pub fn smile_elapsed(&mut self) -> bool {
        if self.phase != Phase::Smile {
            return false;
        }
        self.phase = Phase::Capturing;
        true
    }

    /// Publish the composed shot and enter review.
    ///
    /// Only valid while `Capturing`; the shot is dropped otherwise (a reset
    /// happened while the frame was being composed).
    pub fn publish_shot(&mut self, shot: ReviewShot) -> bool {
        if self.phase != Phase::Capturing {
            log::warn!("composed shot discarded, phase is {:?}", self.phase);
            return false;
        }
        self.shot = Some(shot);
        self.phase = Phase::Reviewing;
        log::info!("photo in review");
        true
    }

    /// Abort a capture in progress (camera gave no frame) and return to
    /// live view.
    pub fn abort_capture(&mut self) {
        if matches!(self.phase, Phase::Smile | Phase::Capturing) {
            log::warn!("capture aborted in phase {:?}", self.phase);
            self.enter_live();
        }
    }

    /// Select a display filter.
    ///
    /// Always recorded. Returns true when a photo is in review, meaning the
    /// preview's display transform should update; the composite bytes never
    /// change here.
    pub fn select_filter(&mut self, filter: PhotoFilter) -> bool {
        self.selection.filter = filter;
        self.phase == Phase::Reviewing
    }

    /// Select a background.
    ///
    /// While live (or counting down) the choice simply applies to the next
    /// capture. While reviewing, the shot on screen must be re-flattened
    /// with the new background; the caller re-composes and calls
    /// [`update_composite`](Session::update_composite).
    pub fn select_background(&mut self, id: impl Into<String>) -> SelectionEffect {
        self.selection.background = id.into();
        if self.phase == Phase::Reviewing {
            SelectionEffect::Recompose
        } else {
            SelectionEffect::Recorded
        }
    }

    /// Replace the reviewed shot's flattened pixels and composite after a
    /// background change in review.
    pub fn update_composite(&mut self, pixels: RgbImage, composite: CompositeImage) {
        if let Some(shot) = self.shot.as_mut() {
            shot.pixels = pixels;
            shot.composite = composite;
        }
    }

    /// Discard the reviewed shot and return to live view.
    ///
    /// Returns false outside review. The filter resets to none; the
    /// background selection survives for the next photo.
    pub fn retake(&mut self) -> bool {
        if self.phase != Phase::Reviewing {
            return false;
        }
        log::info!("retake, discarding reviewed photo");
        self.enter_live();
        true
    }

    /// Save the reviewed shot and return to live view.
    ///
    /// Bakes the active filter into the pixels (so the saved image matches
    /// the preview), assigns the next `photobooth_<N>` name, and bumps the
    /// counter. On encode failure the session stays in review so the photo
    /// is not lost.
    pub fn save(&mut self) -> Result<Option<SavedPhoto>, CompositionError> {
        if self.phase != Phase::Reviewing {
            return Ok(None);
        }
        let Some(shot) = self.shot.as_ref() else {
            return Ok(None);
        };

        let image = if self.selection.filter.is_active() {
            encode_png(&self.selection.filter.apply(&shot.pixels))?
        } else {
            shot.composite.clone()
        };

        let filename = format!("photobooth_{}", self.next_photo);
        self.next_photo += 1;
        log::info!("saved {}", filename);
        self.enter_live();

        Ok(Some(SavedPhoto { image, filename }))
    }

    fn enter_live(&mut self) {
        self.shot = None;
        self.selection.reset_for_live();
        self.phase = Phase::Live;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FrameFormat;
    use crate::compositor::flatten;
    use std::time::Instant;

    fn test_frame() -> Frame {
        Frame {
            data: vec![100; 2 * 2 * 3],
            width: 2,
            height: 2,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    fn test_shot() -> ReviewShot {
        let frame = test_frame();
        let pixels = flatten(&frame, None).unwrap();
        let composite = encode_png(&pixels).unwrap();
        ReviewShot {
            frame,
            pixels,
            composite,
        }
    }

    /// Drive a session from live view all the way into review.
    fn capture_to_review(session: &mut Session) {
        assert!(session.request_capture());
        assert_eq!(
            session.tick_countdown(),
            CountdownTick::Counting { remaining: 2 }
        );
        assert_eq!(
            session.tick_countdown(),
            CountdownTick::Counting { remaining: 1 }
        );
        assert_eq!(session.tick_countdown(), CountdownTick::Smile);
        assert!(session.smile_elapsed());
        assert!(session.publish_shot(test_shot()));
    }

    #[test]
    fn test_new_session_is_live() {
        let session = Session::new();
        assert_eq!(*session.phase(), Phase::Live);
        assert_eq!(session.next_photo_number(), 1);
        assert!(session.capture_enabled());
        assert!(session.review_shot().is_none());
    }

    #[test]
    fn test_capture_runs_full_cycle() {
        let mut session = Session::new();
        capture_to_review(&mut session);
        assert_eq!(*session.phase(), Phase::Reviewing);
        assert!(session.review_shot().is_some());
    }

    #[test]
    fn test_capture_request_guard() {
        let mut session = Session::new();
        assert!(session.request_capture());

        // Duplicate requests are no-ops in every non-live phase
        assert!(!session.request_capture());
        assert_eq!(
            *session.phase(),
            Phase::CountingDown {
                remaining: COUNTDOWN_START
            }
        );

        session.tick_countdown();
        session.tick_countdown();
        session.tick_countdown();
        assert_eq!(*session.phase(), Phase::Smile);
        assert!(!session.request_capture());

        session.smile_elapsed();
        assert!(!session.request_capture());

        session.publish_shot(test_shot());
        assert!(!session.request_capture());
        assert_eq!(*session.phase(), Phase::Reviewing);
    }

    #[test]
    fn test_capture_refused_while_disabled() {
        let mut session = Session::new();
        session.set_capture_enabled(false);
        assert!(!session.request_capture());
        assert_eq!(*session.phase(), Phase::Live);

        session.set_capture_enabled(true);
        assert!(session.request_capture());
    }

    #[test]
    fn test_stale_countdown_tick_is_ignored() {
        let mut session = Session::new();
        assert_eq!(session.tick_countdown(), CountdownTick::Ignored);

        capture_to_review(&mut session);
        assert_eq!(session.tick_countdown(), CountdownTick::Ignored);

        session.retake();
        // A timer that survived the reset lands in live view and does nothing
        assert_eq!(session.tick_countdown(), CountdownTick::Ignored);
        assert_eq!(*session.phase(), Phase::Live);
    }

    #[test]
    fn test_stale_smile_timer_fires_once() {
        let mut session = Session::new();
        session.request_capture();
        session.tick_countdown();
        session.tick_countdown();
        session.tick_countdown();

        assert!(session.smile_elapsed());
        assert!(!session.smile_elapsed(), "second smile timer must be inert");
    }

    #[test]
    fn test_publish_after_reset_discards_shot() {
        let mut session = Session::new();
        session.request_capture();
        session.tick_countdown();
        session.tick_countdown();
        session.tick_countdown();
        session.smile_elapsed();

        // Session reset while composition was in flight
        session.abort_capture();
        assert_eq!(*session.phase(), Phase::Live);

        assert!(!session.publish_shot(test_shot()));
        assert!(session.review_shot().is_none());
    }

    #[test]
    fn test_retake_resets_filter_keeps_background() {
        let mut session = Session::new();
        session.select_background("beach");
        capture_to_review(&mut session);
        session.select_filter(PhotoFilter::Sepia);

        assert!(session.retake());
        assert_eq!(*session.phase(), Phase::Live);
        assert_eq!(session.selection().filter, PhotoFilter::None);
        assert_eq!(session.selection().background, "beach");
        assert!(session.review_shot().is_none());
    }

    #[test]
    fn test_retake_outside_review_is_noop() {
        let mut session = Session::new();
        assert!(!session.retake());
        session.request_capture();
        assert!(!session.retake());
    }

    #[test]
    fn test_save_increments_counter_and_names_sequentially() {
        let mut session = Session::new();

        capture_to_review(&mut session);
        let first = session.save().unwrap().expect("first save");
        assert_eq!(first.filename, "photobooth_1");
        assert_eq!(session.next_photo_number(), 2);
        assert_eq!(*session.phase(), Phase::Live);

        capture_to_review(&mut session);
        let second = session.save().unwrap().expect("second save");
        assert_eq!(second.filename, "photobooth_2");
        assert_eq!(session.next_photo_number(), 3);
    }

    #[test]
    fn test_save_outside_review_is_noop() {
        let mut session = Session::new();
        assert!(session.save().unwrap().is_none());
        assert_eq!(session.next_photo_number(), 1);
    }

    #[test]
    fn test_save_without_filter_reuses_composite_bytes() {
        let mut session = Session::new();
        capture_to_review(&mut session);
        let composite = session.review_shot().unwrap().composite.clone();

        let saved = session.save().unwrap().unwrap();
        assert_eq!(saved.image, composite);
    }

    #[test]
    fn test_save_bakes_active_filter() {
        let mut session = Session::new();
        capture_to_review(&mut session);
        let unfiltered = session.review_shot().unwrap().composite.clone();

        session.select_filter(PhotoFilter::Invert);
        // Selecting a filter never rewrites the reviewed composite...
        assert_eq!(session.review_shot().unwrap().composite, unfiltered);

        // ...but saving bakes it into the emitted bytes
        let saved = session.save().unwrap().unwrap();
        assert_ne!(saved.image.png, unfiltered.png);
    }

    #[test]
    fn test_background_selection_effects() {
        let mut session = Session::new();
        assert_eq!(session.select_background("beach"), SelectionEffect::Recorded);

        capture_to_review(&mut session);
        assert_eq!(
            session.select_background("space"),
            SelectionEffect::Recompose
        );
        assert_eq!(session.selection().background, "space");
    }

    #[test]
    fn test_filter_selection_reports_preview_refresh() {
        let mut session = Session::new();
        assert!(!session.select_filter(PhotoFilter::Sepia));

        capture_to_review(&mut session);
        assert!(session.select_filter(PhotoFilter::Grayscale));
    }

    #[test]
    fn test_disable_does_not_abort_running_countdown() {
        let mut session = Session::new();
        session.request_capture();
        session.set_capture_enabled(false);
        assert_eq!(
            session.tick_countdown(),
            CountdownTick::Counting { remaining: 2 }
        );
    }
}
