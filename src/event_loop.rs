//! Async event loop for the booth session.
//!
//! All work happens as a reaction to one of four sources: manual commands,
//! voice triggers, the once-per-second countdown tick, and the short smile
//! delay before the shot. `tokio::select!` keeps everything on one task, so
//! ordering is the event queue's and the session machine never needs a lock.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::backgrounds::BackgroundSet;
use crate::camera::{reacquire, CameraCapture, CameraSettings};
use crate::compositor::{encode_png, flatten, CompositionError};
use crate::filters::PhotoFilter;
use crate::gallery::GallerySink;
use crate::session::{BoothView, CountdownTick, ReviewShot, SelectionEffect, Session};

/// Seconds between countdown numbers.
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// How long the ready flash ("Smile!") stays up before the shot.
const SMILE_DELAY: Duration = Duration::from_millis(500);

/// Commands from the booth's manual controls.
#[derive(Debug, Clone, PartialEq)]
pub enum BoothCommand {
    /// Start a countdown capture
    Capture,
    /// Keep the reviewed photo
    Save,
    /// Discard the reviewed photo
    Retake,
    /// Change the display filter
    SelectFilter(PhotoFilter),
    /// Change the background
    SelectBackground(String),
    /// Toggle front/back camera
    SwitchCamera,
    /// Leave the booth
    Quit,
}

/// Run the booth until a `Quit` command or until every command source
/// closes. Returns the session in its final state.
///
/// `camera` may arrive as `None` (initial acquisition failed); the session
/// then starts with capture disabled and a camera switch retries.
pub async fn run<V, G>(
    mut session: Session,
    mut camera: Option<CameraCapture>,
    mut settings: CameraSettings,
    backgrounds: BackgroundSet,
    gallery: &mut G,
    view: &mut V,
    mut command_rx: mpsc::UnboundedReceiver<BoothCommand>,
    mut voice_rx: mpsc::UnboundedReceiver<()>,
) -> Session
where
    V: BoothView,
    G: GallerySink,
{
    session.set_capture_enabled(camera.is_some());

    let mut countdown = tokio::time::interval(COUNTDOWN_TICK);
    countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // The smile timer is armed only when a countdown finishes; until then
    // the branch below is disabled.
    let smile = tokio::time::sleep(SMILE_DELAY);
    tokio::pin!(smile);
    let mut smile_armed = false;

    // A degraded voice trigger closes its channel; the branch is then
    // disabled instead of spinning on a closed receiver
    let mut voice_open = true;

    loop {
        tokio::select! {
            maybe_command = command_rx.recv() => {
                let Some(command) = maybe_command else { break };
                match command {
                    BoothCommand::Capture => {
                        start_capture(&mut session, &mut countdown, view);
                    }
                    BoothCommand::Save => {
                        save_photo(&mut session, gallery, view);
                    }
                    BoothCommand::Retake => {
                        if session.retake() {
                            view.live();
                        }
                    }
                    BoothCommand::SelectFilter(filter) => {
                        if session.select_filter(filter) {
                            if let Some(shot) = session.review_shot() {
                                view.review(&shot.composite, filter);
                            }
                        }
                    }
                    BoothCommand::SelectBackground(id) => {
                        select_background(&mut session, &backgrounds, view, id);
                    }
                    BoothCommand::SwitchCamera => {
                        switch_camera(&mut session, &mut camera, &mut settings, view);
                    }
                    BoothCommand::Quit => break,
                }
            }

            // Voice triggers take the same guarded path as the button
            maybe_voice = voice_rx.recv(), if voice_open => {
                match maybe_voice {
                    Some(()) => start_capture(&mut session, &mut countdown, view),
                    // Trigger degraded; manual capture keeps working
                    None => voice_open = false,
                }
            }

            _ = countdown.tick() => {
                match session.tick_countdown() {
                    CountdownTick::Counting { remaining } => view.countdown(remaining),
                    CountdownTick::Smile => {
                        view.show_ready();
                        smile.as_mut().reset(Instant::now() + SMILE_DELAY);
                        smile_armed = true;
                    }
                    CountdownTick::Ignored => {}
                }
            }

            _ = &mut smile, if smile_armed => {
                smile_armed = false;
                if session.smile_elapsed() {
                    take_photo(&mut session, camera.as_ref(), &backgrounds, view);
                }
            }
        }
    }

    session
}

/// Start a countdown if the session allows it.
fn start_capture(session: &mut Session, countdown: &mut tokio::time::Interval, view: &mut impl BoothView) {
    if session.request_capture() {
        // Align the first tick one full second after the request
        countdown.reset();
        view.countdown(session.countdown_start());
    }
}

/// Snapshot a frame, compose it, and enter review.
fn take_photo(
    session: &mut Session,
    camera: Option<&CameraCapture>,
    backgrounds: &BackgroundSet,
    view: &mut impl BoothView,
) {
    let frame = camera.and_then(|c| c.get_frame());
    let Some(frame) = frame else {
        session.abort_capture();
        view.notice("The camera did not deliver a frame. Try again.");
        view.live();
        return;
    };

    let background = load_background(session, backgrounds, view);

    let shot = flatten(&frame, background.as_ref())
        .and_then(|pixels| Ok((encode_png(&pixels)?, pixels)))
        .map(|(composite, pixels)| ReviewShot {
            frame,
            pixels,
            composite,
        });

    match shot {
        Ok(shot) => {
            if session.publish_shot(shot) {
                if let Some(shot) = session.review_shot() {
                    view.review(&shot.composite, session.selection().filter);
                }
            }
        }
        Err(e) => {
            log::error!("composition failed: {}", e);
            session.abort_capture();
            view.notice("Could not compose the photo. Try again.");
            view.live();
        }
    }
}

/// Load the selected background, falling back to none on a bad file.
fn load_background(
    session: &Session,
    backgrounds: &BackgroundSet,
    view: &mut impl BoothView,
) -> Option<image::DynamicImage> {
    match backgrounds.load(&session.selection().background) {
        Ok(bg) => bg,
        Err(CompositionError::BadBackground { id, message }) => {
            log::warn!("background '{}' unusable: {}", id, message);
            view.notice(&format!(
                "Background '{}' could not be loaded; capturing without it.",
                id
            ));
            None
        }
        Err(e) => {
            log::warn!("background load failed: {}", e);
            None
        }
    }
}

/// Re-flatten the reviewed shot after a background change.
fn select_background(
    session: &mut Session,
    backgrounds: &BackgroundSet,
    view: &mut impl BoothView,
    id: String,
) {
    match session.select_background(id) {
        SelectionEffect::Recorded => {}
        SelectionEffect::Recompose => {
            let Some(frame) = session.review_shot().map(|s| s.frame.clone()) else {
                return;
            };
            let background = load_background(session, backgrounds, view);
            match flatten(&frame, background.as_ref())
                .and_then(|pixels| Ok((encode_png(&pixels)?, pixels)))
            {
                Ok((composite, pixels)) => {
                    session.update_composite(pixels, composite);
                    if let Some(shot) = session.review_shot() {
                        view.review(&shot.composite, session.selection().filter);
                    }
                }
                Err(e) => {
                    log::error!("re-composition failed: {}", e);
                    view.notice("Could not apply that background.");
                }
            }
        }
    }
}

/// Save the reviewed photo into the gallery.
fn save_photo(session: &mut Session, gallery: &mut impl GallerySink, view: &mut impl BoothView) {
    match session.save() {
        Ok(Some(saved)) => {
            gallery.add(saved.image, &saved.filename);
            view.photo_saved(&saved.filename);
            view.live();
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("save failed: {}", e);
            view.notice("Could not encode the photo; it is still in review.");
        }
    }
}

/// Toggle camera facing, releasing the old stream before acquiring.
fn switch_camera(
    session: &mut Session,
    camera: &mut Option<CameraCapture>,
    settings: &mut CameraSettings,
    view: &mut impl BoothView,
) {
    settings.facing = settings.facing.toggled();

    match reacquire(camera.take(), settings.clone()) {
        Ok(new_camera) => {
            log::info!(
                "switched to {} camera at {:?}",
                new_camera.facing(),
                new_camera.granted_resolution()
            );
            *camera = Some(new_camera);
            session.set_capture_enabled(true);
        }
        Err(e) => {
            // Old stream is already released; captures stay disabled until
            // a later switch succeeds
            session.set_capture_enabled(false);
            view.notice(&e.to_string());
        }
    }
}
