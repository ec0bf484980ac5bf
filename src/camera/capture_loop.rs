//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::frame_utils::{convert_to_rgb, mirror_horizontal};
use super::types::{CameraError, CameraSettings, Frame, Resolution};

/// Commands sent to the capture thread.
pub enum CaptureCommand {
    Stop,
}

/// Run the capture loop in a background thread.
///
/// Opens the camera at `device_index`, reports the granted resolution back
/// through `info_tx`, then keeps the latest decoded frame in `buffer` until
/// stopped.
pub fn run_capture_loop(
    device_index: u32,
    settings: CameraSettings,
    buffer: Arc<Mutex<Option<Frame>>>,
    stop: Arc<AtomicBool>,
    rx: Receiver<CaptureCommand>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CameraError::StreamFailed(e.to_string())));
        return;
    }

    // Report back what the camera actually granted
    let res = camera.resolution();
    let granted = Resolution {
        width: res.width(),
        height: res.height(),
    };
    let granted_fps = camera.frame_rate();
    let _ = info_tx.send(Ok((granted, granted_fps)));

    let mirror = settings.mirror_active();

    while !stop.load(Ordering::Relaxed) {
        if let Ok(CaptureCommand::Stop) = rx.try_recv() {
            break;
        }

        if let Ok(raw_frame) = camera.frame() {
            if let Some(mut frame) = convert_to_rgb(&raw_frame) {
                if mirror {
                    mirror_horizontal(&mut frame);
                }

                if let Ok(mut buf) = buffer.lock() {
                    *buf = Some(frame);
                }
            }
            // Conversion failures skip the frame; the next one replaces it
        }

        // Small sleep to allow checking the stop signal
        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
}

/// Try to open a camera, stepping through format preferences.
///
/// NV12 first (native on macOS), then MJPEG (widely supported), then
/// whatever highest-resolution mode the camera offers. The booth asks for
/// its requested resolution but accepts the closest grant.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    let requested_res =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);

    let closest = |format: NokhwaFrameFormat| {
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_res,
            format,
            settings.fps,
        )))
    };

    let attempts = [
        closest(NokhwaFrameFormat::NV12),
        closest(NokhwaFrameFormat::MJPEG),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(camera) => return Ok(camera),
            Err(e) => last_error = Some(e),
        }
    }

    let e = last_error.unwrap();
    Err(classify_open_error(&e.to_string()))
}

/// Distinguish permission refusals from other open failures.
fn classify_open_error(message: &str) -> CameraError {
    let msg = message.to_lowercase();
    let denied = ["permission", "denied", "authorization", "access"]
        .iter()
        .any(|needle| msg.contains(needle));

    if denied {
        CameraError::PermissionDenied
    } else {
        CameraError::OpenFailed(message.to_string())
    }
}
