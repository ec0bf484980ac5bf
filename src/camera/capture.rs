//! Camera capture handle and public API.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, CaptureCommand};
use super::device::{device_for_facing, list_devices};
use super::types::{CameraError, CameraSettings, Facing, Frame, Resolution};

/// Handle to a camera stream.
///
/// The camera runs a background thread that continuously captures frames and
/// stores the latest one in a shared buffer. `acquire()` resolves the device
/// for the requested facing mode, `start()` opens the stream, and
/// `get_frame()` snapshots the most recent frame.
///
/// The stream has single-writer semantics: there is never more than one
/// active stream per handle, and `switch_facing` releases the old stream
/// completely before the replacement is acquired.
pub struct CameraCapture {
    /// Latest captured frame (shared with capture thread)
    frame_buffer: Arc<Mutex<Option<Frame>>>,
    /// Capture thread handle
    capture_thread: Option<JoinHandle<()>>,
    /// Channel to send commands to capture thread
    command_tx: Option<Sender<CaptureCommand>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Current settings
    settings: CameraSettings,
    /// Device index resolved from the facing mode
    device_index: u32,
    /// Granted resolution (set after the stream opens)
    granted_resolution: Option<Resolution>,
    /// Granted FPS (set after the stream opens)
    granted_fps: Option<u32>,
}

impl std::fmt::Debug for CameraCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraCapture")
            .field("settings", &self.settings)
            .field("device_index", &self.device_index)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraCapture {
    /// Acquire a camera for the requested facing mode.
    ///
    /// Resolves and validates the device but does not open the stream until
    /// `start()` is called; the camera itself is opened inside the
    /// background thread to avoid thread-safety issues.
    ///
    /// # Errors
    /// * `CameraError::NoDevices` - no cameras on the system
    /// * `CameraError::NoFacingDevice` - no device for the requested facing
    pub fn acquire(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        let device_index = device_for_facing(&devices, settings.facing)?;

        Ok(Self {
            frame_buffer: Arc::new(Mutex::new(None)),
            capture_thread: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            device_index,
            granted_resolution: None,
            granted_fps: None,
        })
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Which way this camera points.
    pub fn facing(&self) -> Facing {
        self.settings.facing
    }

    /// The resolution the camera actually granted.
    ///
    /// Returns `None` until the stream has been started. May differ from the
    /// requested resolution; composite output follows this value.
    pub fn granted_resolution(&self) -> Option<Resolution> {
        self.granted_resolution
    }

    /// The frame rate the camera actually granted.
    pub fn granted_fps(&self) -> Option<u32> {
        self.granted_fps
    }

    /// Start capturing frames in a background thread.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - capture is already running
    /// * `CameraError::StreamFailed` - the stream failed to open
    /// * `CameraError::PermissionDenied` - camera access denied
    /// * `CameraError::OpenFailed` - the camera failed to open otherwise
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        let buffer = Arc::clone(&self.frame_buffer);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();
        let device_index = self.device_index;

        // Channel to receive the granted resolution/fps from the thread
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let handle = std::thread::spawn(move || {
            run_capture_loop(device_index, settings, buffer, stop, rx, info_tx);
        });

        self.capture_thread = Some(handle);

        // Wait for the thread to report success or failure
        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.granted_resolution = Some(res);
                self.granted_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                Err(e)
            }
            Err(_) => {
                self.stop_signal.store(true, Ordering::SeqCst);
                if let Some(h) = self.capture_thread.take() {
                    let _ = h.join();
                }
                Err(CameraError::StreamFailed(
                    "Capture thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Release the stream.
    ///
    /// Signals the background thread to stop and waits for it to finish, so
    /// the device is free for reacquisition when this returns.
    pub fn release(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        // Also send stop via channel in case the thread is blocked
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(CaptureCommand::Stop);
        }

        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }

    /// Snapshot the latest captured frame.
    ///
    /// Returns `None` if no frame has arrived yet or capture is not running.
    pub fn get_frame(&self) -> Option<Frame> {
        let buffer = self.frame_buffer.lock().ok()?;
        buffer.clone()
    }

    /// Check if the capture thread is currently running.
    pub fn is_running(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        self.release();
    }
}

/// Replace the active stream with one for `settings`.
///
/// The old stream is released (thread joined, device freed) before the new
/// acquisition begins, so at no point do two streams exist. If acquisition
/// fails the old stream is already gone; the caller surfaces the error and
/// retries on a later switch request.
pub fn reacquire(
    current: Option<CameraCapture>,
    settings: CameraSettings,
) -> Result<CameraCapture, CameraError> {
    if let Some(mut camera) = current {
        camera.release();
        drop(camera);
    }

    let mut camera = CameraCapture::acquire(settings)?;
    camera.start()?;
    Ok(camera)
}
