//! Camera capture module for live camera access and still frames.
//!
//! This module provides a high-level API for the booth's capture source:
//! - Device enumeration via [`list_devices`]
//! - Facing-mode resolution via [`device_for_facing`]
//! - Stream lifecycle via [`CameraCapture`] and [`reacquire`]
//! - Configuration via [`CameraSettings`] and [`Resolution`]

mod capture;
mod capture_loop;
mod device;
mod frame_utils;
mod types;

pub use capture::{reacquire, CameraCapture};
pub use device::{device_for_facing, list_devices};
pub use types::{CameraError, CameraInfo, CameraSettings, Facing, Frame, FrameFormat, Resolution};
