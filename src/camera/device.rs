//! Camera device enumeration and facing-mode resolution.

use nokhwa::query;
use nokhwa::utils::ApiBackend;

use super::types::{CameraError, CameraInfo, Facing};

/// List all available camera devices on the system.
///
/// Returns a vector of `CameraInfo` structs, or an error if querying fails.
/// If no cameras are found, returns an empty vector (not an error).
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Pick the device index for a facing mode.
///
/// The first enumerated device counts as the front camera and the second as
/// the back camera. Asking for a facing mode with no matching device is an
/// error so the caller can surface it and keep the previous stream choices.
pub fn device_for_facing(devices: &[CameraInfo], facing: Facing) -> Result<u32, CameraError> {
    if devices.is_empty() {
        return Err(CameraError::NoDevices);
    }

    let position = match facing {
        Facing::Front => 0,
        Facing::Back => 1,
    };

    devices
        .get(position)
        .map(|d| d.index)
        .ok_or(CameraError::NoFacingDevice(facing))
}
