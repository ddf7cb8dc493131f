//! Real-hardware camera variant, grounded on `PvcamConnection`'s
//! `initialize`/`open`/`close`/`uninitialize` lifecycle shape
//! (`daq-driver-pvcam/src/components/connection.rs`). Vendor SDK linkage
//! is gated behind the `pvcam_hardware` feature; with the feature off
//! (the default) every operation reports [`EngineError::CameraNotReady`]
//! rather than failing to build, so the workspace stays hardware-free by
//! default the way `daq-driver-pvcam`'s own `default = ["mock"]` does.

use daq_core::error::{EngineError, EngineResult};

use crate::interface::CameraInterface;

/// Real-camera variant. Without `pvcam_hardware`, this is an inert shell:
/// every call fails with [`EngineError::CameraNotReady`].
pub struct RealCamera {
    #[cfg_attr(not(feature = "pvcam_hardware"), allow(dead_code))]
    camera_number: u32,
}

impl RealCamera {
    pub fn new(camera_number: u32) -> Self {
        Self { camera_number }
    }
}

#[cfg(not(feature = "pvcam_hardware"))]
impl CameraInterface for RealCamera {
    fn api_init(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn connect(&mut self, _index: u32) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn disconnect(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn attach_buffer(&mut self, _n_frames: u32) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn prepare_capture(&mut self, _timeout_ms: u32) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn capture_frame(&mut self) -> EngineResult<Option<&[u8]>> {
        Err(EngineError::CameraNotReady)
    }

    fn abort_capture(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn disarm(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn remove_buffer(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn close(&mut self) -> EngineResult<()> {
        Err(EngineError::CameraNotReady)
    }

    fn set_property(&mut self, _name: &str, _value: f64) -> bool {
        false
    }

    fn get_property(&self, _name: &str) -> Option<f64> {
        None
    }

    fn get_device_count(&self) -> u32 {
        0
    }
}

// A `pvcam_hardware`-gated implementation backed by the vendor SDK would
// live here, following `PvcamConnection`'s init/open/close pairing and its
// `// SAFETY:` comment convention around each FFI call. No vendor crate is
// available in this workspace's dependency stack, so it is not built here.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_not_ready_without_hardware_feature() {
        let mut cam = RealCamera::new(0);
        assert!(matches!(cam.connect(0), Err(EngineError::CameraNotReady)));
        assert_eq!(cam.get_device_count(), 0);
    }
}
