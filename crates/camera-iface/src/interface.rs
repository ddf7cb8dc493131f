//! The polymorphic camera capability (spec §4.2), grounded on
//! `ICameraInterface.h`. A small closed variant set (real, simulated); a
//! trait object is acceptable here since the call rate is one per frame,
//! modest next to the multi-megabyte `memcpy` that dominates the capture
//! loop's cost (spec §9 Design Notes).

use daq_core::error::EngineResult;

/// Operations common to every camera variant. `name` in [`CameraInterface::set_property`]
/// is a controller-level symbolic key (`"exposure_time"`, `"trigger_source"`,
/// ...), not a vendor-specific numeric property id — both concrete variants
/// in the original implementation take a string key despite the base
/// interface header declaring an integer id; this trait follows the
/// variants' actual (string-keyed) behaviour.
pub trait CameraInterface: Send {
    /// One-shot global SDK init. Idempotent.
    fn api_init(&mut self) -> EngineResult<()>;

    /// Open the device at `index`.
    fn connect(&mut self, index: u32) -> EngineResult<()>;

    /// Reverse of [`CameraInterface::connect`].
    fn disconnect(&mut self) -> EngineResult<()>;

    /// Allocate the device's internal circular buffer for `n_frames`.
    fn attach_buffer(&mut self, n_frames: u32) -> EngineResult<()>;

    /// Arm the device for capture with the given timeout in milliseconds.
    fn prepare_capture(&mut self, timeout_ms: u32) -> EngineResult<()>;

    /// Block up to the configured timeout for the next frame. Returns
    /// `Ok(None)` on timeout or when not armed; the returned payload is
    /// owned by the camera and is only valid until the next call.
    fn capture_frame(&mut self) -> EngineResult<Option<&[u8]>>;

    /// Abort an in-progress capture without tearing down buffers.
    fn abort_capture(&mut self) -> EngineResult<()>;

    /// Disarm the device.
    fn disarm(&mut self) -> EngineResult<()>;

    /// Release the internal circular buffer.
    fn remove_buffer(&mut self) -> EngineResult<()>;

    /// Tear down the connection entirely.
    fn close(&mut self) -> EngineResult<()>;

    /// Apply a controller-owned configuration field by symbolic name.
    /// Returns `false` if rejected.
    fn set_property(&mut self, name: &str, value: f64) -> bool;

    /// Read back a previously applied property, if supported.
    fn get_property(&self, name: &str) -> Option<f64>;

    /// Number of devices of this variant visible to the process.
    fn get_device_count(&self) -> u32;
}
