//! Simulated camera variant (spec §4.2), grounded on `SimulatedCamera.cpp`:
//! produces synthetic frames at a configured frame rate without touching
//! any vendor SDK, so the rest of the engine can be exercised without
//! hardware attached.

use std::time::{Duration, Instant};

use daq_core::error::{EngineError, EngineResult};
use daq_core::limits::validate_frame_size;

use crate::image_gen;
use crate::interface::CameraInterface;

const X_RESOLUTION: u32 = camera_protocol::X_RESOLUTION;
const Y_RESOLUTION: u32 = camera_protocol::Y_RESOLUTION;
const BIT_DEPTH_BYTES: usize = camera_protocol::BIT_DEPTH_BYTES;

/// A software-only stand-in for the real camera, producing deterministic
/// synthetic frames on a wall-clock cadence.
pub struct SimulatedCamera {
    camera_number: u32,
    connected: bool,
    capturing: bool,
    frame_count: u64,
    frame_period: Duration,
    last_capture: Option<Instant>,
    frame_buf: Vec<u8>,
}

impl SimulatedCamera {
    pub fn new(camera_number: u32) -> EngineResult<Self> {
        let size = validate_frame_size(X_RESOLUTION, Y_RESOLUTION, BIT_DEPTH_BYTES)?;
        Ok(Self {
            camera_number,
            connected: false,
            capturing: false,
            frame_count: 0,
            frame_period: Duration::from_millis(1000 / 30),
            last_capture: None,
            frame_buf: vec![0u8; size.bytes],
        })
    }
}

impl CameraInterface for SimulatedCamera {
    fn api_init(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn connect(&mut self, index: u32) -> EngineResult<()> {
        if index != self.camera_number {
            tracing::warn!(requested = index, configured = self.camera_number, "simulated camera index mismatch, connecting anyway");
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) -> EngineResult<()> {
        self.connected = false;
        self.capturing = false;
        Ok(())
    }

    fn attach_buffer(&mut self, _n_frames: u32) -> EngineResult<()> {
        if !self.connected {
            return Err(EngineError::CameraNotReady);
        }
        Ok(())
    }

    fn prepare_capture(&mut self, _timeout_ms: u32) -> EngineResult<()> {
        if !self.connected {
            return Err(EngineError::CameraNotReady);
        }
        self.capturing = true;
        self.last_capture = Some(Instant::now());
        Ok(())
    }

    fn capture_frame(&mut self) -> EngineResult<Option<&[u8]>> {
        if !self.capturing {
            return Ok(None);
        }
        let now = Instant::now();
        let due = self
            .last_capture
            .map(|t| now.duration_since(t) >= self.frame_period)
            .unwrap_or(true);
        if !due {
            return Ok(None);
        }
        self.last_capture = Some(now);
        image_gen::generate(
            &mut self.frame_buf,
            X_RESOLUTION,
            Y_RESOLUTION,
            self.camera_number,
            self.frame_count,
        );
        self.frame_count += 1;
        Ok(Some(&self.frame_buf[..]))
    }

    fn abort_capture(&mut self) -> EngineResult<()> {
        self.capturing = false;
        Ok(())
    }

    fn disarm(&mut self) -> EngineResult<()> {
        self.capturing = false;
        Ok(())
    }

    fn remove_buffer(&mut self) -> EngineResult<()> {
        Ok(())
    }

    fn close(&mut self) -> EngineResult<()> {
        self.connected = false;
        self.capturing = false;
        Ok(())
    }

    fn set_property(&mut self, name: &str, value: f64) -> bool {
        match name {
            // `frame_time = exposure_time` (spec §4.2), grounded on
            // `SimulatedCamera::set_property` setting `frame_time_ = value`
            // directly for this key.
            "exposure_time" if value > 0.0 => {
                self.frame_period = Duration::from_secs_f64(value);
                true
            }
            // `frame_time = 1/frame_rate` "if set via that key" (spec
            // §4.2); declared after `exposure_time` in
            // `camera-controller::diff::CAMERA_OWNED_FIELDS` so a diff
            // carrying both pushes this one last.
            "frame_rate" if value > 0.0 => {
                self.frame_period = Duration::from_secs_f64(1.0 / value);
                true
            }
            _ => false,
        }
    }

    fn get_property(&self, name: &str) -> Option<f64> {
        match name {
            "exposure_time" => Some(self.frame_period.as_secs_f64()),
            "frame_rate" => Some(1.0 / self.frame_period.as_secs_f64()),
            _ => None,
        }
    }

    fn get_device_count(&self) -> u32 {
        1
    }
}
