//! Camera controller (spec §4.4), grounded on
//! `OrcaQuestCameraController.h/.cpp`: owns the camera variant, the live
//! configuration, derived status, and the state machine, and is the
//! single mutator of configuration and status.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use camera_iface::{CameraInterface, RealCamera, SimulatedCamera};
use camera_state::{CameraState, StateMachine, TransitionHooks};
use daq_core::config::CameraConfig;
use daq_core::error::{EngineError, EngineResult};

use crate::diff::{
    apply_camera_owned_fields, apply_camera_owned_fields_locally, apply_local_fields,
    wire_value_of, CAMERA_OWNED_FIELDS,
};

/// `{camera_status, frame_number}` (spec §3 Status).
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub camera_status: &'static str,
    pub frame_number: u64,
}

/// Owns the camera capability instance, configuration, status and state
/// machine for one capture pipeline. Shared via `Arc` between the
/// capture core (read-mostly: `get_recording`, `get_frame_into`,
/// `frame_number`/`note_frame_produced`/`note_frame_dropped`) and the
/// control core (the sole mutator, via `configure`).
pub struct CameraController {
    camera: Mutex<Option<Box<dyn CameraInterface>>>,
    config: RwLock<CameraConfig>,
    frame_number: AtomicU64,
    dropped_frames: AtomicU64,
    state_machine: StateMachine,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            camera: Mutex::new(None),
            config: RwLock::new(config),
            frame_number: AtomicU64::new(0),
            dropped_frames: AtomicU64::new(0),
            state_machine: StateMachine::new(),
        }
    }

    /// Current configuration (cloned; the struct is small and reads are
    /// far less frequent than frame production).
    pub fn config(&self) -> CameraConfig {
        self.config.read().clone()
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            camera_status: self.state_machine.state().name(),
            frame_number: self.frame_number.load(Ordering::Acquire),
        }
    }

    /// `recording` is true iff the state machine is in `Capturing`
    /// (spec §3 invariant).
    pub fn get_recording(&self) -> bool {
        self.state_machine.state() == CameraState::Capturing
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number.load(Ordering::Acquire)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Acquire)
    }

    /// Capture loop step 9: a frame was produced and enqueued.
    pub fn note_frame_produced(&self) -> u64 {
        self.frame_number.fetch_add(1, Ordering::AcqRel)
    }

    /// Capture loop step 4: the CLEAR ring was empty. The frame is
    /// logically consumed (frame_number still advances) but counted as
    /// dropped (spec §4.5 step 4, §7 `BufferExhausted`).
    pub fn note_frame_dropped(&self) -> u64 {
        self.dropped_frames.fetch_add(1, Ordering::AcqRel);
        self.frame_number.fetch_add(1, Ordering::AcqRel)
    }

    /// Forward to `camera.capture_frame()` and copy the payload directly
    /// into `dst` while the camera lock is held, since the returned
    /// payload is only valid until the camera's next call (spec §4.2).
    /// Returns `Ok(true)` when a frame was copied, `Ok(false)` on
    /// timeout/no-frame.
    pub fn get_frame_into(&self, dst: &mut [u8]) -> EngineResult<bool> {
        let mut guard = self.camera.lock();
        let camera = guard.as_mut().ok_or(EngineError::CameraNotReady)?;
        match camera.capture_frame()? {
            Some(payload) => {
                let n = payload.len().min(dst.len());
                dst[..n].copy_from_slice(&payload[..n]);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Push every camera-owned field of the current configuration to the
    /// camera. Called once on successful `connect` (spec §4.4).
    pub fn apply_configuration(&self) {
        let mut guard = self.camera.lock();
        let Some(camera) = guard.as_mut() else {
            return;
        };
        let config = self.config.read();
        for field in CAMERA_OWNED_FIELDS {
            if let Some(value) = wire_value_of(&config, field) {
                if !camera.set_property(field, value) {
                    tracing::warn!(field, "camera rejected field during apply_configuration");
                }
            }
        }
    }

    /// Apply a configuration diff (spec §4.4 `update_configuration`):
    /// camera-owned fields are pushed to the camera in declaration
    /// order, committing as they succeed; local-only fields commit
    /// directly. Stops on the first camera rejection without touching
    /// fields after it.
    ///
    /// When no camera is attached yet (the controller hasn't seen a
    /// successful `connect`), changed camera-owned fields commit
    /// straight into the config instead of failing: spec §6's combined
    /// message contract applies `camera` before `command`, so a
    /// `{camera: {...}, command: "connect"}` message must be able to
    /// stage its camera diff before the connect hook constructs the
    /// camera. `apply_configuration` pushes the committed config to the
    /// camera once `connect` succeeds.
    pub fn update_configuration(&self, diff: &Map<String, Value>) -> EngineResult<()> {
        let mut guard = self.camera.lock();
        let mut config = self.config.write();

        if let Some(camera) = guard.as_mut() {
            apply_camera_owned_fields(camera.as_mut(), &mut config, diff)?;
        } else {
            apply_camera_owned_fields_locally(&mut config, diff)?;
        }

        apply_local_fields(&mut config, diff)
    }

    /// Forward `name` to the state machine. On success, the new state is
    /// readable via [`CameraController::status`].
    pub fn execute_command(&self, name: &str) -> EngineResult<&'static str> {
        let mut hooks = Hooks { controller: self };
        self.state_machine.execute(name, &mut hooks)
    }

    /// spec §4.4 `configure`: camera diff first (if present), then
    /// command (if present), matching spec §6's "camera is applied
    /// first, command second".
    pub fn configure(&self, params: &Value) -> EngineResult<()> {
        if let Some(camera_diff) = params.get("camera").and_then(Value::as_object) {
            self.update_configuration(camera_diff)?;
        }
        if let Some(command) = params.get("command").and_then(Value::as_str) {
            self.execute_command(command)?;
        }
        Ok(())
    }

    /// Serialise the current configuration into `{"camera": {...}}`
    /// under `reply`.
    pub fn request_configuration(&self, reply: &mut Value) -> EngineResult<()> {
        let config = self.config.read();
        let encoded =
            serde_json::to_value(&*config).map_err(|e| EngineError::Configuration(e.to_string()))?;
        reply["camera"] = encoded;
        Ok(())
    }

    /// Serialise `{camera_status, frame_number}` into `reply`.
    pub fn get_status(&self, reply: &mut Value) {
        let status = self.status();
        reply["status"] = serde_json::json!({
            "camera_status": status.camera_status,
            "frame_number": status.frame_number,
        });
    }

    fn do_connect(&self) -> bool {
        let mut guard = self.camera.lock();
        let config = self.config.read().clone();
        if guard.is_none() {
            let camera: Box<dyn CameraInterface> = if config.simulated_camera {
                match SimulatedCamera::new(config.camera_number) {
                    Ok(camera) => Box::new(camera),
                    Err(error) => {
                        tracing::error!(%error, "failed to construct simulated camera");
                        return false;
                    }
                }
            } else {
                Box::new(RealCamera::new(config.camera_number))
            };
            *guard = Some(camera);
        }

        let camera = guard.as_mut().expect("camera was just constructed if absent");
        let timeout_ms = (config.image_timeout * 1000.0).max(0.0) as u32;
        let armed = camera.api_init().is_ok()
            && camera.connect(config.camera_number).is_ok()
            && camera.attach_buffer(config.num_frames.max(1)).is_ok()
            && camera.prepare_capture(timeout_ms).is_ok();

        if !armed {
            *guard = None;
            return false;
        }
        drop(guard);
        self.apply_configuration();
        true
    }

    fn do_disconnect(&self) -> bool {
        let mut guard = self.camera.lock();
        let Some(camera) = guard.as_mut() else {
            return true;
        };
        let _ = camera.abort_capture();
        let _ = camera.disarm();
        let _ = camera.remove_buffer();
        let ok = camera.disconnect().is_ok() && camera.close().is_ok();
        *guard = None;
        ok
    }

    /// spec §4.4 `start_capture`: reset `frame_number` to 0 and let
    /// `recording` follow from the state machine transitioning to
    /// `Capturing`. This explicitly fills in the frame-number reset the
    /// retrieved original source does not show in `start_capture`/
    /// `end_capture`, per spec.md's stated invariant (see DESIGN.md).
    fn do_start_capture(&self) -> bool {
        self.frame_number.store(0, Ordering::Release);
        true
    }

    fn do_end_capture(&self) -> bool {
        true
    }
}

/// Adapts `&CameraController`'s interior mutability to the
/// [`TransitionHooks`] trait's `&mut self` methods.
struct Hooks<'a> {
    controller: &'a CameraController,
}

impl TransitionHooks for Hooks<'_> {
    fn connect(&mut self) -> bool {
        self.controller.do_connect()
    }

    fn disconnect(&mut self) -> bool {
        self.controller.do_disconnect()
    }

    fn start_capture(&mut self) -> bool {
        self.controller.do_start_capture()
    }

    fn end_capture(&mut self) -> bool {
        self.controller.do_end_capture()
    }
}
