//! Camera controller (spec §4.4): owns the camera capability instance,
//! the live configuration, derived status, and the connection/capture
//! state machine. Single mutator of configuration and status; the
//! capture core only reads through it and advances the frame counter.

mod controller;
mod diff;
mod registry;

pub use controller::{CameraController, StatusSnapshot};
pub use registry::ControllerRegistry;
