//! Control core loop (spec §4.6): a request/reply server that decodes
//! control-plane messages and drives a [`camera_controller::CameraController`].
//!
//! Grounded on `OrcaControlCore.h/.cpp`, which binds a `ZMQ_ROUTER`
//! socket at `tcp://0.0.0.0:9001`. This engine does not pull in a ZMQ
//! binding (absent from the teacher's and every pack example's
//! dependency stack); SPEC_FULL.md's transport-choice note replaces it
//! with `tokio::net::TcpListener` framing each request/reply as a
//! length-prefixed JSON document, one task per accepted connection
//! playing the role of the ROUTER socket's client identity.

mod codec;
mod message;
mod server;

pub use message::{ControlReply, ControlRequest};
pub use server::ControlCore;
