//! Capture core loop (spec §4.5): a per-core tight polling producer that
//! drains the camera, stamps a super-frame header + payload into a
//! pre-allocated pool buffer, and dispatches it onto a downstream ring
//! by `frame_number mod N`.

mod capture_loop;

pub use capture_loop::{CaptureCore, TickOutcome};
