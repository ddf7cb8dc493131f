//! Live-view core loop (spec §4.7): a downstream consumer of the same
//! shape as the capture core, run in reverse. It dequeues a completed
//! frame from one designated downstream ring, downsamples it to 8 bits
//! per pixel, JPEG-encodes the result onto a bounded preview session
//! queue, and requeues the pool buffer onto CLEAR.
//!
//! Grounded on spec.md's framing: "Included here only to fix the
//! buffer-recycling contract." There is no live-view sidecar in the
//! retrieved original source to imitate directly, so the JPEG step
//! itself is grounded on the `image` crate's own encoder API rather
//! than a teacher file; everything around it (ring wiring, run-flag
//! cancellation, drop accounting) follows `capture-core`'s pattern.

mod preview;

pub use preview::{LiveviewCore, PreviewFrame, TickOutcome};
