//! Error taxonomy for the capture engine.
//!
//! One variant per category named in the design's error-handling section;
//! wording is pinned where callers (tests, control-plane NACKs) depend on
//! the exact string.

use thiserror::Error;

/// Crate-wide result alias, mirroring the rest of the workspace's
/// `Result<T, EngineError>` convention.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Operation attempted while the camera is not in an armed state.
    #[error("camera is not ready")]
    CameraNotReady,

    /// `set_property` refused a value during configuration apply.
    #[error("camera rejected property {name}")]
    CameraPropertyRejected { name: String },

    /// State-machine event not legal in the current state.
    #[error("{event} is not valid in {state} state")]
    IllegalTransition { event: String, state: String },

    /// Command string not recognised by the state machine's command map.
    #[error("unknown camera state transition command: {0}")]
    UnknownCommand(String),

    /// CLEAR ring was empty when a frame was ready; accounted, not fatal.
    #[error("buffer pool exhausted, frame dropped")]
    BufferExhausted,

    /// Downstream enqueue failed after a successful CLEAR dequeue: a sizing
    /// invariant was violated. Fatal — the owning core loop must stop.
    #[error("downstream ring sizing violated: {0}")]
    RingSizingViolation(String),

    /// A control-channel request could not be parsed.
    #[error("failed to decode control message: {0}")]
    MessageDecodeFailure(String),

    /// Requested frame/ring dimensions exceed configured limits.
    #[error("frame dimensions {width}x{height} exceed max {max_dimension}")]
    FrameDimensionsTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },

    /// A size computation would overflow `usize`.
    #[error("size overflow computing {context}")]
    SizeOverflow { context: &'static str },

    /// Computed frame byte size exceeds the configured hard limit.
    #[error("frame too large: {bytes} bytes exceeds max {max_bytes}")]
    FrameTooLarge { bytes: usize, max_bytes: usize },

    /// Configuration document failed to load or validate.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
