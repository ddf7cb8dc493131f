//! Three-state camera connection/capture state machine (spec §4.3),
//! grounded on `OrcaQuestCameraStateMachine.h/.cpp` but re-expressed as an
//! explicit `(state, event) -> (state, hook)` match table rather than an
//! object-per-state class hierarchy, per spec.md §9's Design Notes.

mod machine;

pub use machine::{CameraState, StateMachine, TransitionHooks};
