//! Polymorphic camera capability: a trait shared by the real (vendor SDK
//! gated) and simulated camera variants, plus the simulated variant's
//! synthetic image generator (spec §4.2).

pub mod image_gen;
pub mod interface;
pub mod real;
pub mod simulated;

pub use interface::CameraInterface;
pub use real::RealCamera;
pub use simulated::SimulatedCamera;
