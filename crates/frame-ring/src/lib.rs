//! Pre-allocated buffer pool plus named, non-blocking rings used to move
//! populated buffers from the capture core to downstream workers and back.

pub mod buffer_pool;
pub mod registry;
pub mod ring;
pub mod wiring;

pub use buffer_pool::BufferPool;
pub use registry::RingRegistry;
pub use ring::{clear_ring_name, downstream_ring_name, Ring};
pub use wiring::FrameRings;
