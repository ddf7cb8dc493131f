//! Wires a [`BufferPool`] to its CLEAR ring and a set of downstream rings,
//! matching `OrcaCaptureCore`'s constructor-time setup.

use std::sync::Arc;

use daq_core::limits::next_power_of_two;
use tracing::info;

use crate::buffer_pool::BufferPool;
use crate::registry::RingRegistry;
use crate::ring::{clear_ring_name, downstream_ring_name, Ring};

/// Everything a capture core needs to produce frames: the backing buffer
/// pool, the shared free-buffer (CLEAR) ring, and the set of downstream
/// worker rings frames are dispatched across.
pub struct FrameRings {
    pub pool: Arc<BufferPool>,
    pub clear: Arc<Ring>,
    pub downstream: Vec<Arc<Ring>>,
}

impl FrameRings {
    /// Build (or attach to) the ring topology for a capture core named
    /// `core_name` on `socket_id`, backed by `pool_size` buffers of
    /// `buffer_size` bytes, dispatching across `num_downstream` rings.
    ///
    /// Ring capacity is the pool size rounded up to the next power of two
    /// (spec §5's sizing guarantee), so that an enqueue immediately
    /// following a successful CLEAR dequeue cannot fail.
    pub fn new(
        registry: &RingRegistry,
        core_name: &str,
        socket_id: u32,
        pool_size: usize,
        buffer_size: usize,
        num_downstream: usize,
    ) -> Self {
        let pool = Arc::new(BufferPool::new(pool_size, buffer_size));
        let ring_capacity = next_power_of_two(pool_size);

        let (clear, clear_is_new) =
            registry.get_or_create(&clear_ring_name(socket_id), ring_capacity);

        if clear_is_new {
            info!(pool_size, ring_capacity, "seeding CLEAR ring with every pool buffer");
            for index in 0..pool.len() {
                clear
                    .try_enqueue(index)
                    .expect("freshly created CLEAR ring must fit the whole pool");
            }
        }

        let downstream = (0..num_downstream)
            .map(|i| {
                let name = downstream_ring_name(core_name, socket_id, i);
                registry.get_or_create(&name, ring_capacity).0
            })
            .collect();

        Self {
            pool,
            clear,
            downstream,
        }
    }

    /// A clone of the shared pool handle, for a sibling core (e.g.
    /// live-view) that consumes from one of this core's downstream
    /// rings and must interpret the same buffer indices.
    pub fn shared_pool(&self) -> Arc<BufferPool> {
        self.pool.clone()
    }
}
