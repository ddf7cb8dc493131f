//! Process-wide lookup table of named rings.
//!
//! Grounded on the original capture core's `rte_ring_lookup`/
//! `rte_ring_create` pattern: a ring is created the first time it is
//! named and looked up (shared) on every subsequent call, which is how
//! co-located cores (e.g. capture and a live-view core on the same
//! `socket_id`) end up pointing at the same CLEAR ring.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ring::Ring;

#[derive(Default)]
pub struct RingRegistry {
    rings: RwLock<HashMap<String, Arc<Ring>>>,
}

impl RingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a ring by name, creating it with `capacity` if absent.
    /// Returns the ring plus whether this call created it (the caller
    /// needs this to know whether to seed a freshly created CLEAR ring).
    pub fn get_or_create(&self, name: &str, capacity: usize) -> (Arc<Ring>, bool) {
        if let Some(existing) = self.rings.read().get(name) {
            return (existing.clone(), false);
        }

        let mut rings = self.rings.write();
        // Re-check under the write lock in case of a concurrent creator.
        if let Some(existing) = rings.get(name) {
            return (existing.clone(), false);
        }
        let ring = Arc::new(Ring::new(name.to_string(), capacity));
        rings.insert(name.to_string(), ring.clone());
        (ring, true)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Ring>> {
        self.rings.read().get(name).cloned()
    }
}
