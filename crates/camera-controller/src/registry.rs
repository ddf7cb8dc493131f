//! Socket-id-keyed registry of live controllers.
//!
//! Spec.md §9's redesign flag replaces the original protocol decoder's
//! raw `set_capture_core_ref`/`get_capture_core_ref_` back-pointer with
//! "a registry keyed by socket-id rather than a raw back-pointer". This
//! is that registry: both `capture-core` and `control-core` look up the
//! same [`CameraController`] for a given `socket_id` here instead of
//! either core holding a pointer into the other. Grounded on
//! `frame_ring::RingRegistry`'s create-or-share shape.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::controller::CameraController;

#[derive(Default)]
pub struct ControllerRegistry {
    controllers: RwLock<HashMap<u32, Arc<CameraController>>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the controller for `socket_id`, inserting `build()`'s
    /// result if absent.
    pub fn get_or_insert_with(
        &self,
        socket_id: u32,
        build: impl FnOnce() -> Arc<CameraController>,
    ) -> Arc<CameraController> {
        if let Some(existing) = self.controllers.read().get(&socket_id) {
            return existing.clone();
        }
        let mut controllers = self.controllers.write();
        if let Some(existing) = controllers.get(&socket_id) {
            return existing.clone();
        }
        let controller = build();
        controllers.insert(socket_id, controller.clone());
        controller
    }

    pub fn lookup(&self, socket_id: u32) -> Option<Arc<CameraController>> {
        self.controllers.read().get(&socket_id).cloned()
    }
}
