//! End-to-end scenarios S3/S4 from spec.md §8, driven entirely through
//! `capture-core`'s public API (no access to its private fields),
//! following the teacher's root `tests/` integration-test convention.

use std::sync::Arc;

use camera_controller::CameraController;
use capture_core::{CaptureCore, TickOutcome};
use daq_core::config::CameraConfig;
use frame_ring::{FrameRings, RingRegistry};

fn simulated_config(num_frames: u32) -> CameraConfig {
    CameraConfig {
        simulated_camera: true,
        frame_rate: 1_000_000.0,
        num_frames,
        ..Default::default()
    }
}

fn buffer_size() -> usize {
    camera_protocol::decoder::frame_buffer_size()
}

fn run_to_capture_limit(core: &CaptureCore) -> Vec<(u64, usize)> {
    let mut produced = vec![];
    loop {
        match core.tick().expect("tick must not fail under the sizing guarantee") {
            TickOutcome::Produced {
                frame_number,
                ring_index,
            } => produced.push((frame_number, ring_index)),
            TickOutcome::CaptureLimitReached => break,
            TickOutcome::Dropped | TickOutcome::NoFrame | TickOutcome::NotRecording => {}
        }
    }
    produced
}

#[test]
fn s3_five_frames_two_rings_no_drops() {
    let controller = Arc::new(CameraController::new(simulated_config(5)));
    controller.execute_command("connect").unwrap();
    controller.execute_command("capture").unwrap();

    let registry = RingRegistry::new();
    let rings = FrameRings::new(&registry, "capture", 10, 16, buffer_size(), 2);
    let core = CaptureCore::new(controller.clone(), rings);

    let produced = run_to_capture_limit(&core);

    let ring0: Vec<u64> = produced.iter().filter(|(_, r)| *r == 0).map(|(f, _)| *f).collect();
    let ring1: Vec<u64> = produced.iter().filter(|(_, r)| *r == 1).map(|(f, _)| *f).collect();
    assert_eq!(ring0, vec![0, 2, 4]);
    assert_eq!(ring1, vec![1, 3]);
    assert_eq!(controller.frame_number(), 5);
    assert_eq!(controller.dropped_frames(), 0);
}

#[test]
fn s4_clear_exhaustion_drops_the_tail_but_frame_number_still_reaches_the_limit() {
    let controller = Arc::new(CameraController::new(simulated_config(5)));
    controller.execute_command("connect").unwrap();
    controller.execute_command("capture").unwrap();

    let registry = RingRegistry::new();
    let rings = FrameRings::new(&registry, "capture", 11, 2, buffer_size(), 2);
    let core = CaptureCore::new(controller.clone(), rings);

    let produced = run_to_capture_limit(&core);

    assert_eq!(produced, vec![(0, 0), (1, 1)]);
    assert_eq!(controller.frame_number(), 5);
    assert_eq!(controller.dropped_frames(), 3);
}
