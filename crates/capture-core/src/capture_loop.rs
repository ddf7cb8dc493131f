//! The nine-step capture loop body (spec §4.5), grounded on
//! `OrcaCaptureCore.h/.cpp`'s steady-state loop shape, with two
//! deliberate deviations recorded in DESIGN.md: the loop does not break
//! on an empty `capture_frame()` result (it continues), and it does not
//! insert a fixed `rte_delay_ms(100)` at the end of every iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use camera_controller::CameraController;
use camera_protocol::decoder;
use camera_protocol::{superframe, FRAME_DATA_SIZE};
use daq_core::error::{EngineError, EngineResult};
use frame_ring::FrameRings;

/// What happened on one call to [`CaptureCore::tick`]. Exposed so tests
/// can drive and assert on individual iterations without real camera
/// timing (spec §8's property/scenario tests S3/S4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// `controller.get_recording()` was false (step 1).
    NotRecording,
    /// `num_frames` capture limit already reached (step 2).
    CaptureLimitReached,
    /// `get_frame` timed out; nothing was consumed (step 3).
    NoFrame,
    /// CLEAR ring was empty; the frame was consumed and counted as
    /// dropped (step 4).
    Dropped,
    /// A frame was written into a pool buffer and dispatched downstream.
    Produced {
        frame_number: u64,
        ring_index: usize,
    },
}

/// Nanoseconds since the Unix epoch, used to stamp
/// `super_frame_start_time`/`super_frame_complete_time`. Grounded on the
/// original's `rte_get_timer_cycles`-style monotonic stamp, re-expressed
/// over `SystemTime` since no TSC-cycle API is portable in std Rust.
fn now_ticks() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// One capture core: owns the ring topology for this core and a
/// reusable scratch buffer sized to one frame's payload, and drives the
/// polling loop against a shared [`CameraController`].
pub struct CaptureCore {
    controller: Arc<CameraController>,
    rings: FrameRings,
    run: Arc<AtomicBool>,
    scratch: Mutex<Vec<u8>>,
}

impl CaptureCore {
    pub fn new(controller: Arc<CameraController>, rings: FrameRings) -> Self {
        Self {
            controller,
            rings,
            run: Arc::new(AtomicBool::new(true)),
            scratch: Mutex::new(vec![0u8; FRAME_DATA_SIZE]),
        }
    }

    /// Shared stop flag (spec §5: "each core holds a single 'run' flag
    /// set by `stop()`"). Clone it out to hand to a shutdown handler.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.run.clone()
    }

    /// Request the loop to exit after its current iteration.
    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    pub fn rings(&self) -> &FrameRings {
        &self.rings
    }

    /// Run the polling loop until `stop()` is called or a fatal
    /// `RingSizingViolation` aborts the core (spec §7).
    pub fn run(&self) -> EngineResult<()> {
        while self.run.load(Ordering::Acquire) {
            match self.tick() {
                Ok(_) => {}
                Err(err @ EngineError::RingSizingViolation(_)) => {
                    tracing::error!(error = %err, "fatal ring sizing violation, aborting capture core");
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// One iteration of the 9-step loop body.
    pub fn tick(&self) -> EngineResult<TickOutcome> {
        // Step 1.
        if !self.controller.get_recording() {
            return Ok(TickOutcome::NotRecording);
        }

        // Step 2: num_frames == 0 means unlimited (spec.md's open
        // question, resolved explicitly here).
        let config = self.controller.config();
        if config.num_frames > 0 && self.controller.frame_number() >= u64::from(config.num_frames) {
            return Ok(TickOutcome::CaptureLimitReached);
        }

        // Step 3: no increment on an empty/timeout frame.
        let mut scratch = self.scratch.lock();
        if !self.controller.get_frame_into(&mut scratch)? {
            return Ok(TickOutcome::NoFrame);
        }

        // Step 4: CLEAR exhaustion drops the frame but still advances
        // frame_number (a frame was consumed, just discarded).
        let Some(buf_index) = self.rings.clear.try_dequeue() else {
            self.controller.note_frame_dropped();
            return Ok(TickOutcome::Dropped);
        };

        // SAFETY: `buf_index` was just dequeued from the CLEAR ring,
        // giving this loop exclusive ownership until it is enqueued
        // downstream a few lines below (spec §3's single-owner
        // invariant).
        let buf = unsafe { self.rings.pool.get_mut(buf_index) };

        // Step 5.
        buf.fill(0);

        // Step 6.
        let frame_number = self.controller.frame_number();
        let header = decoder::get_super_frame_header_mut(buf);
        superframe::set_frame_number(header, frame_number);
        superframe::set_start_time(header, now_ticks());
        superframe::set_image_size(header, scratch.len() as u64);

        // Step 7.
        let image = decoder::get_image_data_mut(buf);
        let n = scratch.len().min(image.len());
        image[..n].copy_from_slice(&scratch[..n]);
        drop(scratch);

        let header = decoder::get_super_frame_header_mut(buf);
        superframe::set_complete_time(header, now_ticks());

        // Step 8: must not fail under the sizing guarantee (spec §5);
        // if it does, that is a fatal invariant violation (spec §7
        // `RingSizingViolation`).
        let ring_index = (frame_number as usize) % self.rings.downstream.len();
        if let Err(returned_index) = self.rings.downstream[ring_index].try_enqueue(buf_index) {
            debug_assert_eq!(returned_index, buf_index);
            return Err(EngineError::RingSizingViolation(format!(
                "downstream ring {ring_index} rejected enqueue of buffer {buf_index}"
            )));
        }

        // Step 9.
        self.controller.note_frame_produced();

        Ok(TickOutcome::Produced {
            frame_number,
            ring_index,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use daq_core::config::CameraConfig;
    use frame_ring::RingRegistry;
    use proptest::prelude::*;

    fn build(pool_size: usize, num_downstream: usize, num_frames: u32) -> CaptureCore {
        let config = CameraConfig {
            simulated_camera: true,
            exposure_time: 0.0,
            frame_rate: 1_000_000.0,
            num_frames,
            ..Default::default()
        };
        let controller = Arc::new(CameraController::new(config));
        controller.execute_command("connect").unwrap();
        controller.execute_command("capture").unwrap();

        let registry = RingRegistry::new();
        let rings = FrameRings::new(
            &registry,
            "capture",
            0,
            pool_size,
            camera_protocol::decoder::frame_buffer_size(),
            num_downstream,
        );
        CaptureCore::new(controller, rings)
    }

    proptest! {
        /// For any `num_frames = K` run to completion with `N` downstream
        /// rings and a CLEAR pool that is never recycled mid-run, the
        /// multiset of produced frame numbers is exactly
        /// `{0, ..., K-1} \ D` (where `D` is whatever exceeds the pool's
        /// capacity), and each ring's sequence is strictly increasing
        /// with residue `ring_index mod N` (spec §8 property 2).
        #[test]
        fn frame_dispatch_matches_the_modulo_n_model(
            pool_size in 1usize..12,
            num_downstream in 1usize..5,
            num_frames in 1u32..30,
        ) {
            let core = build(pool_size, num_downstream, num_frames);
            let mut produced = vec![];
            let mut dropped = 0u32;

            loop {
                match core.tick().unwrap() {
                    TickOutcome::Produced { frame_number, ring_index } => {
                        produced.push((frame_number, ring_index))
                    }
                    TickOutcome::Dropped => dropped += 1,
                    TickOutcome::CaptureLimitReached => break,
                    TickOutcome::NotRecording | TickOutcome::NoFrame => {}
                }
            }

            let expected_produced = (pool_size as u32).min(num_frames);
            let expected_dropped = num_frames.saturating_sub(pool_size as u32);
            prop_assert_eq!(produced.len() as u32, expected_produced);
            prop_assert_eq!(dropped, expected_dropped);

            let mut by_ring: Vec<Vec<u64>> = vec![Vec::new(); num_downstream];
            for (frame_number, ring_index) in &produced {
                by_ring[*ring_index].push(*frame_number);
            }
            for (ring_index, numbers) in by_ring.iter().enumerate() {
                for window in numbers.windows(2) {
                    prop_assert!(window[0] < window[1]);
                }
                for number in numbers {
                    prop_assert_eq!(*number as usize % num_downstream, ring_index);
                }
            }

            let mut all_numbers: Vec<u64> = produced.iter().map(|(n, _)| *n).collect();
            all_numbers.sort_unstable();
            let expected: Vec<u64> = (0..expected_produced as u64).collect();
            prop_assert_eq!(all_numbers, expected);
        }
    }
}
