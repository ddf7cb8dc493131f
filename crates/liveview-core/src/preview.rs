//! The live-view core body: one downstream ring in, one JPEG-bearing
//! session queue out, with the consumed buffer handed back to CLEAR.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Luma};
use parking_lot::Mutex;

use camera_protocol::{decoder, superframe, X_RESOLUTION, Y_RESOLUTION};
use daq_core::error::{EngineError, EngineResult};
use frame_ring::{BufferPool, Ring};

/// Right shift applied to each 16-bit pixel to downsample it to 8 bits,
/// per spec §4.7's "minimal transform" (no resize, no colormap).
const DOWNSAMPLE_SHIFT: u32 = 8;

/// Default cap on how many encoded frames the session queue retains
/// before the oldest is dropped to make room for the newest.
const DEFAULT_SESSION_CAPACITY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source ring had nothing queued.
    NoFrame,
    /// A frame was downsampled, encoded, and handed to the session
    /// queue; the pool buffer has already been requeued onto CLEAR.
    Produced { frame_number: u64, jpeg_bytes: usize },
}

/// One encoded preview frame as handed to session consumers.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub frame_number: u64,
    pub jpeg: Vec<u8>,
}

/// A live-view core attached to one of a capture core's downstream
/// rings. Shares the capture core's buffer pool and CLEAR ring (see
/// `frame_ring::FrameRings::shared_pool`) rather than owning its own
/// topology, since pool indices are only meaningful against the pool
/// instance that allocated them.
pub struct LiveviewCore {
    pool: Arc<BufferPool>,
    clear: Arc<Ring>,
    source: Arc<Ring>,
    run: Arc<AtomicBool>,
    session: Mutex<VecDeque<PreviewFrame>>,
    session_capacity: usize,
}

impl LiveviewCore {
    pub fn new(pool: Arc<BufferPool>, clear: Arc<Ring>, source: Arc<Ring>) -> Self {
        Self::with_session_capacity(pool, clear, source, DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_session_capacity(
        pool: Arc<BufferPool>,
        clear: Arc<Ring>,
        source: Arc<Ring>,
        session_capacity: usize,
    ) -> Self {
        Self {
            pool,
            clear,
            source,
            run: Arc::new(AtomicBool::new(true)),
            session: Mutex::new(VecDeque::with_capacity(session_capacity.max(1))),
            session_capacity: session_capacity.max(1),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.run.clone()
    }

    pub fn stop(&self) {
        self.run.store(false, Ordering::Release);
    }

    /// Pop the oldest encoded preview frame, if any is waiting.
    pub fn next_preview_frame(&self) -> Option<PreviewFrame> {
        self.session.lock().pop_front()
    }

    pub fn session_len(&self) -> usize {
        self.session.lock().len()
    }

    pub fn run(&self) -> EngineResult<()> {
        while self.run.load(Ordering::Acquire) {
            match self.tick() {
                Ok(_) => {}
                Err(err @ EngineError::RingSizingViolation(_)) => {
                    tracing::error!(error = %err, "fatal ring sizing violation, aborting liveview core");
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn tick(&self) -> EngineResult<TickOutcome> {
        let Some(buf_index) = self.source.try_dequeue() else {
            return Ok(TickOutcome::NoFrame);
        };

        // SAFETY: `buf_index` was just dequeued from our designated
        // source ring, giving this loop exclusive ownership until it is
        // requeued onto CLEAR a few lines below.
        let (frame_number, jpeg) = {
            let buf = unsafe { self.pool.get(buf_index) };
            let header = decoder::get_super_frame_header(buf);
            let frame_number = superframe::get_frame_number(header);
            let image = decoder::get_image_data(buf);
            (frame_number, encode_jpeg(image))
        };

        let jpeg_bytes = jpeg.len();
        let mut session = self.session.lock();
        if session.len() >= self.session_capacity {
            session.pop_front();
        }
        session.push_back(PreviewFrame { frame_number, jpeg });
        drop(session);

        if let Err(returned_index) = self.clear.try_enqueue(buf_index) {
            debug_assert_eq!(returned_index, buf_index);
            return Err(EngineError::RingSizingViolation(format!(
                "CLEAR ring rejected requeue of buffer {buf_index}"
            )));
        }

        Ok(TickOutcome::Produced {
            frame_number,
            jpeg_bytes,
        })
    }
}

/// Downsample a 16-bit-per-pixel native-endian image to 8 bits and
/// JPEG-encode it. Falls back to an all-zero preview frame if the pool
/// payload is short (defensive against a misconfigured buffer size;
/// should not happen given the fixed sensor resolution).
fn encode_jpeg(image16: &[u8]) -> Vec<u8> {
    let pixel_count = (X_RESOLUTION * Y_RESOLUTION) as usize;
    let mut gray = vec![0u8; pixel_count];
    for (i, pixel) in gray.iter_mut().enumerate() {
        let offset = i * 2;
        *pixel = if offset + 1 < image16.len() {
            let value = u16::from_ne_bytes([image16[offset], image16[offset + 1]]);
            (value >> DOWNSAMPLE_SHIFT) as u8
        } else {
            0
        };
    }

    let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(X_RESOLUTION, Y_RESOLUTION, gray)
            .expect("gray buffer length matches X_RESOLUTION * Y_RESOLUTION by construction");

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new(&mut out);
    encoder
        .write_image(buffer.as_raw(), X_RESOLUTION, Y_RESOLUTION, ExtendedColorType::L8)
        .expect("encoding a fixed-size in-memory luma buffer cannot fail");
    out.into_inner()
}
