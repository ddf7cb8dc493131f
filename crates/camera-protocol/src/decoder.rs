//! Deterministic mapping from a pool-buffer address (here, a byte slice)
//! and an outer-index to the embedded header and payload regions.
//!
//! Purely computational, grounded on
//! `OrcaProtocolDecoder::get_frame_header`/`get_image_data_start`. No
//! global state is touched here.

use crate::header::{
    FRAME_BUFFER_SIZE, FRAME_BUFFER_UNIT_SIZE, FRAME_DATA_SIZE, FRAME_OUTER_CHUNK_SIZE,
    RAW_FRAME_HEADER_SIZE, SUPER_FRAME_HEADER_SIZE,
};

/// Size of a fully populated super-frame buffer.
pub fn frame_buffer_size() -> usize {
    FRAME_BUFFER_SIZE
}

/// Byte offset of raw-frame `index`'s header within the buffer.
///
/// `index` must be `< FRAME_OUTER_CHUNK_SIZE`.
pub fn frame_header_offset(index: usize) -> usize {
    debug_assert!(index < FRAME_OUTER_CHUNK_SIZE);
    SUPER_FRAME_HEADER_SIZE + index * FRAME_BUFFER_UNIT_SIZE
}

/// Raw-frame header slice for outer index `index`.
pub fn get_frame_header(buf: &[u8], index: usize) -> &[u8] {
    let offset = frame_header_offset(index);
    &buf[offset..offset + RAW_FRAME_HEADER_SIZE]
}

pub fn get_frame_header_mut(buf: &mut [u8], index: usize) -> &mut [u8] {
    let offset = frame_header_offset(index);
    &mut buf[offset..offset + RAW_FRAME_HEADER_SIZE]
}

/// Byte offset of the first pixel byte, past every header.
pub fn image_data_offset() -> usize {
    SUPER_FRAME_HEADER_SIZE + FRAME_OUTER_CHUNK_SIZE * RAW_FRAME_HEADER_SIZE
}

pub fn get_image_data(buf: &[u8]) -> &[u8] {
    let offset = image_data_offset();
    &buf[offset..offset + FRAME_OUTER_CHUNK_SIZE * FRAME_DATA_SIZE]
}

pub fn get_image_data_mut(buf: &mut [u8]) -> &mut [u8] {
    let offset = image_data_offset();
    &mut buf[offset..offset + FRAME_OUTER_CHUNK_SIZE * FRAME_DATA_SIZE]
}

/// Super-frame header slice (always at the start of the buffer).
pub fn get_super_frame_header(buf: &[u8]) -> &[u8] {
    &buf[0..SUPER_FRAME_HEADER_SIZE]
}

pub fn get_super_frame_header_mut(buf: &mut [u8]) -> &mut [u8] {
    &mut buf[0..SUPER_FRAME_HEADER_SIZE]
}
