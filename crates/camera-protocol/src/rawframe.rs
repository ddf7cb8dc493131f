//! Accessors over a single raw-frame header (one per outer chunk inside a
//! super-frame).

use crate::header::*;

fn u64_at(buf: &[u8], offset: usize) -> u64 {
    u64::from_ne_bytes(buf[offset..offset + 8].try_into().expect("slice len 8"))
}

fn set_u64_at(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}

fn u32_at(buf: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes(buf[offset..offset + 4].try_into().expect("slice len 4"))
}

fn set_u32_at(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

pub fn get_frame_number(buf: &[u8]) -> u64 {
    u64_at(buf, RF_FRAME_NUMBER)
}

pub fn set_frame_number(buf: &mut [u8], value: u64) {
    set_u64_at(buf, RF_FRAME_NUMBER, value);
}

pub fn get_packets_received(buf: &[u8]) -> u32 {
    u32_at(buf, RF_PACKETS_RECEIVED)
}

fn set_packets_received(buf: &mut [u8], value: u32) {
    set_u32_at(buf, RF_PACKETS_RECEIVED, value);
}

/// `packets_per_frame - packets_received`, grounded on
/// `OrcaProtocolDecoder::get_packets_dropped`.
pub fn get_packets_dropped(buf: &[u8]) -> u32 {
    PACKETS_PER_FRAME as u32 - get_packets_received(buf)
}

pub fn get_sof_count(buf: &[u8]) -> u32 {
    u32_at(buf, RF_SOF_COUNT)
}

pub fn set_sof_count(buf: &mut [u8], value: u32) {
    set_u32_at(buf, RF_SOF_COUNT, value);
}

pub fn get_eof_count(buf: &[u8]) -> u32 {
    u32_at(buf, RF_EOF_COUNT)
}

pub fn set_eof_count(buf: &mut [u8], value: u32) {
    set_u32_at(buf, RF_EOF_COUNT, value);
}

pub fn get_start_time(buf: &[u8]) -> u64 {
    u64_at(buf, RF_START_TIME)
}

pub fn set_start_time(buf: &mut [u8], value: u64) {
    set_u64_at(buf, RF_START_TIME, value);
}

pub fn get_complete_time(buf: &[u8]) -> u64 {
    u64_at(buf, RF_COMPLETE_TIME)
}

pub fn set_complete_time(buf: &mut [u8], value: u64) {
    set_u64_at(buf, RF_COMPLETE_TIME, value);
}

pub fn get_time_delta(buf: &[u8]) -> u32 {
    u32_at(buf, RF_TIME_DELTA)
}

pub fn set_time_delta(buf: &mut [u8], value: u32) {
    set_u32_at(buf, RF_TIME_DELTA, value);
}

pub fn get_image_size(buf: &[u8]) -> u64 {
    u64_at(buf, RF_IMAGE_SIZE)
}

pub fn set_image_size(buf: &mut [u8], value: u64) {
    set_u64_at(buf, RF_IMAGE_SIZE, value);
}

pub fn packet_state(buf: &[u8]) -> &[u8] {
    &buf[RF_PACKET_STATE..RF_PACKET_STATE + PACKETS_PER_FRAME]
}

/// Mark packet `packet_number` received. Fails (returns `false`) without
/// mutating anything when `packet_number >= PACKETS_PER_FRAME`, matching
/// `OrcaProtocolDecoder::set_packet_received`. Idempotent: a duplicate
/// delivery of an already-marked packet does not inflate the received
/// count past `PACKETS_PER_FRAME`.
pub fn set_packet_received(buf: &mut [u8], packet_number: usize) -> bool {
    if packet_number >= PACKETS_PER_FRAME {
        return false;
    }
    if buf[RF_PACKET_STATE + packet_number] != 0 {
        return true;
    }
    buf[RF_PACKET_STATE + packet_number] = 1;
    let received = get_packets_received(buf);
    set_packets_received(buf, received + 1);
    true
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// `get_packets_dropped = packets_per_frame - packets_received` must
        /// hold after any sequence of `set_packet_received` calls on a
        /// zeroed frame header, in or out of range.
        #[test]
        fn packets_dropped_invariant_holds_after_any_call_sequence(
            packet_numbers in prop::collection::vec(0usize..PACKETS_PER_FRAME + 4, 0..32)
        ) {
            let mut buf = vec![0u8; RAW_FRAME_HEADER_SIZE];
            for packet_number in packet_numbers {
                set_packet_received(&mut buf, packet_number);
                prop_assert_eq!(
                    get_packets_dropped(&buf),
                    PACKETS_PER_FRAME as u32 - get_packets_received(&buf)
                );
            }
        }
    }
}
