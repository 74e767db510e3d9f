//! ADTS framing for raw AAC payloads.
//!
//! Writing covers the fixed 7-byte header (no CRC) the encoder prepends;
//! parsing is only as deep as the decoder needs to strip a header off.

use crate::{
    audio::constants::{
        AAC_SAMPLE_RATES, ADTS_HEADER_SIZE, ADTS_HEADER_SIZE_CRC, ADTS_MAX_FRAME_LENGTH,
    },
    common::errors::{CodecError, CodecResult},
};

/// Index of `sample_rate` in the MPEG-4 sampling-frequency table.
pub fn sample_rate_index(sample_rate: u32) -> Option<u8> {
    AAC_SAMPLE_RATES
        .iter()
        .position(|&r| r == sample_rate)
        .map(|i| i as u8)
}

/// MPEG-4 channel configuration for a plain channel count (8 channels is config 7).
pub fn channel_config(channels: u32) -> Option<u8> {
    match channels {
        1..=6 => Some(channels as u8),
        8 => Some(7),
        _ => None,
    }
}

/// The fields an encoder header is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdtsParams {
    /// MPEG-4 audio object type (2 = AAC-LC).
    pub object_type: u8,
    pub sample_rate_index: u8,
    pub channel_config: u8,
}

impl AdtsParams {
    /// Header for a payload of `payload_len` bytes.
    pub fn header(&self, payload_len: usize) -> CodecResult<[u8; ADTS_HEADER_SIZE]> {
        let frame_length = payload_len + ADTS_HEADER_SIZE;
        if frame_length > ADTS_MAX_FRAME_LENGTH {
            return Err(CodecError::Unknown(format!(
                "adts frame length {frame_length} exceeds {ADTS_MAX_FRAME_LENGTH}"
            )));
        }
        let profile = self.object_type.saturating_sub(1) & 0x3;
        let len = frame_length as u16;

        Ok([
            0xFF,
            // sync (low 4 bits), MPEG-4, layer 0, no CRC
            0xF1,
            (profile << 6) | ((self.sample_rate_index & 0xF) << 2) | ((self.channel_config >> 2) & 0x1),
            ((self.channel_config & 0x3) << 6) | ((len >> 11) & 0x3) as u8,
            ((len >> 3) & 0xFF) as u8,
            (((len & 0x7) << 5) as u8) | 0x1F,
            // buffer fullness 0x7FF (VBR), one raw data block
            0xFC,
        ])
    }
}

fn has_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && (data[1] & 0xF0) == 0xF0
}

/// Header length of the ADTS frame at the start of `data`, if there is one.
pub fn header_len(data: &[u8]) -> Option<usize> {
    if data.len() < ADTS_HEADER_SIZE || !has_sync(data) {
        return None;
    }
    let protection_absent = data[1] & 0x1 == 1;
    let len = if protection_absent {
        ADTS_HEADER_SIZE
    } else {
        ADTS_HEADER_SIZE_CRC
    };
    (data.len() >= len).then_some(len)
}

/// Payload of an ADTS frame; data without a sync word is returned unchanged.
pub fn strip(data: &[u8]) -> &[u8] {
    match header_len(data) {
        Some(len) => &data[len..],
        None => data,
    }
}
