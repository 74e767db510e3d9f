//! FLAC decoder parameterization. The native decoder needs a STREAMINFO
//! block; one is synthesized when the format carries none.

use byteorder::{BigEndian, ByteOrder};

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{
            FLAC_MAX_BLOCK_SIZE, FLAC_MAX_INPUT_SIZE, FLAC_MAX_SAMPLE_RATE, FLAC_MIN_BLOCK_SIZE,
            FLAC_STREAMINFO_SIZE, MAX_CHANNELS, MIN_CHANNELS,
        },
        format::{CodecId, Format, keys},
        native::DecoderConfig,
    },
    common::errors::{CodecError, CodecResult},
};

const BITS_PER_SAMPLE: [u32; 3] = [16, 24, 32];

#[derive(Debug, Default)]
pub struct FlacDecoderSpec;

/// STREAMINFO metadata block body for a stream of unknown length.
pub fn streaminfo(sample_rate: u32, channels: u32, bits_per_sample: u32) -> [u8; FLAC_STREAMINFO_SIZE] {
    let mut block = [0u8; FLAC_STREAMINFO_SIZE];
    BigEndian::write_u16(&mut block[0..2], FLAC_MIN_BLOCK_SIZE);
    BigEndian::write_u16(&mut block[2..4], FLAC_MAX_BLOCK_SIZE);
    // min/max frame size (24 bits each) left unknown.
    let packed = ((sample_rate as u64 & 0xF_FFFF) << 44)
        | (((channels - 1) as u64 & 0x7) << 41)
        | (((bits_per_sample - 1) as u64 & 0x1F) << 36);
    BigEndian::write_u64(&mut block[10..18], packed);
    // MD5 signature stays zero.
    block
}

impl DecoderSpec for FlacDecoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Flac
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        let channels = require_channels(format, MIN_CHANNELS..=MAX_CHANNELS)?;
        let sample_rate = require_sample_rate(format, |r| r <= FLAC_MAX_SAMPLE_RATE)?;
        let bits = format.get_u32(keys::BITS_PER_CODED_SAMPLE).unwrap_or(16);
        if !BITS_PER_SAMPLE.contains(&bits) {
            return Err(CodecError::InvalidConfig(format!(
                "flac bits_per_coded_sample {bits} unsupported"
            )));
        }

        let extradata = match format.get_bytes(keys::CODEC_CONFIG) {
            Some(config) if config.len() == FLAC_STREAMINFO_SIZE => config.to_vec(),
            Some(config) if !config.is_empty() => {
                return Err(CodecError::InvalidConfig(format!(
                    "flac codec_config must be a {FLAC_STREAMINFO_SIZE}-byte STREAMINFO, got {}",
                    config.len()
                )));
            }
            _ => streaminfo(sample_rate, channels, bits).to_vec(),
        };

        Ok(DecoderConfig {
            codec: CodecId::Flac,
            channels,
            sample_rate,
            extradata: Some(extradata),
            bits_per_coded_sample: Some(bits),
            max_input_size: max_input_size(format, FLAC_MAX_INPUT_SIZE)?,
        })
    }

    fn max_frame_samples(&self) -> usize {
        FLAC_MAX_BLOCK_SIZE as usize
    }
}
