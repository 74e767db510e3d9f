//! Vorbis decoder parameterization. Extradata is mandatory: either a ready
//! `codec_config`, or the identification and setup headers, which are
//! concatenated in that order.

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{MAX_CHANNELS, MIN_CHANNELS, VORBIS_FRAME_SIZE, VORBIS_MAX_INPUT_SIZE},
        format::{CodecId, Format, keys},
        native::DecoderConfig,
    },
    common::errors::{CodecError, CodecResult},
};

/// Packet type byte plus the `vorbis` signature opening every header packet.
fn is_header(packet: &[u8], kind: u8) -> bool {
    packet.len() > 7 && packet[0] == kind && &packet[1..7] == b"vorbis"
}

#[derive(Debug, Default)]
pub struct VorbisDecoderSpec;

impl DecoderSpec for VorbisDecoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Vorbis
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        let channels = require_channels(format, MIN_CHANNELS..=MAX_CHANNELS)?;
        let sample_rate = require_sample_rate(format, |_| true)?;

        let extradata = match format.get_bytes(keys::CODEC_CONFIG) {
            Some(config) if !config.is_empty() => config.to_vec(),
            _ => {
                let ident = format.get_bytes(keys::IDENTIFICATION_HEADER).unwrap_or_default();
                let setup = format.get_bytes(keys::SETUP_HEADER).unwrap_or_default();
                if !is_header(ident, 0x01) || !is_header(setup, 0x05) {
                    return Err(CodecError::InvalidConfig(
                        "vorbis needs identification and setup headers".into(),
                    ));
                }
                [ident, setup].concat()
            }
        };

        Ok(DecoderConfig {
            codec: CodecId::Vorbis,
            channels,
            sample_rate,
            extradata: Some(extradata),
            bits_per_coded_sample: None,
            max_input_size: max_input_size(format, VORBIS_MAX_INPUT_SIZE)?,
        })
    }

    fn max_frame_samples(&self) -> usize {
        VORBIS_FRAME_SIZE
    }
}
