//! Opus decoder parameterization.

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{MAX_OPUS_FRAME_SIZE, MAX_OPUS_PACKET_SIZE, OPUS_SAMPLE_RATES},
        format::{CodecId, Format},
        native::DecoderConfig,
    },
    common::errors::CodecResult,
};

#[derive(Debug, Default)]
pub struct OpusDecoderSpec;

impl DecoderSpec for OpusDecoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Opus
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        Ok(DecoderConfig {
            codec: CodecId::Opus,
            channels: require_channels(format, 1..=2)?,
            sample_rate: require_sample_rate(format, |r| OPUS_SAMPLE_RATES.contains(&r))?,
            extradata: None,
            bits_per_coded_sample: None,
            max_input_size: max_input_size(format, MAX_OPUS_PACKET_SIZE)?,
        })
    }

    fn max_frame_samples(&self) -> usize {
        MAX_OPUS_FRAME_SIZE
    }
}
