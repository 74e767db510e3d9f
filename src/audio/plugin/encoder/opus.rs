//! Opus encoder parameterization.

use super::{EncoderSpec, require_bitrate};
use crate::{
    audio::{
        constants::{
            MAX_OPUS_PACKET_SIZE, OPUS_DEFAULT_BITRATE, OPUS_MAX_BITRATE, OPUS_MIN_BITRATE,
            OPUS_SAMPLE_RATES,
        },
        format::{CodecId, Format, SampleFormat},
        native::EncoderConfig,
        plugin::decoder::{require_channels, require_sample_rate},
    },
    common::errors::CodecResult,
};

#[derive(Debug, Default)]
pub struct OpusEncoderSpec;

impl EncoderSpec for OpusEncoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Opus
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<EncoderConfig> {
        Ok(EncoderConfig {
            codec: CodecId::Opus,
            channels: require_channels(format, 1..=2)?,
            sample_rate: require_sample_rate(format, |r| OPUS_SAMPLE_RATES.contains(&r))?,
            bitrate: require_bitrate(
                format,
                OPUS_DEFAULT_BITRATE,
                OPUS_MIN_BITRATE,
                OPUS_MAX_BITRATE,
            )?,
            profile: None,
        })
    }

    fn input_formats(&self) -> &'static [SampleFormat] {
        &[SampleFormat::S16Le, SampleFormat::F32Le]
    }

    fn max_output_size(&self, _config: &EncoderConfig) -> usize {
        MAX_OPUS_PACKET_SIZE
    }
}
