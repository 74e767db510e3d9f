//! G.711 encoder parameterization: 8 kHz mono S16 in, one byte per sample out.

use super::EncoderSpec;
use crate::{
    audio::{
        constants::{G711_CHANNELS, G711_MAX_INPUT_SIZE, G711_SAMPLE_RATE},
        format::{CodecId, Format, SampleFormat},
        native::{EncoderConfig, G711Law},
        plugin::decoder::{require_channels, require_sample_rate},
    },
    common::errors::CodecResult,
};

/// 64 kbit/s: 8000 samples of 8 bits.
const G711_BITRATE: i64 = 64_000;

#[derive(Debug)]
pub struct G711EncoderSpec {
    law: G711Law,
}

impl G711EncoderSpec {
    pub fn new(law: G711Law) -> Self {
        Self { law }
    }
}

impl EncoderSpec for G711EncoderSpec {
    fn codec(&self) -> CodecId {
        match self.law {
            G711Law::MuLaw => CodecId::G711Mu,
            G711Law::ALaw => CodecId::G711A,
        }
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<EncoderConfig> {
        Ok(EncoderConfig {
            codec: self.codec(),
            channels: require_channels(format, G711_CHANNELS..=G711_CHANNELS)?,
            sample_rate: require_sample_rate(format, |r| r == G711_SAMPLE_RATE)?,
            bitrate: G711_BITRATE,
            profile: None,
        })
    }

    fn input_formats(&self) -> &'static [SampleFormat] {
        &[SampleFormat::S16Le]
    }

    fn max_output_size(&self, _config: &EncoderConfig) -> usize {
        G711_MAX_INPUT_SIZE
    }

    /// One byte per sample.
    fn max_variable_frame(&self, config: &EncoderConfig) -> usize {
        G711_MAX_INPUT_SIZE / config.channels.max(1) as usize
    }
}
