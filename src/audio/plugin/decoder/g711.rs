//! G.711 decoder parameterization: 8 kHz mono only, one byte per sample.

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{G711_CHANNELS, G711_MAX_INPUT_SIZE, G711_SAMPLE_RATE},
        format::{CodecId, Format},
        native::{DecoderConfig, G711Law},
    },
    common::errors::CodecResult,
};

#[derive(Debug)]
pub struct G711DecoderSpec {
    law: G711Law,
    max_input: usize,
}

impl G711DecoderSpec {
    pub fn new(law: G711Law) -> Self {
        Self {
            law,
            max_input: G711_MAX_INPUT_SIZE,
        }
    }
}

impl DecoderSpec for G711DecoderSpec {
    fn codec(&self) -> CodecId {
        match self.law {
            G711Law::MuLaw => CodecId::G711Mu,
            G711Law::ALaw => CodecId::G711A,
        }
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        let channels = require_channels(format, G711_CHANNELS..=G711_CHANNELS)?;
        let sample_rate = require_sample_rate(format, |r| r == G711_SAMPLE_RATE)?;
        self.max_input = max_input_size(format, G711_MAX_INPUT_SIZE)?;
        Ok(DecoderConfig {
            codec: self.codec(),
            channels,
            sample_rate,
            extradata: None,
            bits_per_coded_sample: Some(8),
            max_input_size: self.max_input,
        })
    }

    fn max_frame_samples(&self) -> usize {
        self.max_input
    }
}
