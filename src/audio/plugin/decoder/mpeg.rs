//! MP3 decoder parameterization.

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{MPEG_FRAME_SIZE, MPEG_MAX_INPUT_SIZE, MPEG_SAMPLE_RATES},
        format::{CodecId, Format},
        native::DecoderConfig,
    },
    common::errors::CodecResult,
};

#[derive(Debug, Default)]
pub struct MpegDecoderSpec;

impl DecoderSpec for MpegDecoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Mpeg
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        Ok(DecoderConfig {
            codec: CodecId::Mpeg,
            channels: require_channels(format, 1..=2)?,
            sample_rate: require_sample_rate(format, |r| MPEG_SAMPLE_RATES.contains(&r))?,
            extradata: None,
            bits_per_coded_sample: None,
            max_input_size: max_input_size(format, MPEG_MAX_INPUT_SIZE)?,
        })
    }

    fn max_frame_samples(&self) -> usize {
        MPEG_FRAME_SIZE
    }
}
