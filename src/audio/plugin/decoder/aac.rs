//! AAC decoder parameterization: raw or ADTS-framed input, AudioSpecificConfig
//! taken from `codec_config` or generated from the stream parameters.

use super::{DecoderSpec, max_input_size, require_channels, require_sample_rate};
use crate::{
    audio::{
        constants::{
            AAC_MAX_FRAME_SAMPLES, AAC_MAX_INPUT_SIZE, AAC_OBJECT_TYPE_LC, MAX_CHANNELS,
            MIN_CHANNELS,
        },
        format::{CodecId, Format, keys},
        native::DecoderConfig,
        plugin::adts,
    },
    common::errors::{CodecError, CodecResult},
};

#[derive(Debug, Default)]
pub struct AacDecoderSpec {
    adts: bool,
}

/// Two-byte AudioSpecificConfig: object type, frequency index, channel config.
pub fn audio_specific_config(object_type: u8, sample_rate: u32, channels: u32) -> Option<[u8; 2]> {
    let freq = adts::sample_rate_index(sample_rate)?;
    let chan = adts::channel_config(channels)?;
    let asc = ((object_type as u16 & 0x1F) << 11) | ((freq as u16) << 7) | ((chan as u16) << 3);
    Some(asc.to_be_bytes())
}

impl DecoderSpec for AacDecoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Aac
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig> {
        let channels = require_channels(format, MIN_CHANNELS..=MAX_CHANNELS)?;
        let sample_rate =
            require_sample_rate(format, |r| adts::sample_rate_index(r).is_some())?;
        self.adts = format.get_int(keys::AAC_IS_ADTS).unwrap_or(0) != 0;

        let extradata = match format.get_bytes(keys::CODEC_CONFIG) {
            Some(config) if !config.is_empty() => config.to_vec(),
            _ => {
                let object_type = match format.get_int(keys::PROFILE) {
                    Some(p) if (1..=31).contains(&p) => p as u8,
                    _ => AAC_OBJECT_TYPE_LC,
                };
                audio_specific_config(object_type, sample_rate, channels)
                    .ok_or_else(|| {
                        CodecError::InvalidConfig(format!(
                            "no AudioSpecificConfig for {channels}ch {sample_rate}Hz"
                        ))
                    })?
                    .to_vec()
            }
        };

        Ok(DecoderConfig {
            codec: CodecId::Aac,
            channels,
            sample_rate,
            extradata: Some(extradata),
            bits_per_coded_sample: None,
            max_input_size: max_input_size(format, AAC_MAX_INPUT_SIZE)?,
        })
    }

    fn prepare<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        if self.adts { adts::strip(data) } else { data }
    }

    fn max_frame_samples(&self) -> usize {
        AAC_MAX_FRAME_SAMPLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(channels: i64, rate: i64) -> Format {
        let mut f = Format::new();
        f.put_int(keys::CHANNEL_COUNT, channels)
            .put_int(keys::SAMPLE_RATE, rate);
        f
    }

    #[test]
    fn generates_lc_config() {
        // LC, 44.1 kHz (index 4), stereo.
        assert_eq!(audio_specific_config(2, 44_100, 2), Some([0x12, 0x10]));
        let config = AacDecoderSpec::default()
            .check_format(&format(2, 44_100))
            .expect("config");
        assert_eq!(config.extradata, Some(vec![0x12, 0x10]));
        assert_eq!(config.max_input_size, AAC_MAX_INPUT_SIZE);
    }

    #[test]
    fn codec_config_wins() {
        let mut f = format(1, 48_000);
        f.put_bytes(keys::CODEC_CONFIG, vec![0x11, 0x88]);
        let config = AacDecoderSpec::default().check_format(&f).expect("config");
        assert_eq!(config.extradata, Some(vec![0x11, 0x88]));
    }

    #[test]
    fn rejects_out_of_range() {
        let mut spec = AacDecoderSpec::default();
        assert!(spec.check_format(&format(9, 44_100)).is_err());
        assert!(spec.check_format(&format(2, 44_000)).is_err());
        assert!(spec.check_format(&Format::new()).is_err());
        // 7 channels has no channel configuration to generate from.
        assert!(spec.check_format(&format(7, 44_100)).is_err());
    }

    #[test]
    fn adts_flag_controls_stripping() {
        let frame = [0xFF, 0xF1, 0x50, 0x80, 0x01, 0x5F, 0xFC, 9];
        let mut spec = AacDecoderSpec::default();
        spec.check_format(&format(2, 44_100)).expect("config");
        assert_eq!(spec.prepare(&frame).len(), 8);

        let mut f = format(2, 44_100);
        f.put_int(keys::AAC_IS_ADTS, 1);
        spec.check_format(&f).expect("config");
        assert_eq!(spec.prepare(&frame), &[9]);
    }
}
