//! AAC encoder parameterization. Every packet leaves with an ADTS header.
//!
//! The pure-Rust stack carries no AAC encoder, so the plugin is built over an
//! injected backend; [`unavailable_backend`] is what the factory wires in when
//! none has been supplied.

use std::sync::Arc;

use super::{EncoderSpec, require_bitrate};
use crate::{
    audio::{
        constants::{
            AAC_MAX_BITRATE, AAC_MIN_BITRATE, AAC_OBJECT_TYPE_LC, ADTS_HEADER_SIZE, MAX_CHANNELS,
            MIN_CHANNELS,
        },
        format::{CodecId, Format, SampleFormat, keys},
        native::{EncoderConfig, EncoderFactory},
        plugin::{
            adts::{self, AdtsParams},
            decoder::{require_channels, require_sample_rate},
        },
    },
    common::errors::{CodecError, CodecResult},
};

const DEFAULT_BITRATE: i64 = 128_000;

/// Upper bound of one raw AAC frame per channel (6144 bits).
const MAX_PAYLOAD_PER_CHANNEL: usize = 768;

#[derive(Debug, Default)]
pub struct AacEncoderSpec {
    adts: Option<AdtsParams>,
}

/// An [`EncoderFactory`] that refuses to open.
pub fn unavailable_backend() -> Arc<EncoderFactory> {
    Arc::new(|_: &EncoderConfig| {
        Err(CodecError::Unsupported(
            "no native aac encoder backend".to_owned(),
        ))
    })
}

impl EncoderSpec for AacEncoderSpec {
    fn codec(&self) -> CodecId {
        CodecId::Aac
    }

    fn check_format(&mut self, format: &Format) -> CodecResult<EncoderConfig> {
        let channels = require_channels(format, MIN_CHANNELS..=MAX_CHANNELS)?;
        let sample_rate =
            require_sample_rate(format, |r| adts::sample_rate_index(r).is_some())?;
        let bitrate = require_bitrate(format, DEFAULT_BITRATE, AAC_MIN_BITRATE, AAC_MAX_BITRATE)?;
        let object_type = match format.get_int(keys::PROFILE) {
            Some(p) if (1..=4).contains(&p) => p as u8,
            Some(p) => {
                return Err(CodecError::InvalidConfig(format!("aac profile {p} unsupported")));
            }
            None => AAC_OBJECT_TYPE_LC,
        };

        let (Some(sample_rate_index), Some(channel_config)) = (
            adts::sample_rate_index(sample_rate),
            adts::channel_config(channels),
        ) else {
            return Err(CodecError::InvalidConfig(format!(
                "no adts header for {channels}ch {sample_rate}Hz"
            )));
        };
        self.adts = Some(AdtsParams {
            object_type,
            sample_rate_index,
            channel_config,
        });

        Ok(EncoderConfig {
            codec: CodecId::Aac,
            channels,
            sample_rate,
            bitrate,
            profile: Some(object_type as i64),
        })
    }

    fn input_formats(&self) -> &'static [SampleFormat] {
        &[SampleFormat::S16Le, SampleFormat::F32Le]
    }

    fn header(&self, payload_len: usize) -> CodecResult<Vec<u8>> {
        let params = self
            .adts
            .ok_or(CodecError::InvalidOperation("aac encoder is not configured"))?;
        Ok(params.header(payload_len)?.to_vec())
    }

    fn max_output_size(&self, config: &EncoderConfig) -> usize {
        ADTS_HEADER_SIZE + MAX_PAYLOAD_PER_CHANNEL * config.channels as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::plugin::{BaseEncoder, CodecPlugin, decoder::DecoderState};

    fn format() -> Format {
        let mut f = Format::new();
        f.put_int(keys::CHANNEL_COUNT, 2)
            .put_int(keys::SAMPLE_RATE, 44_100);
        f
    }

    #[test]
    fn header_follows_configuration() {
        let mut spec = AacEncoderSpec::default();
        assert!(spec.header(10).is_err());

        let config = spec.check_format(&format()).expect("config");
        assert_eq!(config.bitrate, DEFAULT_BITRATE);
        assert_eq!(config.profile, Some(2));
        assert_eq!(
            spec.header(371).expect("header"),
            vec![0xFF, 0xF1, 0x50, 0x80, 0x2F, 0x5F, 0xFC]
        );
        assert!(matches!(spec.header(0x2000), Err(CodecError::Unknown(_))));
        assert_eq!(spec.max_output_size(&config), 7 + 1536);
    }

    #[test]
    fn rejects_out_of_range() {
        let mut spec = AacEncoderSpec::default();
        let mut f = format();
        f.put_int(keys::BITRATE, 4_000);
        assert!(spec.check_format(&f).is_err());

        let mut f = format();
        f.put_int(keys::SAMPLE_RATE, 44_000);
        assert!(spec.check_format(&f).is_err());

        let mut f = format();
        f.put_int(keys::CHANNEL_COUNT, 7);
        assert!(spec.check_format(&f).is_err());

        let mut f = format();
        f.put_int(keys::PROFILE, 29);
        assert!(spec.check_format(&f).is_err());
    }

    #[test]
    fn missing_backend_is_unsupported() {
        let enc = BaseEncoder::with_factory(AacEncoderSpec::default(), unavailable_backend());
        assert!(matches!(
            enc.init(&format()),
            Err(CodecError::Unsupported(_))
        ));
        assert_eq!(enc.state(), DecoderState::ContextAllocated);
    }
}
