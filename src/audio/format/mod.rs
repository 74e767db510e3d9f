//! Media description: sample formats, channel layouts, codec identities and
//! the key/value [`Format`] consumed by plugin configuration.

pub mod codec;
pub mod layout;
pub mod sample;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::errors::{CodecError, CodecResult};

pub use codec::{CodecId, CodecKind};
pub use layout::ChannelLayout;
pub use sample::SampleFormat;

/// Well-known [`Format`] keys.
pub mod keys {
    pub const CHANNEL_COUNT: &str = "channel_count";
    pub const SAMPLE_RATE: &str = "sample_rate";
    pub const BITRATE: &str = "bitrate";
    pub const SAMPLE_FORMAT: &str = "audio_sample_format";
    pub const CHANNEL_LAYOUT: &str = "channel_layout";
    pub const MAX_INPUT_SIZE: &str = "max_input_size";
    pub const CODEC_CONFIG: &str = "codec_config";
    pub const AAC_IS_ADTS: &str = "aac_is_adts";
    pub const PROFILE: &str = "profile";
    pub const COMPLIANCE_LEVEL: &str = "compliance_level";
    pub const BITS_PER_CODED_SAMPLE: &str = "bits_per_coded_sample";
    pub const IDENTIFICATION_HEADER: &str = "identification_header";
    pub const SETUP_HEADER: &str = "setup_header";
    pub const MIME: &str = "codec_mime";
    pub const FRAME_SIZE: &str = "audio_samples_per_frame";
}

/// A single [`Format`] value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatValue {
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

/// Ordered key/value description of a media stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Format {
    items: BTreeMap<String, FormatValue>,
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(&mut self, key: &str, value: i64) -> &mut Self {
        self.items.insert(key.to_owned(), FormatValue::Int(value));
        self
    }

    pub fn put_str(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.items
            .insert(key.to_owned(), FormatValue::Str(value.into()));
        self
    }

    pub fn put_bytes(&mut self, key: &str, value: impl Into<Vec<u8>>) -> &mut Self {
        self.items
            .insert(key.to_owned(), FormatValue::Bytes(value.into()));
        self
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.items.get(key) {
            Some(FormatValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.items.get(key) {
            Some(FormatValue::Str(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.items.get(key) {
            Some(FormatValue::Bytes(v)) => Some(v),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Merge every entry of `other` into `self`, overwriting duplicates.
    pub fn extend(&mut self, other: &Format) {
        for (k, v) in &other.items {
            self.items.insert(k.clone(), v.clone());
        }
    }

    // ── Typed accessors ──────────────────────────────────────────────────────

    /// Non-negative integer that fits in `u32`.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get_int(key).and_then(|v| u32::try_from(v).ok())
    }

    pub fn channel_count(&self) -> Option<u32> {
        self.get_u32(keys::CHANNEL_COUNT)
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.get_u32(keys::SAMPLE_RATE)
    }

    pub fn bitrate(&self) -> Option<i64> {
        self.get_int(keys::BITRATE)
    }

    /// `None` when the key is absent; an unknown code is a configuration error.
    pub fn sample_format(&self) -> CodecResult<Option<SampleFormat>> {
        match self.get_int(keys::SAMPLE_FORMAT) {
            None => Ok(None),
            Some(code) => SampleFormat::from_code(code).map(Some).ok_or_else(|| {
                CodecError::InvalidConfig(format!("unknown audio_sample_format {code}"))
            }),
        }
    }

    pub fn channel_layout(&self) -> Option<ChannelLayout> {
        self.get_int(keys::CHANNEL_LAYOUT)
            .and_then(|v| u64::try_from(v).ok())
            .map(ChannelLayout)
    }

    pub fn max_input_size(&self) -> Option<usize> {
        self.get_int(keys::MAX_INPUT_SIZE)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v > 0)
    }
}
