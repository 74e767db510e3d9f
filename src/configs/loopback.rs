use serde::{Deserialize, Serialize};

use crate::audio::format::{Format, keys};

/// Parameters of the encode → decode run performed by the binary.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoopbackConfig {
    /// MIME type of the codec exercised in both directions.
    pub mime: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: i64,
    /// Samples per channel in each input buffer handed to the encoder.
    pub chunk_samples: usize,
    pub duration_ms: u64,
    pub tone_hz: f64,
    /// Extra keys merged over the generated encoder format.
    pub encoder_format: Format,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            mime: "audio/opus".to_owned(),
            sample_rate: 48_000,
            channels: 2,
            bitrate: 96_000,
            chunk_samples: 700,
            duration_ms: 2_000,
            tone_hz: 440.0,
            encoder_format: Format::new(),
        }
    }
}

impl LoopbackConfig {
    /// Stream parameters shared by the encoder and decoder.
    pub fn stream_format(&self) -> Format {
        let mut format = Format::new();
        format
            .put_int(keys::CHANNEL_COUNT, self.channels as i64)
            .put_int(keys::SAMPLE_RATE, self.sample_rate as i64);
        format
    }

    pub fn encoder_format(&self) -> Format {
        let mut format = self.stream_format();
        format.put_int(keys::BITRATE, self.bitrate);
        format.extend(&self.encoder_format);
        format
    }
}
