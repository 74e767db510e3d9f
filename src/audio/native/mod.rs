//! Native codec seam.
//!
//! The plugin layer only ever talks to a codec library through these two
//! traits: *submit packet → receive frame* for decoders and *submit frame →
//! receive packet* for encoders, each answering OK / again / end-of-stream /
//! error. Which library sits behind them is parameterization:
//!
//! | Backend | Codecs |
//! |---|---|
//! | [`SymphoniaDecoder`] | AAC, FLAC, Vorbis, MP3, G.711, Opus |
//! | [`OpusEncoder`] | Opus |
//! | [`G711Encoder`] | G.711 mu-law / A-law |

pub mod decoder;
pub mod g711;
pub mod opus;

use bytes::Bytes;
use thiserror::Error;

pub use self::decoder::SymphoniaDecoder;
pub use self::g711::{G711Encoder, G711Law};
pub use self::opus::OpusEncoder;

use crate::audio::{
    format::{CodecId, SampleFormat},
    frame::AudioFrame,
};

/// Outcome of a native call that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeError {
    /// The codec cannot take input (or give output) until the other side is serviced.
    #[error("resource temporarily unavailable")]
    Again,
    /// The codec has been drained.
    #[error("end of file")]
    Eof,
    #[error("invalid data found when processing input: {0}")]
    InvalidData(String),
    #[error("{0}")]
    Other(String),
}

pub type NativeResult<T> = Result<T, NativeError>;

/// Compressed input handed to a decoder. Empty data is the drain marker.
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    pub data: &'a [u8],
    pub pts: i64,
}

impl<'a> Packet<'a> {
    pub fn new(data: &'a [u8], pts: i64) -> Self {
        Self { data, pts }
    }

    pub fn eos(pts: i64) -> Self {
        Self { data: &[], pts }
    }

    pub fn is_eos(&self) -> bool {
        self.data.is_empty()
    }
}

/// Compressed output produced by an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    pub data: Bytes,
    pub pts: i64,
    pub duration: i64,
}

/// Parameters a decoder backend is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    pub codec: CodecId,
    pub channels: u32,
    pub sample_rate: u32,
    pub extradata: Option<Vec<u8>>,
    pub bits_per_coded_sample: Option<u32>,
    pub max_input_size: usize,
}

/// Parameters an encoder backend is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub codec: CodecId,
    pub channels: u32,
    pub sample_rate: u32,
    pub bitrate: i64,
    pub profile: Option<i64>,
}

pub trait NativeDecoder: Send {
    /// Submit one packet; [`Packet::eos`] starts draining.
    fn send_packet(&mut self, packet: &Packet<'_>) -> NativeResult<()>;

    fn receive_frame(&mut self) -> NativeResult<AudioFrame>;

    /// Discard queued frames and leave draining mode.
    fn flush(&mut self);

    /// The sample format frames are produced in.
    fn sample_format(&self) -> SampleFormat;
}

pub trait NativeEncoder: Send {
    /// Samples per channel each submitted frame must carry; `0` means any.
    fn frame_size(&self) -> usize;

    /// The sample format frames must be submitted in.
    fn sample_format(&self) -> SampleFormat;

    /// Submit one frame; `None` starts draining.
    fn send_frame(&mut self, frame: Option<&AudioFrame>) -> NativeResult<()>;

    fn receive_packet(&mut self) -> NativeResult<EncodedPacket>;

    fn flush(&mut self);
}

/// Opens a decoder backend for a validated configuration.
pub type DecoderFactory =
    dyn Fn(&DecoderConfig) -> crate::common::errors::CodecResult<Box<dyn NativeDecoder>> + Send + Sync;

/// Opens an encoder backend for a validated configuration.
pub type EncoderFactory =
    dyn Fn(&EncoderConfig) -> crate::common::errors::CodecResult<Box<dyn NativeEncoder>> + Send + Sync;
