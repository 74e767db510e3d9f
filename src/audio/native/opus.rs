//! Opus via `audiopus`: a symphonia-compatible decoder (registered into the
//! shared codec registry) and a native encoder producing 20 ms packets.

use audiopus::{
    Application, Bitrate, Channels, MutSignals, SampleRate,
    coder::{Decoder as OpusDecoder, Encoder as RawOpusEncoder},
    packet::Packet as OpusPacket,
};
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use symphonia::core::{
    audio::{AsAudioBufferRef, AudioBuffer, AudioBufferRef, Layout, Signal, SignalSpec},
    codecs::{
        CODEC_TYPE_OPUS, CodecDescriptor, CodecParameters, CodecRegistry, Decoder,
        DecoderOptions, FinalizeResult,
    },
    errors::{Error, Result},
    formats::Packet as SymphPacket,
    units::Duration,
};

use super::{EncodedPacket, EncoderConfig, NativeEncoder, NativeError, NativeResult};
use crate::{
    audio::{
        constants::{MAX_OPUS_FRAME_SIZE, MAX_OPUS_PACKET_SIZE, OPUS_FRAMES_PER_SECOND},
        format::SampleFormat,
        frame::AudioFrame,
    },
    common::errors::{CodecError, CodecResult},
};

fn opus_rate(rate: u32) -> Option<SampleRate> {
    match rate {
        8_000 => Some(SampleRate::Hz8000),
        12_000 => Some(SampleRate::Hz12000),
        16_000 => Some(SampleRate::Hz16000),
        24_000 => Some(SampleRate::Hz24000),
        48_000 => Some(SampleRate::Hz48000),
        _ => None,
    }
}

fn opus_channels(channels: usize) -> Channels {
    if channels == 1 { Channels::Mono } else { Channels::Stereo }
}

fn io_error(e: impl ToString) -> Error {
    Error::IoError(std::io::Error::other(e.to_string()))
}

/// Register the Opus decoder into a symphonia registry.
pub fn register_codecs(registry: &mut CodecRegistry) {
    registry.register_all::<OpusCodecDecoder>();
}

// ── Decoder ──────────────────────────────────────────────────────────────────

pub struct OpusCodecDecoder {
    params: CodecParameters,
    channels: usize,
    rate: SampleRate,
    decoder: OpusDecoder,
    buf: AudioBuffer<i16>,
    /// Reusable interleaved scratch buffer.
    pcm: Vec<i16>,
}

// audiopus::coder::Decoder is Send but not Sync.
// We only touch it via `&mut self`, so Sync is safe.
unsafe impl Sync for OpusCodecDecoder {}

impl Decoder for OpusCodecDecoder {
    fn try_new(params: &CodecParameters, _options: &DecoderOptions) -> Result<Self> {
        if params.codec != CODEC_TYPE_OPUS {
            return Err(Error::Unsupported("not an opus stream"));
        }

        let sample_rate = params.sample_rate.unwrap_or(48_000);
        let rate = opus_rate(sample_rate).ok_or(Error::Unsupported("opus: sample rate"))?;
        let channels = params
            .channels
            .map(|c| c.count())
            .unwrap_or(2)
            .clamp(1, 2);

        let decoder = OpusDecoder::new(rate, opus_channels(channels)).map_err(io_error)?;

        let layout = if channels == 1 { Layout::Mono } else { Layout::Stereo };
        let spec = SignalSpec::new_with_layout(sample_rate, layout);
        let buf = AudioBuffer::<i16>::new(MAX_OPUS_FRAME_SIZE as Duration, spec);
        let pcm = vec![0i16; MAX_OPUS_FRAME_SIZE * channels];

        Ok(Self {
            params: params.clone(),
            channels,
            rate,
            decoder,
            buf,
            pcm,
        })
    }

    fn supported_codecs() -> &'static [CodecDescriptor] {
        &[CodecDescriptor {
            codec: CODEC_TYPE_OPUS,
            short_name: "opus",
            long_name: "Opus (via audiopus)",
            inst_func: |params, opts| Ok(Box::new(OpusCodecDecoder::try_new(params, opts)?)),
        }]
    }

    fn reset(&mut self) {
        if let Ok(dec) = OpusDecoder::new(self.rate, opus_channels(self.channels)) {
            self.decoder = dec;
        }
    }

    fn codec_params(&self) -> &CodecParameters {
        &self.params
    }

    fn decode(&mut self, packet: &SymphPacket) -> Result<AudioBufferRef<'_>> {
        let packet = OpusPacket::try_from(packet.data.as_ref())
            .map_err(|_| Error::DecodeError("opus: malformed packet"))?;
        let signals = MutSignals::try_from(self.pcm.as_mut_slice()).map_err(io_error)?;
        let n = self
            .decoder
            .decode(Some(packet), signals, false)
            .map_err(|_| Error::DecodeError("opus: decode failed"))?;

        // Deinterleave into symphonia's planar AudioBuffer.
        self.buf.clear();
        self.buf.render_reserved(Some(n));

        let ch = self.channels;
        for c in 0..ch {
            for (i, s) in self.buf.chan_mut(c).iter_mut().enumerate() {
                *s = self.pcm[i * ch + c];
            }
        }

        Ok(self.buf.as_audio_buffer_ref())
    }

    fn finalize(&mut self) -> FinalizeResult {
        FinalizeResult::default()
    }

    fn last_decoded(&self) -> AudioBufferRef<'_> {
        self.buf.as_audio_buffer_ref()
    }
}

// ── Encoder ──────────────────────────────────────────────────────────────────

/// Interleaved S16 PCM → Opus packets, one 20 ms frame per call.
pub struct OpusEncoder {
    encoder: RawOpusEncoder,
    rate: SampleRate,
    channels: usize,
    sample_rate: u32,
    bitrate: i32,
    frame_size: usize,
    pcm: Vec<i16>,
    out: Vec<u8>,
    pending: Option<EncodedPacket>,
    draining: bool,
}

fn open_raw(rate: SampleRate, channels: usize, bitrate: i32) -> CodecResult<RawOpusEncoder> {
    let mut encoder = RawOpusEncoder::new(rate, opus_channels(channels), Application::Audio)
        .map_err(|e| CodecError::ResourceExhausted(format!("opus encoder: {e}")))?;
    encoder
        .set_bitrate(Bitrate::BitsPerSecond(bitrate))
        .map_err(|e| CodecError::InvalidConfig(format!("opus bitrate {bitrate}: {e}")))?;
    Ok(encoder)
}

impl OpusEncoder {
    pub fn open(config: &EncoderConfig) -> CodecResult<Self> {
        let rate = opus_rate(config.sample_rate).ok_or_else(|| {
            CodecError::InvalidConfig(format!("opus sample rate {}", config.sample_rate))
        })?;
        let channels = config.channels as usize;
        let bitrate = i32::try_from(config.bitrate)
            .map_err(|_| CodecError::InvalidConfig(format!("opus bitrate {}", config.bitrate)))?;
        let frame_size = (config.sample_rate / OPUS_FRAMES_PER_SECOND) as usize;

        Ok(Self {
            encoder: open_raw(rate, channels, bitrate)?,
            rate,
            channels,
            sample_rate: config.sample_rate,
            bitrate,
            frame_size,
            pcm: vec![0; frame_size * channels],
            out: vec![0; MAX_OPUS_PACKET_SIZE],
            pending: None,
            draining: false,
        })
    }
}

impl NativeEncoder for OpusEncoder {
    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn sample_format(&self) -> SampleFormat {
        SampleFormat::S16Le
    }

    fn send_frame(&mut self, frame: Option<&AudioFrame>) -> NativeResult<()> {
        let Some(frame) = frame else {
            self.draining = true;
            return Ok(());
        };
        if self.pending.is_some() {
            return Err(NativeError::Again);
        }
        if frame.format != SampleFormat::S16Le
            || frame.channels != self.channels
            || frame.nb_samples != self.frame_size
        {
            return Err(NativeError::InvalidData(format!(
                "opus expects {} S16 samples x {}ch, got {} {:?} x {}ch",
                self.frame_size, self.channels, frame.nb_samples, frame.format, frame.channels
            )));
        }

        LittleEndian::read_i16_into(&frame.planes[0], &mut self.pcm);
        let n = self
            .encoder
            .encode(&self.pcm, &mut self.out)
            .map_err(|e| NativeError::Other(e.to_string()))?;

        self.pending = Some(EncodedPacket {
            data: Bytes::copy_from_slice(&self.out[..n]),
            pts: frame.pts.unwrap_or_default(),
            duration: frame.duration_us(),
        });
        Ok(())
    }

    fn receive_packet(&mut self) -> NativeResult<EncodedPacket> {
        match self.pending.take() {
            Some(packet) => Ok(packet),
            None if self.draining => Err(NativeError::Eof),
            None => Err(NativeError::Again),
        }
    }

    fn flush(&mut self) {
        self.pending = None;
        self.draining = false;
        match open_raw(self.rate, self.channels, self.bitrate) {
            Ok(encoder) => self.encoder = encoder,
            Err(e) => tracing::warn!(
                "OpusEncoder: {}Hz reopen after flush failed: {}",
                self.sample_rate,
                e
            ),
        }
    }
}
