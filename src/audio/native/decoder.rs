//! `SymphoniaDecoder`: the packet-in / frame-out decoder backend.
//!
//! Wraps one symphonia [`Decoder`] from a registry that carries the default
//! symphonia codecs plus the audiopus-backed Opus decoder. Decoded audio is
//! copied out as planar bytes in a format fixed per codec:
//!
//! | Codec | Output |
//! |---|---|
//! | AAC, Vorbis, MP3 | `F32P` |
//! | FLAC | `S32P` |
//! | G.711, Opus | `S16P` |

use std::sync::OnceLock;

use byteorder::{ByteOrder, LittleEndian};
use symphonia::core::{
    audio::{AudioBufferRef, Channels, SampleBuffer},
    codecs::{
        CODEC_TYPE_AAC, CODEC_TYPE_FLAC, CODEC_TYPE_MP3, CODEC_TYPE_OPUS, CODEC_TYPE_PCM_ALAW,
        CODEC_TYPE_PCM_MULAW, CODEC_TYPE_VORBIS, CodecParameters, CodecRegistry, CodecType,
        Decoder, DecoderOptions,
    },
    conv::ConvertibleSample,
    errors::Error,
    formats::Packet as SymphPacket,
    sample::Sample,
};
use tracing::{debug, warn};

use super::{DecoderConfig, NativeDecoder, NativeError, NativeResult, Packet, opus};
use crate::{
    audio::{
        format::{CodecId, SampleFormat},
        frame::AudioFrame,
    },
    common::errors::{CodecError, CodecResult},
};

fn codecs() -> &'static CodecRegistry {
    static REGISTRY: OnceLock<CodecRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = CodecRegistry::new();
        symphonia::default::register_enabled_codecs(&mut registry);
        opus::register_codecs(&mut registry);
        registry
    })
}

fn codec_type(codec: CodecId) -> CodecType {
    match codec {
        CodecId::Aac => CODEC_TYPE_AAC,
        CodecId::Flac => CODEC_TYPE_FLAC,
        CodecId::Vorbis => CODEC_TYPE_VORBIS,
        CodecId::Mpeg => CODEC_TYPE_MP3,
        CodecId::G711Mu => CODEC_TYPE_PCM_MULAW,
        CodecId::G711A => CODEC_TYPE_PCM_ALAW,
        CodecId::Opus => CODEC_TYPE_OPUS,
    }
}

fn output_format(codec: CodecId) -> SampleFormat {
    match codec {
        CodecId::Aac | CodecId::Vorbis | CodecId::Mpeg => SampleFormat::F32P,
        CodecId::Flac => SampleFormat::S32P,
        CodecId::G711Mu | CodecId::G711A | CodecId::Opus => SampleFormat::S16P,
    }
}

/// Reusable sample buffers, one per output sample type.
#[derive(Default)]
struct Scratch {
    f32: Option<SampleBuffer<f32>>,
    i32: Option<SampleBuffer<i32>>,
    i16: Option<SampleBuffer<i16>>,
}

/// Copy `decoded` into `slot` in planar order and split it into byte planes.
fn planar_bytes<T>(
    slot: &mut Option<SampleBuffer<T>>,
    decoded: AudioBufferRef<'_>,
    bytes_per_sample: usize,
    write: fn(&[T], &mut [u8]),
) -> (Vec<Vec<u8>>, usize)
where
    T: Sample + ConvertibleSample,
{
    let spec = *decoded.spec();
    let channels = spec.channels.count();
    let frames = decoded.frames();

    if slot.as_ref().is_some_and(|b| b.capacity() < frames * channels) {
        *slot = None;
    }
    let duration = decoded.capacity().max(frames) as u64;
    let buf = slot.get_or_insert_with(|| SampleBuffer::<T>::new(duration, spec));
    buf.copy_planar_ref(decoded);

    let samples = buf.samples();
    let planes = (0..channels)
        .map(|c| {
            let mut plane = vec![0u8; frames * bytes_per_sample];
            write(&samples[c * frames..(c + 1) * frames], &mut plane);
            plane
        })
        .collect();
    (planes, frames)
}

pub struct SymphoniaDecoder {
    codec: CodecId,
    inner: Box<dyn Decoder>,
    format: SampleFormat,
    sample_rate: u32,
    scratch: Scratch,
    pending: Option<AudioFrame>,
    draining: bool,
}

impl SymphoniaDecoder {
    pub fn open(config: &DecoderConfig) -> CodecResult<Self> {
        let channels = config.channels.clamp(1, 32);
        let mut params = CodecParameters::new();
        params
            .for_codec(codec_type(config.codec))
            .with_sample_rate(config.sample_rate)
            .with_channels(Channels::from_bits_truncate((1u32 << channels) - 1));

        if let Some(extradata) = &config.extradata {
            params.with_extra_data(extradata.clone().into_boxed_slice());
        }
        if let Some(bits) = config.bits_per_coded_sample {
            params.with_bits_per_coded_sample(bits);
        }
        if matches!(config.codec, CodecId::G711Mu | CodecId::G711A) {
            // One byte per sample: the largest input buffer bounds the frame count.
            params
                .with_max_frames_per_packet(config.max_input_size as u64)
                .with_bits_per_coded_sample(8);
        }

        let inner = codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| match e {
                Error::Unsupported(what) => CodecError::Unsupported(what.to_string()),
                other => CodecError::InvalidConfig(other.to_string()),
            })?;

        debug!(
            "SymphoniaDecoder: opened {:?} {}ch {}Hz",
            config.codec, config.channels, config.sample_rate
        );

        Ok(Self {
            codec: config.codec,
            inner,
            format: output_format(config.codec),
            sample_rate: config.sample_rate,
            scratch: Scratch::default(),
            pending: None,
            draining: false,
        })
    }

    pub fn codec(&self) -> CodecId {
        self.codec
    }
}

impl NativeDecoder for SymphoniaDecoder {
    fn send_packet(&mut self, packet: &Packet<'_>) -> NativeResult<()> {
        if self.pending.is_some() {
            return Err(NativeError::Again);
        }
        if packet.is_eos() {
            self.draining = true;
            return Ok(());
        }
        if self.draining {
            return Err(NativeError::Eof);
        }

        let symph = SymphPacket::new_from_slice(0, packet.pts.max(0) as u64, 0, packet.data);
        let decoded = self.inner.decode(&symph).map_err(|e| match e {
            Error::DecodeError(msg) => NativeError::InvalidData(msg.to_string()),
            other => NativeError::Other(other.to_string()),
        })?;

        let channels = decoded.spec().channels.count();
        let rate = decoded.spec().rate;
        let (planes, frames) = match self.format {
            SampleFormat::F32P => planar_bytes(
                &mut self.scratch.f32,
                decoded,
                4,
                LittleEndian::write_f32_into,
            ),
            SampleFormat::S32P => planar_bytes(
                &mut self.scratch.i32,
                decoded,
                4,
                LittleEndian::write_i32_into,
            ),
            _ => planar_bytes(
                &mut self.scratch.i16,
                decoded,
                2,
                LittleEndian::write_i16_into,
            ),
        };

        if frames == 0 {
            return Ok(());
        }
        if rate != self.sample_rate {
            warn!(
                "SymphoniaDecoder: {:?} stream reports {}Hz, configured {}Hz",
                self.codec, rate, self.sample_rate
            );
        }

        self.pending = Some(AudioFrame {
            format: self.format,
            channels,
            sample_rate: rate,
            nb_samples: frames,
            pts: Some(packet.pts),
            planes,
        });
        Ok(())
    }

    fn receive_frame(&mut self) -> NativeResult<AudioFrame> {
        match self.pending.take() {
            Some(frame) => Ok(frame),
            None if self.draining => Err(NativeError::Eof),
            None => Err(NativeError::Again),
        }
    }

    fn flush(&mut self) {
        self.inner.reset();
        self.pending = None;
        self.draining = false;
    }

    fn sample_format(&self) -> SampleFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mulaw(channels: u32) -> DecoderConfig {
        DecoderConfig {
            codec: CodecId::G711Mu,
            channels,
            sample_rate: 8_000,
            extradata: None,
            bits_per_coded_sample: None,
            max_input_size: 1_024,
        }
    }

    #[test]
    fn mulaw_silence_decodes_to_zero() {
        let mut dec = SymphoniaDecoder::open(&mulaw(1)).expect("open");
        assert_eq!(dec.sample_format(), SampleFormat::S16P);

        dec.send_packet(&Packet::new(&[0xFF; 160], 20_000)).expect("send");
        let frame = dec.receive_frame().expect("frame");
        assert_eq!(frame.nb_samples, 160);
        assert_eq!(frame.channels, 1);
        assert_eq!(frame.pts, Some(20_000));
        assert!(frame.planes[0].iter().all(|&b| b == 0));
    }

    #[test]
    fn second_packet_waits_for_receive() {
        let mut dec = SymphoniaDecoder::open(&mulaw(1)).expect("open");
        dec.send_packet(&Packet::new(&[0xFF; 80], 0)).expect("send");
        assert_eq!(
            dec.send_packet(&Packet::new(&[0xFF; 80], 10_000)),
            Err(NativeError::Again)
        );
        assert!(dec.receive_frame().is_ok());
        assert_eq!(dec.receive_frame(), Err(NativeError::Again));
    }

    #[test]
    fn drain_then_flush() {
        let mut dec = SymphoniaDecoder::open(&mulaw(1)).expect("open");
        dec.send_packet(&Packet::eos(0)).expect("eos");
        assert_eq!(dec.receive_frame(), Err(NativeError::Eof));

        dec.flush();
        assert_eq!(dec.receive_frame(), Err(NativeError::Again));
        dec.send_packet(&Packet::new(&[0xFF; 8], 0)).expect("send after flush");
    }
}
