//! G.711 companding encoder: 16-bit linear PCM → one mu-law or A-law byte
//! per sample.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use super::{EncodedPacket, NativeEncoder, NativeError, NativeResult};
use crate::audio::{format::SampleFormat, frame::AudioFrame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum G711Law {
    MuLaw,
    ALaw,
}

const ULAW_BIAS: i32 = 0x84;
const ULAW_CLIP: i32 = 32_635;

/// Segment end points for 13-bit A-law magnitudes.
const ALAW_SEG_END: [i32; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];

fn linear_to_ulaw(sample: i16) -> u8 {
    let mut pcm = sample as i32;
    let sign = if pcm < 0 {
        pcm = -pcm;
        0x80
    } else {
        0x00
    };
    pcm = pcm.min(ULAW_CLIP) + ULAW_BIAS;

    let mut exponent = 7;
    let mut mask = 0x4000;
    while pcm & mask == 0 && exponent > 0 {
        exponent -= 1;
        mask >>= 1;
    }
    let mantissa = (pcm >> (exponent + 3)) & 0x0F;
    !(sign | (exponent << 4) as u8 | mantissa as u8)
}

fn linear_to_alaw(sample: i16) -> u8 {
    let mut pcm = sample as i32 >> 3;
    let mask = if pcm >= 0 {
        0xD5
    } else {
        pcm = -pcm - 1;
        0x55
    };

    let Some(seg) = ALAW_SEG_END.iter().position(|&end| pcm <= end) else {
        return 0x7F ^ mask;
    };
    let mut aval = (seg as u8) << 4;
    aval |= if seg < 2 {
        ((pcm >> 1) & 0x0F) as u8
    } else {
        ((pcm >> seg) & 0x0F) as u8
    };
    aval ^ mask
}

impl G711Law {
    pub fn compress(self, sample: i16) -> u8 {
        match self {
            G711Law::MuLaw => linear_to_ulaw(sample),
            G711Law::ALaw => linear_to_alaw(sample),
        }
    }
}

pub struct G711Encoder {
    law: G711Law,
    pcm: Vec<i16>,
    pending: Option<EncodedPacket>,
    draining: bool,
}

impl G711Encoder {
    pub fn new(law: G711Law) -> Self {
        Self {
            law,
            pcm: Vec::new(),
            pending: None,
            draining: false,
        }
    }
}

impl NativeEncoder for G711Encoder {
    fn frame_size(&self) -> usize {
        0
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
        if frame.format != SampleFormat::S16Le || frame.channels != 1 {
            return Err(NativeError::InvalidData(format!(
                "g711 expects mono S16, got {:?} x {}ch",
                frame.format, frame.channels
            )));
        }

        self.pcm.resize(frame.nb_samples, 0);
        LittleEndian::read_i16_into(&frame.planes[0], &mut self.pcm);
        let law = self.law;
        let data: Vec<u8> = self.pcm.iter().map(|&s| law.compress(s)).collect();

        self.pending = Some(EncodedPacket {
            data: Bytes::from(data),
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
    }
}
