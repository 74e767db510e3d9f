//! `AudioFrame`: a structured block of PCM samples as exchanged with native
//! codecs. Planar formats keep one byte plane per channel; packed formats keep
//! a single interleaved plane.

use crate::{
    audio::{constants::US_PER_SECOND, format::SampleFormat},
    common::errors::{CodecError, CodecResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub format: SampleFormat,
    pub channels: usize,
    pub sample_rate: u32,
    /// Samples per channel.
    pub nb_samples: usize,
    /// Presentation timestamp in microseconds, if the producer knows it.
    pub pts: Option<i64>,
    pub planes: Vec<Vec<u8>>,
}

impl AudioFrame {
    /// A silent frame of `nb_samples` samples per channel.
    pub fn silent(format: SampleFormat, channels: usize, sample_rate: u32, nb_samples: usize) -> Self {
        let plane_len = if format.is_planar() {
            format.bytes_per_sample() * nb_samples
        } else {
            format.buffer_size(channels, nb_samples)
        };
        Self {
            format,
            channels,
            sample_rate,
            nb_samples,
            pts: None,
            planes: vec![vec![0; plane_len]; format.planes(channels)],
        }
    }

    /// Build a frame from a flat buffer. Planar input is laid out plane after plane.
    pub fn from_bytes(
        format: SampleFormat,
        channels: usize,
        sample_rate: u32,
        bytes: &[u8],
    ) -> CodecResult<Self> {
        let frame_bytes = format.bytes_per_sample() * channels;
        if channels == 0 || bytes.len() % frame_bytes != 0 {
            return Err(CodecError::InvalidValue(format!(
                "{} bytes is not a whole number of {}-channel {:?} samples",
                bytes.len(),
                channels,
                format
            )));
        }
        let nb_samples = bytes.len() / frame_bytes;
        let planes = if format.is_planar() {
            let plane_len = bytes.len() / channels;
            (0..channels)
                .map(|c| bytes[c * plane_len..(c + 1) * plane_len].to_vec())
                .collect()
        } else {
            vec![bytes.to_vec()]
        };
        Ok(Self {
            format,
            channels,
            sample_rate,
            nb_samples,
            pts: None,
            planes,
        })
    }

    pub fn with_pts(mut self, pts: Option<i64>) -> Self {
        self.pts = pts;
        self
    }

    /// Total payload size across all planes.
    pub fn byte_len(&self) -> usize {
        self.format.buffer_size(self.channels, self.nb_samples)
    }

    /// Flatten the planes into one buffer (plane after plane for planar data).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for plane in &self.planes {
            out.extend_from_slice(plane);
        }
        out
    }

    pub fn duration_us(&self) -> i64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.nb_samples as f64 * US_PER_SECOND / self.sample_rate as f64) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_bytes_split_per_channel() {
        let bytes: Vec<u8> = (0..8).collect();
        let frame = AudioFrame::from_bytes(SampleFormat::S16P, 2, 8_000, &bytes).expect("frame");
        assert_eq!(frame.nb_samples, 2);
        assert_eq!(frame.planes, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
        assert_eq!(frame.to_bytes(), bytes);
    }

    #[test]
    fn packed_bytes_stay_interleaved() {
        let bytes = [0u8; 12];
        let frame = AudioFrame::from_bytes(SampleFormat::S16Le, 2, 8_000, &bytes).expect("frame");
        assert_eq!(frame.planes.len(), 1);
        assert_eq!(frame.nb_samples, 3);
        assert_eq!(frame.byte_len(), 12);
    }

    #[test]
    fn ragged_input_is_rejected() {
        assert!(AudioFrame::from_bytes(SampleFormat::S16Le, 2, 8_000, &[0; 6]).is_err());
        assert!(AudioFrame::from_bytes(SampleFormat::S16Le, 0, 8_000, &[]).is_err());
    }

    #[test]
    fn duration_of_one_aac_frame() {
        let frame = AudioFrame::silent(SampleFormat::F32P, 2, 44_100, 1024);
        assert_eq!(frame.duration_us(), 23_219);
        assert_eq!(frame.planes.len(), 2);
        assert_eq!(frame.planes[0].len(), 4096);
    }
}
