//! `Resample`: inline sample-format, channel-layout and sample-rate
//! conversion between a native codec's working representation and the format
//! a caller asked for.
//!
//! Conversion runs through normalized `f32` planes:
//!
//! | Stage | What happens |
//! |---|---|
//! | unpack | source bytes (packed or planar) → one `f32` vec per channel |
//! | remix | source channels → destination channels |
//! | rate | [`LinearResampler`] when the two rates differ |
//! | pack | `f32` planes → destination bytes |
//!
//! Conversions that only change the layout (planar ⇄ interleaved of one
//! sample type) skip the `f32` stages and copy samples as they are.
//!
//! Results are returned as owned buffers, so a caller can hold one across the
//! next conversion. Only the intermediate planes are reused between calls.

pub mod linear;
pub mod sample;

pub use linear::LinearResampler;

use tracing::{debug, warn};

use crate::{
    audio::{
        format::{ChannelLayout, SampleFormat},
        frame::AudioFrame,
    },
    common::errors::{CodecError, CodecResult},
};

/// Converter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResamplePara {
    pub channels: usize,
    pub sample_rate: u32,
    pub src_format: SampleFormat,
    pub dest_format: SampleFormat,
    pub channel_layout: ChannelLayout,
    pub dest_channels: usize,
    pub dest_sample_rate: u32,
    /// Expected samples per channel per call; sizes the scratch planes.
    pub frame_samples: usize,
}

impl ResamplePara {
    /// Format-only conversion: same channel count and rate on both sides.
    pub fn format_only(
        channels: usize,
        sample_rate: u32,
        src_format: SampleFormat,
        dest_format: SampleFormat,
        frame_samples: usize,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            src_format,
            dest_format,
            channel_layout: ChannelLayout::default_for(channels)
                .unwrap_or(ChannelLayout::STEREO),
            dest_channels: channels,
            dest_sample_rate: sample_rate,
            frame_samples,
        }
    }
}

pub struct Resample {
    para: ResamplePara,
    src: Vec<Vec<f32>>,
    mixed: Vec<Vec<f32>>,
    rated: Vec<Vec<f32>>,
    rate: Option<LinearResampler>,
}

fn alloc_planes(channels: usize, samples: usize) -> CodecResult<Vec<Vec<f32>>> {
    let mut planes = Vec::with_capacity(channels);
    for _ in 0..channels {
        let mut plane = Vec::new();
        plane.try_reserve_exact(samples).map_err(|e| {
            CodecError::ResourceExhausted(format!("resample scratch of {samples} samples: {e}"))
        })?;
        planes.push(plane);
    }
    Ok(planes)
}

impl Resample {
    /// Build a converter and preallocate scratch for one frame.
    pub fn init(para: ResamplePara) -> CodecResult<Self> {
        if para.channels == 0 || para.dest_channels == 0 {
            return Err(CodecError::InvalidConfig(format!(
                "resample channels {} -> {}",
                para.channels, para.dest_channels
            )));
        }
        if para.sample_rate == 0 || para.dest_sample_rate == 0 {
            return Err(CodecError::InvalidConfig(format!(
                "resample rate {} -> {}",
                para.sample_rate, para.dest_sample_rate
            )));
        }
        if !para.channel_layout.matches(para.channels) {
            return Err(CodecError::InvalidConfig(format!(
                "channel layout {:#x} does not describe {} channels",
                para.channel_layout.0, para.channels
            )));
        }

        let rate = (para.sample_rate != para.dest_sample_rate).then(|| {
            LinearResampler::new(para.sample_rate, para.dest_sample_rate, para.dest_channels)
        });
        let out_samples = rate
            .as_ref()
            .map_or(para.frame_samples, |r| r.max_output(para.frame_samples));

        debug!(
            "Resample: {:?} {}ch {}Hz -> {:?} {}ch {}Hz",
            para.src_format,
            para.channels,
            para.sample_rate,
            para.dest_format,
            para.dest_channels,
            para.dest_sample_rate
        );

        Ok(Self {
            src: alloc_planes(para.channels, para.frame_samples)?,
            mixed: alloc_planes(para.dest_channels, para.frame_samples)?,
            rated: alloc_planes(para.dest_channels, out_samples)?,
            rate,
            para,
        })
    }

    pub fn para(&self) -> &ResamplePara {
        &self.para
    }

    /// Convert a flat buffer. Planar sources are laid out plane after plane.
    ///
    /// Returns an empty vec when `src` is not a whole number of source
    /// samples; callers treat that as "no data this call".
    pub fn convert(&mut self, src: &[u8]) -> Vec<u8> {
        let fmt = self.para.src_format;
        let frame_bytes = fmt.bytes_per_sample() * self.para.channels;
        if src.is_empty() || src.len() % frame_bytes != 0 {
            warn!(
                "Resample: {} bytes is not a whole number of {}-byte sample frames",
                src.len(),
                frame_bytes
            );
            return Vec::new();
        }

        let nb_samples = src.len() / frame_bytes;
        let planes: Vec<&[u8]> = if fmt.is_planar() {
            src.chunks_exact(src.len() / self.para.channels).collect()
        } else {
            vec![src]
        };

        let (out, _) = self.run(&planes, nb_samples);
        out.concat()
    }

    /// Convert a structured frame; timestamp is carried over.
    pub fn convert_frame(&mut self, frame: &AudioFrame) -> CodecResult<AudioFrame> {
        if frame.format != self.para.src_format || frame.channels != self.para.channels {
            return Err(CodecError::InvalidValue(format!(
                "frame is {:?}/{}ch, converter expects {:?}/{}ch",
                frame.format, frame.channels, self.para.src_format, self.para.channels
            )));
        }
        let planes: Vec<&[u8]> = frame.planes.iter().map(Vec::as_slice).collect();
        let (out, nb_samples) = self.run(&planes, frame.nb_samples);
        Ok(AudioFrame {
            format: self.para.dest_format,
            channels: self.para.dest_channels,
            sample_rate: self.para.dest_sample_rate,
            nb_samples,
            pts: frame.pts,
            planes: out,
        })
    }

    /// Drop cross-block rate state (after a flush or seek).
    pub fn reset(&mut self) {
        if let Some(rate) = &mut self.rate {
            rate.reset();
        }
    }

    /// Same sample type, channels and rate: only the layout differs.
    fn is_relayout(&self) -> bool {
        let p = &self.para;
        p.src_format.packed() == p.dest_format.packed()
            && p.channels == p.dest_channels
            && p.sample_rate == p.dest_sample_rate
    }

    fn run(&mut self, planes: &[&[u8]], nb_samples: usize) -> (Vec<Vec<u8>>, usize) {
        let p = self.para;
        if self.is_relayout() {
            let out = sample::relayout(p.src_format, p.dest_format, p.channels, planes, nb_samples);
            return (out, nb_samples);
        }
        sample::to_f32_planes(p.src_format, p.channels, planes, nb_samples, &mut self.src);

        remix(&self.src, &mut self.mixed, p.dest_channels);

        let out = match &mut self.rate {
            Some(rate) => {
                self.rated.resize_with(p.dest_channels, Vec::new);
                rate.process(&self.mixed, &mut self.rated);
                &self.rated
            }
            None => &self.mixed,
        };

        let produced = out.first().map_or(0, Vec::len);
        (sample::from_f32_planes(p.dest_format, out), produced)
    }
}

/// Map `src` channels onto `dest_channels` output planes.
fn remix(src: &[Vec<f32>], dest: &mut Vec<Vec<f32>>, dest_channels: usize) {
    let src_channels = src.len();
    let nb_samples = src.first().map_or(0, Vec::len);
    dest.resize_with(dest_channels, Vec::new);

    if dest_channels == 1 && src_channels > 1 {
        let out = &mut dest[0];
        out.clear();
        out.extend((0..nb_samples).map(|i| {
            src.iter().map(|plane| plane[i]).sum::<f32>() / src_channels as f32
        }));
        return;
    }

    for (c, out) in dest.iter_mut().enumerate() {
        out.clear();
        out.extend_from_slice(&src[c % src_channels]);
    }
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;

    fn s16(samples: &[i16]) -> Vec<u8> {
        let mut b = vec![0u8; samples.len() * 2];
        LittleEndian::write_i16_into(samples, &mut b);
        b
    }

    fn f32p(planes: &[&[f32]]) -> Vec<u8> {
        let mut out = Vec::new();
        for plane in planes {
            let mut b = vec![0u8; plane.len() * 4];
            LittleEndian::write_f32_into(plane, &mut b);
            out.extend(b);
        }
        out
    }

    #[test]
    fn planar_float_to_interleaved_s16() {
        let para = ResamplePara::format_only(2, 44_100, SampleFormat::F32P, SampleFormat::S16Le, 2);
        let mut r = Resample::init(para).expect("init");
        let out = r.convert(&f32p(&[&[0.5, -0.5], &[0.25, 0.0]]));
        assert_eq!(out, s16(&[16_384, 8_192, -16_384, 0]));
    }

    #[test]
    fn ragged_input_yields_empty_output() {
        let para = ResamplePara::format_only(2, 8_000, SampleFormat::S16Le, SampleFormat::F32P, 16);
        let mut r = Resample::init(para).expect("init");
        assert!(r.convert(&[0u8; 6]).is_empty());
        assert!(r.convert(&[]).is_empty());
    }

    #[test]
    fn owned_output_survives_next_conversion() {
        let para = ResamplePara::format_only(1, 8_000, SampleFormat::S16Le, SampleFormat::S32Le, 4);
        let mut r = Resample::init(para).expect("init");
        let first = r.convert(&s16(&[1, 2]));
        let second = r.convert(&s16(&[3, 4]));
        assert_ne!(first, second);
        assert_eq!(LittleEndian::read_i32(&first[0..4]), 1 << 16);
        assert_eq!(LittleEndian::read_i32(&second[0..4]), 3 << 16);
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        let para = ResamplePara {
            dest_channels: 2,
            ..ResamplePara::format_only(1, 8_000, SampleFormat::S16Le, SampleFormat::S16Le, 2)
        };
        let mut r = Resample::init(para).expect("init");
        assert_eq!(r.convert(&s16(&[10, 20])), s16(&[10, 10, 20, 20]));
    }

    #[test]
    fn stereo_to_mono_averages() {
        let para = ResamplePara {
            dest_channels: 1,
            ..ResamplePara::format_only(2, 8_000, SampleFormat::S16Le, SampleFormat::S16Le, 2)
        };
        let mut r = Resample::init(para).expect("init");
        assert_eq!(r.convert(&s16(&[100, 200, -50, 50])), s16(&[150, 0]));
    }

    #[test]
    fn rate_change_alters_sample_count() {
        let para = ResamplePara {
            dest_sample_rate: 8_000,
            ..ResamplePara::format_only(1, 16_000, SampleFormat::S16Le, SampleFormat::S16Le, 320)
        };
        let mut r = Resample::init(para).expect("init");
        let frame = AudioFrame::from_bytes(SampleFormat::S16Le, 1, 16_000, &s16(&[0; 320]))
            .expect("frame")
            .with_pts(Some(40));
        let out = r.convert_frame(&frame).expect("convert");
        assert_eq!(out.nb_samples, 160);
        assert_eq!(out.sample_rate, 8_000);
        assert_eq!(out.pts, Some(40));
    }

    #[test]
    fn frame_with_wrong_format_is_rejected() {
        let para = ResamplePara::format_only(2, 8_000, SampleFormat::F32P, SampleFormat::S16Le, 4);
        let mut r = Resample::init(para).expect("init");
        let frame = AudioFrame::silent(SampleFormat::S16P, 2, 8_000, 4);
        assert!(r.convert_frame(&frame).is_err());
    }

    #[test]
    fn init_rejects_bad_parameters() {
        let mut para = ResamplePara::format_only(2, 8_000, SampleFormat::S16Le, SampleFormat::F32P, 4);
        para.channel_layout = ChannelLayout::MONO;
        assert!(matches!(Resample::init(para), Err(CodecError::InvalidConfig(_))));

        let para = ResamplePara::format_only(0, 8_000, SampleFormat::S16Le, SampleFormat::F32P, 4);
        assert!(Resample::init(para).is_err());
    }

    #[test]
    fn planar_s32_to_interleaved_is_exact() {
        let left = [0x1234_5677i32, i32::MIN, 0x0000_0001, -0x0123_4567];
        let right = [i32::MAX, -1, 0x7654_3211, 0x0F0F_0F0F];
        let mut src = vec![0u8; 32];
        LittleEndian::write_i32_into(&left, &mut src[..16]);
        LittleEndian::write_i32_into(&right, &mut src[16..]);

        let para = ResamplePara::format_only(2, 48_000, SampleFormat::S32P, SampleFormat::S32Le, 4);
        let mut r = Resample::init(para).expect("init");
        let out = r.convert(&src);
        let mut samples = [0i32; 8];
        LittleEndian::read_i32_into(&out, &mut samples);
        let expected: Vec<i32> = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
        assert_eq!(samples.to_vec(), expected);

        let back = ResamplePara::format_only(2, 48_000, SampleFormat::S32Le, SampleFormat::S32P, 4);
        let frame = AudioFrame {
            format: SampleFormat::S32Le,
            channels: 2,
            sample_rate: 48_000,
            nb_samples: 4,
            pts: Some(7),
            planes: vec![out],
        };
        let planar = Resample::init(back)
            .expect("init")
            .convert_frame(&frame)
            .expect("convert");
        assert_eq!(planar.nb_samples, 4);
        assert_eq!(planar.pts, Some(7));
        assert_eq!(planar.planes.concat(), src);
    }
}
