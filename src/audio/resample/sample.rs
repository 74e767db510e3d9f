//! Sample packing: raw little-endian bytes ⇄ normalized `f32` planes, plus
//! a lossless planar ⇄ interleaved copy.

use byteorder::{ByteOrder, LittleEndian};

use crate::audio::format::SampleFormat;

const S16_SCALE: f32 = 32_768.0;
const S24_SCALE: f32 = 8_388_608.0;
const S32_SCALE: f64 = 2_147_483_648.0;

#[inline]
fn read_sample(format: SampleFormat, b: &[u8]) -> f32 {
    match format.packed() {
        SampleFormat::U8 => (b[0] as f32 - 128.0) / 128.0,
        SampleFormat::S16Le => LittleEndian::read_i16(b) as f32 / S16_SCALE,
        SampleFormat::S24Le => LittleEndian::read_i24(b) as f32 / S24_SCALE,
        SampleFormat::S32Le => (LittleEndian::read_i32(b) as f64 / S32_SCALE) as f32,
        _ => LittleEndian::read_f32(b),
    }
}

#[inline]
fn write_sample(format: SampleFormat, v: f32, b: &mut [u8]) {
    match format.packed() {
        SampleFormat::U8 => {
            b[0] = (v * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16Le => {
            let s = (v * S16_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            LittleEndian::write_i16(b, s);
        }
        SampleFormat::S24Le => {
            let s = (v * S24_SCALE).round().clamp(-8_388_608.0, 8_388_607.0) as i32;
            LittleEndian::write_i24(b, s);
        }
        SampleFormat::S32Le => {
            let s = (v as f64 * S32_SCALE)
                .round()
                .clamp(i32::MIN as f64, i32::MAX as f64) as i32;
            LittleEndian::write_i32(b, s);
        }
        _ => LittleEndian::write_f32(b, v),
    }
}

/// Decode `nb_samples` samples per channel into `out` (one `f32` vec per channel).
///
/// `planes` holds one slice per channel for planar formats, a single
/// interleaved slice otherwise.
pub fn to_f32_planes(
    format: SampleFormat,
    channels: usize,
    planes: &[&[u8]],
    nb_samples: usize,
    out: &mut Vec<Vec<f32>>,
) {
    let bps = format.bytes_per_sample();
    out.resize_with(channels, Vec::new);
    for (c, dst) in out.iter_mut().enumerate() {
        dst.clear();
        dst.reserve(nb_samples);
        for i in 0..nb_samples {
            let at = if format.is_planar() {
                (planes[c], i * bps)
            } else {
                (planes[0], (i * channels + c) * bps)
            };
            dst.push(read_sample(format, &at.0[at.1..at.1 + bps]));
        }
    }
}

/// Encode `f32` planes into raw bytes: one plane per channel for planar
/// formats, one interleaved plane otherwise.
pub fn from_f32_planes(format: SampleFormat, planes: &[Vec<f32>]) -> Vec<Vec<u8>> {
    let bps = format.bytes_per_sample();
    let channels = planes.len();
    let nb_samples = planes.first().map_or(0, Vec::len);

    if format.is_planar() {
        planes
            .iter()
            .map(|plane| {
                let mut bytes = vec![0u8; nb_samples * bps];
                for (i, &v) in plane.iter().enumerate() {
                    write_sample(format, v, &mut bytes[i * bps..(i + 1) * bps]);
                }
                bytes
            })
            .collect()
    } else {
        let mut bytes = vec![0u8; nb_samples * channels * bps];
        for (c, plane) in planes.iter().enumerate() {
            for (i, &v) in plane.iter().enumerate() {
                let at = (i * channels + c) * bps;
                write_sample(format, v, &mut bytes[at..at + bps]);
            }
        }
        vec![bytes]
    }
}

/// Move samples between planar and interleaved layouts of the same sample
/// type. Values are copied bit for bit.
pub fn relayout(
    src: SampleFormat,
    dest: SampleFormat,
    channels: usize,
    planes: &[&[u8]],
    nb_samples: usize,
) -> Vec<Vec<u8>> {
    let bps = src.bytes_per_sample();
    let at = |c: usize, i: usize| {
        let (plane, offset) = if src.is_planar() {
            (planes[c], i * bps)
        } else {
            (planes[0], (i * channels + c) * bps)
        };
        &plane[offset..offset + bps]
    };

    if dest.is_planar() {
        (0..channels)
            .map(|c| {
                let mut bytes = Vec::with_capacity(nb_samples * bps);
                for i in 0..nb_samples {
                    bytes.extend_from_slice(at(c, i));
                }
                bytes
            })
            .collect()
    } else {
        let mut bytes = Vec::with_capacity(nb_samples * channels * bps);
        for i in 0..nb_samples {
            for c in 0..channels {
                bytes.extend_from_slice(at(c, i));
            }
        }
        vec![bytes]
    }
}
