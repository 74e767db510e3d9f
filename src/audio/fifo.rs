//! `AudioFifo`: sample accumulation between arbitrary-sized PCM pushes and a
//! codec's fixed per-frame sample count.
//!
//! One circular byte ring per plane (a single ring for packed formats). The
//! rings grow instead of overwriting: nothing written is ever lost until it is
//! drained or the FIFO is cleared. Sizes in the public API are samples per
//! channel.

use crate::{
    audio::{format::SampleFormat, frame::AudioFrame},
    common::errors::{CodecError, CodecResult},
};

struct Ring {
    buf: Vec<u8>,
    read_offset: usize,
    length: usize,
}

impl Ring {
    fn new(size: usize) -> CodecResult<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|e| CodecError::ResourceExhausted(format!("fifo of {size} bytes: {e}")))?;
        buf.resize(size, 0);
        Ok(Self {
            buf,
            read_offset: 0,
            length: 0,
        })
    }

    fn size(&self) -> usize {
        self.buf.len()
    }

    /// Unwrap the contents to the front and grow the backing store to `size`.
    fn grow(&mut self, size: usize) -> CodecResult<()> {
        let mut next = Vec::new();
        next.try_reserve_exact(size)
            .map_err(|e| CodecError::ResourceExhausted(format!("fifo of {size} bytes: {e}")))?;
        next.resize(size, 0);
        self.copy_out(&mut next[..self.length]);
        self.buf = next;
        self.read_offset = 0;
        Ok(())
    }

    fn write(&mut self, chunk: &[u8]) {
        let size = self.size();
        let write_offset = (self.read_offset + self.length) % size.max(1);
        let to_write = chunk.len();
        let available_at_end = size - write_offset;

        if to_write <= available_at_end {
            self.buf[write_offset..write_offset + to_write].copy_from_slice(chunk);
        } else {
            self.buf[write_offset..].copy_from_slice(&chunk[..available_at_end]);
            self.buf[..to_write - available_at_end].copy_from_slice(&chunk[available_at_end..]);
        }
        self.length += to_write;
    }

    /// Copy the first `out.len()` buffered bytes without consuming them.
    fn copy_out(&self, out: &mut [u8]) {
        let to_read = out.len();
        let available_at_end = self.size() - self.read_offset;
        if to_read <= available_at_end {
            out.copy_from_slice(&self.buf[self.read_offset..self.read_offset + to_read]);
        } else {
            out[..available_at_end].copy_from_slice(&self.buf[self.read_offset..]);
            out[available_at_end..].copy_from_slice(&self.buf[..to_read - available_at_end]);
        }
    }

    fn skip(&mut self, n: usize) {
        let to_skip = n.min(self.length);
        self.read_offset = (self.read_offset + to_skip) % self.size().max(1);
        self.length -= to_skip;
    }

    fn clear(&mut self) {
        self.read_offset = 0;
        self.length = 0;
    }
}

pub struct AudioFifo {
    format: SampleFormat,
    channels: usize,
    /// Bytes one sample occupies in each ring.
    stride: usize,
    rings: Vec<Ring>,
    samples: usize,
}

impl AudioFifo {
    /// A FIFO with room for `capacity` samples per channel before it grows.
    pub fn new(format: SampleFormat, channels: usize, capacity: usize) -> CodecResult<Self> {
        if channels == 0 {
            return Err(CodecError::InvalidValue("fifo needs at least one channel".into()));
        }
        let stride = if format.is_planar() {
            format.bytes_per_sample()
        } else {
            format.bytes_per_sample() * channels
        };
        let rings = (0..format.planes(channels))
            .map(|_| Ring::new(capacity.max(1) * stride))
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self {
            format,
            channels,
            stride,
            rings,
            samples: 0,
        })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Buffered samples per channel.
    pub fn len(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Samples per channel that fit before the next grow.
    pub fn capacity(&self) -> usize {
        self.rings.first().map_or(0, |r| r.size() / self.stride)
    }

    /// Append a flat buffer in the FIFO's format. Planar input is laid out
    /// plane after plane; the per-plane stride is derived from the length of
    /// this buffer, not from any earlier one.
    pub fn write(&mut self, bytes: &[u8]) -> CodecResult<usize> {
        let frame_bytes = self.format.bytes_per_sample() * self.channels;
        if bytes.len() % frame_bytes != 0 {
            return Err(CodecError::InvalidValue(format!(
                "{} bytes is not a whole number of {}-byte sample frames",
                bytes.len(),
                frame_bytes
            )));
        }
        let nb_samples = bytes.len() / frame_bytes;
        if nb_samples == 0 {
            return Ok(0);
        }

        let needed = self.samples + nb_samples;
        if needed > self.capacity() {
            let grown = needed.max(self.capacity() * 2) * self.stride;
            for ring in &mut self.rings {
                ring.grow(grown)?;
            }
        }

        let plane_len = nb_samples * self.stride;
        for (ring, chunk) in self.rings.iter_mut().zip(bytes.chunks(plane_len)) {
            ring.write(chunk);
        }
        self.samples += nb_samples;
        Ok(nb_samples)
    }

    /// Copy out the first `nb_samples` samples per channel as a frame without
    /// consuming them. `None` when fewer are buffered.
    pub fn peek(&self, nb_samples: usize, sample_rate: u32) -> Option<AudioFrame> {
        if nb_samples == 0 || nb_samples > self.samples {
            return None;
        }
        let planes = self
            .rings
            .iter()
            .map(|ring| {
                let mut plane = vec![0u8; nb_samples * self.stride];
                ring.copy_out(&mut plane);
                plane
            })
            .collect();
        Some(AudioFrame {
            format: self.format,
            channels: self.channels,
            sample_rate,
            nb_samples,
            pts: None,
            planes,
        })
    }

    /// Drop up to `nb_samples` samples per channel from the front.
    pub fn drain(&mut self, nb_samples: usize) -> usize {
        let n = nb_samples.min(self.samples);
        for ring in &mut self.rings {
            ring.skip(n * self.stride);
        }
        self.samples -= n;
        n
    }

    /// Read and consume `nb_samples` samples per channel.
    pub fn read(&mut self, nb_samples: usize, sample_rate: u32) -> Option<AudioFrame> {
        let frame = self.peek(nb_samples, sample_rate)?;
        self.drain(nb_samples);
        Some(frame)
    }

    pub fn clear(&mut self) {
        for ring in &mut self.rings {
            ring.clear();
        }
        self.samples = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_samples_come_out_in_order() {
        let mut fifo = AudioFifo::new(SampleFormat::S16Le, 2, 4).expect("fifo");
        let bytes: Vec<u8> = (0..12).collect();
        assert_eq!(fifo.write(&bytes).expect("write"), 3);
        assert_eq!(fifo.len(), 3);

        let frame = fifo.read(2, 8_000).expect("read");
        assert_eq!(frame.planes, vec![(0..8).collect::<Vec<u8>>()]);
        assert_eq!(fifo.len(), 1);
    }

    #[test]
    fn grows_instead_of_overwriting() {
        let mut fifo = AudioFifo::new(SampleFormat::U8, 1, 2).expect("fifo");
        fifo.write(&[1, 2]).expect("write");
        fifo.write(&[3, 4, 5]).expect("write");
        assert!(fifo.capacity() >= 5);
        let frame = fifo.read(5, 8_000).expect("read");
        assert_eq!(frame.planes[0], vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn wraps_around_the_ring() {
        let mut fifo = AudioFifo::new(SampleFormat::U8, 1, 4).expect("fifo");
        fifo.write(&[1, 2, 3]).expect("write");
        fifo.drain(2);
        fifo.write(&[4, 5, 6]).expect("write");
        assert_eq!(fifo.capacity(), 4);
        assert_eq!(fifo.read(4, 8_000).expect("read").planes[0], vec![3, 4, 5, 6]);
    }

    #[test]
    fn planar_input_uses_its_own_stride() {
        let mut fifo = AudioFifo::new(SampleFormat::U8P, 2, 8).expect("fifo");
        fifo.write(&[1, 2, 10, 20]).expect("write");
        fifo.write(&[3, 4, 5, 30, 40, 50]).expect("write");
        let frame = fifo.read(5, 8_000).expect("read");
        assert_eq!(frame.planes, vec![vec![1, 2, 3, 4, 5], vec![10, 20, 30, 40, 50]]);
    }

    #[test]
    fn peek_leaves_content_and_short_read_is_none() {
        let mut fifo = AudioFifo::new(SampleFormat::S16Le, 1, 4).expect("fifo");
        fifo.write(&[0; 6]).expect("write");
        assert!(fifo.peek(4, 8_000).is_none());
        assert!(fifo.peek(3, 8_000).is_some());
        assert_eq!(fifo.len(), 3);
        assert!(fifo.write(&[0; 3]).is_err());
        fifo.clear();
        assert!(fifo.is_empty());
    }
}
