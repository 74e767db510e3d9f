//! A single pooled buffer: fixed-capacity memory plus its mutable attributes.

use parking_lot::{Mutex, MutexGuard};

use crate::common::errors::{CodecError, CodecResult};

/// Who currently holds a pooled buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferOwner {
    Free,
    OwnedByCaller,
    OwnedByCodec,
}

/// Per-buffer attributes travelling with the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferAttr {
    /// Presentation timestamp in microseconds.
    pub pts_us: i64,
    /// Number of valid bytes.
    pub size: usize,
    pub offset: usize,
}

/// Buffer memory plus attributes. The backing storage never changes size.
#[derive(Debug)]
pub struct AudioBuffer {
    data: Vec<u8>,
    meta: Vec<u8>,
    attr: BufferAttr,
    eos: bool,
}

fn alloc_zeroed(len: usize) -> CodecResult<Vec<u8>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| CodecError::ResourceExhausted(format!("buffer of {len} bytes: {e}")))?;
    v.resize(len, 0);
    Ok(v)
}

impl AudioBuffer {
    pub fn new(capacity: usize) -> CodecResult<Self> {
        Self::with_meta(capacity, 0)
    }

    pub fn with_meta(capacity: usize, meta_size: usize) -> CodecResult<Self> {
        Ok(Self {
            data: alloc_zeroed(capacity)?,
            meta: alloc_zeroed(meta_size)?,
            attr: BufferAttr::default(),
            eos: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The valid portion of the buffer (`attr.size` bytes from `attr.offset`).
    pub fn data(&self) -> &[u8] {
        let start = self.attr.offset.min(self.data.len());
        let end = (start + self.attr.size).min(self.data.len());
        &self.data[start..end]
    }

    /// The whole backing storage, for callers filling the buffer in place.
    pub fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Replace the contents with `bytes`.
    pub fn write(&mut self, bytes: &[u8]) -> CodecResult<()> {
        if bytes.len() > self.data.len() {
            return Err(CodecError::NoMemory {
                needed: bytes.len(),
                capacity: self.data.len(),
            });
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.attr.offset = 0;
        self.attr.size = bytes.len();
        Ok(())
    }

    /// Append `bytes` after the current valid region.
    pub fn append(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let start = self.attr.offset + self.attr.size;
        let end = start + bytes.len();
        if end > self.data.len() {
            return Err(CodecError::NoMemory {
                needed: end,
                capacity: self.data.len(),
            });
        }
        self.data[start..end].copy_from_slice(bytes);
        self.attr.size += bytes.len();
        Ok(())
    }

    pub fn attr(&self) -> BufferAttr {
        self.attr
    }

    pub fn set_attr(&mut self, attr: BufferAttr) -> CodecResult<()> {
        if attr.offset + attr.size > self.data.len() {
            return Err(CodecError::InvalidValue(format!(
                "attr range {}+{} exceeds capacity {}",
                attr.offset,
                attr.size,
                self.data.len()
            )));
        }
        self.attr = attr;
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.attr.size
    }

    pub fn set_size(&mut self, size: usize) -> CodecResult<()> {
        self.set_attr(BufferAttr { size, ..self.attr })
    }

    pub fn pts(&self) -> i64 {
        self.attr.pts_us
    }

    pub fn set_pts(&mut self, pts_us: i64) {
        self.attr.pts_us = pts_us;
    }

    pub fn is_eos(&self) -> bool {
        self.eos
    }

    pub fn set_eos(&mut self, eos: bool) {
        self.eos = eos;
    }

    pub fn meta(&self) -> &[u8] {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut [u8] {
        &mut self.meta
    }

    /// Clear attributes; the bytes themselves are left as they are.
    pub fn reset(&mut self) {
        self.attr = BufferAttr::default();
        self.eos = false;
    }
}

/// A pool entry: the buffer behind a lock plus its ownership flag.
#[derive(Debug)]
pub struct AudioBufferInfo {
    name: String,
    capacity: usize,
    content: Mutex<AudioBuffer>,
    owner: Mutex<BufferOwner>,
}

impl AudioBufferInfo {
    pub fn new(name: &str, capacity: usize, meta_size: usize) -> CodecResult<Self> {
        Ok(Self {
            name: name.to_owned(),
            capacity,
            content: Mutex::new(AudioBuffer::with_meta(capacity, meta_size)?),
            owner: Mutex::new(BufferOwner::Free),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Lock the buffer contents for reading or filling.
    pub fn lock(&self) -> MutexGuard<'_, AudioBuffer> {
        self.content.lock()
    }

    pub fn owner(&self) -> BufferOwner {
        *self.owner.lock()
    }

    pub(crate) fn set_owner(&self, owner: BufferOwner) {
        *self.owner.lock() = owner;
    }

    /// Move ownership from `from` to `to`; `false` if `from` no longer holds it.
    pub(crate) fn transfer_owner(&self, from: BufferOwner, to: BufferOwner) -> bool {
        let mut owner = self.owner.lock();
        if *owner != from {
            return false;
        }
        *owner = to;
        true
    }

    pub fn is_available(&self) -> bool {
        self.owner() == BufferOwner::Free
    }

    pub fn is_eos(&self) -> bool {
        self.content.lock().is_eos()
    }

    /// Clear attributes and mark the buffer free.
    pub(crate) fn reset(&self) {
        self.content.lock().reset();
        self.set_owner(BufferOwner::Free);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_rejects_oversized_payload() {
        let mut buf = AudioBuffer::new(4).expect("alloc");
        let err = buf.write(&[0; 5]).unwrap_err();
        assert_eq!(
            err,
            CodecError::NoMemory {
                needed: 5,
                capacity: 4
            }
        );
        assert_eq!(buf.size(), 0);
    }

    #[test]
    fn append_follows_write() {
        let mut buf = AudioBuffer::new(8).expect("alloc");
        buf.write(&[1, 2, 3]).expect("write");
        buf.append(&[4, 5]).expect("append");
        assert_eq!(buf.data(), &[1, 2, 3, 4, 5]);
        assert!(buf.append(&[0; 4]).is_err());
    }

    #[test]
    fn reset_clears_attributes_but_not_capacity() {
        let mut buf = AudioBuffer::with_meta(16, 4).expect("alloc");
        buf.write(&[9; 10]).expect("write");
        buf.set_pts(1234);
        buf.set_eos(true);
        buf.reset();
        assert_eq!(buf.attr(), BufferAttr::default());
        assert!(!buf.is_eos());
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.meta().len(), 4);
    }

    #[test]
    fn set_size_is_bounded_by_capacity() {
        let mut buf = AudioBuffer::new(8).expect("alloc");
        assert!(buf.set_size(8).is_ok());
        assert!(matches!(
            buf.set_size(9),
            Err(CodecError::InvalidValue(_))
        ));
    }

    #[test]
    fn info_reset_frees_owner() {
        let info = AudioBufferInfo::new("in", 8, 0).expect("alloc");
        info.set_owner(BufferOwner::OwnedByCaller);
        info.lock().set_eos(true);
        info.reset();
        assert!(info.is_available());
        assert!(!info.is_eos());
    }
}
