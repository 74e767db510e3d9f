//! `AudioBuffersManager`: a growable pool of [`AudioBufferInfo`]s with a FIFO
//! availability queue, blocking acquire and release-with-notify.
//!
//! Indices in the availability queue always refer to free buffers. Every
//! other buffer is owned by a caller or by the codec. Blocked acquirers wake
//! every [`POOL_WAIT_MS`] to re-check the running flag, so
//! [`AudioBuffersManager::disable_running`] unblocks them within one slice even
//! if the notification races the wait.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, warn};

use crate::{
    audio::{
        buffer::info::{AudioBufferInfo, BufferOwner},
        constants::POOL_WAIT_MS,
    },
    common::errors::{CodecError, CodecResult},
};

struct PoolQueue {
    available: VecDeque<u32>,
    running: bool,
}

pub struct AudioBuffersManager {
    name: String,
    buffer_size: usize,
    meta_size: usize,
    buffers: RwLock<Vec<Arc<AudioBufferInfo>>>,
    queue: Mutex<PoolQueue>,
    available_cond: Condvar,
    wait_slice: Duration,
}

impl AudioBuffersManager {
    /// Allocate `count` buffers of `buffer_size` bytes and mark them all free.
    pub fn new(
        buffer_size: usize,
        name: &str,
        count: usize,
        meta_size: usize,
    ) -> CodecResult<Self> {
        let mut buffers = Vec::with_capacity(count);
        for _ in 0..count {
            buffers.push(Arc::new(AudioBufferInfo::new(name, buffer_size, meta_size)?));
        }

        debug!(
            "AudioBuffersManager: `{}` initialised with {} x {} bytes",
            name, count, buffer_size
        );

        Ok(Self {
            name: name.to_owned(),
            buffer_size,
            meta_size,
            buffers: RwLock::new(buffers),
            queue: Mutex::new(PoolQueue {
                available: (0..count as u32).collect(),
                running: true,
            }),
            available_cond: Condvar::new(),
            wait_slice: Duration::from_millis(POOL_WAIT_MS),
        })
    }

    /// Override the re-check interval used by blocked acquirers.
    pub fn with_wait_slice(mut self, wait_slice: Duration) -> Self {
        self.wait_slice = wait_slice;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.read().len()
    }

    pub fn available_count(&self) -> usize {
        self.queue.lock().available.len()
    }

    /// Block until a free buffer exists, then hand it to the caller.
    ///
    /// Returns [`CodecError::PoolStopped`] if the pool is (or becomes) stopped.
    pub fn request_available_index(&self) -> CodecResult<u32> {
        let mut queue = self.queue.lock();
        while queue.available.is_empty() && queue.running {
            self.available_cond.wait_for(&mut queue, self.wait_slice);
        }

        if !queue.running {
            return Err(CodecError::PoolStopped(self.name.clone()));
        }

        let Some(index) = queue.available.pop_front() else {
            return Err(CodecError::PoolStopped(self.name.clone()));
        };

        if let Some(info) = self.buffers.read().get(index as usize) {
            info.set_owner(BufferOwner::OwnedByCaller);
        }
        Ok(index)
    }

    /// Reset the buffer and put it back at the tail of the availability queue.
    pub fn release_buffer(&self, index: u32) -> CodecResult<()> {
        let info = self.get_buffer(index)?;
        info.reset();

        let mut queue = self.queue.lock();
        if queue.available.contains(&index) {
            warn!(
                "AudioBuffersManager: `{}` buffer {} released twice",
                self.name, index
            );
            return Err(CodecError::InvalidValue(format!(
                "buffer {index} of `{}` is already free",
                self.name
            )));
        }
        queue.available.push_back(index);
        self.available_cond.notify_one();
        Ok(())
    }

    /// Grow the pool by one buffer owned immediately by the caller.
    pub fn request_new_buffer(&self) -> CodecResult<(u32, Arc<AudioBufferInfo>)> {
        let info = Arc::new(AudioBufferInfo::new(
            &self.name,
            self.buffer_size,
            self.meta_size,
        )?);
        info.set_owner(BufferOwner::OwnedByCaller);

        let mut buffers = self.buffers.write();
        let index = u32::try_from(buffers.len()).map_err(|_| {
            CodecError::ResourceExhausted(format!("pool `{}` index space exhausted", self.name))
        })?;
        buffers.push(info.clone());
        Ok((index, info))
    }

    /// Reclaim every buffer regardless of owner; the queue ends up in index order.
    pub fn release_all(&self) {
        let mut queue = self.queue.lock();
        let buffers = self.buffers.read();
        queue.available.clear();
        for (index, info) in buffers.iter().enumerate() {
            info.reset();
            queue.available.push_back(index as u32);
        }
        self.available_cond.notify_all();
    }

    pub fn get_buffer(&self, index: u32) -> CodecResult<Arc<AudioBufferInfo>> {
        let buffers = self.buffers.read();
        buffers.get(index as usize).cloned().ok_or_else(|| {
            CodecError::InvalidValue(format!(
                "index {index} out of range for `{}` ({} buffers)",
                self.name,
                buffers.len()
            ))
        })
    }

    /// Hand a caller-held buffer to the codec. Fails unless the caller holds it.
    pub fn set_buffer_busy(&self, index: u32) -> CodecResult<()> {
        let info = self.get_buffer(index)?;
        if !info.transfer_owner(BufferOwner::OwnedByCaller, BufferOwner::OwnedByCodec) {
            return Err(CodecError::InvalidValue(format!(
                "buffer {index} of `{}` is not held by the caller",
                self.name
            )));
        }
        Ok(())
    }

    pub fn set_running(&self) {
        self.queue.lock().running = true;
    }

    /// Stop the pool and wake every blocked acquirer.
    pub fn disable_running(&self) {
        self.queue.lock().running = false;
        self.available_cond.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.queue.lock().running
    }
}
