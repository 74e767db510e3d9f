//! `AudioCodec`: the application-facing codec object.
//!
//! Wraps one plugin and, once configured, the pools and [`CodecWorker`] that
//! drive it. Lifecycle:
//!
//! ```text
//! Uninitialized -> Initialized -> Configured -> Running <-> Flushed
//!                       ^              ^           |
//!                       |              +-- stop ---+--> EndOfStream
//!                       +---------------- reset -------------------+
//! any -> Released
//! ```

use std::sync::Arc;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{
    audio::{
        buffer::{AudioBufferInfo, AudioBuffersManager},
        format::{CodecKind, Format},
        plugin::{CodecPlugin, create_by_mime, create_by_name},
        worker::{CodecEvent, CodecWorker},
    },
    common::errors::{CodecError, CodecResult},
    configs::BuffersConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
    Uninitialized,
    Initialized,
    Configured,
    Running,
    Flushed,
    EndOfStream,
    Released,
}

struct CodecInner {
    state: CodecState,
    plugin: Option<Arc<dyn CodecPlugin>>,
    worker: Option<CodecWorker>,
}

impl CodecInner {
    fn expect_state(&self, allowed: &[CodecState], op: &'static str) -> CodecResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            warn!("AudioCodec: {} refused in state {:?}", op, self.state);
            Err(CodecError::InvalidOperation(op))
        }
    }

    fn plugin(&self) -> CodecResult<&Arc<dyn CodecPlugin>> {
        self.plugin
            .as_ref()
            .ok_or(CodecError::InvalidOperation("no plugin created"))
    }

    fn worker(&self) -> CodecResult<&CodecWorker> {
        self.worker
            .as_ref()
            .ok_or(CodecError::InvalidOperation("codec is not configured"))
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.as_mut() {
            worker.stop();
        }
    }
}

pub struct AudioCodec {
    buffers: BuffersConfig,
    inner: Mutex<CodecInner>,
    events_tx: Sender<CodecEvent>,
    events_rx: Receiver<CodecEvent>,
}

impl AudioCodec {
    pub fn new(buffers: BuffersConfig) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            buffers,
            inner: Mutex::new(CodecInner {
                state: CodecState::Uninitialized,
                plugin: None,
                worker: None,
            }),
            events_tx,
            events_rx,
        }
    }

    /// Notifications from the running worker.
    pub fn events(&self) -> Receiver<CodecEvent> {
        self.events_rx.clone()
    }

    pub fn state(&self) -> CodecState {
        self.inner.lock().state
    }

    pub fn init_by_name(&self, name: &str) -> CodecResult<()> {
        self.init_with(|| create_by_name(name))
    }

    pub fn init_by_mime(&self, mime: &str, kind: CodecKind) -> CodecResult<()> {
        self.init_with(|| create_by_mime(mime, kind))
    }

    /// Adopt an already-built plugin.
    pub fn init_with_plugin(&self, plugin: Box<dyn CodecPlugin>) -> CodecResult<()> {
        self.init_with(|| Ok(plugin))
    }

    fn init_with(
        &self,
        create: impl FnOnce() -> CodecResult<Box<dyn CodecPlugin>>,
    ) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(&[CodecState::Uninitialized], "init")?;
        let plugin = create()?;
        debug!("AudioCodec: created {}", plugin.codec_name());
        inner.plugin = Some(Arc::from(plugin));
        inner.state = CodecState::Initialized;
        Ok(())
    }

    /// Configure the plugin and size the pools from what it reports.
    pub fn configure(&self, format: &Format) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(&[CodecState::Initialized], "configure")?;
        let plugin = Arc::clone(inner.plugin()?);
        plugin.init(format)?;

        let wait = self.buffers.wait_slice();
        let input = AudioBuffersManager::new(
            plugin.input_buffer_size(),
            "input",
            self.buffers.input_count,
            self.buffers.meta_size,
        )?
        .with_wait_slice(wait);
        let output = AudioBuffersManager::new(
            plugin.output_buffer_size(),
            "output",
            self.buffers.output_count,
            self.buffers.meta_size,
        )?
        .with_wait_slice(wait);

        info!(
            "AudioCodec: {} configured, input {} x {} bytes, output {} x {} bytes",
            plugin.codec_name(),
            self.buffers.input_count,
            input.buffer_size(),
            self.buffers.output_count,
            output.buffer_size()
        );

        inner.worker = Some(CodecWorker::new(
            plugin,
            Arc::new(input),
            Arc::new(output),
            self.events_tx.clone(),
            wait,
        ));
        inner.state = CodecState::Configured;
        Ok(())
    }

    pub fn start(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(&[CodecState::Configured, CodecState::Flushed], "start")?;
        match inner.worker.as_mut() {
            Some(worker) => worker.start()?,
            None => return Err(CodecError::InvalidOperation("codec is not configured")),
        }
        inner.state = CodecState::Running;
        Ok(())
    }

    /// Stop processing; `start` resumes with every buffer reclaimed.
    pub fn stop(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(
            &[
                CodecState::Running,
                CodecState::Flushed,
                CodecState::EndOfStream,
            ],
            "stop",
        )?;
        inner.stop_worker();
        inner.state = CodecState::Configured;
        Ok(())
    }

    /// Discard in-flight data; the codec stays configured.
    pub fn flush(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(&[CodecState::Running, CodecState::EndOfStream], "flush")?;
        inner.stop_worker();
        match inner.worker.as_mut() {
            Some(worker) => worker.flush()?,
            None => return Err(CodecError::InvalidOperation("codec is not configured")),
        }
        inner.state = CodecState::Flushed;
        Ok(())
    }

    /// Back to `Initialized`: the plugin forgets its configuration.
    pub fn reset(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == CodecState::Released {
            return Err(CodecError::InvalidOperation("reset"));
        }
        inner.stop_worker();
        inner.worker = None;
        if let Some(plugin) = inner.plugin.as_ref() {
            plugin.reset()?;
            inner.state = CodecState::Initialized;
        } else {
            inner.state = CodecState::Uninitialized;
        }
        Ok(())
    }

    pub fn release(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.stop_worker();
        inner.worker = None;
        let released = match inner.plugin.take() {
            Some(plugin) => plugin.release(),
            None => Ok(()),
        };
        inner.state = CodecState::Released;
        released
    }

    /// Submit a filled input buffer. An end-of-stream buffer moves the codec
    /// to `EndOfStream`.
    pub fn queue_input(&self, index: u32) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.expect_state(&[CodecState::Running], "queue_input")?;
        let worker = inner.worker()?;
        let eos = worker.input_buffer(index)?.is_eos();
        worker.queue_input(index)?;
        if eos {
            debug!("AudioCodec: end of stream queued");
            inner.state = CodecState::EndOfStream;
        }
        Ok(())
    }

    pub fn release_output(&self, index: u32) -> CodecResult<()> {
        let inner = self.inner.lock();
        inner.expect_state(
            &[
                CodecState::Running,
                CodecState::EndOfStream,
                CodecState::Flushed,
            ],
            "release_output",
        )?;
        inner.worker()?.release_output(index)
    }

    pub fn input_buffer(&self, index: u32) -> CodecResult<Arc<AudioBufferInfo>> {
        self.inner.lock().worker()?.input_buffer(index)
    }

    pub fn output_buffer(&self, index: u32) -> CodecResult<Arc<AudioBufferInfo>> {
        self.inner.lock().worker()?.output_buffer(index)
    }

    pub fn output_format(&self) -> CodecResult<Format> {
        let inner = self.inner.lock();
        inner.expect_state(
            &[
                CodecState::Configured,
                CodecState::Running,
                CodecState::Flushed,
                CodecState::EndOfStream,
            ],
            "output_format",
        )?;
        Ok(inner.plugin()?.output_format())
    }
}

impl Drop for AudioCodec {
    fn drop(&mut self) {
        self.inner.get_mut().stop_worker();
    }
}
