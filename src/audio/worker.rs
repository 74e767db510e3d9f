//! `CodecWorker`: drives one [`CodecPlugin`] from two buffer pools.
//!
//! Two threads per running worker:
//!
//! | Thread | Loop |
//! |---|---|
//! | feed | acquire a free input buffer, announce it as [`CodecEvent::InputAvailable`] |
//! | process | take the next queued input, send it, drain every ready output |
//!
//! Both exit once the pools are stopped. Output buffers stay with the consumer
//! until [`CodecWorker::release_output`] hands them back.

use std::{
    collections::VecDeque,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use flume::Sender;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace, warn};

use crate::{
    audio::{
        buffer::{AudioBufferInfo, AudioBuffersManager},
        plugin::{CodecPlugin, Status},
    },
    common::errors::{CodecError, CodecResult},
};

/// Notifications published by a running worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecEvent {
    /// Input buffer `index` is free for the caller to fill.
    InputAvailable(u32),
    /// Output buffer `index` holds a produced unit (or the end-of-stream marker).
    OutputAvailable(u32),
    /// A send or receive failed; the worker keeps going.
    Error(CodecError),
}

struct Pending {
    queue: VecDeque<u32>,
    running: bool,
}

struct WorkerCore {
    plugin: Arc<dyn CodecPlugin>,
    input: Arc<AudioBuffersManager>,
    output: Arc<AudioBuffersManager>,
    pending: Mutex<Pending>,
    cond: Condvar,
    events: Sender<CodecEvent>,
    wait_slice: Duration,
}

impl WorkerCore {
    fn emit(&self, event: CodecEvent) {
        if self.events.send(event).is_err() {
            trace!("CodecWorker: event receiver dropped");
        }
    }

    fn next_input(&self) -> Option<u32> {
        let mut pending = self.pending.lock();
        loop {
            if !pending.running {
                return None;
            }
            if let Some(index) = pending.queue.pop_front() {
                return Some(index);
            }
            self.cond.wait_for(&mut pending, self.wait_slice);
        }
    }

    fn send(&self, info: &AudioBufferInfo) -> CodecResult<Status> {
        let buffer = info.lock();
        self.plugin.process_send_data(&buffer)
    }

    fn handle_input(&self, index: u32) -> CodecResult<()> {
        let info = self.input.get_buffer(index)?;
        let mut sent = self.send(&info);
        if matches!(sent, Ok(Status::NotEnoughData)) {
            // The codec wants its output drained before it takes more.
            self.drain_output()?;
            sent = self.send(&info);
            if matches!(sent, Ok(Status::NotEnoughData)) {
                warn!(
                    "CodecWorker: {} refused input {} after draining",
                    self.plugin.codec_name(),
                    index
                );
            }
        }
        self.input.release_buffer(index)?;
        sent?;
        self.drain_output()
    }

    /// Receive into fresh output buffers until the plugin has nothing ready.
    fn drain_output(&self) -> CodecResult<()> {
        loop {
            let index = self.output.request_available_index()?;
            let info = self.output.get_buffer(index)?;
            let received = {
                let mut buffer = info.lock();
                self.plugin.process_receive_data(&mut buffer)
            };
            match received {
                Ok(Status::Ok) | Ok(Status::Again) => {
                    self.emit(CodecEvent::OutputAvailable(index));
                }
                Ok(Status::EndOfStream) => {
                    debug!("CodecWorker: {} end of stream", self.plugin.codec_name());
                    self.emit(CodecEvent::OutputAvailable(index));
                    return Ok(());
                }
                Ok(Status::NotEnoughData) => {
                    self.output.release_buffer(index)?;
                    return Ok(());
                }
                Err(e) => {
                    self.output.release_buffer(index)?;
                    return Err(e);
                }
            }
        }
    }
}

fn feed_loop(core: Arc<WorkerCore>) {
    while let Ok(index) = core.input.request_available_index() {
        if core.events.send(CodecEvent::InputAvailable(index)).is_err() {
            break;
        }
    }
    debug!("CodecWorker: feed loop for `{}` exited", core.input.name());
}

fn process_loop(core: Arc<WorkerCore>) {
    while let Some(index) = core.next_input() {
        match core.handle_input(index) {
            Ok(()) => {}
            Err(CodecError::PoolStopped(_)) => break,
            Err(e) => {
                error!(
                    "CodecWorker: {} input {} failed: {}",
                    core.plugin.codec_name(),
                    index,
                    e
                );
                core.emit(CodecEvent::Error(e));
            }
        }
    }
    debug!("CodecWorker: process loop for {} exited", core.plugin.codec_name());
}

pub struct CodecWorker {
    core: Arc<WorkerCore>,
    threads: Vec<JoinHandle<()>>,
}

impl CodecWorker {
    pub fn new(
        plugin: Arc<dyn CodecPlugin>,
        input: Arc<AudioBuffersManager>,
        output: Arc<AudioBuffersManager>,
        events: Sender<CodecEvent>,
        wait_slice: Duration,
    ) -> Self {
        Self {
            core: Arc::new(WorkerCore {
                plugin,
                input,
                output,
                pending: Mutex::new(Pending {
                    queue: VecDeque::new(),
                    running: false,
                }),
                cond: Condvar::new(),
                events,
                wait_slice,
            }),
            threads: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.threads.is_empty()
    }

    /// Reclaim every buffer and spawn the feed and process threads.
    pub fn start(&mut self) -> CodecResult<()> {
        if self.is_running() {
            return Err(CodecError::InvalidOperation("worker is already running"));
        }
        {
            let mut pending = self.core.pending.lock();
            pending.queue.clear();
            pending.running = true;
        }
        for pool in [&self.core.input, &self.core.output] {
            pool.release_all();
            pool.set_running();
        }

        let name = self.core.plugin.codec_name();
        for (role, body) in [
            ("feed", feed_loop as fn(Arc<WorkerCore>)),
            ("process", process_loop),
        ] {
            let core = Arc::clone(&self.core);
            let handle = thread::Builder::new()
                .name(format!("codec-{role}"))
                .spawn(move || body(core))
                .map_err(|e| {
                    CodecError::ResourceExhausted(format!("spawning {role} thread: {e}"))
                });
            match handle {
                Ok(handle) => self.threads.push(handle),
                Err(e) => {
                    self.stop();
                    return Err(e);
                }
            }
        }

        debug!("CodecWorker: {} started", name);
        Ok(())
    }

    /// Stop both pools and join the threads. Queued inputs stay queued.
    pub fn stop(&mut self) {
        {
            let mut pending = self.core.pending.lock();
            pending.running = false;
        }
        self.core.cond.notify_all();
        self.core.input.disable_running();
        self.core.output.disable_running();

        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                error!("CodecWorker: a worker thread panicked");
            }
        }
    }

    /// Drop queued inputs and flush the plugin. Only legal while stopped.
    pub fn flush(&mut self) -> CodecResult<()> {
        if self.is_running() {
            return Err(CodecError::InvalidOperation("worker must be stopped to flush"));
        }
        self.core.pending.lock().queue.clear();
        self.core.plugin.flush()
    }

    /// Hand a filled input buffer to the process thread.
    pub fn queue_input(&self, index: u32) -> CodecResult<()> {
        let mut pending = self.core.pending.lock();
        if !pending.running {
            return Err(CodecError::InvalidOperation("worker is not running"));
        }
        // Claims the buffer atomically: a second queue of the same index fails here.
        self.core.input.set_buffer_busy(index)?;
        pending.queue.push_back(index);
        self.core.cond.notify_one();
        Ok(())
    }

    /// Give a consumed output buffer back to the pool.
    pub fn release_output(&self, index: u32) -> CodecResult<()> {
        self.core.output.release_buffer(index)
    }

    pub fn input_buffer(&self, index: u32) -> CodecResult<Arc<AudioBufferInfo>> {
        self.core.input.get_buffer(index)
    }

    pub fn output_buffer(&self, index: u32) -> CodecResult<Arc<AudioBufferInfo>> {
        self.core.output.get_buffer(index)
    }
}

impl Drop for CodecWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("CodecWorker: dropped while running");
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use flume::Receiver;

    use super::*;
    use crate::audio::{
        format::{Format, keys},
        plugin::create_by_name,
    };

    const WAIT: Duration = Duration::from_secs(5);

    fn g711_encoder() -> (CodecWorker, Receiver<CodecEvent>) {
        let plugin: Arc<dyn CodecPlugin> =
            Arc::from(create_by_name("OH.Media.Codec.Encoder.Audio.G711mu").expect("plugin"));
        let mut format = Format::new();
        format
            .put_int(keys::CHANNEL_COUNT, 1)
            .put_int(keys::SAMPLE_RATE, 8_000);
        plugin.init(&format).expect("init");

        let input = AudioBuffersManager::new(plugin.input_buffer_size(), "in", 2, 0)
            .expect("input pool")
            .with_wait_slice(Duration::from_millis(20));
        let output = AudioBuffersManager::new(plugin.output_buffer_size(), "out", 2, 0)
            .expect("output pool")
            .with_wait_slice(Duration::from_millis(20));
        let (tx, rx) = flume::unbounded();
        let worker = CodecWorker::new(
            plugin,
            Arc::new(input),
            Arc::new(output),
            tx,
            Duration::from_millis(20),
        );
        (worker, rx)
    }

    fn next_input(rx: &Receiver<CodecEvent>) -> u32 {
        loop {
            match rx.recv_timeout(WAIT).expect("event") {
                CodecEvent::InputAvailable(index) => return index,
                CodecEvent::Error(e) => panic!("worker error: {e}"),
                CodecEvent::OutputAvailable(_) => {}
            }
        }
    }

    fn next_output(rx: &Receiver<CodecEvent>) -> u32 {
        loop {
            match rx.recv_timeout(WAIT).expect("event") {
                CodecEvent::OutputAvailable(index) => return index,
                CodecEvent::Error(e) => panic!("worker error: {e}"),
                CodecEvent::InputAvailable(_) => {}
            }
        }
    }

    #[test]
    fn encodes_through_threads() {
        let (mut worker, rx) = g711_encoder();
        worker.start().expect("start");

        let index = next_input(&rx);
        {
            let info = worker.input_buffer(index).expect("buffer");
            let mut buffer = info.lock();
            buffer.write(&[0u8; 320]).expect("write");
            buffer.set_pts(40_000);
        }
        worker.queue_input(index).expect("queue");

        let out = next_output(&rx);
        {
            let info = worker.output_buffer(out).expect("buffer");
            let buffer = info.lock();
            assert_eq!(buffer.size(), 160);
            assert_eq!(buffer.pts(), 40_000);
            assert!(buffer.data().iter().all(|&b| b == 0xFF));
        }
        worker.release_output(out).expect("release");

        let index = next_input(&rx);
        worker
            .input_buffer(index)
            .expect("buffer")
            .lock()
            .set_eos(true);
        worker.queue_input(index).expect("queue eos");
        let out = next_output(&rx);
        assert!(worker.output_buffer(out).expect("buffer").is_eos());

        worker.stop();
        assert!(!worker.is_running());
    }

    #[test]
    fn queue_requires_running_and_ownership() {
        let (mut worker, rx) = g711_encoder();
        assert!(worker.queue_input(0).is_err());

        worker.start().expect("start");
        assert!(worker.start().is_err());
        let index = next_input(&rx);
        assert!(matches!(
            worker.queue_input(99),
            Err(CodecError::InvalidValue(_))
        ));
        assert!(worker.flush().is_err());
        worker.release_output(index).ok();

        worker.stop();
        worker.flush().expect("flush while stopped");
    }
}
