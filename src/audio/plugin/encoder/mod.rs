//! `BaseEncoder`: the send/receive protocol shared by every encoder plugin.
//!
//! Callers hand over PCM in whatever chunk sizes they have; the encoder needs
//! exactly `frame_size` samples per channel per submission. An [`AudioFifo`]
//! sits between the two:
//!
//! | Call | Work |
//! |---|---|
//! | send | convert to the native sample format, append to the FIFO |
//! | receive | submit one FIFO frame when enough is buffered, pull one packet |
//!
//! An end-of-stream input short-circuits the next receive: it reports
//! end-of-stream with an empty buffer and never touches the FIFO or codec.

pub mod aac;
pub mod g711;
pub mod opus;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace};

pub use self::{aac::AacEncoderSpec, g711::G711EncoderSpec, opus::OpusEncoderSpec};

use super::{CodecPlugin, Status, decoder::DecoderState};
use crate::{
    audio::{
        buffer::AudioBuffer,
        constants::US_PER_SECOND,
        fifo::AudioFifo,
        format::{CodecId, CodecKind, Format, SampleFormat, keys},
        native::{EncodedPacket, EncoderConfig, EncoderFactory, NativeEncoder, NativeError},
        resample::{Resample, ResamplePara},
    },
    common::errors::{CodecError, CodecResult},
};

/// Per-codec parameterization of [`BaseEncoder`].
pub trait EncoderSpec: Send + 'static {
    fn codec(&self) -> CodecId;

    /// Validate a configuration.
    fn check_format(&mut self, format: &Format) -> CodecResult<EncoderConfig>;

    /// Sample formats callers may submit.
    fn input_formats(&self) -> &'static [SampleFormat];

    /// Bytes written ahead of a packet's payload in the same output buffer.
    fn header(&self, _payload_len: usize) -> CodecResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Largest encoded packet, header included.
    fn max_output_size(&self, config: &EncoderConfig) -> usize;

    /// Most samples per channel submitted at once when the native frame size
    /// is variable, so that one packet still fits `max_output_size`.
    fn max_variable_frame(&self, _config: &EncoderConfig) -> usize {
        usize::MAX
    }
}

struct EncoderInner<S> {
    spec: S,
    state: DecoderState,
    config: Option<EncoderConfig>,
    native: Option<Box<dyn NativeEncoder>>,
    resample: Option<Resample>,
    fifo: Option<AudioFifo>,
    src_format: SampleFormat,
    frame_size: usize,
    /// Submission cap for variable frame sizes.
    max_chunk: usize,
    /// Timestamp of the oldest sample in the FIFO.
    fifo_pts: i64,
    eos: bool,
    frames_sent: u64,
    out_format: Format,
}

impl<S: EncoderSpec> EncoderInner<S> {
    fn check_open(&self) -> CodecResult<()> {
        match (self.state, &self.native) {
            (DecoderState::Open, Some(_)) => Ok(()),
            _ => Err(CodecError::InvalidOperation("encoder context is not open")),
        }
    }

    fn teardown(&mut self) {
        self.native = None;
        self.resample = None;
        self.fifo = None;
        self.eos = false;
    }

    fn sample_rate(&self) -> u32 {
        self.config.as_ref().map_or(0, |c| c.sample_rate)
    }

    /// Append one caller chunk to the FIFO, converting it first if needed.
    fn push_in_fifo(&mut self, input: &AudioBuffer) -> CodecResult<()> {
        let data = input.data();
        let channels = self.config.as_ref().map_or(0, |c| c.channels as usize);
        let frame_bytes = self.src_format.bytes_per_sample() * channels;
        if frame_bytes == 0 || data.len() % frame_bytes != 0 {
            return Err(CodecError::InvalidValue(format!(
                "{} bytes is not a whole number of {:?} sample frames",
                data.len(),
                self.src_format
            )));
        }

        let converted;
        let bytes = match &mut self.resample {
            Some(resample) => {
                converted = resample.convert(data);
                converted.as_slice()
            }
            None => data,
        };
        let Some(fifo) = self.fifo.as_mut() else {
            return Err(CodecError::InvalidOperation("encoder fifo is gone"));
        };
        if fifo.is_empty() {
            self.fifo_pts = input.pts();
        }
        fifo.write(bytes)?;
        Ok(())
    }

    /// Submit one frame from the FIFO. `Ok(false)` when nothing was submitted.
    fn send_frame_to_native(&mut self) -> CodecResult<bool> {
        let rate = self.sample_rate();
        let (Some(fifo), Some(native)) = (self.fifo.as_mut(), self.native.as_mut()) else {
            return Err(CodecError::InvalidOperation("encoder context is not open"));
        };
        let n = if self.frame_size == 0 {
            fifo.len().min(self.max_chunk)
        } else {
            self.frame_size
        };
        let Some(frame) = fifo.peek(n, rate) else {
            return Ok(false);
        };
        let frame = frame.with_pts(Some(self.fifo_pts));

        match native.send_frame(Some(&frame)) {
            Ok(()) => {
                fifo.drain(n);
                self.fifo_pts += (n as f64 * US_PER_SECOND / rate.max(1) as f64) as i64;
                self.frames_sent += 1;
                Ok(true)
            }
            Err(NativeError::Again) | Err(NativeError::Eof) => Ok(false),
            Err(NativeError::InvalidData(msg)) | Err(NativeError::Other(msg)) => {
                error!("BaseEncoder: send frame failed: {}", msg);
                Err(CodecError::Unknown(msg))
            }
        }
    }

    fn fifo_has_frame(&self) -> bool {
        self.fifo
            .as_ref()
            .is_some_and(|f| !f.is_empty() && f.len() >= self.frame_size)
    }

    /// Header then payload; a failure of either leaves the buffer empty.
    fn write_packet(&self, packet: &EncodedPacket, output: &mut AudioBuffer) -> CodecResult<()> {
        let written = self.spec.header(packet.data.len()).and_then(|header| {
            output.write(&header)?;
            output.append(&packet.data)
        });
        if let Err(e) = written {
            error!(
                "BaseEncoder: writing {}-byte packet into {}-byte buffer failed: {}",
                packet.data.len(),
                output.capacity(),
                e
            );
            output.set_size(0)?;
            return Err(CodecError::Unknown(e.to_string()));
        }
        output.set_pts(packet.pts);
        output.set_eos(false);
        Ok(())
    }
}

pub struct BaseEncoder<S> {
    codec: CodecId,
    factory: Arc<EncoderFactory>,
    inner: Mutex<EncoderInner<S>>,
}

impl<S: EncoderSpec> BaseEncoder<S> {
    /// An encoder whose native backend is opened by `factory`.
    pub fn with_factory(spec: S, factory: Arc<EncoderFactory>) -> Self {
        Self {
            codec: spec.codec(),
            factory,
            inner: Mutex::new(EncoderInner {
                spec,
                state: DecoderState::Uninitialized,
                config: None,
                native: None,
                resample: None,
                fifo: None,
                src_format: SampleFormat::S16Le,
                frame_size: 0,
                max_chunk: usize::MAX,
                fifo_pts: 0,
                eos: false,
                frames_sent: 0,
                out_format: Format::new(),
            }),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.inner.lock().state
    }

    /// Samples per channel waiting in the FIFO.
    pub fn buffered_samples(&self) -> usize {
        self.inner.lock().fifo.as_ref().map_or(0, AudioFifo::len)
    }

    /// Frames handed to the native encoder since `init`.
    pub fn frames_sent(&self) -> u64 {
        self.inner.lock().frames_sent
    }
}

impl<S: EncoderSpec> CodecPlugin for BaseEncoder<S> {
    fn init(&self, format: &Format) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            DecoderState::Uninitialized | DecoderState::ContextAllocated => {}
            _ => return Err(CodecError::InvalidOperation("encoder is already initialized")),
        }
        inner.state = DecoderState::ContextAllocated;

        let config = inner.spec.check_format(format).inspect_err(|e| {
            error!("BaseEncoder: {} rejected format: {}", self.codec_name(), e);
        })?;
        let src_format = format
            .sample_format()
            .inspect_err(|e| {
                error!("BaseEncoder: {} rejected format: {}", self.codec_name(), e);
            })?
            .unwrap_or(SampleFormat::S16Le);
        if !inner.spec.input_formats().contains(&src_format) {
            error!(
                "BaseEncoder: {} does not take {:?} input",
                self.codec_name(),
                src_format
            );
            return Err(CodecError::InvalidConfig(format!(
                "sample format {src_format:?} unsupported"
            )));
        }
        inner.state = DecoderState::Configured;

        let opened = (self.factory)(&config).and_then(|native| {
            let channels = config.channels as usize;
            let frame_size = native.frame_size();
            let work_format = native.sample_format();
            let resample = if work_format == src_format {
                None
            } else {
                Some(Resample::init(ResamplePara::format_only(
                    channels,
                    config.sample_rate,
                    src_format,
                    work_format,
                    frame_size.max(1),
                ))?)
            };
            let fifo = AudioFifo::new(work_format, channels, frame_size.max(1) * 2)?;
            Ok((native, resample, fifo))
        });
        let (native, resample, fifo) = match opened {
            Ok(parts) => parts,
            Err(e) => {
                error!("BaseEncoder: {} open failed: {}", self.codec_name(), e);
                inner.state = DecoderState::ContextAllocated;
                return Err(e);
            }
        };

        let frame_size = native.frame_size();
        let mut out = Format::new();
        out.put_str(keys::MIME, self.codec.mime())
            .put_int(keys::CHANNEL_COUNT, config.channels as i64)
            .put_int(keys::SAMPLE_RATE, config.sample_rate as i64)
            .put_int(keys::BITRATE, config.bitrate)
            .put_int(keys::FRAME_SIZE, frame_size as i64)
            .put_int(
                keys::MAX_INPUT_SIZE,
                inner.spec.max_output_size(&config) as i64,
            );

        debug!(
            "BaseEncoder: {} open, {}ch {}Hz {}bps, {:?} -> {:?}, frame {}",
            self.codec_name(),
            config.channels,
            config.sample_rate,
            config.bitrate,
            src_format,
            native.sample_format(),
            frame_size
        );

        inner.src_format = src_format;
        inner.frame_size = frame_size;
        inner.max_chunk = inner.spec.max_variable_frame(&config).max(1);
        inner.resample = resample;
        inner.fifo = Some(fifo);
        inner.native = Some(native);
        inner.config = Some(config);
        inner.out_format = out;
        inner.eos = false;
        inner.frames_sent = 0;
        inner.state = DecoderState::Open;
        Ok(())
    }

    fn set_parameter(&self, format: &Format) -> CodecResult<()> {
        let inner = self.inner.lock();
        inner.check_open()?;
        format.sample_format()?;
        if format.contains(keys::SAMPLE_RATE) || format.contains(keys::CHANNEL_COUNT) {
            return Err(CodecError::InvalidOperation(
                "stream layout cannot change on an open encoder",
            ));
        }
        Ok(())
    }

    fn process_send_data(&self, input: &AudioBuffer) -> CodecResult<Status> {
        let mut inner = self.inner.lock();
        inner.check_open()?;

        if input.is_eos() {
            debug!("BaseEncoder: {} input end of stream", self.codec_name());
            inner.eos = true;
            return Ok(Status::Ok);
        }
        if inner.eos {
            return Ok(Status::EndOfStream);
        }
        let size = input.size();
        if size == 0 || size > input.capacity() {
            error!(
                "BaseEncoder: invalid input size {} (capacity {})",
                size,
                input.capacity()
            );
            return Err(CodecError::InvalidValue(format!("input size {size}")));
        }

        inner.push_in_fifo(input)?;
        Ok(Status::Ok)
    }

    fn process_receive_data(&self, output: &mut AudioBuffer) -> CodecResult<Status> {
        let mut inner = self.inner.lock();
        inner.check_open()?;

        if inner.eos {
            output.set_size(0)?;
            output.set_eos(true);
            return Ok(Status::EndOfStream);
        }

        loop {
            let sent = inner.send_frame_to_native()?;
            let received = match inner.native.as_mut() {
                Some(native) => native.receive_packet(),
                None => return Err(CodecError::InvalidOperation("encoder context is not open")),
            };
            match received {
                Ok(packet) => {
                    inner.write_packet(&packet, output)?;
                    return Ok(if inner.fifo_has_frame() {
                        Status::Again
                    } else {
                        Status::Ok
                    });
                }
                Err(NativeError::Again) if sent && inner.fifo_has_frame() => continue,
                Err(NativeError::Again) => {
                    trace!("BaseEncoder: receive backpressure");
                    return Ok(Status::NotEnoughData);
                }
                Err(NativeError::Eof) => {
                    output.set_size(0)?;
                    output.set_eos(true);
                    return Ok(Status::EndOfStream);
                }
                Err(NativeError::InvalidData(msg)) | Err(NativeError::Other(msg)) => {
                    error!("BaseEncoder: {} receive failed: {}", self.codec_name(), msg);
                    return Err(CodecError::Unknown(msg));
                }
            }
        }
    }

    fn reset(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == DecoderState::Closed {
            return Err(CodecError::InvalidOperation("encoder is released"));
        }
        inner.teardown();
        inner.state = DecoderState::ContextAllocated;
        Ok(())
    }

    fn flush(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.check_open()?;
        if let Some(native) = inner.native.as_mut() {
            native.flush();
        }
        if let Some(fifo) = inner.fifo.as_mut() {
            fifo.clear();
        }
        if let Some(resample) = inner.resample.as_mut() {
            resample.reset();
        }
        inner.eos = false;
        Ok(())
    }

    fn release(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.teardown();
        inner.state = DecoderState::Closed;
        Ok(())
    }

    fn output_format(&self) -> Format {
        self.inner.lock().out_format.clone()
    }

    fn input_buffer_size(&self) -> usize {
        let inner = self.inner.lock();
        let channels = inner.config.as_ref().map_or(2, |c| c.channels as usize);
        let samples = if inner.frame_size == 0 {
            inner.sample_rate().max(8_000) as usize / 50
        } else {
            inner.frame_size
        };
        inner.src_format.buffer_size(channels, samples)
    }

    fn output_buffer_size(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .config
            .as_ref()
            .map_or(0, |c| inner.spec.max_output_size(c))
    }

    fn codec_name(&self) -> &'static str {
        self.codec
            .plugin_name(CodecKind::Encoder)
            .unwrap_or_default()
    }
}

// ── Shared format checks ─────────────────────────────────────────────────────

/// Bitrate from `format` (or `default`), within `min..=max`.
pub(crate) fn require_bitrate(format: &Format, default: i64, min: i64, max: i64) -> CodecResult<i64> {
    let bitrate = format.bitrate().unwrap_or(default);
    if !(min..=max).contains(&bitrate) {
        return Err(CodecError::InvalidConfig(format!(
            "bitrate {bitrate} outside {min}..={max}"
        )));
    }
    Ok(bitrate)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio::{frame::AudioFrame, native::NativeResult};

    /// Scripted native encoder: one packet per frame, payload is a frame counter.
    pub(crate) struct FakeEncoder {
        pub frame_size: usize,
        pub format: SampleFormat,
        pub pending: Option<EncodedPacket>,
        pub draining: bool,
        pub submitted: Arc<Mutex<Vec<usize>>>,
    }

    impl NativeEncoder for FakeEncoder {
        fn frame_size(&self) -> usize {
            self.frame_size
        }

        fn sample_format(&self) -> SampleFormat {
            self.format
        }

        fn send_frame(&mut self, frame: Option<&AudioFrame>) -> NativeResult<()> {
            let Some(frame) = frame else {
                self.draining = true;
                return Ok(());
            };
            if self.pending.is_some() {
                return Err(NativeError::Again);
            }
            let mut submitted = self.submitted.lock();
            submitted.push(frame.nb_samples);
            self.pending = Some(EncodedPacket {
                data: vec![submitted.len() as u8; 16].into(),
                pts: frame.pts.unwrap_or_default(),
                duration: frame.duration_us(),
            });
            Ok(())
        }

        fn receive_packet(&mut self) -> NativeResult<EncodedPacket> {
            match self.pending.take() {
                Some(p) => Ok(p),
                None if self.draining => Err(NativeError::Eof),
                None => Err(NativeError::Again),
            }
        }

        fn flush(&mut self) {
            self.pending = None;
            self.draining = false;
        }
    }

    pub(crate) fn fake_factory(
        frame_size: usize,
        format: SampleFormat,
        submitted: Arc<Mutex<Vec<usize>>>,
    ) -> Arc<EncoderFactory> {
        Arc::new(move |_: &EncoderConfig| {
            Ok(Box::new(FakeEncoder {
                frame_size,
                format,
                pending: None,
                draining: false,
                submitted: submitted.clone(),
            }) as Box<dyn NativeEncoder>)
        })
    }

    pub(crate) fn pcm(samples: usize, channels: usize, pts: i64) -> AudioBuffer {
        let mut buf = AudioBuffer::new(samples * channels * 2).expect("buffer");
        let bytes: Vec<u8> = (0..samples * channels * 2).map(|i| i as u8).collect();
        buf.write(&bytes).expect("write");
        buf.set_pts(pts);
        buf
    }

    pub(crate) fn eos() -> AudioBuffer {
        let mut buf = AudioBuffer::new(4).expect("buffer");
        buf.set_eos(true);
        buf
    }

    fn aac_format() -> Format {
        let mut f = Format::new();
        f.put_int(keys::CHANNEL_COUNT, 2)
            .put_int(keys::SAMPLE_RATE, 44_100)
            .put_int(keys::BITRATE, 128_000);
        f
    }

    fn aac(submitted: Arc<Mutex<Vec<usize>>>, native: SampleFormat) -> BaseEncoder<AacEncoderSpec> {
        BaseEncoder::with_factory(
            AacEncoderSpec::default(),
            fake_factory(1024, native, submitted),
        )
    }

    /// Receive until the encoder wants more input, collecting packets.
    fn drain(enc: &impl CodecPlugin, out: &mut AudioBuffer) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        loop {
            match enc.process_receive_data(out).expect("recv") {
                Status::Ok => packets.push(out.data().to_vec()),
                Status::Again => {
                    packets.push(out.data().to_vec());
                    continue;
                }
                _ => break,
            }
            if packets.len() > 64 {
                panic!("encoder never ran dry");
            }
        }
        packets
    }

    #[test]
    fn aac_chunks_make_two_adts_frames() {
        let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
        let enc = aac(Arc::clone(&submitted), SampleFormat::S16Le);
        enc.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");

        let mut packets = Vec::new();
        for (samples, pts) in [(1024, 0), (512, 23_219), (512, 34_829)] {
            assert_eq!(enc.process_send_data(&pcm(samples, 2, pts)).expect("send"), Status::Ok);
            packets.extend(drain(&enc, &mut out));
        }

        assert_eq!(packets.len(), 2);
        for packet in &packets {
            assert_eq!(packet.len(), 7 + 16);
            assert_eq!(&packet[..2], &[0xFF, 0xF1]);
        }
        assert_eq!(*submitted.lock(), vec![1024, 1024]);
        assert_eq!(enc.buffered_samples(), 0);
        enc.flush().expect("flush");
        assert_eq!(enc.buffered_samples(), 0);
    }

    #[test]
    fn rechunking_ignores_chunk_boundaries() {
        for chunks in [vec![512usize, 716, 820], vec![2048]] {
            let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
            let enc = aac(Arc::clone(&submitted), SampleFormat::S16Le);
            enc.init(&aac_format()).expect("init");
            let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");

            for samples in chunks {
                enc.process_send_data(&pcm(samples, 2, 0)).expect("send");
                drain(&enc, &mut out);
            }
            assert_eq!(enc.frames_sent(), 2);
            assert_eq!(*submitted.lock(), vec![1024, 1024]);
            assert_eq!(enc.buffered_samples(), 0);
        }
    }

    #[test]
    fn large_chunk_signals_again() {
        let enc = aac(Arc::default(), SampleFormat::S16Le);
        enc.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");

        enc.process_send_data(&pcm(3 * 1024, 2, 0)).expect("send");
        assert_eq!(enc.process_receive_data(&mut out).expect("recv"), Status::Again);
        assert_eq!(out.pts(), 0);
        assert_eq!(enc.process_receive_data(&mut out).expect("recv"), Status::Again);
        assert_eq!(out.pts(), 23_219);
        assert_eq!(enc.process_receive_data(&mut out).expect("recv"), Status::Ok);
        assert_eq!(
            enc.process_receive_data(&mut out).expect("recv"),
            Status::NotEnoughData
        );
    }

    #[test]
    fn random_chunking_keeps_sample_count() {
        use rand::Rng;

        let mut rng = rand::thread_rng();
        let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
        let enc = aac(Arc::clone(&submitted), SampleFormat::S16Le);
        enc.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");

        let mut total = 0;
        while total < 20 * 1024 {
            let samples = rng.gen_range(1..=3000);
            enc.process_send_data(&pcm(samples, 2, 0)).expect("send");
            drain(&enc, &mut out);
            total += samples;
        }
        assert_eq!(submitted.lock().len(), total / 1024);
        assert_eq!(enc.buffered_samples(), total % 1024);
    }

    #[test]
    fn eos_short_circuits_receive() {
        let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
        let enc = aac(Arc::clone(&submitted), SampleFormat::S16Le);
        enc.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");

        enc.process_send_data(&pcm(1500, 2, 0)).expect("send");
        enc.process_send_data(&eos()).expect("eos");
        assert_eq!(
            enc.process_receive_data(&mut out).expect("recv"),
            Status::EndOfStream
        );
        assert!(out.is_eos());
        assert_eq!(out.size(), 0);
        assert!(submitted.lock().is_empty());

        enc.flush().expect("flush");
        assert_eq!(enc.buffered_samples(), 0);
        enc.process_send_data(&pcm(1024, 2, 0)).expect("send after flush");
        assert_eq!(enc.process_receive_data(&mut out).expect("recv"), Status::Ok);
    }

    #[test]
    fn input_is_converted_to_the_native_format() {
        let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
        let enc = aac(Arc::clone(&submitted), SampleFormat::F32P);
        enc.init(&aac_format()).expect("init");
        enc.process_send_data(&pcm(1024, 2, 0)).expect("send");
        assert_eq!(enc.buffered_samples(), 1024);
        let mut out = AudioBuffer::new(enc.output_buffer_size()).expect("out");
        assert_eq!(enc.process_receive_data(&mut out).expect("recv"), Status::Ok);
    }

    #[test]
    fn too_small_output_is_unknown_and_empty() {
        let enc = aac(Arc::default(), SampleFormat::S16Le);
        enc.init(&aac_format()).expect("init");
        enc.process_send_data(&pcm(1024, 2, 0)).expect("send");
        let mut out = AudioBuffer::new(10).expect("out");
        assert!(matches!(
            enc.process_receive_data(&mut out),
            Err(CodecError::Unknown(_))
        ));
        assert_eq!(out.size(), 0);
    }

    #[test]
    fn invalid_input_and_lifecycle() {
        let enc = aac(Arc::default(), SampleFormat::S16Le);
        assert!(matches!(
            enc.process_send_data(&pcm(4, 2, 0)),
            Err(CodecError::InvalidOperation(_))
        ));

        let mut f = aac_format();
        f.put_int(keys::SAMPLE_FORMAT, SampleFormat::U8.code());
        assert!(matches!(enc.init(&f), Err(CodecError::InvalidConfig(_))));
        assert_eq!(enc.state(), DecoderState::ContextAllocated);

        enc.init(&aac_format()).expect("init");
        let mut ragged = AudioBuffer::new(16).expect("buffer");
        ragged.write(&[0; 3]).expect("write");
        assert!(matches!(
            enc.process_send_data(&ragged),
            Err(CodecError::InvalidValue(_))
        ));

        enc.release().expect("release");
        assert!(enc.process_send_data(&pcm(4, 2, 0)).is_err());
    }

    #[test]
    fn unknown_input_sample_format_is_rejected() {
        let submitted: Arc<Mutex<Vec<usize>>> = Arc::default();
        let enc = aac(submitted, SampleFormat::F32P);
        let mut f = aac_format();
        f.put_int(keys::SAMPLE_FORMAT, 42);
        assert!(matches!(enc.init(&f), Err(CodecError::InvalidConfig(_))));
        assert_eq!(enc.state(), DecoderState::ContextAllocated);

        enc.init(&aac_format()).expect("init");
        let mut change = Format::new();
        change.put_int(keys::SAMPLE_FORMAT, 42);
        assert!(matches!(
            enc.set_parameter(&change),
            Err(CodecError::InvalidConfig(_))
        ));
    }
}
