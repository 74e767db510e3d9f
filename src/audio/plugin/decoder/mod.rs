//! `BaseDecoder`: the send/receive protocol shared by every decoder plugin.
//!
//! | State | Entered by |
//! |---|---|
//! | `Uninitialized` | construction |
//! | `ContextAllocated` | start of `init`, failed configuration, `reset` |
//! | `Configured` | format accepted by the [`DecoderSpec`] |
//! | `Open` | native decoder opened (and output conversion built) |
//! | `Closed` | `release` |
//!
//! Send and receive each hold the single plugin mutex for their whole native
//! interaction.

pub mod aac;
pub mod flac;
pub mod g711;
pub mod mpeg;
pub mod opus;
pub mod vorbis;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

pub use self::{
    aac::AacDecoderSpec, flac::FlacDecoderSpec, g711::G711DecoderSpec, mpeg::MpegDecoderSpec,
    opus::OpusDecoderSpec, vorbis::VorbisDecoderSpec,
};

use super::{CodecPlugin, Status};
use crate::{
    audio::{
        buffer::AudioBuffer,
        constants::US_PER_SECOND,
        format::{ChannelLayout, CodecId, CodecKind, Format, SampleFormat, keys},
        frame::AudioFrame,
        native::{
            DecoderConfig, DecoderFactory, NativeDecoder, NativeError, Packet, SymphoniaDecoder,
        },
        resample::{Resample, ResamplePara},
    },
    common::errors::{CodecError, CodecResult},
};

/// Per-codec parameterization of [`BaseDecoder`].
pub trait DecoderSpec: Send + 'static {
    fn codec(&self) -> CodecId;

    /// Validate a configuration and stage extradata.
    fn check_format(&mut self, format: &Format) -> CodecResult<DecoderConfig>;

    /// Strip transport framing off one compressed unit.
    fn prepare<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data
    }

    /// Upper bound on samples per channel in one decoded frame.
    fn max_frame_samples(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Uninitialized,
    ContextAllocated,
    Configured,
    Open,
    Closed,
}

/// Timestamp synthesis for frames the native decoder leaves unstamped.
#[derive(Debug, Default)]
struct PtsClock {
    /// Microseconds per sample, fixed at the first successful receive.
    duration_per_sample: Option<f64>,
    last: Option<(i64, usize)>,
}

impl PtsClock {
    fn stamp(&mut self, frame: &AudioFrame, sample_rate: u32, fallback: i64) -> i64 {
        let per_sample = *self
            .duration_per_sample
            .get_or_insert_with(|| US_PER_SECOND / sample_rate.max(1) as f64);
        let pts = match (frame.pts, self.last) {
            (Some(pts), _) => pts,
            (None, Some((last_pts, last_samples))) => {
                last_pts + (last_samples as f64 * per_sample) as i64
            }
            (None, None) => fallback,
        };
        self.last = Some((pts, frame.nb_samples));
        pts
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

struct DecoderInner<S> {
    spec: S,
    state: DecoderState,
    config: Option<DecoderConfig>,
    native: Option<Box<dyn NativeDecoder>>,
    resample: Option<Resample>,
    dest_format: SampleFormat,
    out_format: Format,
    clock: PtsClock,
    last_send_pts: i64,
}

impl<S: DecoderSpec> DecoderInner<S> {
    fn native(&mut self) -> CodecResult<&mut Box<dyn NativeDecoder>> {
        match (self.state, self.native.as_mut()) {
            (DecoderState::Open, Some(native)) => Ok(native),
            _ => Err(CodecError::InvalidOperation("decoder context is not open")),
        }
    }

    fn teardown(&mut self) {
        self.native = None;
        self.resample = None;
        self.clock = PtsClock::default();
    }

    /// Build (or rebuild) the converter when `src` differs from the requested output.
    fn ensure_resample(
        &mut self,
        src: SampleFormat,
        channels: usize,
        sample_rate: u32,
    ) -> CodecResult<()> {
        if src == self.dest_format {
            self.resample = None;
            return Ok(());
        }
        let current = self.resample.as_ref().map(|r| *r.para());
        let matches = current.is_some_and(|para| {
            para.src_format == src && para.channels == channels && para.sample_rate == sample_rate
        });
        if matches {
            return Ok(());
        }
        let para = ResamplePara::format_only(
            channels,
            sample_rate,
            src,
            self.dest_format,
            self.spec.max_frame_samples(),
        );
        self.resample = Some(Resample::init(para)?);
        Ok(())
    }

    fn receive_frame_succ(
        &mut self,
        frame: AudioFrame,
        output: &mut AudioBuffer,
    ) -> CodecResult<Status> {
        let rate = self
            .config
            .as_ref()
            .map_or(frame.sample_rate, |c| c.sample_rate);
        let pts = self.clock.stamp(&frame, rate, self.last_send_pts);

        self.ensure_resample(frame.format, frame.channels, frame.sample_rate)?;
        let bytes = match &mut self.resample {
            Some(resample) => resample.convert_frame(&frame)?.to_bytes(),
            None => frame.to_bytes(),
        };
        if bytes.is_empty() {
            trace!("BaseDecoder: conversion produced no data");
            return Ok(Status::NotEnoughData);
        }
        if bytes.len() > output.capacity() {
            error!(
                "BaseDecoder: output buffer too small, need {} have {}",
                bytes.len(),
                output.capacity()
            );
            return Err(CodecError::NoMemory {
                needed: bytes.len(),
                capacity: output.capacity(),
            });
        }

        output.write(&bytes)?;
        output.set_pts(pts);
        output.set_eos(false);
        Ok(Status::Ok)
    }
}

pub struct BaseDecoder<S> {
    codec: CodecId,
    factory: Arc<DecoderFactory>,
    inner: Mutex<DecoderInner<S>>,
}

fn open_symphonia(config: &DecoderConfig) -> CodecResult<Box<dyn NativeDecoder>> {
    Ok(Box::new(SymphoniaDecoder::open(config)?))
}

impl<S: DecoderSpec> BaseDecoder<S> {
    /// A decoder backed by the bundled symphonia backend.
    pub fn new(spec: S) -> Self {
        Self::with_factory(spec, Arc::new(open_symphonia))
    }

    /// A decoder whose native backend is opened by `factory`.
    pub fn with_factory(spec: S, factory: Arc<DecoderFactory>) -> Self {
        Self {
            codec: spec.codec(),
            factory,
            inner: Mutex::new(DecoderInner {
                spec,
                state: DecoderState::Uninitialized,
                config: None,
                native: None,
                resample: None,
                dest_format: SampleFormat::S16Le,
                out_format: Format::new(),
                clock: PtsClock::default(),
                last_send_pts: 0,
            }),
        }
    }

    pub fn state(&self) -> DecoderState {
        self.inner.lock().state
    }

    /// Whether output is currently routed through a converter.
    pub fn is_resampling(&self) -> bool {
        self.inner.lock().resample.is_some()
    }
}

impl<S: DecoderSpec> CodecPlugin for BaseDecoder<S> {
    fn init(&self, format: &Format) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        match inner.state {
            DecoderState::Uninitialized | DecoderState::ContextAllocated => {}
            _ => return Err(CodecError::InvalidOperation("decoder is already initialized")),
        }
        inner.state = DecoderState::ContextAllocated;

        let config = inner.spec.check_format(format).inspect_err(|e| {
            error!("BaseDecoder: {} rejected format: {}", self.codec_name(), e);
        })?;
        let dest_format = format
            .sample_format()
            .inspect_err(|e| {
                error!("BaseDecoder: {} rejected format: {}", self.codec_name(), e);
            })?
            .unwrap_or(SampleFormat::S16Le);
        inner.state = DecoderState::Configured;

        let native = (self.factory)(&config).inspect_err(|e| {
            error!("BaseDecoder: {} open failed: {}", self.codec_name(), e);
        });
        let native = match native {
            Ok(native) => native,
            Err(e) => {
                inner.state = DecoderState::ContextAllocated;
                return Err(e);
            }
        };

        inner.dest_format = dest_format;
        let channels = config.channels as usize;
        if let Err(e) = inner.ensure_resample(native.sample_format(), channels, config.sample_rate)
        {
            error!("BaseDecoder: {} converter setup failed: {}", self.codec_name(), e);
            inner.state = DecoderState::ContextAllocated;
            return Err(e);
        }

        let layout = format
            .channel_layout()
            .or_else(|| ChannelLayout::default_for(channels))
            .unwrap_or(ChannelLayout::STEREO);
        let mut out = Format::new();
        out.put_str(keys::MIME, self.codec.mime())
            .put_int(keys::CHANNEL_COUNT, config.channels as i64)
            .put_int(keys::SAMPLE_RATE, config.sample_rate as i64)
            .put_int(keys::SAMPLE_FORMAT, dest_format.code())
            .put_int(keys::CHANNEL_LAYOUT, layout.0 as i64)
            .put_int(keys::MAX_INPUT_SIZE, config.max_input_size as i64);

        debug!(
            "BaseDecoder: {} open, {}ch {}Hz, {:?} -> {:?}",
            self.codec_name(),
            config.channels,
            config.sample_rate,
            native.sample_format(),
            dest_format
        );

        inner.out_format = out;
        inner.config = Some(config);
        inner.native = Some(native);
        inner.clock = PtsClock::default();
        inner.state = DecoderState::Open;
        Ok(())
    }

    fn set_parameter(&self, format: &Format) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        if inner.state != DecoderState::Open {
            return Err(CodecError::InvalidOperation("decoder context is not open"));
        }
        match format.sample_format()? {
            Some(fmt) if fmt != inner.dest_format => {
                debug!("BaseDecoder: output format {:?} -> {:?}", inner.dest_format, fmt);
                inner.dest_format = fmt;
                inner.resample = None;
                inner.out_format.put_int(keys::SAMPLE_FORMAT, fmt.code());
            }
            _ => {}
        }
        Ok(())
    }

    fn process_send_data(&self, input: &AudioBuffer) -> CodecResult<Status> {
        let mut inner = self.inner.lock();
        inner.native()?;

        let pts = input.pts();
        let data = if input.is_eos() {
            &[][..]
        } else {
            let size = input.size();
            if size == 0 || size > input.capacity() {
                error!(
                    "BaseDecoder: invalid input size {} (capacity {})",
                    size,
                    input.capacity()
                );
                return Err(CodecError::InvalidValue(format!("input size {size}")));
            }
            let data = inner.spec.prepare(input.data());
            if data.is_empty() {
                return Err(CodecError::InvalidData("input holds no payload".into()));
            }
            data
        };

        inner.last_send_pts = pts;
        let packet = if data.is_empty() {
            Packet::eos(pts)
        } else {
            Packet::new(data, pts)
        };

        match inner.native()?.send_packet(&packet) {
            Ok(()) => Ok(Status::Ok),
            Err(NativeError::Again) => {
                trace!("BaseDecoder: send backpressure");
                Ok(Status::NotEnoughData)
            }
            Err(NativeError::Eof) => Ok(Status::EndOfStream),
            Err(NativeError::InvalidData(msg)) => {
                error!("BaseDecoder: {} invalid data: {}", self.codec_name(), msg);
                Err(CodecError::InvalidData(msg))
            }
            Err(NativeError::Other(msg)) => {
                error!("BaseDecoder: {} send failed: {}", self.codec_name(), msg);
                Err(CodecError::Unknown(msg))
            }
        }
    }

    fn process_receive_data(&self, output: &mut AudioBuffer) -> CodecResult<Status> {
        let mut inner = self.inner.lock();
        match inner.native()?.receive_frame() {
            Ok(frame) => inner.receive_frame_succ(frame, output),
            Err(NativeError::Again) => Ok(Status::NotEnoughData),
            Err(NativeError::Eof) => {
                output.set_eos(true);
                output.set_size(0)?;
                inner.native()?.flush();
                if let Some(resample) = &mut inner.resample {
                    resample.reset();
                }
                inner.clock.reset();
                debug!("BaseDecoder: {} reached end of stream", self.codec_name());
                Ok(Status::EndOfStream)
            }
            Err(NativeError::InvalidData(msg)) => {
                error!("BaseDecoder: {} invalid data: {}", self.codec_name(), msg);
                Err(CodecError::InvalidData(msg))
            }
            Err(NativeError::Other(msg)) => {
                error!("BaseDecoder: {} receive failed: {}", self.codec_name(), msg);
                Err(CodecError::Unknown(msg))
            }
        }
    }

    fn reset(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        if inner.state == DecoderState::Closed {
            return Err(CodecError::InvalidOperation("decoder is released"));
        }
        inner.teardown();
        inner.state = DecoderState::ContextAllocated;
        Ok(())
    }

    fn flush(&self) -> CodecResult<()> {
        let mut inner = self.inner.lock();
        inner.native()?.flush();
        if let Some(resample) = &mut inner.resample {
            resample.reset();
        }
        inner.clock.reset();
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
        self.inner
            .lock()
            .config
            .as_ref()
            .map_or(0, |c| c.max_input_size)
    }

    fn output_buffer_size(&self) -> usize {
        let inner = self.inner.lock();
        let channels = inner.config.as_ref().map_or(2, |c| c.channels as usize);
        inner
            .dest_format
            .buffer_size(channels, inner.spec.max_frame_samples())
    }

    fn codec_name(&self) -> &'static str {
        self.codec
            .plugin_name(CodecKind::Decoder)
            .unwrap_or_default()
    }
}

// ── Shared format checks ─────────────────────────────────────────────────────

/// Channel count from `format`, required and within `range`.
pub(crate) fn require_channels(
    format: &Format,
    range: std::ops::RangeInclusive<u32>,
) -> CodecResult<u32> {
    let channels = format
        .channel_count()
        .ok_or_else(|| CodecError::InvalidConfig("channel_count is required".into()))?;
    if !range.contains(&channels) {
        return Err(CodecError::InvalidConfig(format!(
            "channel_count {channels} outside {}..={}",
            range.start(),
            range.end()
        )));
    }
    Ok(channels)
}

/// Sample rate from `format`, required and accepted by `ok`.
pub(crate) fn require_sample_rate(
    format: &Format,
    ok: impl Fn(u32) -> bool,
) -> CodecResult<u32> {
    let rate = format
        .sample_rate()
        .ok_or_else(|| CodecError::InvalidConfig("sample_rate is required".into()))?;
    if rate == 0 || !ok(rate) {
        return Err(CodecError::InvalidConfig(format!("sample_rate {rate} unsupported")));
    }
    Ok(rate)
}

/// `max_input_size` from `format`, falling back to `default`.
pub(crate) fn max_input_size(format: &Format, default: usize) -> CodecResult<usize> {
    match format.get_int(keys::MAX_INPUT_SIZE) {
        None => Ok(default),
        Some(size) if size > 0 => Ok(size as usize),
        Some(size) => {
            warn!("BaseDecoder: rejecting max_input_size {}", size);
            Err(CodecError::InvalidConfig(format!("max_input_size {size}")))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::audio::native::NativeResult;

    /// Scripted native decoder: every packet turns into one frame.
    pub(crate) struct FakeDecoder {
        pub format: SampleFormat,
        pub channels: usize,
        pub sample_rate: u32,
        pub nb_samples: usize,
        pub stamp: bool,
        pub queue: VecDeque<AudioFrame>,
        pub draining: bool,
        pub payloads: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl FakeDecoder {
        pub(crate) fn new(format: SampleFormat, channels: usize, sample_rate: u32, nb_samples: usize) -> Self {
            Self {
                format,
                channels,
                sample_rate,
                nb_samples,
                stamp: true,
                queue: VecDeque::new(),
                draining: false,
                payloads: Arc::default(),
            }
        }

        fn frame_for(&self, packet: &Packet<'_>) -> AudioFrame {
            let mut frame =
                AudioFrame::silent(self.format, self.channels, self.sample_rate, self.nb_samples);
            // Distinct, recognizable bytes.
            for (p, plane) in frame.planes.iter_mut().enumerate() {
                for (i, b) in plane.iter_mut().enumerate() {
                    *b = (i + p + packet.data.len()) as u8;
                }
            }
            frame.pts = self.stamp.then_some(packet.pts);
            frame
        }
    }

    impl NativeDecoder for FakeDecoder {
        fn send_packet(&mut self, packet: &Packet<'_>) -> NativeResult<()> {
            if packet.is_eos() {
                self.draining = true;
                return Ok(());
            }
            if !self.queue.is_empty() {
                return Err(NativeError::Again);
            }
            if packet.data[0] == 0xEE {
                return Err(NativeError::InvalidData("corrupt".into()));
            }
            self.payloads.lock().push(packet.data.to_vec());
            let frame = self.frame_for(packet);
            self.queue.push_back(frame);
            Ok(())
        }

        fn receive_frame(&mut self) -> NativeResult<AudioFrame> {
            match self.queue.pop_front() {
                Some(frame) => Ok(frame),
                None if self.draining => Err(NativeError::Eof),
                None => Err(NativeError::Again),
            }
        }

        fn flush(&mut self) {
            self.queue.clear();
            self.draining = false;
        }

        fn sample_format(&self) -> SampleFormat {
            self.format
        }
    }

    pub(crate) fn fake_factory(
        format: SampleFormat,
        nb_samples: usize,
        stamp: bool,
    ) -> Arc<DecoderFactory> {
        Arc::new(move |config: &DecoderConfig| {
            let mut dec = FakeDecoder::new(
                format,
                config.channels as usize,
                config.sample_rate,
                nb_samples,
            );
            dec.stamp = stamp;
            Ok(Box::new(dec) as Box<dyn NativeDecoder>)
        })
    }

    pub(crate) fn input(data: &[u8], pts: i64) -> AudioBuffer {
        let mut buf = AudioBuffer::new(8_192).expect("buffer");
        buf.write(data).expect("write");
        buf.set_pts(pts);
        buf
    }

    pub(crate) fn eos(pts: i64) -> AudioBuffer {
        let mut buf = AudioBuffer::new(16).expect("buffer");
        buf.set_pts(pts);
        buf.set_eos(true);
        buf
    }

    fn aac_format() -> Format {
        let mut f = Format::new();
        f.put_int(keys::CHANNEL_COUNT, 2)
            .put_int(keys::SAMPLE_RATE, 44_100)
            .put_int(keys::AAC_IS_ADTS, 1);
        f
    }

    fn aac(format: SampleFormat, stamp: bool) -> BaseDecoder<AacDecoderSpec> {
        BaseDecoder::with_factory(AacDecoderSpec::default(), fake_factory(format, 1024, stamp))
    }

    #[test]
    fn aac_frame_then_eos() {
        let dec = aac(SampleFormat::F32P, true);
        dec.init(&aac_format()).expect("init");
        assert_eq!(dec.state(), DecoderState::Open);

        assert_eq!(dec.process_send_data(&input(&[0x21; 512], 0)).expect("send"), Status::Ok);
        let mut out = AudioBuffer::new(dec.output_buffer_size()).expect("out");
        assert_eq!(dec.process_receive_data(&mut out).expect("recv"), Status::Ok);
        assert_eq!(out.size(), 4096);
        assert_eq!(out.pts(), 0);
        assert!(!out.is_eos());

        assert_eq!(
            dec.process_receive_data(&mut out).expect("recv"),
            Status::NotEnoughData
        );
        assert_eq!(dec.process_send_data(&eos(23_220)).expect("eos"), Status::Ok);
        assert_eq!(
            dec.process_receive_data(&mut out).expect("recv"),
            Status::EndOfStream
        );
        assert!(out.is_eos());
        assert_eq!(out.size(), 0);
    }

    #[test]
    fn backpressure_round_trip_drains_every_frame() {
        let dec = aac(SampleFormat::S16Le, true);
        dec.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(dec.output_buffer_size()).expect("out");

        let mut frames = 0;
        for (i, pts) in [0i64, 23_220, 46_440].into_iter().enumerate() {
            assert_eq!(dec.process_send_data(&input(&[0x21; 300], pts)).expect("send"), Status::Ok);
            if i == 0 {
                // Native queue is full until drained.
                assert_eq!(
                    dec.process_send_data(&input(&[0x21; 300], pts)).expect("send"),
                    Status::NotEnoughData
                );
            }
            while dec.process_receive_data(&mut out).expect("recv") == Status::Ok {
                assert_eq!(out.pts(), pts);
                frames += 1;
            }
        }
        dec.process_send_data(&eos(69_660)).expect("eos");
        assert_eq!(dec.process_receive_data(&mut out).expect("recv"), Status::EndOfStream);
        assert_eq!(frames, 3);
    }

    #[test]
    fn passthrough_writes_native_bytes_unchanged() {
        let dec = aac(SampleFormat::S16Le, true);
        dec.init(&aac_format()).expect("init");
        assert!(!dec.is_resampling());

        dec.process_send_data(&input(&[0x21; 10], 0)).expect("send");
        let mut out = AudioBuffer::new(dec.output_buffer_size()).expect("out");
        dec.process_receive_data(&mut out).expect("recv");

        let expected = FakeDecoder::new(SampleFormat::S16Le, 2, 44_100, 1024)
            .frame_for(&Packet::new(&[0x21; 10], 0))
            .to_bytes();
        assert_eq!(out.data(), expected.as_slice());
    }

    #[test]
    fn adts_header_is_stripped_before_submission() {
        let payloads: Arc<Mutex<Vec<Vec<u8>>>> = Arc::default();
        let seen = payloads.clone();
        let factory: Arc<DecoderFactory> = Arc::new(move |config: &DecoderConfig| {
            let mut dec = FakeDecoder::new(
                SampleFormat::S16Le,
                config.channels as usize,
                config.sample_rate,
                1024,
            );
            dec.payloads = seen.clone();
            Ok(Box::new(dec) as Box<dyn NativeDecoder>)
        });
        let dec = BaseDecoder::with_factory(AacDecoderSpec::default(), factory);
        dec.init(&aac_format()).expect("init");

        let mut frame = vec![0xFF, 0xF1, 0x50, 0x80, 0x01, 0x5F, 0xFC];
        frame.extend_from_slice(&[1, 2, 3]);
        dec.process_send_data(&input(&frame, 0)).expect("send");
        assert_eq!(payloads.lock().as_slice(), &[vec![1u8, 2, 3]]);
    }

    #[test]
    fn missing_timestamps_are_extrapolated() {
        let dec = aac(SampleFormat::S16Le, false);
        dec.init(&aac_format()).expect("init");
        let mut out = AudioBuffer::new(dec.output_buffer_size()).expect("out");

        let mut seen = Vec::new();
        for pts in [1_000i64, 0, 0] {
            dec.process_send_data(&input(&[0x21; 8], pts)).expect("send");
            dec.process_receive_data(&mut out).expect("recv");
            seen.push(out.pts());
        }
        // 1024 samples at 44.1 kHz ≈ 23 219 µs.
        assert_eq!(seen[0], 1_000);
        assert_eq!(seen[1], 1_000 + 23_219);
        assert_eq!(seen[2], 1_000 + 2 * 23_219);
    }

    #[test]
    fn small_output_buffer_is_no_memory() {
        let dec = aac(SampleFormat::S16Le, true);
        dec.init(&aac_format()).expect("init");
        dec.process_send_data(&input(&[0x21; 8], 0)).expect("send");
        let mut out = AudioBuffer::new(100).expect("out");
        assert!(matches!(
            dec.process_receive_data(&mut out),
            Err(CodecError::NoMemory { needed: 4096, capacity: 100 })
        ));
    }

    #[test]
    fn invalid_inputs_and_data() {
        let dec = aac(SampleFormat::S16Le, true);
        dec.init(&aac_format()).expect("init");

        let empty = AudioBuffer::new(16).expect("buffer");
        assert!(matches!(
            dec.process_send_data(&empty),
            Err(CodecError::InvalidValue(_))
        ));
        assert!(matches!(
            dec.process_send_data(&input(&[0xEE; 4], 0)),
            Err(CodecError::InvalidData(_))
        ));
        // Data errors do not poison the context.
        assert_eq!(dec.process_send_data(&input(&[0x21; 4], 0)).expect("send"), Status::Ok);
    }

    #[test]
    fn lifecycle_guards() {
        let dec = aac(SampleFormat::S16Le, true);
        let mut out = AudioBuffer::new(8_192).expect("out");
        assert!(matches!(
            dec.process_receive_data(&mut out),
            Err(CodecError::InvalidOperation(_))
        ));

        let mut bad = aac_format();
        bad.put_int(keys::CHANNEL_COUNT, 0);
        assert!(matches!(dec.init(&bad), Err(CodecError::InvalidConfig(_))));
        assert_eq!(dec.state(), DecoderState::ContextAllocated);

        dec.init(&aac_format()).expect("init after bad config");
        dec.reset().expect("reset");
        assert_eq!(dec.state(), DecoderState::ContextAllocated);
        assert!(matches!(
            dec.process_send_data(&input(&[0x21; 4], 0)),
            Err(CodecError::InvalidOperation(_))
        ));

        dec.init(&aac_format()).expect("init after reset");
        dec.release().expect("release");
        assert!(matches!(
            dec.process_send_data(&input(&[0x21; 4], 0)),
            Err(CodecError::InvalidOperation(_))
        ));
        assert!(dec.init(&aac_format()).is_err());
    }

    #[test]
    fn flush_discards_queued_frames() {
        let dec = aac(SampleFormat::S16Le, true);
        dec.init(&aac_format()).expect("init");
        dec.process_send_data(&input(&[0x21; 4], 0)).expect("send");
        dec.flush().expect("flush");
        let mut out = AudioBuffer::new(8_192).expect("out");
        assert_eq!(
            dec.process_receive_data(&mut out).expect("recv"),
            Status::NotEnoughData
        );
    }

    #[test]
    fn requested_output_format_changes_converter() {
        let dec = aac(SampleFormat::F32P, true);
        let mut format = aac_format();
        format.put_int(keys::SAMPLE_FORMAT, SampleFormat::F32P.code());
        dec.init(&format).expect("init");
        assert!(!dec.is_resampling());

        let mut change = Format::new();
        change.put_int(keys::SAMPLE_FORMAT, SampleFormat::S16Le.code());
        dec.set_parameter(&change).expect("set_parameter");
        dec.process_send_data(&input(&[0x21; 4], 0)).expect("send");
        let mut out = AudioBuffer::new(8_192).expect("out");
        dec.process_receive_data(&mut out).expect("recv");
        assert_eq!(out.size(), 4096);
        assert!(dec.is_resampling());
        assert_eq!(
            dec.output_format().sample_format(),
            Ok(Some(SampleFormat::S16Le))
        );
    }

    #[test]
    fn unknown_output_sample_format_is_rejected() {
        let dec = aac(SampleFormat::F32P, true);
        let mut f = aac_format();
        f.put_int(keys::SAMPLE_FORMAT, 42);
        assert!(matches!(dec.init(&f), Err(CodecError::InvalidConfig(_))));
        assert_eq!(dec.state(), DecoderState::ContextAllocated);

        dec.init(&aac_format()).expect("init");
        let mut change = Format::new();
        change.put_int(keys::SAMPLE_FORMAT, 42);
        assert!(matches!(
            dec.set_parameter(&change),
            Err(CodecError::InvalidConfig(_))
        ));
        assert_eq!(
            dec.output_format().sample_format(),
            Ok(Some(SampleFormat::S16Le))
        );
    }
}
