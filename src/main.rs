use std::{
    f64::consts::TAU,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use avcodec_audio::{
    audio::{AudioCodec, CodecEvent, CodecKind, CodecState, SampleFormat},
    common::{logger, types::AnyResult},
    configs::{Config, LoopbackConfig},
};
use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, error, info, warn};

/// One encoded unit travelling from the encoder to the decoder.
struct Packet {
    data: Vec<u8>,
    pts: i64,
    eos: bool,
}

#[derive(Default)]
struct Stats {
    packets: usize,
    packet_bytes: usize,
    frames: usize,
    samples: usize,
    last_pts: i64,
}

/// Interleaved S16 sine tone, `start` samples into the stream.
fn tone(cfg: &LoopbackConfig, start: usize, samples: usize) -> Vec<u8> {
    let channels = cfg.channels as usize;
    let mut pcm = vec![0i16; samples * channels];
    for (i, frame) in pcm.chunks_exact_mut(channels).enumerate() {
        let t = (start + i) as f64 / cfg.sample_rate as f64;
        let v = ((TAU * cfg.tone_hz * t).sin() * 0.5 * i16::MAX as f64) as i16;
        frame.fill(v);
    }
    let mut bytes = vec![0u8; pcm.len() * 2];
    LittleEndian::write_i16_into(&pcm, &mut bytes);
    bytes
}

/// Feed the tone into the encoder and forward every packet it produces.
fn drive_encoder(
    encoder: Arc<AudioCodec>,
    cfg: LoopbackConfig,
    packets: flume::Sender<Packet>,
) -> AnyResult<()> {
    let total = (cfg.sample_rate as u64 * cfg.duration_ms / 1000) as usize;
    let bytes_per_sample = SampleFormat::S16Le.bytes_per_sample() * cfg.channels as usize;
    let mut sent = 0usize;
    let mut eos_sent = false;
    let events = encoder.events();

    loop {
        let event = match events.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => event,
            Err(flume::RecvTimeoutError::Timeout) => {
                if encoder.state() == CodecState::Released {
                    return Err("encoder released before end of stream".into());
                }
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        match event {
            CodecEvent::InputAvailable(index) => {
                if eos_sent {
                    continue;
                }
                let info = encoder.input_buffer(index)?;
                {
                    let mut buffer = info.lock();
                    if sent >= total {
                        buffer.set_eos(true);
                        eos_sent = true;
                    } else {
                        let chunk = cfg
                            .chunk_samples
                            .min(buffer.capacity() / bytes_per_sample)
                            .min(total - sent)
                            .max(1);
                        buffer.write(&tone(&cfg, sent, chunk))?;
                        buffer.set_pts((sent as u64 * 1_000_000 / cfg.sample_rate as u64) as i64);
                        sent += chunk;
                    }
                }
                encoder.queue_input(index)?;
            }
            CodecEvent::OutputAvailable(index) => {
                let packet = {
                    let info = encoder.output_buffer(index)?;
                    let buffer = info.lock();
                    Packet {
                        data: buffer.data().to_vec(),
                        pts: buffer.pts(),
                        eos: buffer.is_eos(),
                    }
                };
                encoder.release_output(index)?;
                let eos = packet.eos;
                if packets.send(packet).is_err() || eos {
                    return Ok(());
                }
            }
            CodecEvent::Error(e) => return Err(e.into()),
        }
    }
}

/// Decode forwarded packets until the end-of-stream buffer comes out.
fn drive_decoder(
    decoder: &AudioCodec,
    channels: usize,
    packets: flume::Receiver<Packet>,
) -> AnyResult<Stats> {
    let mut stats = Stats::default();
    let mut input_done = false;
    let events = decoder.events();

    loop {
        match events.recv()? {
            CodecEvent::InputAvailable(index) => {
                if input_done {
                    continue;
                }
                let Ok(packet) = packets.recv() else {
                    return Err("encoder stopped before end of stream".into());
                };
                {
                    let info = decoder.input_buffer(index)?;
                    let mut buffer = info.lock();
                    if packet.eos {
                        buffer.set_eos(true);
                        input_done = true;
                    } else {
                        stats.packets += 1;
                        stats.packet_bytes += packet.data.len();
                        buffer.write(&packet.data)?;
                        buffer.set_pts(packet.pts);
                    }
                }
                decoder.queue_input(index)?;
            }
            CodecEvent::OutputAvailable(index) => {
                let eos = {
                    let info = decoder.output_buffer(index)?;
                    let buffer = info.lock();
                    if !buffer.is_eos() {
                        stats.frames += 1;
                        stats.samples += buffer.size() / (2 * channels);
                        stats.last_pts = buffer.pts();
                    }
                    buffer.is_eos()
                };
                decoder.release_output(index)?;
                if eos {
                    return Ok(stats);
                }
            }
            CodecEvent::Error(e) => {
                // Bad packets do not poison the decoder.
                warn!("Loopback: decoder reported {}", e);
            }
        }
    }
}

fn run(config: &Config) -> AnyResult<()> {
    let cfg = config.loopback.clone();
    let encoder = Arc::new(AudioCodec::new(config.buffers.clone()));
    encoder.init_by_mime(&cfg.mime, CodecKind::Encoder)?;
    encoder.configure(&cfg.encoder_format())?;

    let decoder = AudioCodec::new(config.buffers.clone());
    decoder.init_by_mime(&cfg.mime, CodecKind::Decoder)?;
    decoder.configure(&cfg.stream_format())?;
    debug!("Loopback: decoder output {:?}", decoder.output_format()?);

    let (tx, rx) = flume::bounded(config.buffers.input_count.max(1));
    let started = Instant::now();
    decoder.start()?;
    encoder.start()?;

    let feeder = {
        let encoder = Arc::clone(&encoder);
        let cfg = cfg.clone();
        thread::Builder::new()
            .name("loopback-encode".to_string())
            .spawn(move || drive_encoder(encoder, cfg, tx))?
    };

    let decoded = drive_decoder(&decoder, cfg.channels as usize, rx);
    // Unblocks the encoder driver if decoding bailed out early.
    encoder.release()?;
    decoder.release()?;
    let encoded = feeder
        .join()
        .map_err(|_| "encoder driver panicked")?;
    encoded?;
    let stats = decoded?;

    let expected = (cfg.sample_rate as u64 * cfg.duration_ms / 1000) as usize;
    info!(
        "Loopback: {} {}ch {}Hz: {} packets ({} bytes) -> {} frames, {}/{} samples, last pts {} us, {:.1?}",
        cfg.mime,
        cfg.channels,
        cfg.sample_rate,
        stats.packets,
        stats.packet_bytes,
        stats.frames,
        stats.samples,
        expected,
        stats.last_pts,
        started.elapsed()
    );
    Ok(())
}

fn main() -> AnyResult<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Falling back to built-in configuration: {}", e);
            Config::default()
        }
    };
    logger::init(&config);
    info!(
        "avcodec-audio {} (config: {})",
        env!("CARGO_PKG_VERSION"),
        Config::locate().unwrap_or("built-in")
    );

    if let Err(e) = run(&config) {
        error!("Loopback failed: {}", e);
        return Err(e);
    }
    Ok(())
}
