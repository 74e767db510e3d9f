//! Central constants for the codec core.
//!
//! Lookup tables are process-wide immutable statics; nothing here is mutated
//! after start-up.

// ── Buffer pool ──────────────────────────────────────────────────────────────

/// Milliseconds a blocked acquirer sleeps before re-checking the running flag.
pub const POOL_WAIT_MS: u64 = 500;

/// Default number of buffers per input/output pool.
pub const DEFAULT_BUFFER_COUNT: usize = 8;

/// Default metadata region attached to each pooled buffer.
pub const DEFAULT_META_SIZE: usize = 0;

// ── Timing ───────────────────────────────────────────────────────────────────

/// Microseconds per second; all presentation timestamps are in microseconds.
pub const US_PER_SECOND: f64 = 1_000_000.0;

// ── Channels ─────────────────────────────────────────────────────────────────

pub const MIN_CHANNELS: u32 = 1;
pub const MAX_CHANNELS: u32 = 8;

// ── AAC ──────────────────────────────────────────────────────────────────────

/// Samples per channel in one AAC-LC access unit.
pub const AAC_FRAME_SIZE: usize = 1024;

/// Samples per channel an HE-AAC frame can decode to (SBR doubles the core frame).
pub const AAC_MAX_FRAME_SAMPLES: usize = 2048;

/// ADTS header length without CRC.
pub const ADTS_HEADER_SIZE: usize = 7;

/// ADTS header length with the 16-bit CRC present.
pub const ADTS_HEADER_SIZE_CRC: usize = 9;

/// Largest frame length the 13-bit ADTS field can carry.
pub const ADTS_MAX_FRAME_LENGTH: usize = 0x1FFF;

/// MPEG-4 audio object type for AAC-LC.
pub const AAC_OBJECT_TYPE_LC: u8 = 2;

/// MPEG-4 sampling-frequency-index table (ISO/IEC 14496-3, 1.6.3.4).
pub const AAC_SAMPLE_RATES: [u32; 13] = [
    96_000, 88_200, 64_000, 48_000, 44_100, 32_000, 24_000, 22_050, 16_000, 12_000, 11_025, 8_000,
    7_350,
];

/// Default compressed input size for AAC decoders.
pub const AAC_MAX_INPUT_SIZE: usize = 8_192;

/// Accepted AAC encoder bitrate range (bits per second).
pub const AAC_MIN_BITRATE: i64 = 8_000;
pub const AAC_MAX_BITRATE: i64 = 960_000;

// ── FLAC ─────────────────────────────────────────────────────────────────────

pub const FLAC_MAX_SAMPLE_RATE: u32 = 384_000;
pub const FLAC_MIN_BLOCK_SIZE: u16 = 16;
pub const FLAC_MAX_BLOCK_SIZE: u16 = 65_535;
pub const FLAC_STREAMINFO_SIZE: usize = 34;
pub const FLAC_MAX_INPUT_SIZE: usize = 65_536;

// ── Vorbis / MP3 ─────────────────────────────────────────────────────────────

pub const VORBIS_MAX_INPUT_SIZE: usize = 8_192;
pub const MPEG_MAX_INPUT_SIZE: usize = 4_096;

/// Largest number of samples per channel an MP3 frame decodes to.
pub const MPEG_FRAME_SIZE: usize = 1_152;

/// MPEG-1/2/2.5 layer III sample rates.
pub const MPEG_SAMPLE_RATES: [u32; 9] = [
    8_000, 11_025, 12_000, 16_000, 22_050, 24_000, 32_000, 44_100, 48_000,
];

/// Largest number of samples per channel a Vorbis packet decodes to.
pub const VORBIS_FRAME_SIZE: usize = 8_192;

// ── G.711 ────────────────────────────────────────────────────────────────────

pub const G711_SAMPLE_RATE: u32 = 8_000;
pub const G711_CHANNELS: u32 = 1;
pub const G711_MAX_INPUT_SIZE: usize = 8_192;

// ── Opus ─────────────────────────────────────────────────────────────────────

pub const OPUS_SAMPLE_RATES: [u32; 5] = [8_000, 12_000, 16_000, 24_000, 48_000];

/// Maximum decoded Opus frame size at 48 kHz: 120 ms → 5 760 samples/channel.
pub const MAX_OPUS_FRAME_SIZE: usize = 5_760;

/// Opus frames are encoded in 20 ms units: `rate / OPUS_FRAMES_PER_SECOND`.
pub const OPUS_FRAMES_PER_SECOND: u32 = 50;

/// Maximum size of a single encoded Opus packet.
pub const MAX_OPUS_PACKET_SIZE: usize = 4_000;

pub const OPUS_MIN_BITRATE: i64 = 6_000;
pub const OPUS_MAX_BITRATE: i64 = 510_000;
pub const OPUS_DEFAULT_BITRATE: i64 = 64_000;
