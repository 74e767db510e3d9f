use serde::{Deserialize, Serialize};

/// PCM sample representation, numbered like the platform's
/// `AudioSampleFormat` so it can travel through a [`super::Format`] as an int.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16Le,
    S24Le,
    S32Le,
    F32Le,
    U8P,
    S16P,
    S24P,
    S32P,
    F32P,
}

const ALL: [SampleFormat; 10] = [
    SampleFormat::U8,
    SampleFormat::S16Le,
    SampleFormat::S24Le,
    SampleFormat::S32Le,
    SampleFormat::F32Le,
    SampleFormat::U8P,
    SampleFormat::S16P,
    SampleFormat::S24P,
    SampleFormat::S32P,
    SampleFormat::F32P,
];

impl SampleFormat {
    pub fn code(self) -> i64 {
        ALL.iter().position(|f| *f == self).unwrap_or_default() as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code).ok().and_then(|i| ALL.get(i).copied())
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 | Self::U8P => 1,
            Self::S16Le | Self::S16P => 2,
            Self::S24Le | Self::S24P => 3,
            Self::S32Le | Self::S32P | Self::F32Le | Self::F32P => 4,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Self::U8P | Self::S16P | Self::S24P | Self::S32P | Self::F32P
        )
    }

    /// The interleaved counterpart (identity for packed formats).
    pub fn packed(self) -> Self {
        match self {
            Self::U8P => Self::U8,
            Self::S16P => Self::S16Le,
            Self::S24P => Self::S24Le,
            Self::S32P => Self::S32Le,
            Self::F32P => Self::F32Le,
            other => other,
        }
    }

    /// The planar counterpart (identity for planar formats).
    pub fn planar(self) -> Self {
        match self {
            Self::U8 => Self::U8P,
            Self::S16Le => Self::S16P,
            Self::S24Le => Self::S24P,
            Self::S32Le => Self::S32P,
            Self::F32Le => Self::F32P,
            other => other,
        }
    }

    /// Number of data planes a frame of `channels` channels occupies.
    pub fn planes(self, channels: usize) -> usize {
        if self.is_planar() { channels } else { 1 }
    }

    /// Bytes needed to hold `samples` samples per channel.
    pub fn buffer_size(self, channels: usize, samples: usize) -> usize {
        self.bytes_per_sample() * channels * samples
    }
}
