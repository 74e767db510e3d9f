use thiserror::Error;

/// Errors surfaced by the codec core.
///
/// Protocol signals (backpressure, end of stream) are not errors; they are
/// reported through [`crate::audio::plugin::Status`] in the `Ok` arm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The call is not legal in the current state (e.g. no open context).
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Caller bug: out-of-range index, empty buffer, double release.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Rejected configuration (channel count, sample rate, format, extradata).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// No backend or table entry for the requested codec/format.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Malformed bitstream reported by the native codec.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The caller's output buffer is smaller than the produced unit.
    #[error("no memory: {needed} bytes needed, buffer capacity is {capacity}")]
    NoMemory { needed: usize, capacity: usize },

    /// Allocation or converter/codec setup failure.
    #[error("resource setup failed: {0}")]
    ResourceExhausted(String),

    /// A buffer pool was stopped while a caller waited on it.
    #[error("buffer pool `{0}` is not running")]
    PoolStopped(String),

    /// Unclassified native failure; the native diagnostic is preserved.
    #[error("unknown codec error: {0}")]
    Unknown(String),
}

impl CodecError {
    /// Configuration errors leave the plugin reconfigurable.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::Unsupported(_))
    }
}

/// Result alias used throughout the codec core.
pub type CodecResult<T> = Result<T, CodecError>;
