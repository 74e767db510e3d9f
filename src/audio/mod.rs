pub mod adapter;
pub mod buffer;
pub mod constants;
pub mod fifo;
pub mod format;
pub mod frame;
pub mod native;
pub mod plugin;
pub mod resample;
pub mod worker;

pub use adapter::{AudioCodec, CodecState};
pub use buffer::{AudioBuffer, AudioBufferInfo, AudioBuffersManager};
pub use fifo::AudioFifo;
pub use format::{CodecId, CodecKind, Format, SampleFormat};
pub use frame::AudioFrame;
pub use plugin::{CodecPlugin, Status};
pub use resample::{Resample, ResamplePara};
pub use worker::{CodecEvent, CodecWorker};
