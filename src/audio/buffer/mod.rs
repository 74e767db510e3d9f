pub mod info;
pub mod manager;

pub use info::{AudioBuffer, AudioBufferInfo, BufferAttr, BufferOwner};
pub use manager::AudioBuffersManager;
