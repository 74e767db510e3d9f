use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::constants::{DEFAULT_BUFFER_COUNT, DEFAULT_META_SIZE, POOL_WAIT_MS};

/// Sizing of the input/output pools a codec is driven through.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BuffersConfig {
    pub input_count: usize,
    pub output_count: usize,
    pub meta_size: usize,
    /// How often a blocked acquire re-checks whether its pool was stopped.
    pub wait_ms: u64,
}

impl Default for BuffersConfig {
    fn default() -> Self {
        Self {
            input_count: DEFAULT_BUFFER_COUNT,
            output_count: DEFAULT_BUFFER_COUNT,
            meta_size: DEFAULT_META_SIZE,
            wait_ms: POOL_WAIT_MS,
        }
    }
}

impl BuffersConfig {
    pub fn wait_slice(&self) -> Duration {
        Duration::from_millis(self.wait_ms.max(1))
    }
}
