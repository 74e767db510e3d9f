use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub buffers: BuffersConfig,
    #[serde(default)]
    pub loopback: LoopbackConfig,
}

impl Config {
    /// The config file `load` will read, if any exists.
    pub fn locate() -> Option<&'static str> {
        ["config.toml", "config.default.toml"]
            .into_iter()
            .find(|path| std::path::Path::new(path).exists())
    }

    pub fn load() -> AnyResult<Self> {
        let Some(config_path) = Self::locate() else {
            return Err("config.toml or config.default.toml not found".into());
        };

        let config_str = std::fs::read_to_string(config_path)?;
        if config_str.is_empty() {
            return Err(format!("{} is empty", config_path).into());
        }
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }
}
