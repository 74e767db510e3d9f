use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub filters: Option<String>,
}
