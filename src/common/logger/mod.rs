use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::Config;

/// Filter directives from the `[logging]` section; `RUST_LOG` wins when set.
pub fn filter_directives(config: &Config) -> String {
    let level = config
        .logging
        .as_ref()
        .and_then(|l| l.level.as_deref())
        .unwrap_or("info");

    let filters = config
        .logging
        .as_ref()
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    // symphonia is chatty at debug about every probe it makes
    if filters.is_empty() {
        format!("{},symphonia=warn", level)
    } else {
        format!("{},symphonia=warn,{}", level, filters)
    }
}

pub fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let stdout_layer = fmt::layer()
        .event_format(CustomFormatter::new(true))
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::LoggingConfig;

    #[test]
    fn directives_from_config() {
        let mut config = Config::default();
        assert_eq!(filter_directives(&config), "info,symphonia=warn");

        config.logging = Some(LoggingConfig {
            level: Some("debug".to_owned()),
            filters: Some("avcodec_audio::audio::worker=trace".to_owned()),
        });
        assert_eq!(
            filter_directives(&config),
            "debug,symphonia=warn,avcodec_audio::audio::worker=trace"
        );
    }
}
