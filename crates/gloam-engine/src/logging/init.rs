use std::sync::Once;

/// Filter used when neither the config nor `RUST_LOG` names one. The wgpu
/// internals are chatty at `info`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Logger configuration.
///
/// `env_filter` uses `env_logger` syntax, e.g. `"gloam_engine=debug,wgpu=warn"`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Explicit filter, then `RUST_LOG`, then [`DEFAULT_FILTER`].
    fn resolve_filter(&self, env: Option<String>) -> String {
        self.env_filter
            .clone()
            .or(env)
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Later calls do nothing.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = config.resolve_filter(std::env::var("RUST_LOG").ok());
        env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .init();

        log::debug!("logging initialized ({filter})");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_precedence() {
        let explicit = LoggingConfig {
            env_filter: Some("debug".into()),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_filter(Some("trace".into())), "debug");

        let plain = LoggingConfig::default();
        assert_eq!(plain.resolve_filter(Some("trace".into())), "trace");
        assert_eq!(plain.resolve_filter(None), DEFAULT_FILTER);
    }
}
