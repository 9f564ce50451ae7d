//! Logger bootstrap for native and web builds.
//!
//! The crate itself only logs through the `log` macros; call [`init_logging`]
//! once from the host application to see the output.

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. `"info"` or
/// `"layer_ngin=debug,wgpu=warn"`) and overrides `RUST_LOG` when set.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
}

/// Installs the global logger. Calling it again is harmless.
pub fn init_logging(config: LoggingConfig) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut builder = env_logger::Builder::from_default_env();
        if let Some(filter) = &config.env_filter {
            builder.parse_filters(filter);
        } else if std::env::var_os("RUST_LOG").is_none() {
            builder.filter_level(log::LevelFilter::Info);
        }
        if let Err(e) = builder.try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        let level = config
            .env_filter
            .as_deref()
            .and_then(|f| f.parse::<log::Level>().ok())
            .unwrap_or(log::Level::Info);
        if let Err(e) = console_log::init_with_level(level) {
            log::warn!("Could not initialize logger: {}", e);
        }
    }
}
