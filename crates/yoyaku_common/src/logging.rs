//! Logging utilities for the Yoyaku services.
//!
//! One call to [`init`] at process start installs a `tracing` subscriber with
//! an `EnvFilter` and a formatted stdout layer, plus an optional daily rolling
//! file layer.

use std::str::FromStr;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};
use yoyaku_config::LoggingConfig;

const DEFAULT_FILE_PREFIX: &str = "yoyaku.log";

/// Initialize the tracing subscriber from configuration.
///
/// `RUST_LOG` is honoured; the configured level is added as a directive for
/// all `yoyaku*` targets. The returned guard must be kept alive for the file
/// writer to flush; it is `None` when file logging is off.
///
/// Uses `try_init`, so a second call (tests, embedded use) is a no-op.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = config
        .level
        .as_deref()
        .and_then(|raw| Level::from_str(raw).ok())
        .unwrap_or(Level::INFO);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("yoyaku={}", level).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    let (file_layer, guard) = match config.directory.as_deref() {
        Some(directory) => {
            let prefix = config.file_prefix.as_deref().unwrap_or(DEFAULT_FILE_PREFIX);
            let appender = tracing_appender::rolling::daily(directory, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}
