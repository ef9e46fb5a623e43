//! Logging initialization using the `tracing` ecosystem.
//!
//! - Console output (human-readable, colored)
//! - Optional file output as JSON lines, rotated daily via `tracing-appender`
//! - Level from `RUST_LOG` when set, otherwise the explicit parameter
//!
//! File lines carry the structured fields (`segment`, `processed`,
//! `skipped`, ...) as JSON keys.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Call once at program start. The returned guard flushes the file writer on
/// drop and must be held until the process exits; it is `None` when no
/// `log_dir` was given.
///
/// - `log_level`: default level if `RUST_LOG` is not set (e.g. `"info"`)
/// - `log_dir`: optional directory for daily-rotating log files
/// - `module_name`: log file prefix (e.g. `"scrip-sync"`)
pub fn init_logging(
    log_level: &str,
    log_dir: Option<&str>,
    module_name: &str,
) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, module_name));
            let file_layer =
                fmt::layer().json().with_writer(writer).with_ansi(false).with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(env_filter).with(console_layer).init();
            None
        }
    }
}
