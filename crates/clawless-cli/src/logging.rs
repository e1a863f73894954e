//! Tracing setup: compact stderr output plus a per-session log file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `<shared_root>/logs/YYYY/MM/DD/file<unix_ts>.log`
pub fn session_log_path(shared_root: &Path, at: DateTime<Local>) -> PathBuf {
    shared_root
        .join("logs")
        .join(at.format("%Y").to_string())
        .join(at.format("%m").to_string())
        .join(at.format("%d").to_string())
        .join(format!("file{}.log", at.timestamp()))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `verbose` for stderr. When `shared_root` is given,
/// `info` and above also go to a fresh session log file; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init_logging(verbose: bool, shared_root: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("clawless=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(filter);

    let file = shared_root.and_then(|root| {
        let path = session_log_path(root, Local::now());
        let dir = path.parent()?;
        std::fs::create_dir_all(dir).ok()?;
        let appender = tracing_appender::rolling::never(dir, path.file_name()?);
        Some(tracing_appender::non_blocking(appender))
    });
    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(LevelFilter::INFO),
            ),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    guard
}
