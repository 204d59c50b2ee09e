use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, Layer};

/// Installs the global subscriber: always a log file, plus stderr when
/// `console` is set. Keep the guards alive until exit or buffered lines
/// are lost.
pub fn init(level: Level, console: bool, log_file: Option<&Path>) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();
    let mut layers = Vec::new();

    if let Some(path) = log_file {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let name = path.file_name().unwrap_or(path.as_os_str());
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        layers.push(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .boxed(),
        );
    }

    if console {
        let format = fmt::format()
            .with_level(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .compact();
        layers.push(
            fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers.with_filter(LevelFilter::from_level(level)))
        .init();
    guards
}
