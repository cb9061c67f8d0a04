use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Installs the global subscriber.
///
/// Events always go to `log_file` when given, and to the console as well when
/// `console` is set. Keep the returned guards alive until exit so buffered
/// lines are flushed.
pub fn init(level: Level, console: bool, log_file: Option<&Path>) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let file_layer = log_file.map(|path| {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "tankfarm.log".as_ref());
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        guards.push(guard);
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true) // include targets
            .with_thread_ids(false) // don't include the thread ID of the current thread
            .compact()
    });

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_level(true) // include levels in formatted output
            .with_target(true)
            .with_thread_names(false) // don't include the name of the current thread
            .compact() // use the `Compact` formatting style.
    });

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(file_layer)
        .with(console_layer)
        .init();
    guards
}
