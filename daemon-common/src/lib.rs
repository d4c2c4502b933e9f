//! Process plumbing shared by the relay binaries: log verbosity, subscriber
//! setup and optional detaching from the terminal.

use clap::ValueEnum;
use tracing_subscriber::filter::LevelFilter;

/// Verbosity accepted by `--log-level`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the global `fmt` subscriber capped at `level`.
///
/// Calling this twice is harmless; the second install is ignored.
pub fn init_logging(level: LogLevel) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .try_init();
}

/// Detach into the background when `enable` is true.
///
/// Must run before any async runtime spawns worker threads, since forking a
/// multi-threaded process only keeps the calling thread.
pub fn maybe_daemonize(enable: bool) -> anyhow::Result<()> {
    if enable {
        daemonize::Daemonize::new()
            .working_directory(".")
            .start()
            .map_err(|e| anyhow::anyhow!("failed to daemonize: {e}"))?;
    }
    Ok(())
}
