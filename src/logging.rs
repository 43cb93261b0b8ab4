//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Level;

/// Where log lines go.
pub enum LogSink<'a> {
    /// Batch commands: plain stderr.
    Stderr,
    /// Interactive review: append to a file so the alternate screen stays
    /// clean.
    File(&'a Path),
}

/// Map `-v` / `-q` counts to a level. INFO by default.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        Level::WARN
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// Install the global fmt subscriber. Call once from `main`.
pub fn init(level: Level, sink: LogSink<'_>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);

    match sink {
        LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
        LogSink::File(path) => {
            crate::db::ensure_parent_dir(path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}
