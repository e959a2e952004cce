//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so interactive sessions log to a file in the
//! data directory; the print/add modes log to stderr.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MAP_MARKERS_LOG";
pub const LOG_FILE: &str = "map-markers.log";
const DEFAULT_DIRECTIVE: &str = "map_markers=info";

pub enum LogTarget {
    Stderr,
    /// Append to `LOG_FILE` inside this directory.
    File(PathBuf),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub fn init(target: LogTarget) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter());
    match target {
        LogTarget::Stderr => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("install stderr logger")?,
        LogTarget::File(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE)
                .build(&dir)
                .with_context(|| format!("open log file in {}", dir.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(appender))
                .try_init()
                .context("install file logger")?
        }
    }
    Ok(())
}
