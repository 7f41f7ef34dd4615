//! Logging setup.
//!
//! Installs a `fern` dispatcher honoring the `[logging]` config section.
//! With logging disabled nothing is installed and the log macros are no-ops.

use anyhow::{Context, Result};
use log::LevelFilter;

use crate::config::LoggingConfig;

fn level_filter(level: &str) -> Result<LevelFilter> {
    match level {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        // an unset level falls back to info
        "" | "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        other => anyhow::bail!("Unknown log level '{other}'"),
    }
}

/// Initialize the global logger from the logging configuration.
///
/// # Errors
/// Returns an error for an unknown level, an unwritable log file, or when a
/// global logger is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level_filter(&config.level)?)
        .chain(std::io::stderr());

    if let Some(path) = &config.file {
        let file = fern::log_file(path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("Failed to install logger")?;
    Ok(())
}
