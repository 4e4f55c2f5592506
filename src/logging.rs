//! `env_logger` setup. Records go to stderr and, optionally, to a log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use anyhow::Context;
use env_logger::{Builder, Target};

use crate::config::LoggingConfig;

/// Environment variable that overrides every other level source.
pub const LOG_ENV: &str = "RUST_LOG";

/// Writes every log line to stderr and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Pick the filter directive: `RUST_LOG` first, then `--verbose`, then the
/// configured level.
pub fn resolve_filter(config: &LoggingConfig, verbose: bool, env: Option<String>) -> String {
    match env.filter(|value| !value.trim().is_empty()) {
        Some(value) => value,
        None if verbose => "debug".to_string(),
        None => config.level.clone(),
    }
}

/// Install the global logger. Call once, before any other work.
pub fn init(config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let filter = resolve_filter(config, verbose, std::env::var(LOG_ENV).ok());

    let mut builder = Builder::new();
    builder.parse_filters(&filter);

    if !config.file.is_empty() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.file)
            .with_context(|| format!("Failed to open log file {}", config.file))?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
    }

    builder
        .try_init()
        .context("A global logger is already installed")?;
    log::debug!("Logging initialised with filter '{filter}'");
    Ok(())
}
