//! Logging initialization
//!
//! Logs go to stderr so stdout stays free for `key=value` output. `RUST_LOG`
//! overrides the level derived from `-v` flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Must be kept alive until exit so buffered file logs are flushed
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingOptions {
    /// Number of `-v` flags
    pub verbosity: u8,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl LoggingOptions {
    pub fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

pub fn init_logging(options: &LoggingOptions) -> anyhow::Result<LogGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let (file_writer, file_guard) = match &options.file {
        Some(path) => {
            let (writer, guard) = create_file_writer(path)?;
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if options.json {
        let console_layer = fmt::layer().json().with_writer(std::io::stderr);
        let file_layer = file_writer.map(|writer| fmt::layer().json().with_writer(writer));
        registry.with(console_layer).with(file_layer).try_init()?;
    } else {
        let console_layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        let file_layer = file_writer.map(|writer| {
            fmt::layer()
                .with_ansi(false) // No ANSI colors in files
                .with_writer(writer)
        });
        registry.with(console_layer).with(file_layer).try_init()?;
    }

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

fn create_file_writer(path: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let Some(file_name) = path.file_name() else {
        bail!("Log file path has no file name: {}", path.display());
    };
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}
