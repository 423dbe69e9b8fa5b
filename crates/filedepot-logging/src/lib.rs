//! Logging setup for filedepot binaries.
//!
//! Wraps `tracing-subscriber` with a small config: console output by
//! default, plus an optional non-blocking rolling file appender. Call
//! [`init_logging`] once at startup and keep the returned guard alive so
//! buffered file output is flushed on exit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

pub use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default level filter when `RUST_LOG` is unset (trace .. error).
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rotated log files; console-only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation period for file logs: "hourly", "daily" or "never".
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Emit JSON records instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".into()
}

fn default_rotation() -> String {
    "daily".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            log_dir: None,
            rotation: default_rotation(),
            json: false,
        }
    }
}

fn rotation_policy(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Returns the file writer guard when file logging is enabled; hold it for
/// the lifetime of the process.
pub fn init_logging(config: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers = Vec::new();
    layers.push(if config.json {
        fmt::layer().json().boxed()
    } else {
        fmt::layer().boxed()
    });

    let mut guard = None;
    if let Some(dir) = &config.log_dir {
        match RollingFileAppender::builder()
            .rotation(rotation_policy(&config.rotation))
            .filename_prefix("filedepot")
            .filename_suffix("log")
            .build(dir)
        {
            Ok(appender) => {
                let (writer, g) = tracing_appender::non_blocking(appender);
                guard = Some(g);
                layers.push(if config.json {
                    fmt::layer().json().with_ansi(false).with_writer(writer).boxed()
                } else {
                    fmt::layer().with_ansi(false).with_writer(writer).boxed()
                });
            }
            Err(e) => {
                eprintln!("file logging disabled, cannot open {}: {e}", dir.display());
            }
        }
    }

    tracing_subscriber::registry().with(filter).with(layers).init();

    guard
}
