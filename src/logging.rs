//! Logging System
//!
//! Structured logging on `tracing`. Level, format and destination come from the
//! `[logging]` config section, CLI flags, or the `DAILYDRAFT_LOG*` environment variables.

use crate::error::DraftError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter directive override, e.g. `DAILYDRAFT_LOG=dailydraft=debug`.
pub const LOG_ENV: &str = "DAILYDRAFT_LOG";
pub const LOG_FORMAT_ENV: &str = "DAILYDRAFT_LOG_FORMAT";
pub const LOG_OUTPUT_ENV: &str = "DAILYDRAFT_LOG_OUTPUT";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: json, text
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output is "file"
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Colored output (text format, terminal destinations only)
    #[serde(default = "default_color")]
    pub color: bool,

    /// Module-specific log levels
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

// Run summaries go to stdout; keep logs off it.
fn default_output() -> String {
    "stderr".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("dailydraft.log")
}

fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            output: default_output(),
            file: default_log_file(),
            color: default_color(),
            modules: HashMap::new(),
        }
    }
}

/// Line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineFormat {
    Text,
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Stdout,
    Stderr,
    File,
}

/// Initialize the global subscriber.
///
/// Priority (highest first): environment variables, then `config`, then defaults.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), DraftError> {
    let filter = build_env_filter(config)?;
    let format = resolve_format(config)?;
    let destination = resolve_output(config)?;
    let use_color = config.map(|c| c.color).unwrap_or(true) && destination != Destination::File;

    let writer = match destination {
        Destination::Stdout => BoxMakeWriter::new(std::io::stdout),
        Destination::Stderr => BoxMakeWriter::new(std::io::stderr),
        Destination::File => {
            let log_file = config
                .map(|c| c.file.clone())
                .unwrap_or_else(default_log_file);
            if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DraftError::ConfigError(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .map_err(|e| {
                    DraftError::ConfigError(format!("Failed to open log file {:?}: {}", log_file, e))
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };

    let registry = Registry::default().with(filter);
    let result = match format {
        LineFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init(),
        LineFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(use_color)
                    .with_writer(writer),
            )
            .try_init(),
    };
    result.map_err(|e| DraftError::ConfigError(format!("Failed to initialize logging: {}", e)))
}

/// `DAILYDRAFT_LOG` wins outright; otherwise the configured level plus per-module directives.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, DraftError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }

    let Some(config) = config else {
        return Ok(EnvFilter::new(default_log_level()));
    };
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    config
        .modules
        .iter()
        .try_fold(EnvFilter::new(&config.level), |filter, (module, level)| {
            let directive: Directive = format!("{}={}", module, level)
                .parse()
                .map_err(|e| DraftError::ConfigError(format!("Invalid log directive: {}", e)))?;
            Ok(filter.add_directive(directive))
        })
}

fn resolve_format(config: Option<&LoggingConfig>) -> Result<LineFormat, DraftError> {
    if let Some(format) = std::env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|value| parse_format(&value).ok())
    {
        return Ok(format);
    }
    parse_format(config.map(|c| c.format.as_str()).unwrap_or("text"))
}

fn parse_format(format: &str) -> Result<LineFormat, DraftError> {
    match format {
        "text" => Ok(LineFormat::Text),
        "json" => Ok(LineFormat::Json),
        _ => Err(DraftError::ConfigError(format!(
            "Unknown log format '{}'; expected json or text",
            format
        ))),
    }
}

fn resolve_output(config: Option<&LoggingConfig>) -> Result<Destination, DraftError> {
    if let Ok(output) = std::env::var(LOG_OUTPUT_ENV) {
        return parse_destination(&output);
    }
    parse_destination(config.map(|c| c.output.as_str()).unwrap_or("stderr"))
}

fn parse_destination(output: &str) -> Result<Destination, DraftError> {
    match output {
        "stdout" => Ok(Destination::Stdout),
        "stderr" => Ok(Destination::Stderr),
        "file" => Ok(Destination::File),
        _ => Err(DraftError::ConfigError(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            output
        ))),
    }
}
