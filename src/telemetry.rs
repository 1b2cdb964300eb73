//! Telemetry and tracing utilities
//!
//! The library itself only emits `tracing` events; applications embedding
//! it install a subscriber with [`init_subscriber`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use streamchat::telemetry::{init_subscriber, SubscriberConfig, OutputFormat};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::Json)
//!     .build();
//! let _guard = init_subscriber(config)?;
//! ```

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::ChatError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format
    Json,
    /// Compact JSON format
    JsonCompact,
}

/// Configuration for tracing subscriber
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Log level for this crate
    pub log_level: tracing::Level,
    /// Output format
    pub output_format: OutputFormat,
    /// Write to the log file instead of stderr when set
    pub log_file: Option<PathBuf>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            log_file: None,
        }
    }
}

impl SubscriberConfig {
    /// Create a new builder for SubscriberConfig
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    /// Create a debug configuration
    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// Filter directive derived from the configured level. `RUST_LOG`, when
    /// set, takes precedence.
    fn filter(&self) -> EnvFilter {
        let level = self.log_level.as_str().to_ascii_lowercase();
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("streamchat={level}")))
    }
}

/// Builder for SubscriberConfig
#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    log_file: Option<PathBuf>,
}

impl SubscriberConfigBuilder {
    /// Set the log level
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, ChatError> {
        let level = level.parse::<tracing::Level>().map_err(|_| {
            ChatError::ConfigurationError(format!(
                "Invalid log level: {level}. Valid options: trace, debug, info, warn, error"
            ))
        })?;
        self.log_level = Some(level);
        Ok(self)
    }

    /// Set the output format
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    /// Set the log file path
    pub fn log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Build the configuration
    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            log_file: self.log_file,
        }
    }
}

/// Install a global tracing subscriber.
///
/// Returns the appender guard when logging to a file; it must be kept alive
/// for buffered lines to be flushed. A subscriber that is already installed
/// is left in place.
pub fn init_subscriber(config: SubscriberConfig) -> Result<Option<WorkerGuard>, ChatError> {
    let filter = config.filter();

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path.file_name().ok_or_else(|| {
                ChatError::ConfigurationError(format!(
                    "log file path has no file name: {}",
                    path.display()
                ))
            })?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (writer, Some(guard))
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, Some(guard))
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(writer);

    let init_result = match config.output_format {
        OutputFormat::Json => builder.json().try_init(),
        OutputFormat::JsonCompact => builder.json().flatten_event(true).try_init(),
        OutputFormat::Text => builder.with_ansi(config.log_file.is_none()).try_init(),
    };

    match init_result {
        Ok(()) => Ok(guard),
        // Another subscriber is already installed, which is fine.
        Err(_) => Ok(None),
    }
}

/// Initialize from environment variables
///
/// - `STREAMCHAT_LOG_LEVEL`: trace, debug, info, warn, error
/// - `STREAMCHAT_LOG_FORMAT`: text, json, json-compact
/// - `STREAMCHAT_LOG_FILE`: log file path
pub fn init_from_env() -> Result<Option<WorkerGuard>, ChatError> {
    let mut builder = SubscriberConfig::builder();

    if let Ok(level) = std::env::var("STREAMCHAT_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }

    if let Ok(format) = std::env::var("STREAMCHAT_LOG_FORMAT") {
        let output_format = match format.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "json-compact" => OutputFormat::JsonCompact,
            "text" => OutputFormat::Text,
            _ => {
                return Err(ChatError::ConfigurationError(format!(
                    "Invalid log format: {format}. Valid options: text, json, json-compact"
                )));
            }
        };
        builder = builder.output_format(output_format);
    }

    if let Ok(file_path) = std::env::var("STREAMCHAT_LOG_FILE") {
        builder = builder.log_file(PathBuf::from(file_path));
    }

    init_subscriber(builder.build())
}
