//! Tracing subscriber setup for processes embedding the agent
//!
//! Driven by the `[logging]` section of the agent configuration:
//!
//! ```toml
//! [logging]
//! level = "debug"     # default directive, RUST_LOG entries take precedence
//! json = true         # one JSON object per line on stdout
//! file_info = true    # source file and line on every event
//! spans = true        # log span enter/exit (session spans)
//! ```

use std::str::FromStr;

use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogSettings;
use crate::errors::ConfigError;

/// Resolved logging options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` does not say otherwise
    pub level: Level,
    pub json: bool,
    pub file_info: bool,
    pub log_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggingConfig {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            json: false,
            file_info: false,
            log_spans: false,
        }
    }

    /// Validate a `[logging]` section
    pub fn from_settings(settings: &LogSettings) -> Result<Self, ConfigError> {
        let mut config = Self::new(parse_log_level(&settings.level)?);
        if settings.json {
            config = config.with_json();
        }
        if settings.file_info {
            config = config.with_file_info();
        }
        if settings.spans {
            config = config.with_spans();
        }
        Ok(config)
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.level).into())
            .from_env_lossy()
    }

    fn span_events(&self) -> FmtSpan {
        if self.log_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install the process-wide subscriber
///
/// Fails with [`ConfigError::Logging`] when a subscriber is already set.
pub fn setup_logging(config: LoggingConfig) -> Result<(), ConfigError> {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(config.filter())
        .with_span_events(config.span_events())
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        builder.json().with_writer(std::io::stdout).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(?config, "logging initialized");
    Ok(())
}

/// Parse `trace`/`debug`/`info`/`warn`/`error`, case-insensitive
pub fn parse_log_level(level: &str) -> Result<Level, ConfigError> {
    Level::from_str(level.trim()).map_err(|_| ConfigError::InvalidLogLevel(level.to_string()))
}
