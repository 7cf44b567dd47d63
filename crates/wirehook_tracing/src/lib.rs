//! Tracing subscriber setup for wirehook applications.
//!
//! `wirehook_core` only emits `tracing` events: registrations and adaptations
//! at `debug`, every dispatch at `trace`, failing hooks at `warn` and
//! panicking hooks at `error`. Applications that do not install a subscriber
//! of their own can use [`TracingConfig`] to get one.
//!
//! # Example
//!
//! ```
//! use wirehook_tracing::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("wirehook_core=trace,info")
//!     .init();
//! ```
//!
//! # Environment
//!
//! [`TracingConfig::from_env`] reads:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `WIREHOOK_LOG` | a level (`debug`) or a filter directive (`wirehook_core=trace,info`) |
//! | `WIREHOOK_LOG_FORMAT` | `pretty`, `compact` or `json` |

use core::fmt;
use core::str::FromStr;

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Variable holding the level or filter directive.
pub const LOG_ENV: &str = "WIREHOOK_LOG";

/// Variable holding the output format.
pub const LOG_FORMAT_ENV: &str = "WIREHOOK_LOG_FORMAT";

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl TracingFormat {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for TracingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TracingFormat {
    type Err = TracingConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(TracingConfigError::InvalidFormat(s.to_owned())),
        }
    }
}

/// Errors from reading tracing configuration.
#[derive(Debug, Error)]
pub enum TracingConfigError {
    /// The format is not one of `pretty`, `compact` or `json`.
    #[error("unknown log format `{0}`; expected `pretty`, `compact` or `json`")]
    InvalidFormat(String),

    /// The filter directive does not parse.
    #[error("invalid log filter `{directive}`: {source}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Maximum log level, used when no filter directive is set.
    pub level: Level,
    /// Output format.
    pub format: TracingFormat,
    /// Filter directive (e.g. `"wirehook_core=trace,info"`).
    pub env_filter: Option<String>,
    /// Whether to include span enter/exit events.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a filter directive, `target=level,target=level,...`.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Reads [`LOG_ENV`] and [`LOG_FORMAT_ENV`] from the process environment.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TracingConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, TracingConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`TracingConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TracingConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(LOG_ENV).filter(|value| !value.trim().is_empty()) {
            let value = value.trim();
            match Level::from_str(value) {
                Ok(level) => config.level = level,
                Err(_) => {
                    EnvFilter::try_new(value).map_err(|source| {
                        TracingConfigError::InvalidFilter {
                            directive: value.to_owned(),
                            source,
                        }
                    })?;
                    config.env_filter = Some(value.to_owned());
                }
            }
        }

        if let Some(value) = lookup(LOG_FORMAT_ENV).filter(|value| !value.trim().is_empty()) {
            config.format = value.parse()?;
        }

        Ok(config)
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed, in which
    /// case this configuration is ignored.
    pub fn init(&self) -> bool {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let installed = match self.format {
            TracingFormat::Pretty => tracing_subscriber::registry()
                .with(self.filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Compact => tracing_subscriber::registry()
                .with(self.filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
            TracingFormat::Json => tracing_subscriber::registry()
                .with(self.filter())
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_span_events(span_events),
                )
                .try_init()
                .is_ok(),
        };

        if installed {
            tracing::debug!(
                level = %self.level,
                format = %self.format,
                filter = self.env_filter.as_deref(),
                "Tracing initialized"
            );
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_format_parses_case_insensitively() {
        assert_eq!(
            "JSON".parse::<TracingFormat>().unwrap(),
            TracingFormat::Json
        );
        assert_eq!(
            " compact ".parse::<TracingFormat>().unwrap(),
            TracingFormat::Compact
        );
        assert!(matches!(
            "xml".parse::<TracingFormat>(),
            Err(TracingConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn builder_sets_fields() {
        let config = TracingConfig::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("wirehook_core=trace")
            .with_span_events(true);

        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("wirehook_core=trace"));
        assert!(config.span_events);
    }

    #[test]
    fn empty_environment_keeps_defaults() {
        let config = TracingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TracingConfig::default());
    }

    #[test]
    fn environment_level_and_format() {
        let config = TracingConfig::from_lookup(lookup(&[
            (LOG_ENV, "debug"),
            (LOG_FORMAT_ENV, "json"),
        ]))
        .unwrap();

        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.env_filter, None);
        assert_eq!(config.format, TracingFormat::Json);
    }

    #[test]
    fn environment_filter_directive() {
        let vars = lookup(&[(LOG_ENV, "wirehook_core=trace,warn")]);
        let config = TracingConfig::from_lookup(vars).unwrap();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(
            config.env_filter.as_deref(),
            Some("wirehook_core=trace,warn")
        );
    }

    #[test]
    fn environment_rejects_bad_values() {
        assert!(matches!(
            TracingConfig::from_lookup(lookup(&[(LOG_FORMAT_ENV, "yaml")])),
            Err(TracingConfigError::InvalidFormat(_))
        ));
        assert!(matches!(
            TracingConfig::from_lookup(lookup(&[(LOG_ENV, "wirehook_core=loud")])),
            Err(TracingConfigError::InvalidFilter { .. })
        ));
    }
}
