//! Logging setup for configator binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is left to the binary, which usually calls [`init`] once at
//! startup.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the preferred filter directives.
pub const LOG_ENV: &str = "CONFIGATOR_LOG";

/// Fallback environment variable, shared with the wider ecosystem.
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Directive used when neither variable is set.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter `{directives}`: {reason}")]
    InvalidFilter {
        /// Directives that failed to parse.
        directives: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber already initialized: {reason}")]
    AlreadyInitialized {
        /// Details from `tracing-subscriber`.
        reason: String,
    },
}

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Subscriber options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TelemetryConfig {
    default_directive: String,
    ansi: bool,
    with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_directive: DEFAULT_DIRECTIVE.to_owned(),
            ansi: std::io::IsTerminal::is_terminal(&std::io::stderr()),
            with_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the directive used when no environment filter is set.
    #[must_use]
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    /// Enables or disables ANSI colours.
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Includes event targets in the output.
    #[must_use]
    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Picks the filter directives: `CONFIGATOR_LOG`, then `RUST_LOG`, then
    /// the configured default. Blank values are skipped.
    #[must_use]
    pub fn directives<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        [LOG_ENV, RUST_LOG_ENV]
            .into_iter()
            .filter_map(&lookup)
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| self.default_directive.clone())
    }

    /// Builds the filter from `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] if the directives do not parse.
    pub fn filter<F>(&self, lookup: F) -> TelemetryResult<EnvFilter>
    where
        F: Fn(&str) -> Option<String>,
    {
        let directives = self.directives(lookup);
        EnvFilter::try_new(&directives).map_err(|err| TelemetryError::InvalidFilter {
            directives,
            reason: err.to_string(),
        })
    }

    /// Installs a stderr fmt subscriber as the global default.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidFilter`] for bad directives and
    /// [`TelemetryError::AlreadyInitialized`] if a subscriber is already set.
    pub fn init(&self) -> TelemetryResult<()> {
        let filter = self.filter(|key| std::env::var(key).ok())?;
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(self.ansi)
            .with_target(self.with_target)
            .with_level(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|err| TelemetryError::AlreadyInitialized {
                reason: err.to_string(),
            })
    }
}

/// Installs the default subscriber.
///
/// # Errors
///
/// See [`TelemetryConfig::init`].
pub fn init() -> TelemetryResult<()> {
    TelemetryConfig::default().init()
}
