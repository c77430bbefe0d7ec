//! Configuration loading and typed config structures for the telemetry client.
//!
//! The configuration lives in `emergence-watch.yaml`. Every section is
//! optional; missing sections and fields fall back to defaults that work
//! against an observer running on `localhost:8080`.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level telemetry client configuration.
///
/// Mirrors the structure of `emergence-watch.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TelemetryConfig {
    /// Where the observer lives.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Reconnect backoff bounds.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Query refresh parameters.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Toast notification limits.
    #[serde(default)]
    pub alerts: AlertConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TelemetryConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment overrides are applied after parsing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override settings with environment variables when set.
    ///
    /// - `OBSERVER_URL` replaces `observer.base_url`
    /// - `EMERGENCE_LOG_LEVEL` replaces `logging.level`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("OBSERVER_URL") {
            self.observer.base_url = val;
        }
        if let Some(val) = lookup("EMERGENCE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}

/// Observer connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Base HTTP URL of the observer (e.g. `http://localhost:8080`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the tick stream, upgraded to a WebSocket.
    #[serde(default = "default_stream_path")]
    pub stream_path: String,

    /// Per-request timeout for query calls, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ObserverConfig {
    /// The query timeout as a [`Duration`].
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stream_path: default_stream_path(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Reconnect backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on the retry delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Query refresh parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of recent events fetched per refresh.
    #[serde(default = "default_event_limit")]
    pub event_limit: u32,

    /// Maximum number of decisions in the analytics window.
    #[serde(default = "default_decision_limit")]
    pub decision_limit: u32,

    /// Refresh decisions and social snapshots every N distinct ticks.
    ///
    /// The first tick always triggers them. Zero disables them.
    #[serde(default = "default_analytics_every_ticks")]
    pub analytics_every_ticks: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            event_limit: default_event_limit(),
            decision_limit: default_decision_limit(),
            analytics_every_ticks: default_analytics_every_ticks(),
        }
    }
}

/// Toast notification limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AlertConfig {
    /// Maximum simultaneously live toasts.
    #[serde(default = "default_max_live")]
    pub max_live: usize,

    /// How long a toast stays live, in milliseconds.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

impl AlertConfig {
    /// The toast lifetime as a [`Duration`].
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            max_live: default_max_live(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_base_url() -> String {
    "http://localhost:8080".to_owned()
}

fn default_stream_path() -> String {
    "/ws/ticks".to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

const fn default_initial_delay_ms() -> u64 {
    1_000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_event_limit() -> u32 {
    100
}

const fn default_decision_limit() -> u32 {
    500
}

const fn default_analytics_every_ticks() -> u64 {
    10
}

const fn default_max_live() -> usize {
    5
}

const fn default_ttl_ms() -> u64 {
    6_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
