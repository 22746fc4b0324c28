//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Console configuration derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "CUMULUS",
    discovery(
        app_name = "cumulus",
        env_var = "CUMULUS_CONFIG_PATH",
        config_file_name = "cumulus.toml",
        dotfile_name = ".cumulus.toml",
        project_file_name = "cumulus.toml"
    )
)]
pub struct ConsoleConfig {
    /// Base URL of the control-plane API endpoint (for example
    /// `https://cloud.example.com/client/api`).
    pub api_url: String,
    /// Session key issued by the management server after login. Sent with
    /// every command when present.
    pub session_key: Option<String>,
    /// API key used when no session key is configured.
    pub api_key: Option<String>,
    /// Number of rows requested per list page.
    #[ortho_config(default = 20)]
    pub page_size: u32,
    /// Delay between two asynchronous job status queries, in milliseconds.
    #[ortho_config(default = 3000)]
    pub poll_interval_ms: u64,
    /// Upper bound on how long a single job is polled, in seconds.
    #[ortho_config(default = 600)]
    pub poll_timeout_secs: u64,
    /// Timeout applied to each HTTP request, in seconds.
    #[ortho_config(default = 30)]
    pub http_timeout_secs: u64,
    /// Default tracing filter when `RUST_LOG` is unset.
    #[ortho_config(default = "info".to_owned())]
    pub log_level: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to cumulus.toml",
            self.description, self.env_var, self.toml_key
        ))
    }
}

impl ConsoleConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("cumulus")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages include guidance on how
    /// to provide missing values via environment variables or configuration
    /// files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a numeric setting is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(
                FieldMetadata::new("control-plane API URL", "CUMULUS_API_URL", "api_url")
                    .missing(),
            );
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }
        let has_session = self
            .session_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        let has_api_key = self
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_session && !has_api_key {
            return Err(FieldMetadata::new(
                "API credentials",
                "CUMULUS_SESSION_KEY",
                "session_key",
            )
            .missing());
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(String::from(
                "page_size must be greater than zero",
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_ms must be greater than zero",
            )));
        }
        Ok(())
    }

    /// Interval between job status queries.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Maximum time spent polling a single job.
    #[must_use]
    pub const fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Timeout applied to each HTTP request.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value that cannot be used.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
