//! Configuration layer: typed settings with layered precedence (defaults → file → env → CLI).

use std::{path::PathBuf, str::FromStr, time::Duration};

use clap::Args;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const LOCAL_CONFIG_BASENAME: &str = "folio";
const ENV_PREFIX: &str = "FOLIO";
const API_URL_ENV: &str = "FOLIO_API_URL";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_LOG_FORMAT: &str = "compact";

/// CLI overrides applied on top of file and environment configuration.
#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "FOLIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Override the catalog API base URL.
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Override the request timeout in milliseconds.
    #[arg(long = "api-timeout-ms", value_name = "MILLIS")]
    pub api_timeout_ms: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Override the log format (compact|json).
    #[arg(long = "log-format", value_name = "FORMAT")]
    pub log_format: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid api base url `{value}`: {source}")]
    ApiUrl {
        value: String,
        source: url::ParseError,
    },
    #[error("api timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid log level `{0}`")]
    LogLevel(String),
    #[error("invalid log format `{0}` (expected `compact` or `json`)")]
    LogFormat(String),
}

/// Raw deserialization target for the `config` crate; validated into [`Settings`].
#[derive(Debug, Deserialize)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Deserialize)]
struct RawApiSettings {
    base_url: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct RawLoggingSettings {
    level: String,
    format: String,
}

/// Validated process-wide settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
}

/// Connection settings for the catalog API.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::LogFormat(other.to_string())),
        }
    }
}

/// Load settings with layered precedence: built-in defaults, then an optional
/// TOML file, then `FOLIO_*` environment variables, then CLI overrides.
pub fn load(overrides: &SettingsOverrides) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder()
        .set_default("api.base_url", DEFAULT_API_URL)?
        .set_default("api.timeout_ms", DEFAULT_TIMEOUT_MS)?
        .set_default("logging.level", DEFAULT_LOG_LEVEL)?
        .set_default("logging.format", DEFAULT_LOG_FORMAT)?;

    builder = match &overrides.config_file {
        Some(path) => builder.add_source(File::from(path.clone()).required(true)),
        None => builder.add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false)),
    };

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    // Short form kept for parity with the original deployment variable.
    if let Ok(value) = std::env::var(API_URL_ENV) {
        builder = builder.set_override("api.base_url", value)?;
    }

    if let Some(url) = &overrides.api_url {
        builder = builder.set_override("api.base_url", url.clone())?;
    }
    if let Some(timeout) = overrides.api_timeout_ms {
        builder = builder.set_override("api.timeout_ms", timeout)?;
    }
    if let Some(level) = &overrides.log_level {
        builder = builder.set_override("logging.level", level.clone())?;
    }
    if let Some(format) = &overrides.log_format {
        builder = builder.set_override("logging.format", format.clone())?;
    }

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    validate(raw)
}

fn validate(raw: RawSettings) -> Result<Settings, ConfigError> {
    let base_url = Url::parse(&raw.api.base_url).map_err(|source| ConfigError::ApiUrl {
        value: raw.api.base_url.clone(),
        source,
    })?;

    if raw.api.timeout_ms == 0 {
        return Err(ConfigError::ZeroTimeout);
    }

    let level = LevelFilter::from_str(&raw.logging.level)
        .map_err(|_| ConfigError::LogLevel(raw.logging.level.clone()))?;
    let format = raw.logging.format.parse::<LogFormat>()?;

    Ok(Settings {
        api: ApiSettings {
            base_url,
            timeout: Duration::from_millis(raw.api.timeout_ms),
        },
        logging: LoggingSettings { level, format },
    })
}
