//! Configuration layer: typed settings with file → environment precedence.

use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;


const DEFAULT_STORE_URL: &str = "memory:";
const DEFAULT_DATABASE: &str = "blog";
const ENV_PREFIX: &str = "SOBREMESA";

/// Fully validated settings consumed by the rest of the crate.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Backend selector, scheme-prefixed (`memory:` for the embedded store).
    pub url: String,
    /// Logical database name; backends that have no database concept ignore
    /// it.
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    store: RawStoreSettings,
    #[serde(default)]
    logging: RawLoggingSettings,
}

#[derive(Debug, Default, Deserialize)]
struct RawStoreSettings {
    url: Option<String>,
    database: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("configuration could not be read: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: String,
    },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings from an optional file, then `SOBREMESA_*` environment
/// overrides (`SOBREMESA_STORE__URL`, `SOBREMESA_LOGGING__LEVEL`, ...).
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder();
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let url = raw
            .store
            .url
            .unwrap_or_else(|| DEFAULT_STORE_URL.to_string());
        if url.trim().is_empty() {
            return Err(LoadError::invalid("store.url", "must not be empty"));
        }

        let database = raw
            .store
            .database
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        if database.trim().is_empty() {
            return Err(LoadError::invalid("store.database", "must not be empty"));
        }

        let level = match raw.logging.level {
            Some(value) => LevelFilter::from_str(&value).map_err(|_| {
                LoadError::invalid(
                    "logging.level",
                    format!("`{value}` is not one of trace|debug|info|warn|error|off"),
                )
            })?,
            None => LevelFilter::INFO,
        };

        let format = match raw.logging.format.as_deref() {
            Some("json") => LogFormat::Json,
            Some("compact") | None => LogFormat::Compact,
            Some(other) => {
                return Err(LoadError::invalid(
                    "logging.format",
                    format!("`{other}` is not one of json|compact"),
                ));
            }
        };

        Ok(Self {
            store: StoreSettings { url, database },
            logging: LoggingSettings { level, format },
        })
    }
}
