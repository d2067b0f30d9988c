use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_path: PathBuf,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
    pub default_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "INSPECT_API_BIND_ADDR", "127.0.0.1:8080");
        if !bind_addr.contains(':') {
            return Err(ConfigError::Invalid(
                "INSPECT_API_BIND_ADDR must be a host:port pair".to_string(),
            ));
        }

        let database_path = PathBuf::from(value_or_default(
            &lookup,
            "INSPECT_DATABASE_PATH",
            "data/inspections.db",
        ));

        let cors_allowed_origins = optional_trimmed(&lookup, "INSPECT_CORS_ALLOW_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty() && *origin != "*")
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if let Some(origin) = cors_allowed_origins
            .iter()
            .find(|origin| !is_http_url(origin))
        {
            return Err(ConfigError::Invalid(format!(
                "INSPECT_CORS_ALLOW_ORIGINS entry {origin} must start with http:// or https://"
            )));
        }

        let default_page_size = value_or_default(&lookup, "INSPECT_DEFAULT_PAGE_SIZE", "100")
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "INSPECT_DEFAULT_PAGE_SIZE must be an integer in [1, 10000]".to_string(),
                )
            })?;
        if !(1..=10_000).contains(&default_page_size) {
            return Err(ConfigError::Invalid(
                "INSPECT_DEFAULT_PAGE_SIZE must be in [1, 10000]".to_string(),
            ));
        }

        Ok(Self {
            bind_addr,
            database_path,
            cors_allowed_origins,
            default_page_size,
        })
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        database_path: PathBuf::from(":memory:"),
        cors_allowed_origins: Vec::new(),
        default_page_size: 100,
    }
}
