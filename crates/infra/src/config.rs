//! Configuration loading and representation.

use thiserror::Error;

pub const ENV_EVENT_SOURCE: &str = "CATALOG_EVENT_SOURCE";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "CATALOG_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "CATALOG_MAX_PAGE_SIZE";
pub const ENV_ENFORCE_ATTRIBUTE_VALUE_TYPES: &str = "CATALOG_ENFORCE_ATTRIBUTE_VALUE_TYPES";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Catalog service settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Written into the `source` of every emitted event.
    pub event_source: String,
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Reject product attribute values whose populated slot does not match the
    /// attribute's type. Off by default.
    pub enforce_attribute_value_types: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            event_source: "ecommerce-catalog-service".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            enforce_attribute_value_types: false,
        }
    }
}

impl CatalogConfig {
    /// Load from the process environment. Unset keys keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(source) = lookup(ENV_EVENT_SOURCE) {
            if source.trim().is_empty() {
                return Err(invalid(ENV_EVENT_SOURCE, &source, "must not be empty"));
            }
            config.event_source = source;
        }

        if let Some(raw) = lookup(ENV_DEFAULT_PAGE_SIZE) {
            config.default_page_size = parse_page_size(ENV_DEFAULT_PAGE_SIZE, &raw)?;
        }

        if let Some(raw) = lookup(ENV_MAX_PAGE_SIZE) {
            config.max_page_size = parse_page_size(ENV_MAX_PAGE_SIZE, &raw)?;
        }

        if let Some(raw) = lookup(ENV_ENFORCE_ATTRIBUTE_VALUE_TYPES) {
            config.enforce_attribute_value_types = parse_bool(ENV_ENFORCE_ATTRIBUTE_VALUE_TYPES, &raw)?;
        }

        if config.max_page_size < config.default_page_size {
            return Err(invalid(
                ENV_MAX_PAGE_SIZE,
                &config.max_page_size.to_string(),
                "must not be smaller than the default page size",
            ));
        }

        Ok(config)
    }

    /// Resolve a requested page/size pair: page starts at 1, a missing or zero
    /// size falls back to the default and sizes are capped at the maximum.
    pub fn page_request(&self, page: Option<u32>, size: Option<u32>) -> (u32, u32) {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let size = size
            .filter(|s| *s > 0)
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);
        (page, size)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_page_size(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    let size: u32 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(key, raw, e.to_string()))?;
    if size == 0 {
        return Err(invalid(key, raw, "must be greater than 0"));
    }
    Ok(size)
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}
