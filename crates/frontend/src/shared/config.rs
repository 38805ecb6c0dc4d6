use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FilterConfig {
    /// localStorage key holding the persisted snapshot
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Name of the CustomEvent fired on `window` for same-tab listeners
    #[serde(default = "default_local_event")]
    pub local_event: String,
    #[serde(default = "default_true")]
    pub broadcast_window_event: bool,
}

fn default_storage_key() -> String {
    "incident_filters_v1".to_string()
}

fn default_local_event() -> String {
    "filters:changed".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            local_event: default_local_event(),
            broadcast_window_event: true,
        }
    }
}

/// Default configuration embedded in the bundle
const DEFAULT_CONFIG: &str = r#"
[filters]
storage_key = "incident_filters_v1"
local_event = "filters:changed"
broadcast_window_event = true
"#;

pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Load the embedded configuration, falling back to built-in defaults.
pub fn load_config() -> AppConfig {
    match parse_config(DEFAULT_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Embedded config rejected, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        assert_eq!(load_config(), AppConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = parse_config("[filters]\nstorage_key = \"custom\"\n").unwrap();
        assert_eq!(config.filters.storage_key, "custom");
        assert_eq!(config.filters.local_event, "filters:changed");
        assert!(config.filters.broadcast_window_event);

        let empty = parse_config("").unwrap();
        assert_eq!(empty, AppConfig::default());
    }

    #[test]
    fn test_broken_config_is_error() {
        let err = parse_config("[filters\nstorage_key = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
