use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CACHE_CAPACITY: usize = 10;
pub const DEFAULT_LOOKUP_ENDPOINT: &str = "https://epsg.io/?format=json";

/// Engine settings. Every field has a default, so partial JSON is accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cached (source, target) transforms. Each cache hit updates
    /// recency with a linear scan, so very large capacities slow down lookups.
    pub cache_capacity: usize,
    /// Lookup service URL; the numeric code is appended as the `q` parameter.
    pub lookup_endpoint: String,
    pub default_source: String,
    pub default_target: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            lookup_endpoint: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            default_source: "EPSG:4326".to_string(),
            default_target: "EPSG:3857".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"cache_capacity": 4}"#).unwrap();
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.lookup_endpoint, DEFAULT_LOOKUP_ENDPOINT);
        assert_eq!(config.default_source, "EPSG:4326");
        assert_eq!(config.default_target, "EPSG:3857");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            EngineConfig::from_json(r#"{"cache_capacity": 0}"#),
            Err(ConfigError::ZeroCapacity)
        );
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
