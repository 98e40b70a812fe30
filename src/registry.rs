//! Definition registry: CRS identifier → projection-definition string.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

/// Definitions every registry starts with.
pub const BUILTIN_DEFINITIONS: &[(&str, &str)] = &[
    ("EPSG:4326", "+proj=longlat +datum=WGS84 +no_defs"),
    ("WGS84", "+proj=longlat +datum=WGS84 +no_defs"),
    ("EPSG:4269", "+proj=longlat +datum=NAD83 +no_defs"),
    ("EPSG:3857", WEB_MERCATOR),
    ("EPSG:3785", WEB_MERCATOR),
    ("GOOGLE", WEB_MERCATOR),
    ("EPSG:900913", WEB_MERCATOR),
    ("EPSG:102113", WEB_MERCATOR),
];

const WEB_MERCATOR: &str = "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 \
    +x_0=0.0 +y_0=0 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs";

/// Grows by [`define`](Registry::define), never shrinks. One lock guards readers and
/// writers alike; entries are small and only touched while building transforms.
#[derive(Debug)]
pub struct Registry {
    defs: Mutex<HashMap<String, String>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry seeded with [`BUILTIN_DEFINITIONS`].
    pub fn new() -> Self {
        let defs = BUILTIN_DEFINITIONS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            defs: Mutex::new(defs),
        }
    }

    pub fn define(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug!(key = %key, "defining projection");
        self.defs.lock().insert(key, value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.defs.lock().contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.defs.lock().get(key).cloned()
    }

    /// The registered definition for `id`, or `id` itself taken as a raw definition.
    pub fn resolve(&self, id: &str) -> String {
        self.get(id).unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.defs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_definitions() {
        let registry = Registry::new();
        assert!(registry.has("EPSG:4326"));
        assert!(registry.has("EPSG:3857"));
        assert_eq!(registry.len(), BUILTIN_DEFINITIONS.len());
    }

    #[test]
    fn test_custom_definition() {
        let registry = Registry::new();
        assert!(!registry.has("my projection"));
        registry.define("my projection", "+proj=longlat +datum=WGS84 +no_defs");
        assert_eq!(
            registry.get("my projection").as_deref(),
            Some("+proj=longlat +datum=WGS84 +no_defs")
        );
    }

    #[test]
    fn test_resolve_falls_back_to_raw_definition() {
        let registry = Registry::new();
        assert_eq!(registry.resolve("+proj=longlat"), "+proj=longlat");
        assert!(registry.resolve("EPSG:3857").starts_with("+proj=merc"));
    }
}
