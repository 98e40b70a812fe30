//! The engine context: owns the definition registry, the transform cache and the
//! remote resolver. Construct one and pass it to everything that reprojects.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::cache::TransformCache;
use crate::config::EngineConfig;
use crate::coords::{Coordinate, CoordinateBatch};
use crate::error::{ResolveError, TransformError};
use crate::registry::Registry;
use crate::resolver::{DefinitionSource, HttpDefinitionSource, Resolver};
use crate::transform::Transform;

pub struct Engine {
    config: EngineConfig,
    registry: Arc<Registry>,
    cache: TransformCache,
    resolver: Resolver,
}

impl Engine {
    /// An engine that resolves unknown codes over HTTP at `config.lookup_endpoint`.
    pub fn new(config: EngineConfig) -> Result<Self, TransformError> {
        let source = Arc::new(HttpDefinitionSource::new(config.lookup_endpoint.clone()));
        Self::with_source(config, source)
    }

    /// An engine with a caller-supplied lookup transport.
    pub fn with_source(
        config: EngineConfig,
        source: Arc<dyn DefinitionSource>,
    ) -> Result<Self, TransformError> {
        config.validate()?;
        let registry = Arc::new(Registry::new());
        Ok(Self {
            cache: TransformCache::new(config.cache_capacity),
            resolver: Resolver::new(Arc::clone(&registry), source),
            registry,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    /// Cached transform for `(source, target)`, built on first use.
    ///
    /// Identifiers are looked up in the registry; anything unregistered is taken as a
    /// raw definition.
    pub fn get_transform(&self, source: &str, target: &str) -> Result<Arc<Transform>, TransformError> {
        if let Some(transform) = self.cache.get(source, target) {
            trace!(source, target, "transform cache hit");
            return Ok(transform);
        }
        debug!(source, target, "transform cache miss, building");
        let transform = Transform::new(
            source,
            target,
            &self.registry.resolve(source),
            &self.registry.resolve(target),
        )?;
        Ok(self.cache.insert(transform))
    }

    /// The transform between the configured default source and target.
    pub fn default_transform(&self) -> Result<Arc<Transform>, TransformError> {
        self.get_transform(&self.config.default_source, &self.config.default_target)
    }

    /// Like [`get_transform`](Self::get_transform), but first fetches any side that is an
    /// unregistered authority code from the lookup service.
    pub async fn resolve_transform(
        &self,
        source: &str,
        target: &str,
    ) -> Result<Arc<Transform>, TransformError> {
        for id in [source, target] {
            if !self.registry.has(id) && Resolver::supports(id) {
                self.resolver.lookup(id).await?;
            }
        }
        self.get_transform(source, target)
    }

    /// Resolve `code` through the lookup service; see [`Resolver::lookup`].
    pub async fn lookup(&self, code: &str) -> Result<String, ResolveError> {
        self.resolver.lookup(code).await
    }

    /// Reproject `batch` from `source` to `target`, returning it in the same shape.
    /// Identical identifiers return the input itself.
    pub fn transform_coordinates<'a>(
        &self,
        source: &str,
        target: &str,
        batch: &'a CoordinateBatch,
    ) -> Result<Cow<'a, CoordinateBatch>, TransformError> {
        if source == target {
            return Ok(Cow::Borrowed(batch));
        }
        self.get_transform(source, target)?.forward(batch)
    }

    /// [`transform_coordinates`](Self::transform_coordinates) over dynamic input.
    pub fn transform_value<'a>(
        &self,
        source: &str,
        target: &str,
        value: &'a Value,
        components: Option<usize>,
    ) -> Result<Cow<'a, Value>, TransformError> {
        if source == target {
            return Ok(Cow::Borrowed(value));
        }
        self.get_transform(source, target)?
            .forward_value(value, components)
    }

    /// Pack `points` into an interleaved `[x, y, z, ...]` buffer (missing `z` is 0) in
    /// the target CRS, ready to upload as a vertex position array.
    pub fn transform_positions(
        &self,
        source: &str,
        target: &str,
        points: &[Coordinate],
    ) -> Result<Vec<f64>, TransformError> {
        let values = points
            .iter()
            .flat_map(|p| [p.x, p.y, p.z.unwrap_or(0.0)])
            .collect();
        let batch = CoordinateBatch::Flat {
            values,
            components: Some(3),
        };
        match self.transform_coordinates(source, target, &batch)?.into_owned() {
            CoordinateBatch::Flat { values, .. } => Ok(values),
            _ => Err(crate::error::CoordinateError::Invalid.into()),
        }
    }
}
