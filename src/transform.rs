//! Transform instances: shape-preserving forward/inverse over coordinate batches.

use std::borrow::Cow;

use serde_json::Value;

use crate::coords::{denormalize, normalize, CoordinateBatch};
use crate::error::{ProjError, TransformError};
use crate::proj::definition::Definition;
use crate::proj::pipeline::Pipeline;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// A compiled (source, target) transform. Immutable once built and shared through
/// `Arc` by everyone asking for the same pair.
pub struct Transform {
    source: String,
    target: String,
    pipeline: Pipeline,
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("native", &self.pipeline.is_native())
            .finish()
    }
}

impl Transform {
    /// `source`/`target` are the identifiers callers use; `*_definition` are the
    /// definition strings they resolved to.
    pub fn new(
        source: &str,
        target: &str,
        source_definition: &str,
        target_definition: &str,
    ) -> Result<Self, ProjError> {
        let src = Definition::parse(source_definition)?;
        let dst = Definition::parse(target_definition)?;
        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            pipeline: Pipeline::new(&src, &dst)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Textually identical identifiers: every call hands the input straight back.
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    pub fn forward<'a>(
        &self,
        batch: &'a CoordinateBatch,
    ) -> Result<Cow<'a, CoordinateBatch>, TransformError> {
        self.apply(batch, Direction::Forward)
    }

    pub fn inverse<'a>(
        &self,
        batch: &'a CoordinateBatch,
    ) -> Result<Cow<'a, CoordinateBatch>, TransformError> {
        self.apply(batch, Direction::Inverse)
    }

    /// [`forward`](Self::forward) over dynamic input; `components` is the flat
    /// component count, if the caller has one.
    pub fn forward_value<'a>(
        &self,
        value: &'a Value,
        components: Option<usize>,
    ) -> Result<Cow<'a, Value>, TransformError> {
        self.apply_value(value, components, Direction::Forward)
    }

    pub fn inverse_value<'a>(
        &self,
        value: &'a Value,
        components: Option<usize>,
    ) -> Result<Cow<'a, Value>, TransformError> {
        self.apply_value(value, components, Direction::Inverse)
    }

    pub fn apply<'a>(
        &self,
        batch: &'a CoordinateBatch,
        direction: Direction,
    ) -> Result<Cow<'a, CoordinateBatch>, TransformError> {
        if self.is_identity() {
            return Ok(Cow::Borrowed(batch));
        }
        let mut normalized = normalize(batch)?;
        let flat_z = !normalized.has_nonzero_z();

        let mut coords: Vec<(f64, f64, f64)> =
            normalized.points.iter().map(|p| p.triple()).collect();
        match direction {
            Direction::Forward => self.pipeline.forward_batch(&mut coords)?,
            Direction::Inverse => self.pipeline.inverse_batch(&mut coords)?,
        }

        for (point, mut c) in normalized.points.iter_mut().zip(coords) {
            // All-zero input elevation never picks up height from a datum shift.
            if flat_z {
                c.2 = 0.0;
            }
            point.set_triple(c);
        }
        Ok(Cow::Owned(denormalize(normalized)))
    }

    fn apply_value<'a>(
        &self,
        value: &'a Value,
        components: Option<usize>,
        direction: Direction,
    ) -> Result<Cow<'a, Value>, TransformError> {
        if self.is_identity() {
            return Ok(Cow::Borrowed(value));
        }
        let batch = CoordinateBatch::from_value(value, components)?;
        let out = self.apply(&batch, direction)?;
        Ok(Cow::Owned(out.to_value()))
    }
}
