//! Coordinate reference system transforms for rendering pipelines.
//!
//! An [`Engine`] owns a registry of named definitions, a bounded cache of transforms and
//! a resolver that fetches unknown EPSG codes on demand. Coordinates go in and come out
//! in the same shape: a record, a list of records, a flat numeric buffer or a list of
//! numeric tuples.

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod affine;
pub mod cache;
pub mod config;
pub mod coords;
pub mod engine;
pub mod error;
pub mod proj;
pub mod registry;
pub mod resolver;
pub mod transform;
#[cfg(feature = "python")]
mod py;

pub use affine::{affine_forward, affine_inverse, AffineConfig};
pub use config::EngineConfig;
pub use coords::{Coordinate, CoordinateBatch};
pub use engine::Engine;
pub use error::{CoordinateError, ProjError, ResolveError, TransformError};
pub use transform::{Direction, Transform};

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py::register(m)?;
    Ok(())
}
