//! PyO3 binding for the transform engine.

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::EngineConfig;
use crate::coords::CoordinateBatch;
use crate::engine::Engine;

fn value_error(e: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// A registry of named definitions plus a cache of transforms between them.
#[pyclass(name = "Engine")]
pub struct PyEngine {
    inner: Engine,
}

#[pymethods]
impl PyEngine {
    /// Args:
    ///     config: Optional JSON object with `cache_capacity`, `lookup_endpoint`,
    ///         `default_source` and `default_target`.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(text) => EngineConfig::from_json(text).map_err(value_error)?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            inner: Engine::new(config).map_err(value_error)?,
        })
    }

    /// Register `definition` under `name`, replacing any previous entry.
    fn define(&self, name: &str, definition: &str) {
        self.inner.registry().define(name, definition);
    }

    fn has(&self, name: &str) -> bool {
        self.inner.registry().has(name)
    }

    /// Transform arrays of coordinates from one CRS to another.
    ///
    /// Args:
    ///     x: 1D array of x coordinates (longitude or easting).
    ///     y: 1D array of y coordinates (latitude or northing).
    ///     src_crs: Source identifier or definition (e.g. "EPSG:4326").
    ///     dst_crs: Destination identifier or definition (e.g. "EPSG:3857").
    ///
    /// Returns:
    ///     Tuple of (x_out, y_out) arrays in the destination CRS.
    #[pyo3(signature = (x, y, src_crs, dst_crs))]
    #[allow(clippy::type_complexity)]
    fn transform_points<'py>(
        &self,
        py: Python<'py>,
        x: PyReadonlyArray1<'py, f64>,
        y: PyReadonlyArray1<'py, f64>,
        src_crs: &str,
        dst_crs: &str,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
        let x_view = x.as_array();
        let y_view = y.as_array();
        if x_view.len() != y_view.len() {
            return Err(PyValueError::new_err(format!(
                "x and y must have same length, got {} and {}",
                x_view.len(),
                y_view.len()
            )));
        }

        let values: Vec<f64> = x_view
            .iter()
            .zip(y_view.iter())
            .flat_map(|(&xi, &yi)| [xi, yi])
            .collect();

        let engine = &self.inner;
        let values = py.allow_threads(move || -> PyResult<Vec<f64>> {
            let batch = CoordinateBatch::Flat {
                values,
                components: Some(2),
            };
            match engine
                .transform_coordinates(src_crs, dst_crs, &batch)
                .map_err(value_error)?
                .into_owned()
            {
                CoordinateBatch::Flat { values, .. } => Ok(values),
                _ => Err(PyValueError::new_err("unexpected coordinate shape")),
            }
        })?;

        let (xs, ys): (Vec<f64>, Vec<f64>) = values.chunks_exact(2).map(|c| (c[0], c[1])).unzip();

        Ok((
            PyArray1::from_owned_array(py, ndarray::Array1::from(xs)),
            PyArray1::from_owned_array(py, ndarray::Array1::from(ys)),
        ))
    }
}
