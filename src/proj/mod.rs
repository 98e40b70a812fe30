//! Projection math: definition parsing, native fast-path projections and the
//! `proj4rs` fallback, combined into a [`pipeline::Pipeline`].

pub mod axis;
pub mod crs;
pub mod definition;
pub mod ellipsoid;
pub mod equirectangular;
pub mod mercator;
pub mod pipeline;
pub mod transverse_mercator;

use crate::error::ProjError;

/// Trait for map projections supporting forward and inverse transforms.
pub trait Projection: Send + Sync {
    /// Forward: (lon_rad, lat_rad) -> (easting, northing)
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError>;

    /// Inverse: (easting, northing) -> (lon_rad, lat_rad)
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError>;

    fn ellipsoid(&self) -> &ellipsoid::Ellipsoid;
}
