//! Spherical ("Web") Mercator, as used by EPSG:3857 and every `+proj=merc`
//! definition on a sphere (`+a == +b` or `+R`). Ellipsoidal Mercator goes to proj4rs.
//!
//!   forward: x = R·(λ - λ₀) + x₀, y = R·ln(tan(π/4 + φ/2)) + y₀
//!   inverse: λ = λ₀ + (x - x₀)/R, φ = 2·atan(exp((y - y₀)/R)) - π/2

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::ProjError;
use crate::proj::ellipsoid::{Ellipsoid, WGS84};
use crate::proj::Projection;

/// Latitudes this close to a pole have no finite northing.
const POLE_TOLERANCE: f64 = 1e-10;

pub struct WebMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl WebMercator {
    /// EPSG:3857 parameters.
    pub fn new() -> Self {
        Self::with_params(WGS84.a, 0.0, 0.0, 0.0)
    }

    /// Sphere of radius `radius`, central meridian `lon0` in radians.
    pub fn with_params(radius: f64, lon0: f64, false_easting: f64, false_northing: f64) -> Self {
        Self {
            ellipsoid: Ellipsoid::sphere(radius),
            lon0,
            false_easting,
            false_northing,
        }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new()
    }
}

impl Projection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        if (lat.abs() - FRAC_PI_2).abs() <= POLE_TOLERANCE {
            return Err(ProjError::TransformFailed(format!(
                "latitude {} is at a pole",
                lat.to_degrees()
            )));
        }
        let r = self.ellipsoid.a;
        let x = r * (lon - self.lon0) + self.false_easting;
        let y = r * (FRAC_PI_4 + lat / 2.0).tan().ln() + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let r = self.ellipsoid.a;
        let lon = self.lon0 + (x - self.false_easting) / r;
        let lat = 2.0 * ((y - self.false_northing) / r).exp().atan() - FRAC_PI_2;
        Ok((lon, lat))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}
