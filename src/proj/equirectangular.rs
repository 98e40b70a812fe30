//! Equidistant cylindrical (`+proj=eqc`, Plate Carrée).
//!
//! forward: x = a·(λ - λ₀)·cos(φ_ts) + x₀, y = a·(φ - φ₀) + y₀
//! inverse: λ = λ₀ + (x - x₀)/(a·cos(φ_ts)), φ = φ₀ + (y - y₀)/a

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct Equirectangular {
    ellipsoid: Ellipsoid,
    lon0: f64,
    lat0: f64,
    cos_lat_ts: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Equirectangular {
    /// Angles in radians. Only the semi-major axis of `ellipsoid` is used.
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        lat_ts: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Result<Self, ProjError> {
        let cos_lat_ts = lat_ts.cos();
        if cos_lat_ts < 1e-10 {
            return Err(ProjError::InvalidParameter(format!(
                "lat_ts must lie strictly between -90 and 90 degrees, got {}",
                lat_ts.to_degrees()
            )));
        }
        Ok(Self {
            ellipsoid,
            lon0,
            lat0,
            cos_lat_ts,
            false_easting,
            false_northing,
        })
    }
}

impl Projection for Equirectangular {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let a = self.ellipsoid.a;
        let x = a * (lon - self.lon0) * self.cos_lat_ts + self.false_easting;
        let y = a * (lat - self.lat0) + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let a = self.ellipsoid.a;
        let lon = self.lon0 + (x - self.false_easting) / (a * self.cos_lat_ts);
        let lat = self.lat0 + (y - self.false_northing) / a;
        Ok((lon, lat))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}
