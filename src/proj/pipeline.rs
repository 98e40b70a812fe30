//! CRS-to-CRS transform chain that dispatches between
//! native pure-Rust projections and proj4rs fallback.

use tracing::trace;

use crate::error::ProjError;
use crate::proj::axis::Axis;
use crate::proj::crs::CrsTransform;
use crate::proj::definition::{Definition, NativeCrs};

/// One side of a native pipeline.
pub struct Endpoint {
    crs: NativeCrs,
    axis: Axis,
}

impl Endpoint {
    fn is_geographic(&self) -> bool {
        matches!(self.crs, NativeCrs::Geographic)
    }

    /// Stored coordinates → (lon_rad, lat_rad, z).
    fn unproject(&self, c: (f64, f64, f64)) -> Result<(f64, f64, f64), ProjError> {
        let (x, y, z) = self.axis.to_enu(c);
        match &self.crs {
            NativeCrs::Geographic => Ok((x.to_radians(), y.to_radians(), z)),
            NativeCrs::Projected(proj) => {
                let (lon, lat) = proj.inverse(x, y)?;
                Ok((lon, lat, z))
            }
        }
    }

    /// (lon_rad, lat_rad, z) → stored coordinates.
    fn project(&self, c: (f64, f64, f64)) -> Result<(f64, f64, f64), ProjError> {
        let (lon, lat, z) = c;
        let enu = match &self.crs {
            NativeCrs::Geographic => (lon.to_degrees(), lat.to_degrees(), z),
            NativeCrs::Projected(proj) => {
                let (x, y) = proj.forward(lon, lat)?;
                (x, y, z)
            }
        };
        Ok(self.axis.from_enu(enu))
    }
}

/// A CRS-to-CRS transform pipeline.
///
/// For definitions the native projections cover, uses pure-Rust math.
/// Falls back to proj4rs for anything else.
pub enum Pipeline {
    Native { src: Endpoint, dst: Endpoint },
    Proj4rs(Box<CrsTransform>),
}

impl Pipeline {
    /// Both sides must be native for the native path; a single unsupported side sends
    /// the whole pair through proj4rs so the datum handling stays consistent.
    pub fn new(src: &Definition, dst: &Definition) -> Result<Self, ProjError> {
        if let (Some(src_crs), Some(dst_crs)) = (src.native()?, dst.native()?) {
            trace!(src = src.as_str(), dst = dst.as_str(), "native pipeline");
            return Ok(Pipeline::Native {
                src: Endpoint {
                    crs: src_crs,
                    axis: src.axis(),
                },
                dst: Endpoint {
                    crs: dst_crs,
                    axis: dst.axis(),
                },
            });
        }
        trace!(src = src.as_str(), dst = dst.as_str(), "proj4rs pipeline");
        let ct = CrsTransform::new(src, dst)?;
        Ok(Pipeline::Proj4rs(Box::new(ct)))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Pipeline::Native { .. })
    }

    /// Source CRS → destination CRS, in place. CRS native units (degrees for
    /// geographic, metres for projected).
    pub fn forward_batch(&self, coords: &mut [(f64, f64, f64)]) -> Result<(), ProjError> {
        match self {
            Pipeline::Native { src, dst } => native_batch(src, dst, coords),
            Pipeline::Proj4rs(ct) => ct.forward_batch(coords),
        }
    }

    /// Destination CRS → source CRS, in place.
    pub fn inverse_batch(&self, coords: &mut [(f64, f64, f64)]) -> Result<(), ProjError> {
        match self {
            Pipeline::Native { src, dst } => native_batch(dst, src, coords),
            Pipeline::Proj4rs(ct) => ct.inverse_batch(coords),
        }
    }
}

fn native_batch(
    from: &Endpoint,
    to: &Endpoint,
    coords: &mut [(f64, f64, f64)],
) -> Result<(), ProjError> {
    // Geographic to geographic stays in degrees so values survive exactly.
    if from.is_geographic() && to.is_geographic() {
        for c in coords.iter_mut() {
            *c = to.axis.from_enu(from.axis.to_enu(*c));
        }
        return Ok(());
    }
    for c in coords.iter_mut() {
        *c = to.project(from.unproject(*c)?)?;
    }
    Ok(())
}
