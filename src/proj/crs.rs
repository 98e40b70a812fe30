use crate::error::ProjError;
use crate::proj::axis::Axis;
use crate::proj::definition::Definition;
use proj4rs::Proj;

/// Thin wrapper around proj4rs that handles radians/degrees conversion and axis order.
///
/// proj4rs works in radians for geographic CRS while callers hand us degrees, and it
/// expects east/north/up ordering. This wrapper converts on the way in and out.
pub struct CrsTransform {
    src: Proj,
    dst: Proj,
    src_is_geo: bool,
    dst_is_geo: bool,
    src_axis: Axis,
    dst_axis: Axis,
}

impl CrsTransform {
    /// Accepts EPSG codes known to proj4rs ("EPSG:2154") or PROJ strings.
    pub fn new(src: &Definition, dst: &Definition) -> Result<Self, ProjError> {
        let src_proj = build(src)?;
        let dst_proj = build(dst)?;
        Ok(Self {
            src_is_geo: src_proj.is_latlong(),
            dst_is_geo: dst_proj.is_latlong(),
            src: src_proj,
            dst: dst_proj,
            src_axis: src.axis(),
            dst_axis: dst.axis(),
        })
    }

    /// Source CRS → destination CRS, in place, CRS native units.
    pub fn forward_batch(&self, coords: &mut [(f64, f64, f64)]) -> Result<(), ProjError> {
        run(
            (&self.src, self.src_is_geo, self.src_axis),
            (&self.dst, self.dst_is_geo, self.dst_axis),
            coords,
        )
    }

    /// Destination CRS → source CRS, in place, CRS native units.
    pub fn inverse_batch(&self, coords: &mut [(f64, f64, f64)]) -> Result<(), ProjError> {
        run(
            (&self.dst, self.dst_is_geo, self.dst_axis),
            (&self.src, self.src_is_geo, self.src_axis),
            coords,
        )
    }
}

fn build(def: &Definition) -> Result<Proj, ProjError> {
    Proj::from_user_string(&def.backend_string())
        .map_err(|e| ProjError::UnknownCrs(format!("{}: {e}", def.as_str())))
}

fn run(
    from: (&Proj, bool, Axis),
    to: (&Proj, bool, Axis),
    coords: &mut [(f64, f64, f64)],
) -> Result<(), ProjError> {
    let (from_proj, from_geo, from_axis) = from;
    let (to_proj, to_geo, to_axis) = to;

    for c in coords.iter_mut() {
        let (mut x, mut y, z) = from_axis.to_enu(*c);
        if from_geo {
            x = x.to_radians();
            y = y.to_radians();
        }
        let mut point = (x, y, z);

        proj4rs::transform::transform(from_proj, to_proj, &mut point)
            .map_err(|e| ProjError::TransformFailed(e.to_string()))?;

        if to_geo {
            point.0 = point.0.to_degrees();
            point.1 = point.1.to_degrees();
        }
        *c = to_axis.from_enu(point);
    }
    Ok(())
}
