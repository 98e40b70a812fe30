use serde::{Deserialize, Serialize};

use crate::coords::Coordinate;

/// Origin of the local frame. A 2D concept: `z` is never offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// Per-axis scale; every missing axis is 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    #[serde(default = "unit")]
    pub x: f64,
    #[serde(default = "unit")]
    pub y: f64,
    #[serde(default = "unit")]
    pub z: f64,
}

fn unit() -> f64 {
    1.0
}

impl Default for Scale {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: 1.0,
            z: 1.0,
        }
    }
}

/// Local origin/scale correction applied to already-projected coordinates, e.g. to
/// keep display-space values small.
///
///   x' = (x - origin.x) * scale.x
///   y' = (y - origin.y) * scale.y
///   z' = z * scale.z
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AffineConfig {
    pub origin: Origin,
    #[serde(default)]
    pub scale: Scale,
}

impl AffineConfig {
    pub fn new(origin_x: f64, origin_y: f64) -> Self {
        Self {
            origin: Origin {
                x: origin_x,
                y: origin_y,
            },
            scale: Scale::default(),
        }
    }

    pub fn with_scale(mut self, x: f64, y: f64, z: f64) -> Self {
        self.scale = Scale { x, y, z };
        self
    }
}

/// Apply `config` to every point, in place, and hand the same slice back.
///
/// Mutation is the contract: render loops call this on buffers they own and reuse.
pub fn affine_forward<'a>(config: &AffineConfig, coords: &'a mut [Coordinate]) -> &'a mut [Coordinate] {
    let AffineConfig { origin, scale } = *config;
    for c in coords.iter_mut() {
        c.x = (c.x - origin.x) * scale.x;
        c.y = (c.y - origin.y) * scale.y;
        if let Some(z) = c.z.as_mut() {
            *z *= scale.z;
        }
    }
    coords
}

/// Exact inverse of [`affine_forward`], also in place.
pub fn affine_inverse<'a>(config: &AffineConfig, coords: &'a mut [Coordinate]) -> &'a mut [Coordinate] {
    let AffineConfig { origin, scale } = *config;
    for c in coords.iter_mut() {
        c.x = c.x / scale.x + origin.x;
        c.y = c.y / scale.y + origin.y;
        if let Some(z) = c.z.as_mut() {
            *z /= scale.z;
        }
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn points() -> Vec<Coordinate> {
        vec![Coordinate::with_z(1.0, 2.0, 3.0), Coordinate::with_z(4.0, 5.0, 6.0)]
    }

    fn config(value: serde_json::Value) -> AffineConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_forward_zero_origin_is_identity() {
        let mut coords = points();
        let ptr = coords.as_ptr();
        let out = affine_forward(&config(json!({"origin": {"x": 0, "y": 0}})), &mut coords);
        assert_eq!(out.as_ptr(), ptr);
        assert_eq!(out, points().as_slice());
    }

    #[test]
    fn test_forward_origin_only() {
        let mut coords = points();
        affine_forward(&config(json!({"origin": {"x": -2, "y": -3}})), &mut coords);
        assert_eq!(coords[0], Coordinate::with_z(3.0, 5.0, 3.0));
        assert_eq!(coords[1], Coordinate::with_z(6.0, 8.0, 6.0));
    }

    #[test]
    fn test_forward_with_scale() {
        let mut coords = points();
        let cfg = config(json!({"origin": {"x": -2, "y": -3}, "scale": {"x": 2, "y": 3, "z": 4}}));
        affine_forward(&cfg, &mut coords);
        assert_eq!(coords[0], Coordinate::with_z(6.0, 15.0, 12.0));
        assert_eq!(coords[1], Coordinate::with_z(12.0, 24.0, 24.0));

        affine_inverse(&cfg, &mut coords);
        assert_eq!(coords, points());
    }

    #[test]
    fn test_inverse() {
        let mut coords = points();
        affine_inverse(&config(json!({"origin": {"x": -2, "y": -3}})), &mut coords);
        assert_eq!(coords[0], Coordinate::with_z(-1.0, -1.0, 3.0));
        assert_eq!(coords[1], Coordinate::with_z(2.0, 2.0, 6.0));

        let mut coords = points();
        let cfg = AffineConfig::new(-2.0, -3.0).with_scale(2.0, 3.0, 4.0);
        affine_inverse(&cfg, &mut coords);
        assert_relative_eq!(coords[0].x, -3.0 / 2.0);
        assert_relative_eq!(coords[0].y, -7.0 / 3.0);
        assert_eq!(coords[0].z, Some(3.0 / 4.0));
        assert_relative_eq!(coords[1].x, 0.0);
        assert_relative_eq!(coords[1].y, -4.0 / 3.0);
        assert_eq!(coords[1].z, Some(6.0 / 4.0));
    }

    #[test]
    fn test_partial_scale_defaults_to_one() {
        let cfg = config(json!({"origin": {"x": 1, "y": 1}, "scale": {"x": 10}}));
        assert_eq!(cfg.scale, Scale { x: 10.0, y: 1.0, z: 1.0 });
        let mut coords = vec![Coordinate::new(2.0, 3.0)];
        affine_forward(&cfg, &mut coords);
        assert_eq!(coords[0], Coordinate::new(10.0, 2.0));
    }
}
