/// Reference ellipsoid parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (metres)
    pub a: f64,
    /// Flattening (dimensionless)
    pub f: f64,
    /// Semi-minor axis: a * (1 - f)
    pub b: f64,
    /// First eccentricity squared
    pub e2: f64,
    /// Third flattening: f / (2 - f)
    pub n: f64,
}

impl Ellipsoid {
    pub const fn new(a: f64, f: f64) -> Self {
        Self {
            a,
            f,
            b: a * (1.0 - f),
            e2: 2.0 * f - f * f,
            n: f / (2.0 - f),
        }
    }

    /// Build from semi-major and semi-minor axes (`+a` / `+b`).
    pub fn from_axes(a: f64, b: f64) -> Self {
        Self::new(a, (a - b) / a)
    }

    /// A sphere of radius `r` (`+R`).
    pub const fn sphere(r: f64) -> Self {
        Self::new(r, 0.0)
    }

    /// Look up a named ellipsoid as used by `+ellps=`.
    pub fn named(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "WGS84" => Some(WGS84),
            "GRS80" => Some(GRS80),
            "SPHERE" => Some(Self::sphere(6_370_997.0)),
            _ => None,
        }
    }

    pub fn eccentricity(&self) -> f64 {
        self.e2.sqrt()
    }

    pub fn is_sphere(&self) -> bool {
        self.f == 0.0
    }
}

pub const WGS84: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_223_563);
pub const GRS80: Ellipsoid = Ellipsoid::new(6_378_137.0, 1.0 / 298.257_222_101);
