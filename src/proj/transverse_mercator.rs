//! Transverse Mercator (`+proj=tmerc`, `+proj=utm`): Krüger n-series, 6th order.
//!
//! Karney (2011) formulation. Accurate to well under a millimetre within a few
//! thousand kilometres of the central meridian, which covers every UTM zone.

use crate::error::ProjError;
use crate::proj::ellipsoid::Ellipsoid;
use crate::proj::Projection;

pub struct TransverseMercator {
    ellipsoid: Ellipsoid,
    lon0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// Rectifying radius A = a/(1+n)·(1 + n²/4 + n⁴/64)
    a_hat: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
    /// Normalized meridional arc at lat0
    xi0: f64,
}

impl TransverseMercator {
    /// Angles in radians.
    pub fn new(
        ellipsoid: Ellipsoid,
        lon0: f64,
        lat0: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.n;
        let powers = [n, n * n, n.powi(3), n.powi(4), n.powi(5), n.powi(6)];
        let a_hat = ellipsoid.a / (1.0 + n) * (1.0 + powers[1] / 4.0 + powers[3] / 64.0);

        Self {
            ellipsoid,
            lon0,
            k0,
            false_easting,
            false_northing,
            a_hat,
            alpha: alpha_coefficients(&powers),
            beta: beta_coefficients(&powers),
            xi0: normalized_meridional_arc(lat0, &powers),
        }
    }

    /// UTM zone `zone` (1–60) on `ellipsoid`; southern zones use a 10 000 km false northing.
    pub fn utm(ellipsoid: Ellipsoid, zone: u8, south: bool) -> Result<Self, ProjError> {
        if !(1..=60).contains(&zone) {
            return Err(ProjError::InvalidParameter(format!(
                "UTM zone must be 1-60, got {zone}"
            )));
        }
        let lon0 = (f64::from(zone) * 6.0 - 183.0).to_radians();
        let false_northing = if south { 10_000_000.0 } else { 0.0 };
        Ok(Self::new(ellipsoid, lon0, 0.0, 0.9996, 500_000.0, false_northing))
    }

    /// Geodetic tangent τ → conformal tangent τ'.
    fn conformal_tangent(&self, tau: f64) -> f64 {
        let e = self.ellipsoid.eccentricity();
        let tau1 = tau.hypot(1.0);
        let sigma = (e * (e * tau / tau1).atanh()).sinh();
        tau * sigma.hypot(1.0) - sigma * tau1
    }

    /// Conformal tangent τ' → geodetic tangent τ, by Newton iteration.
    fn geodetic_tangent(&self, tau_prime: f64) -> f64 {
        let e2 = self.ellipsoid.e2;
        let mut tau = tau_prime;
        for _ in 0..15 {
            let tau1 = tau.hypot(1.0);
            let estimate = self.conformal_tangent(tau);
            let dtau = (tau_prime - estimate) * (1.0 + (1.0 - e2) * tau * tau)
                / ((1.0 - e2) * tau1 * estimate.hypot(1.0));
            tau += dtau;
            if dtau.abs() < 1e-12 * (1.0 + tau.abs()) {
                break;
            }
        }
        tau
    }
}

fn alpha_coefficients(p: &[f64; 6]) -> [f64; 6] {
    let [n, n2, n3, n4, n5, n6] = *p;
    [
        n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4 - 127.0 / 288.0 * n5
            + 7891.0 / 37800.0 * n6,
        13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
            - 1983433.0 / 1935360.0 * n6,
        61.0 / 240.0 * n3 - 103.0 / 140.0 * n4 + 15061.0 / 26880.0 * n5
            + 167603.0 / 181440.0 * n6,
        49561.0 / 161280.0 * n4 - 179.0 / 168.0 * n5 + 6601661.0 / 7257600.0 * n6,
        34729.0 / 80640.0 * n5 - 3418889.0 / 1995840.0 * n6,
        212378941.0 / 319334400.0 * n6,
    ]
}

fn beta_coefficients(p: &[f64; 6]) -> [f64; 6] {
    let [n, n2, n3, n4, n5, n6] = *p;
    [
        n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4 - 81.0 / 512.0 * n5
            + 96199.0 / 604800.0 * n6,
        1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
            - 1118711.0 / 3870720.0 * n6,
        17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5 + 5569.0 / 90720.0 * n6,
        4397.0 / 161280.0 * n4 - 11.0 / 504.0 * n5 - 830251.0 / 7257600.0 * n6,
        4583.0 / 161280.0 * n5 - 108847.0 / 3991680.0 * n6,
        20648693.0 / 638668800.0 * n6,
    ]
}

fn normalized_meridional_arc(phi: f64, p: &[f64; 6]) -> f64 {
    let [n, n2, n3, n4, _, _] = *p;
    phi + (-1.5 * n + 9.0 / 16.0 * n3) * (2.0 * phi).sin()
        + (15.0 / 16.0 * n2 - 15.0 / 32.0 * n4) * (4.0 * phi).sin()
        - 35.0 / 48.0 * n3 * (6.0 * phi).sin()
        + 315.0 / 512.0 * n4 * (8.0 * phi).sin()
}

impl Projection for TransverseMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjError> {
        let dlam = lon - self.lon0;
        let tau_prime = self.conformal_tangent(lat.tan());

        let xi_prime = tau_prime.atan2(dlam.cos());
        let eta_prime = (dlam.sin() / tau_prime.hypot(dlam.cos())).asinh();

        let mut xi = xi_prime;
        let mut eta = eta_prime;
        for (j, &a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi += a * (k * xi_prime).sin() * (k * eta_prime).cosh();
            eta += a * (k * xi_prime).cos() * (k * eta_prime).sinh();
        }

        let x = self.k0 * self.a_hat * eta + self.false_easting;
        let y = self.k0 * self.a_hat * (xi - self.xi0) + self.false_northing;
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let eta = (x - self.false_easting) / (self.k0 * self.a_hat);
        let xi = (y - self.false_northing) / (self.k0 * self.a_hat) + self.xi0;

        let mut xi_prime = xi;
        let mut eta_prime = eta;
        for (j, &b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j as f64 + 1.0);
            xi_prime -= b * (k * xi).sin() * (k * eta).cosh();
            eta_prime -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let sinh_eta = eta_prime.sinh();
        let cos_xi = xi_prime.cos();
        let tau_prime = xi_prime.sin() / sinh_eta.hypot(cos_xi);

        let lat = self.geodetic_tangent(tau_prime).atan();
        let lon = self.lon0 + sinh_eta.atan2(cos_xi);
        Ok((lon, lat))
    }

    fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proj::ellipsoid::{GRS80, WGS84};
    use approx::assert_relative_eq;

    #[test]
    fn test_roundtrip_utm33() {
        let tm = TransverseMercator::utm(WGS84, 33, false).unwrap();
        let cases: &[(f64, f64)] = &[(15.0, 52.0), (12.0, 50.0), (18.0, 50.0), (15.0, 0.0), (15.0, 80.0)];
        for &(lon_deg, lat_deg) in cases {
            let lon = lon_deg.to_radians();
            let lat = lat_deg.to_radians();
            let (x, y) = tm.forward(lon, lat).unwrap();
            let (lon2, lat2) = tm.inverse(x, y).unwrap();
            assert_relative_eq!(lon2, lon, epsilon = 1e-9);
            assert_relative_eq!(lat2, lat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_central_meridian_known_point() {
        let tm = TransverseMercator::utm(WGS84, 33, false).unwrap();
        let (e, n) = tm
            .forward(15.0_f64.to_radians(), 52.0_f64.to_radians())
            .unwrap();
        assert_relative_eq!(e, 500_000.0, epsilon = 0.01);
        assert!(n > 5_760_000.0 && n < 5_762_000.0, "northing = {n}");
    }

    #[test]
    fn test_zone_central_meridians() {
        let tm1 = TransverseMercator::utm(WGS84, 1, false).unwrap();
        let tm60 = TransverseMercator::utm(WGS84, 60, false).unwrap();
        assert_relative_eq!(tm1.lon0, (-177.0_f64).to_radians(), epsilon = 1e-10);
        assert_relative_eq!(tm60.lon0, 177.0_f64.to_radians(), epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_zone() {
        assert!(TransverseMercator::utm(WGS84, 0, false).is_err());
        assert!(TransverseMercator::utm(WGS84, 61, true).is_err());
    }

    #[test]
    fn test_southern_hemisphere() {
        let tm = TransverseMercator::utm(GRS80, 33, true).unwrap();
        let lon = 15.0_f64.to_radians();
        let lat = (-30.0_f64).to_radians();
        let (x, y) = tm.forward(lon, lat).unwrap();
        assert!(y > 0.0, "southing should be positive with FN=10M, got {y}");
        let (lon2, lat2) = tm.inverse(x, y).unwrap();
        assert_relative_eq!(lon2, lon, epsilon = 1e-9);
        assert_relative_eq!(lat2, lat, epsilon = 1e-9);
    }

    #[test]
    fn test_nonzero_origin_latitude() {
        let lat0 = 49.0_f64.to_radians();
        let tm = TransverseMercator::new(WGS84, (-2.0_f64).to_radians(), lat0, 0.9996, 0.0, 0.0);
        let (x, y) = tm.forward((-2.0_f64).to_radians(), lat0).unwrap();
        assert_relative_eq!(x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
    }
}
