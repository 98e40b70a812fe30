//! Projection-definition strings.
//!
//! A definition is either a proj4-style parameter list (`+proj=utm +zone=33 ...`) or an
//! opaque user string such as `EPSG:2154` that only `proj4rs` can interpret. Parsing
//! extracts the parameters the native projections understand and the `+axis` setting,
//! which is applied around the projection math rather than inside it.

use crate::error::ProjError;
use crate::proj::axis::Axis;
use crate::proj::ellipsoid::{Ellipsoid, WGS84};
use crate::proj::equirectangular::Equirectangular;
use crate::proj::mercator::WebMercator;
use crate::proj::transverse_mercator::TransverseMercator;
use crate::proj::Projection;

/// Parameters the native projections know how to honor. Anything else sends the
/// definition to `proj4rs`.
const NATIVE_KEYS: &[&str] = &[
    "proj", "ellps", "datum", "a", "b", "rf", "R", "lat_0", "lon_0", "lat_ts", "k", "k_0",
    "x_0", "y_0", "zone", "south", "units", "towgs84", "nadgrids", "axis", "no_defs", "wktext",
    "type", "title",
];

/// A CRS endpoint evaluated without `proj4rs`.
pub enum NativeCrs {
    /// Longitude/latitude in degrees.
    Geographic,
    /// Projected coordinates in metres.
    Projected(Box<dyn Projection>),
}

impl std::fmt::Debug for NativeCrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeCrs::Geographic => f.write_str("Geographic"),
            NativeCrs::Projected(_) => f.write_str("Projected"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    text: String,
    params: Vec<(String, Option<String>)>,
    axis: Axis,
}

impl Definition {
    pub fn parse(text: &str) -> Result<Self, ProjError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ProjError::UnknownCrs("empty definition".into()));
        }
        if !trimmed.starts_with('+') {
            return Ok(Self {
                text: trimmed.to_string(),
                params: Vec::new(),
                axis: Axis::ENU,
            });
        }

        let mut params = Vec::new();
        for token in trimmed.split_whitespace() {
            let token = token.trim_start_matches('+');
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((key, value)) => params.push((key.to_string(), Some(value.to_string()))),
                None => params.push((token.to_string(), None)),
            }
        }

        let axis = match lookup(&params, "axis") {
            Some(Some(spec)) => Axis::parse(spec)?,
            Some(None) => return Err(ProjError::InvalidParameter("axis requires a value".into())),
            None => Axis::ENU,
        };

        Ok(Self {
            text: trimmed.to_string(),
            params,
            axis,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn is_proj_string(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn proj(&self) -> Option<&str> {
        self.value("proj")
    }

    pub fn has(&self, key: &str) -> bool {
        lookup(&self.params, key).is_some()
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        lookup(&self.params, key).flatten()
    }

    pub fn number(&self, key: &str) -> Result<Option<f64>, ProjError> {
        self.value(key)
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|_| ProjError::InvalidParameter(format!("{key}={v}")))
            })
            .transpose()
    }

    fn angle(&self, key: &str) -> Result<f64, ProjError> {
        Ok(self.number(key)?.unwrap_or(0.0).to_radians())
    }

    /// The definition handed to `proj4rs`, with `+axis` removed since the pipeline
    /// applies it.
    pub fn backend_string(&self) -> String {
        if !self.is_proj_string() {
            return self.text.clone();
        }
        self.params
            .iter()
            .filter(|(key, _)| key != "axis")
            .map(|(key, value)| match value {
                Some(v) => format!("+{key}={v}"),
                None => format!("+{key}"),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build a native endpoint if this definition is fully covered by the native
    /// projections. `Ok(None)` means "use proj4rs".
    pub fn native(&self) -> Result<Option<NativeCrs>, ProjError> {
        if !self.is_proj_string() {
            return Ok(parse_epsg(&self.text));
        }
        if self.params.iter().any(|(key, _)| !NATIVE_KEYS.contains(&key.as_str())) {
            return Ok(None);
        }
        if !self.is_wgs84_compatible()? {
            return Ok(None);
        }
        if let Some(units) = self.value("units") {
            if units != "m" {
                return Ok(None);
            }
        }
        let Some(ellipsoid) = self.ellipsoid()? else {
            return Ok(None);
        };

        let endpoint = match self.proj() {
            Some("longlat" | "latlong" | "lonlat" | "latlon") => NativeCrs::Geographic,
            Some("merc") => {
                let k = self.number("k")?.or(self.number("k_0")?).unwrap_or(1.0);
                if !ellipsoid.is_sphere() || self.angle("lat_ts")? != 0.0 || k != 1.0 {
                    return Ok(None);
                }
                NativeCrs::Projected(Box::new(WebMercator::with_params(
                    ellipsoid.a,
                    self.angle("lon_0")?,
                    self.number("x_0")?.unwrap_or(0.0),
                    self.number("y_0")?.unwrap_or(0.0),
                )))
            }
            Some("utm") => {
                let zone = self
                    .value("zone")
                    .ok_or_else(|| ProjError::InvalidParameter("utm requires +zone".into()))?;
                let zone = zone
                    .parse::<u8>()
                    .map_err(|_| ProjError::InvalidParameter(format!("zone={zone}")))?;
                NativeCrs::Projected(Box::new(TransverseMercator::utm(
                    ellipsoid,
                    zone,
                    self.has("south"),
                )?))
            }
            Some("tmerc") => NativeCrs::Projected(Box::new(TransverseMercator::new(
                ellipsoid,
                self.angle("lon_0")?,
                self.angle("lat_0")?,
                self.number("k")?.or(self.number("k_0")?).unwrap_or(1.0),
                self.number("x_0")?.unwrap_or(0.0),
                self.number("y_0")?.unwrap_or(0.0),
            ))),
            Some("eqc") => NativeCrs::Projected(Box::new(Equirectangular::new(
                ellipsoid,
                self.angle("lon_0")?,
                self.angle("lat_0")?,
                self.angle("lat_ts")?,
                self.number("x_0")?.unwrap_or(0.0),
                self.number("y_0")?.unwrap_or(0.0),
            )?)),
            _ => return Ok(None),
        };
        Ok(Some(endpoint))
    }

    /// Native math has no datum shifts, so it only applies to definitions that sit on
    /// WGS84 (or a datum proj treats as coincident with it).
    fn is_wgs84_compatible(&self) -> Result<bool, ProjError> {
        if let Some(datum) = self.value("datum") {
            if !matches!(datum.to_ascii_uppercase().as_str(), "WGS84" | "NAD83") {
                return Ok(false);
            }
        }
        if let Some(grids) = self.value("nadgrids") {
            if grids != "@null" {
                return Ok(false);
            }
        }
        if let Some(towgs84) = self.value("towgs84") {
            for term in towgs84.split(',') {
                let v = term
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ProjError::InvalidParameter(format!("towgs84={towgs84}")))?;
                if v != 0.0 {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// `Ok(None)` for an ellipsoid the native math does not know.
    fn ellipsoid(&self) -> Result<Option<Ellipsoid>, ProjError> {
        if let Some(r) = self.number("R")? {
            return Ok(Some(Ellipsoid::sphere(r)));
        }
        if let Some(a) = self.number("a")? {
            if let Some(b) = self.number("b")? {
                return Ok(Some(Ellipsoid::from_axes(a, b)));
            }
            if let Some(rf) = self.number("rf")? {
                return Ok(Some(Ellipsoid::new(a, 1.0 / rf)));
            }
            return Ok(None);
        }
        match self.value("ellps") {
            Some(name) => Ok(Ellipsoid::named(name)),
            None => Ok(Some(WGS84)),
        }
    }
}

fn lookup<'a>(params: &'a [(String, Option<String>)], key: &str) -> Option<Option<&'a str>> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_deref())
}

/// Native endpoints for bare EPSG codes that never went through the registry.
fn parse_epsg(crs: &str) -> Option<NativeCrs> {
    let (authority, code) = crs.split_once(':')?;
    if !authority.trim().eq_ignore_ascii_case("EPSG") {
        return None;
    }
    let code = code.trim().parse::<u32>().ok()?;

    match code {
        4326 => Some(NativeCrs::Geographic),
        3857 => Some(NativeCrs::Projected(Box::new(WebMercator::new()))),
        32601..=32660 => TransverseMercator::utm(WGS84, (code - 32600) as u8, false)
            .ok()
            .map(|tm| NativeCrs::Projected(Box::new(tm))),
        32701..=32760 => TransverseMercator::utm(WGS84, (code - 32700) as u8, true)
            .ok()
            .map(|tm| NativeCrs::Projected(Box::new(tm))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let def = Definition::parse("+proj=utm +zone=33 +south +datum=WGS84 +units=m").unwrap();
        assert!(def.is_proj_string());
        assert_eq!(def.proj(), Some("utm"));
        assert_eq!(def.value("zone"), Some("33"));
        assert!(def.has("south"));
        assert_eq!(def.value("south"), None);
        assert_eq!(def.number("zone").unwrap(), Some(33.0));
    }

    #[test]
    fn test_axis_is_extracted() {
        let def = Definition::parse("+proj=longlat +axis=esu").unwrap();
        assert_eq!(def.axis(), Axis::parse("esu").unwrap());
        assert_eq!(def.backend_string(), "+proj=longlat");
    }

    #[test]
    fn test_invalid_axis() {
        assert!(Definition::parse("+proj=longlat +axis=xyz").is_err());
    }

    #[test]
    fn test_user_string_passthrough() {
        let def = Definition::parse("EPSG:2154").unwrap();
        assert!(!def.is_proj_string());
        assert_eq!(def.backend_string(), "EPSG:2154");
        assert!(def.native().unwrap().is_none());
    }

    #[test]
    fn test_native_endpoints() {
        let cases = [
            ("+proj=longlat +datum=WGS84 +no_defs", true),
            ("+proj=longlat +datum=NAD83 +no_defs", true),
            (
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 \
                 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs",
                true,
            ),
            ("+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs", true),
            (
                "+proj=eqc +ellps=GRS80 +lat_0=0 +lat_ts=5 +lon_0=0 +no_defs \
                 +towgs84=0,0,0,0,0,0,0 +units=m +x_0=0 +y_0=0",
                true,
            ),
            ("EPSG:4326", true),
            ("EPSG:32633", true),
            ("+proj=merc +ellps=WGS84 +lat_ts=33", false),
            (
                "+proj=merc +datum=WGS84 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 \
                 +units=m +nadgrids=@null +no_defs",
                false,
            ),
            ("+proj=lcc +lat_1=33 +lat_2=45 +lon_0=-97", false),
            ("+proj=longlat +ellps=clrk66 +datum=NAD27", false),
            ("+proj=utm +zone=33 +units=us-ft", false),
            ("+proj=longlat +towgs84=1,2,3", false),
        ];
        for (text, native) in cases {
            let def = Definition::parse(text).unwrap();
            assert_eq!(def.native().unwrap().is_some(), native, "{text}");
        }
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let def = Definition::parse("+proj=tmerc +lon_0=abc").unwrap();
        assert!(def.native().is_err());
        let def = Definition::parse("+proj=utm").unwrap();
        assert!(def.native().is_err());
    }
}
