//! Coordinate batches and the normalizer.
//!
//! Callers hand over points in one of four shapes; [`normalize`] flattens any of them
//! into a canonical point sequence plus a [`Shape`] tag, and [`denormalize`] rebuilds
//! the caller's shape from transformed points. Dynamic input (`serde_json::Value`) is
//! classified into a [`CoordinateBatch`] once, by [`CoordinateBatch::from_value`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoordinateError;

/// A single point. `z` is optional and its absence survives a round trip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    pub(crate) fn triple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z.unwrap_or(0.0))
    }

    /// Write a transformed triple back, keeping `z` absent if it was absent.
    pub(crate) fn set_triple(&mut self, (x, y, z): (f64, f64, f64)) {
        self.x = x;
        self.y = y;
        if self.z.is_some() {
            self.z = Some(z);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CoordinateBatch {
    Record(Coordinate),
    Records(Vec<Coordinate>),
    /// Interleaved values, two or three per point. `components` may be omitted when
    /// the sequence holds exactly one point.
    Flat {
        values: Vec<f64>,
        components: Option<usize>,
    },
    /// One inner sequence of length two or three per point.
    Nested(Vec<Vec<f64>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    ScalarRecord,
    RecordSequence,
    FlatNumeric {
        components: usize,
        /// Whether the caller spelled out the component count.
        declared: bool,
    },
    NestedNumeric,
}

/// Canonical form: one [`Coordinate`] per point, `z` present exactly where the
/// input carried a third component.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub points: Vec<Coordinate>,
    pub shape: Shape,
}

impl Normalized {
    pub fn has_nonzero_z(&self) -> bool {
        self.points.iter().any(|p| p.z.is_some_and(|z| z != 0.0))
    }
}

pub fn normalize(batch: &CoordinateBatch) -> Result<Normalized, CoordinateError> {
    let normalized = match batch {
        CoordinateBatch::Record(c) => Normalized {
            points: vec![*c],
            shape: Shape::ScalarRecord,
        },
        CoordinateBatch::Records(records) => Normalized {
            points: records.clone(),
            shape: Shape::RecordSequence,
        },
        CoordinateBatch::Flat { values, components } => {
            let count = match *components {
                Some(c @ (2 | 3)) => c,
                Some(c) => return Err(CoordinateError::ComponentCount(c)),
                None => match values.len() {
                    n @ (2 | 3) => n,
                    _ => return Err(CoordinateError::Invalid),
                },
            };
            if values.len() % count != 0 {
                return Err(CoordinateError::Invalid);
            }
            let points = values
                .chunks_exact(count)
                .map(|chunk| Coordinate {
                    x: chunk[0],
                    y: chunk[1],
                    z: chunk.get(2).copied(),
                })
                .collect();
            Normalized {
                points,
                shape: Shape::FlatNumeric {
                    components: count,
                    declared: components.is_some(),
                },
            }
        }
        CoordinateBatch::Nested(items) => {
            let points = items
                .iter()
                .map(|item| match item.as_slice() {
                    [x, y] => Ok(Coordinate::new(*x, *y)),
                    [x, y, z] => Ok(Coordinate::with_z(*x, *y, *z)),
                    _ => Err(CoordinateError::ComponentsPerElement),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Normalized {
                points,
                shape: Shape::NestedNumeric,
            }
        }
    };
    Ok(normalized)
}

pub fn denormalize(normalized: Normalized) -> CoordinateBatch {
    let Normalized { points, shape } = normalized;
    match shape {
        Shape::ScalarRecord => match points.first() {
            Some(c) => CoordinateBatch::Record(*c),
            None => CoordinateBatch::Records(points),
        },
        Shape::RecordSequence => CoordinateBatch::Records(points),
        Shape::FlatNumeric {
            components,
            declared,
        } => {
            let mut values = Vec::with_capacity(points.len() * components);
            for p in &points {
                values.push(p.x);
                values.push(p.y);
                if components == 3 {
                    values.push(p.z.unwrap_or(0.0));
                }
            }
            CoordinateBatch::Flat {
                values,
                components: declared.then_some(components),
            }
        }
        Shape::NestedNumeric => CoordinateBatch::Nested(
            points
                .iter()
                .map(|p| match p.z {
                    Some(z) => vec![p.x, p.y, z],
                    None => vec![p.x, p.y],
                })
                .collect(),
        ),
    }
}

impl CoordinateBatch {
    /// Classify dynamic input.
    ///
    /// Objects become records (numeric `x` and `y` required); arrays become records,
    /// nested or flat numeric sequences depending on what every element is. Component
    /// counts are checked later by [`normalize`].
    pub fn from_value(value: &Value, components: Option<usize>) -> Result<Self, CoordinateError> {
        match value {
            Value::Object(map) => record_from_map(map)
                .map(CoordinateBatch::Record)
                .ok_or(CoordinateError::NotValid),
            Value::Array(items) => from_array(items, components),
            _ => Err(CoordinateError::NotValid),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            CoordinateBatch::Record(c) => record_value(c),
            CoordinateBatch::Records(records) => {
                Value::Array(records.iter().map(record_value).collect())
            }
            CoordinateBatch::Flat { values, .. } => Value::from(values.clone()),
            CoordinateBatch::Nested(items) => {
                Value::Array(items.iter().map(|item| Value::from(item.clone())).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CoordinateBatch::Record(_) => 1,
            CoordinateBatch::Records(records) => records.len(),
            // Zero for a buffer `normalize` would reject.
            CoordinateBatch::Flat { values, components } => {
                let count = match *components {
                    Some(c @ (2 | 3)) => c,
                    None if matches!(values.len(), 2 | 3) => values.len(),
                    _ => return 0,
                };
                if values.len() % count == 0 {
                    values.len() / count
                } else {
                    0
                }
            }
            CoordinateBatch::Nested(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn from_array(items: &[Value], components: Option<usize>) -> Result<CoordinateBatch, CoordinateError> {
    if items.iter().all(Value::is_number) {
        return Ok(CoordinateBatch::Flat {
            values: items.iter().filter_map(Value::as_f64).collect(),
            components,
        });
    }
    if items.iter().all(Value::is_object) {
        let records = items
            .iter()
            .map(|item| item.as_object().and_then(record_from_map))
            .collect::<Option<Vec<_>>>()
            .ok_or(CoordinateError::Invalid)?;
        return Ok(CoordinateBatch::Records(records));
    }
    if items.iter().all(Value::is_array) {
        let nested = items
            .iter()
            .map(|item| {
                item.as_array()?
                    .iter()
                    .map(Value::as_f64)
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()
            .ok_or(CoordinateError::Invalid)?;
        return Ok(CoordinateBatch::Nested(nested));
    }
    Err(CoordinateError::Invalid)
}

fn record_from_map(map: &Map<String, Value>) -> Option<Coordinate> {
    let x = map.get("x")?.as_f64()?;
    let y = map.get("y")?.as_f64()?;
    let z = match map.get("z") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.as_f64()?),
    };
    Some(Coordinate { x, y, z })
}

fn record_value(c: &Coordinate) -> Value {
    let mut map = Map::new();
    map.insert("x".into(), Value::from(c.x));
    map.insert("y".into(), Value::from(c.y));
    if let Some(z) = c.z {
        map.insert("z".into(), Value::from(z));
    }
    Value::Object(map)
}
