//! Core data structures and types for trajectory conversion.
//!
//! Defines the catalog-side view of a dataset (dimensions, attributes,
//! typed array data), the variable shapes the extractor understands, and
//! the track points handed to the renderers.

use crate::error::{Result, TrajectoryError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A single array element, kept in its storage kind so it prints the way
/// it was written (`39.2` for a float, `3` for a byte flag)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f32),
    Double(f64),
}

impl Scalar {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v as f64,
            Scalar::Double(v) => v,
        }
    }

    pub fn is_nan(&self) -> bool {
        match *self {
            Scalar::Int(_) => false,
            Scalar::Float(v) => v.is_nan(),
            Scalar::Double(v) => v.is_nan(),
        }
    }

    pub fn abs(&self) -> Scalar {
        match *self {
            Scalar::Int(v) => Scalar::Int(v.abs()),
            Scalar::Float(v) => Scalar::Float(v.abs()),
            Scalar::Double(v) => Scalar::Double(v.abs()),
        }
    }

    /// Compare against a declared fill value in the precision of the storage kind
    pub fn equals_fill(&self, fill: f64) -> bool {
        match *self {
            Scalar::Int(v) => fill.fract() == 0.0 && v as f64 == fill,
            Scalar::Float(v) => v == fill as f32,
            Scalar::Double(v) => v == fill,
        }
    }
}

/// Whole floating point values keep one decimal (`14.0`)
fn write_float(f: &mut fmt::Formatter<'_>, value: f64, shortest: &dyn fmt::Display) -> fmt::Result {
    if value.is_finite() && value.fract() == 0.0 {
        write!(f, "{:.1}", value)
    } else {
        write!(f, "{}", shortest)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write_float(f, *v as f64, v),
            Scalar::Double(v) => write_float(f, *v, v),
        }
    }
}

/// Flattened (row-major) contents of a variable
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Int(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int(values) => values.len(),
            ArrayData::Float(values) => values.len(),
            ArrayData::Double(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            ArrayData::Int(values) => values.get(index).map(|&v| Scalar::Int(v)),
            ArrayData::Float(values) => values.get(index).map(|&v| Scalar::Float(v)),
            ArrayData::Double(values) => values.get(index).map(|&v| Scalar::Double(v)),
        }
    }

    /// Integer view used for quality control flags. NaN flags become
    /// `i32::MAX` so they never count as good data.
    pub fn to_codes(&self) -> Vec<i32> {
        let code = |v: f64| {
            if v.is_nan() {
                i32::MAX
            } else {
                v.clamp(i32::MIN as f64, i32::MAX as f64) as i32
            }
        };
        match self {
            ArrayData::Int(values) => values
                .iter()
                .map(|&v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
                .collect(),
            ArrayData::Float(values) => values.iter().map(|&v| code(v as f64)).collect(),
            ArrayData::Double(values) => values.iter().map(|&v| code(v)).collect(),
        }
    }

    /// Apply CF packing (`value * scale_factor + add_offset`). Raw fill
    /// values become NaN so they stay missing after unpacking.
    pub fn unpack(self, scale: Option<f64>, offset: Option<f64>, fill: Option<f64>) -> ArrayData {
        if scale.is_none() && offset.is_none() {
            return self;
        }
        let scale = scale.unwrap_or(1.0);
        let offset = offset.unwrap_or(0.0);

        let values = (0..self.len())
            .filter_map(|i| self.get(i))
            .map(|raw| {
                if raw.is_nan() || fill.is_some_and(|f| raw.equals_fill(f)) {
                    f64::NAN
                } else {
                    raw.as_f64() * scale + offset
                }
            })
            .collect();
        ArrayData::Double(values)
    }
}

/// Attribute value as found in the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(value) => Some(*value),
            AttributeValue::Numbers(values) => values.first().copied(),
            AttributeValue::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Attributes with no content, like an empty `ancillary_variables`
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Number(_) => false,
            AttributeValue::Numbers(values) => values.is_empty(),
            AttributeValue::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(values: Vec<f64>) -> Self {
        AttributeValue::Numbers(values)
    }
}

/// Named dimension of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

/// Variable metadata: name, dimensions and attributes
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl VariableInfo {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.len).collect()
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Trimmed text attribute
    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| v.as_str()).map(str::trim)
    }

    pub fn units(&self) -> Option<&str> {
        self.text_attribute(crate::constants::UNITS)
    }

    /// `_FillValue`, or `missing_value` when no fill value is declared
    pub fn fill_value(&self) -> Option<f64> {
        self.attribute(crate::constants::FILL_VALUE)
            .or_else(|| self.attribute(crate::constants::MISSING_VALUE))
            .and_then(|v| v.as_f64())
    }

    /// True for a 1-D variable named after its own dimension
    pub fn is_dimension_coordinate(&self) -> bool {
        self.dimensions.len() == 1 && self.dimensions[0].name == self.name
    }
}

/// Shapes a displayable variable can take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `var(time)`
    TimeOnly { len: usize },
    /// `var(time, level)`, displayed at level 0
    TimeByLevel { times: usize, levels: usize },
}

impl Shape {
    pub fn from_dimensions(name: &str, dimensions: &[usize]) -> Result<Self> {
        match *dimensions {
            [len] => Ok(Shape::TimeOnly { len }),
            [times, levels] => Ok(Shape::TimeByLevel { times, levels }),
            _ => Err(TrajectoryError::UnsupportedShape {
                name: name.to_string(),
                dimensions: dimensions.len(),
            }),
        }
    }

    /// Number of time steps
    pub fn times(&self) -> usize {
        match *self {
            Shape::TimeOnly { len } => len,
            Shape::TimeByLevel { times, .. } => times,
        }
    }

    /// Flat offset of `(time_index, level 0)`
    pub fn flat_index(&self, time_index: usize) -> usize {
        match *self {
            Shape::TimeOnly { .. } => time_index,
            Shape::TimeByLevel { levels, .. } => time_index * levels,
        }
    }
}

/// Where a track point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PointSource {
    /// Caller-supplied deployment position
    Deployment,
    /// Accepted sample of the dataset
    Sample { index: usize },
}

/// Visual role of a point in the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Start,
    Regular,
    End,
}

impl Marker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Marker::Start => "start",
            Marker::Regular => "regular",
            Marker::End => "end",
        }
    }
}

/// One displayed variable of a track point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayField {
    pub name: String,
    pub value: String,
}

/// An accepted, annotated point of the trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub source: PointSource,
    pub begin: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub latitude: Scalar,
    pub longitude: Scalar,
    pub fields: Vec<DisplayField>,
    pub marker: Marker,
}

impl TrackPoint {
    /// `(lon, lat)` in KML coordinate order
    pub fn coordinate(&self) -> (f64, f64) {
        (self.longitude.as_f64(), self.latitude.as_f64())
    }

    pub fn time_index(&self) -> Option<usize> {
        match self.source {
            PointSource::Sample { index } => Some(index),
            PointSource::Deployment => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Extraction result: marked points plus the connecting path
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub title: String,
    pub points: Vec<TrackPoint>,
    /// `(lon, lat)` of every point, in point order
    pub path: Vec<(Scalar, Scalar)>,
}

impl Trajectory {
    /// Points taken from the dataset, excluding a deployment point
    pub fn sample_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| matches!(p.source, PointSource::Sample { .. }))
            .count()
    }
}

/// Conversion statistics
#[derive(Debug, Default)]
pub struct ConversionStats {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub parquet_path: Option<PathBuf>,
    pub points_written: usize,
    pub variables_displayed: usize,
    pub processing_time_ms: u128,
}
