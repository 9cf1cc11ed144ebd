//! In-memory catalog, built programmatically or loaded from a JSON dataset.
//!
//! The JSON layout mirrors a NetCDF header plus data:
//!
//! ```json
//! {
//!   "attributes": { "title": "Glider sl011", "featureType": "trajectory" },
//!   "dimensions": { "time": 3 },
//!   "variables": [
//!     { "name": "time", "dimensions": ["time"], "type": "double",
//!       "attributes": { "units": "seconds since 1970-01-01 00:00:00" },
//!       "values": [0, 60, 120] }
//!   ]
//! }
//! ```
//!
//! `null` values are read as NaN. Variables keep the order they are listed in.

use super::VariableCatalog;
use crate::error::{Result, TrajectoryError};
use crate::models::{ArrayData, AttributeValue, Dimension, VariableInfo};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// A variable together with its data, used to build a [`MemoryCatalog`]
#[derive(Debug, Clone)]
pub struct MemoryVariable {
    info: VariableInfo,
    data: ArrayData,
}

impl MemoryVariable {
    pub fn new(name: &str, dimensions: &[(&str, usize)], data: ArrayData) -> Self {
        Self {
            info: VariableInfo {
                name: name.to_string(),
                dimensions: dimensions
                    .iter()
                    .map(|(dim, len)| Dimension::new(*dim, *len))
                    .collect(),
                attributes: BTreeMap::new(),
            },
            data,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.info.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn info(&self) -> &VariableInfo {
        &self.info
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    location: String,
    global_attributes: BTreeMap<String, AttributeValue>,
    variables: Vec<VariableInfo>,
    data: HashMap<String, ArrayData>,
}

impl MemoryCatalog {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn with_global_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.global_attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn remove_global_attribute(&mut self, name: &str) -> Option<AttributeValue> {
        self.global_attributes.remove(name)
    }

    /// Add a variable; a variable of the same name is replaced in place
    pub fn with_variable(mut self, variable: MemoryVariable) -> Self {
        let MemoryVariable { info, data } = variable;
        self.data.insert(info.name.clone(), data);
        match self.variables.iter_mut().find(|v| v.name == info.name) {
            Some(existing) => *existing = info,
            None => self.variables.push(info),
        }
        self
    }

    /// Set an attribute on an existing variable; unknown variables are ignored
    pub fn with_variable_attribute(
        mut self,
        variable: &str,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        if let Some(info) = self.variables.iter_mut().find(|v| v.name == variable) {
            info.attributes.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content, path.display().to_string())
    }

    pub fn from_json_str(content: &str, location: impl Into<String>) -> Result<Self> {
        let document: JsonDataset = serde_json::from_str(content)?;
        let mut catalog = Self::new(location);
        catalog.global_attributes = document.attributes;

        for variable in document.variables {
            let dimensions = variable
                .dimensions
                .iter()
                .map(|dim| {
                    document
                        .dimensions
                        .get(dim)
                        .map(|len| (dim.as_str(), *len))
                        .ok_or_else(|| {
                            TrajectoryError::configuration(format!(
                                "Variable {} uses undeclared dimension '{}'",
                                variable.name, dim
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            let expected: usize = dimensions.iter().map(|(_, len)| len).product();
            if variable.values.len() != expected {
                return Err(TrajectoryError::configuration(format!(
                    "Variable {} has {} values but its dimensions hold {}",
                    variable.name,
                    variable.values.len(),
                    expected
                )));
            }

            let data = variable.kind.to_array(&variable.name, &variable.values)?;
            let mut entry = MemoryVariable::new(&variable.name, &dimensions, data);
            entry.info.attributes = variable.attributes;
            catalog = catalog.with_variable(entry);
        }

        debug!(
            "Loaded {} variables from {}",
            catalog.variables.len(),
            catalog.location
        );
        Ok(catalog)
    }
}

impl VariableCatalog for MemoryCatalog {
    fn location(&self) -> &str {
        &self.location
    }

    fn global_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.global_attributes.get(name)
    }

    fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    fn read(&self, name: &str) -> Result<ArrayData> {
        self.data
            .get(name)
            .cloned()
            .ok_or_else(|| TrajectoryError::VariableNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct JsonDataset {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    dimensions: BTreeMap<String, usize>,
    #[serde(default)]
    variables: Vec<JsonVariable>,
}

#[derive(Debug, Deserialize)]
struct JsonVariable {
    name: String,
    #[serde(default)]
    dimensions: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, rename = "type")]
    kind: JsonKind,
    values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum JsonKind {
    Int,
    Float,
    #[default]
    Double,
}

impl JsonKind {
    fn to_array(self, name: &str, values: &[Option<f64>]) -> Result<ArrayData> {
        Ok(match self {
            JsonKind::Int => ArrayData::Int(
                values
                    .iter()
                    .map(|v| match v {
                        Some(v) if v.fract() == 0.0 => Ok(*v as i64),
                        _ => Err(TrajectoryError::configuration(format!(
                            "Integer variable {} holds a non-integer value",
                            name
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            JsonKind::Float => ArrayData::Float(
                values
                    .iter()
                    .map(|v| v.map_or(f32::NAN, |v| v as f32))
                    .collect(),
            ),
            JsonKind::Double => {
                ArrayData::Double(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            }
        })
    }
}
