//! NetCDF catalog backed by the `netcdf` crate.
//!
//! Metadata is read once when the file is opened; array data is read on
//! demand, keeping the storage kind of each variable.

use super::VariableCatalog;
use crate::constants;
use crate::error::{Result, TrajectoryError};
use crate::models::{ArrayData, AttributeValue, Dimension, VariableInfo};
use ::netcdf::types::{FloatType, NcVariableType};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub struct NetcdfCatalog {
    location: String,
    file: ::netcdf::File,
    global_attributes: BTreeMap<String, AttributeValue>,
    variables: Vec<VariableInfo>,
}

impl NetcdfCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = ::netcdf::open(path)?;

        let global_attributes = file
            .attributes()
            .filter_map(|attr| {
                let name = attr.name().to_string();
                attr.value().ok().and_then(convert_attribute).map(|v| (name, v))
            })
            .collect();

        let variables: Vec<VariableInfo> = file
            .variables()
            .map(|var| VariableInfo {
                name: var.name(),
                dimensions: var
                    .dimensions()
                    .iter()
                    .map(|dim| Dimension::new(dim.name(), dim.len()))
                    .collect(),
                attributes: var
                    .attributes()
                    .filter_map(|attr| {
                        let name = attr.name().to_string();
                        attr.value().ok().and_then(convert_attribute).map(|v| (name, v))
                    })
                    .collect(),
            })
            .collect();

        debug!(
            "Opened {} with {} variables",
            path.display(),
            variables.len()
        );

        Ok(Self {
            location: path.display().to_string(),
            file,
            global_attributes,
            variables,
        })
    }
}

impl VariableCatalog for NetcdfCatalog {
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
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| TrajectoryError::VariableNotFound {
                name: name.to_string(),
            })?;

        let data = match var.vartype() {
            NcVariableType::Float(FloatType::F32) => ArrayData::Float(var.get_values::<f32, _>(..)?),
            NcVariableType::Float(FloatType::F64) => ArrayData::Double(var.get_values::<f64, _>(..)?),
            NcVariableType::Int(_) => ArrayData::Int(var.get_values::<i64, _>(..)?),
            other => {
                return Err(TrajectoryError::UnsupportedInput {
                    path: self.location.clone().into(),
                    reason: format!("variable {} has non-numeric type {:?}", name, other),
                });
            }
        };

        let Some(info) = self.variable(name) else {
            return Ok(data);
        };
        let number = |key: &str| info.attribute(key).and_then(|v| v.as_f64());
        let (scale, offset) = (number(constants::SCALE_FACTOR), number(constants::ADD_OFFSET));
        if scale.is_some() || offset.is_some() {
            debug!("Unpacking {} (scale {:?}, offset {:?})", name, scale, offset);
        }
        Ok(data.unpack(scale, offset, info.fill_value()))
    }
}

fn convert_attribute(value: ::netcdf::AttributeValue) -> Option<AttributeValue> {
    use ::netcdf::AttributeValue as Nc;

    let converted = match value {
        Nc::Str(text) => AttributeValue::Text(text),
        Nc::Strs(texts) => AttributeValue::Text(texts.join(" ")),
        Nc::Doubles(values) => AttributeValue::Numbers(values),
        Nc::Floats(values) => AttributeValue::Numbers(values.into_iter().map(f64::from).collect()),
        Nc::Ints(values) => AttributeValue::Numbers(values.into_iter().map(f64::from).collect()),
        Nc::Shorts(values) => AttributeValue::Numbers(values.into_iter().map(f64::from).collect()),
        Nc::Schars(values) => AttributeValue::Numbers(values.into_iter().map(f64::from).collect()),
        Nc::Uchars(values) => AttributeValue::Numbers(values.into_iter().map(f64::from).collect()),
        other => match f64::try_from(other) {
            Ok(number) => AttributeValue::Number(number),
            Err(e) => {
                warn!("Skipping attribute with unsupported type: {}", e);
                return None;
            }
        },
    };
    Some(converted)
}
