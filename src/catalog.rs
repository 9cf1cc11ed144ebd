//! Dataset access and coordinate discovery.
//!
//! [`VariableCatalog`] is the read-only view of a labeled scientific
//! dataset the converter works from. Opening a catalog and validating it
//! are separate steps: [`open_catalog`] only acquires the dataset, then
//! [`CoordinateAxes::discover`] and [`validate_dataset`] check it before
//! anything is extracted. Dropping the catalog releases the dataset.

pub mod memory;
#[cfg(feature = "netcdf")]
pub mod nc;

use crate::constants::{self, axis_values, standard_names};
use crate::error::{Result, TrajectoryError};
use crate::models::{ArrayData, AttributeValue, VariableInfo};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

pub use memory::{MemoryCatalog, MemoryVariable};
#[cfg(feature = "netcdf")]
pub use nc::NetcdfCatalog;

/// Read-only access to the variables of a dataset
pub trait VariableCatalog {
    /// Path or URL the dataset was opened from
    fn location(&self) -> &str;

    fn global_attribute(&self, name: &str) -> Option<&AttributeValue>;

    /// All variables, in file order
    fn variables(&self) -> &[VariableInfo];

    fn variable(&self, name: &str) -> Option<&VariableInfo> {
        self.variables().iter().find(|v| v.name == name)
    }

    /// Read the whole array of a variable
    fn read(&self, name: &str) -> Result<ArrayData>;
}

/// Open a dataset, choosing the reader from the file extension
pub fn open_catalog(path: &Path) -> Result<Box<dyn VariableCatalog>> {
    if !path.exists() {
        return Err(TrajectoryError::DatasetNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if extension == constants::JSON_EXTENSION {
        debug!("Opening JSON dataset {}", path.display());
        return Ok(Box::new(MemoryCatalog::from_json_file(path)?));
    }

    if constants::NETCDF_EXTENSIONS.contains(&extension.as_str()) {
        return open_netcdf(path);
    }

    Err(TrajectoryError::UnsupportedInput {
        path: path.to_path_buf(),
        reason: format!("unknown extension '{}'", extension),
    })
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Box<dyn VariableCatalog>> {
    debug!("Opening NetCDF dataset {}", path.display());
    Ok(Box::new(NetcdfCatalog::open(path)?))
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(path: &Path) -> Result<Box<dyn VariableCatalog>> {
    Err(TrajectoryError::UnsupportedInput {
        path: path.to_path_buf(),
        reason: "NetCDF support requires building with the `netcdf` feature".to_string(),
    })
}

/// Role of a coordinate variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AxisRole {
    Time,
    Latitude,
    Longitude,
    Height,
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AxisRole::Time => "time",
            AxisRole::Latitude => "latitude",
            AxisRole::Longitude => "longitude",
            AxisRole::Height => "height",
        };
        write!(f, "{}", name)
    }
}

/// Coordinate role of a variable according to CF conventions
pub fn axis_role(info: &VariableInfo) -> Option<AxisRole> {
    if let Some(axis) = info.text_attribute(constants::AXIS) {
        match axis.to_uppercase().as_str() {
            axis_values::TIME => return Some(AxisRole::Time),
            axis_values::LATITUDE => return Some(AxisRole::Latitude),
            axis_values::LONGITUDE => return Some(AxisRole::Longitude),
            axis_values::LEVEL => return Some(AxisRole::Height),
            _ => {}
        }
    }

    if let Some(standard_name) = info.text_attribute(constants::STANDARD_NAME) {
        match standard_name {
            standard_names::TIME => return Some(AxisRole::Time),
            standard_names::LATITUDE => return Some(AxisRole::Latitude),
            standard_names::LONGITUDE => return Some(AxisRole::Longitude),
            standard_names::DEPTH | standard_names::ALTITUDE | standard_names::HEIGHT => {
                return Some(AxisRole::Height);
            }
            _ => {}
        }
    }

    if let Some(units) = info.units() {
        if constants::LATITUDE_UNITS.contains(&units) {
            return Some(AxisRole::Latitude);
        }
        if constants::LONGITUDE_UNITS.contains(&units) {
            return Some(AxisRole::Longitude);
        }
        if units.to_lowercase().contains(" since ") {
            return Some(AxisRole::Time);
        }
    }

    if info.has_attribute(constants::POSITIVE) {
        return Some(AxisRole::Height);
    }

    None
}

/// Names listed in a `coordinates` attribute
pub fn coordinate_names(info: &VariableInfo) -> Vec<&str> {
    info.text_attribute(constants::COORDINATES)
        .map(|names| names.split_whitespace().collect())
        .unwrap_or_default()
}

/// The coordinate axes of a dataset, at most one per role
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoordinateAxes {
    axes: BTreeMap<AxisRole, String>,
}

impl CoordinateAxes {
    /// Find the coordinate axes. Candidates are the variables referenced by a
    /// `coordinates` attribute, dimension coordinates and variables carrying
    /// an `axis` attribute. Two variables with the same role are an error.
    pub fn discover(catalog: &dyn VariableCatalog) -> Result<Self> {
        let referenced: Vec<&str> = catalog
            .variables()
            .iter()
            .flat_map(coordinate_names)
            .collect();

        let mut axes: BTreeMap<AxisRole, String> = BTreeMap::new();
        for info in catalog.variables() {
            let is_candidate = referenced.contains(&info.name.as_str())
                || info.is_dimension_coordinate()
                || info.has_attribute(constants::AXIS);
            if !is_candidate {
                continue;
            }
            let Some(role) = axis_role(info) else {
                continue;
            };
            if let Some(first) = axes.get(&role) {
                return Err(TrajectoryError::DuplicateCoordinate {
                    role: role.to_string(),
                    first: first.clone(),
                    second: info.name.clone(),
                });
            }
            debug!("Coordinate axis {}: {}", role, info.name);
            axes.insert(role, info.name.clone());
        }

        Ok(Self { axes })
    }

    pub fn get(&self, role: AxisRole) -> Option<&str> {
        self.axes.get(&role).map(String::as_str)
    }

    pub fn require(&self, role: AxisRole) -> Result<&str> {
        self.get(role).ok_or_else(|| TrajectoryError::MissingCoordinate {
            role: role.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.axes.values().any(|axis| axis == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AxisRole, &str)> {
        self.axes.iter().map(|(role, name)| (*role, name.as_str()))
    }
}

/// Check the dataset is a single trajectory the extractor can walk.
///
/// A missing or unexpected `featureType` is only a warning; a missing or
/// multi-dimensional time coordinate and missing positions are fatal.
pub fn validate_dataset(catalog: &dyn VariableCatalog, axes: &CoordinateAxes) -> Result<()> {
    match catalog
        .global_attribute(constants::FEATURE_TYPE)
        .and_then(|v| v.as_str())
        .map(str::trim)
    {
        None => warn!(
            "The dataset {} doesn't have the {} global attribute",
            catalog.location(),
            constants::FEATURE_TYPE
        ),
        Some(feature_type)
            if !feature_type.eq_ignore_ascii_case(constants::FT_TRAJECTORY)
                && !feature_type.eq_ignore_ascii_case(constants::FT_TRAJECTORY_PROFILE) =>
        {
            warn!(
                "The {} global attribute must be {} or {}, found '{}'",
                constants::FEATURE_TYPE,
                constants::FT_TRAJECTORY,
                constants::FT_TRAJECTORY_PROFILE,
                feature_type
            )
        }
        Some(_) => {}
    }

    let time_name = axes.require(AxisRole::Time)?;
    let time = catalog
        .variable(time_name)
        .ok_or_else(|| TrajectoryError::VariableNotFound {
            name: time_name.to_string(),
        })?;
    if time.rank() != 1 {
        return Err(TrajectoryError::configuration(format!(
            "The time coordinate {} must be unidimensional, found {} dimensions",
            time.name,
            time.rank()
        )));
    }

    let series_len = time.dimensions[0].len;
    for role in [AxisRole::Latitude, AxisRole::Longitude] {
        let name = axes.require(role)?;
        let info = catalog
            .variable(name)
            .ok_or_else(|| TrajectoryError::VariableNotFound {
                name: name.to_string(),
            })?;
        if info.shape().first() != Some(&series_len) {
            return Err(TrajectoryError::configuration(format!(
                "The {} coordinate {} must share the time dimension (length {})",
                role, name, series_len
            )));
        }
    }

    Ok(())
}
