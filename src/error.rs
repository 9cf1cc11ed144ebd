//! Error handling for trajectory conversion.
//!
//! Separates fatal configuration problems (missing or duplicated
//! coordinates, unusable time units) from data problems (no good data,
//! nothing to emit) and the I/O failures of the input and output layers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    #[error("Dataset not found at path: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("Unsupported input file: {path} - {reason}")]
    UnsupportedInput { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Only one {role} coordinate is allowed, found '{first}' and '{second}'")]
    DuplicateCoordinate {
        role: String,
        first: String,
        second: String,
    },

    #[error("The dataset doesn't have a {role} coordinate")]
    MissingCoordinate { role: String },

    #[error("Invalid time units '{units}': {reason}")]
    InvalidTimeUnits { units: String, reason: String },

    #[error("Variable not found: {name}")]
    VariableNotFound { name: String },

    #[error("The variable {name} must be 1 or 2 dimensional, found {dimensions} dimensions")]
    UnsupportedShape { name: String, dimensions: usize },

    #[error("Index {index} is out of bounds for variable {name} (length {len})")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },

    #[error("Vertical coordinate of variable {name}: {reason}")]
    VerticalCoordinate { name: String, reason: String },

    #[error("No good data were found in the dataset {location}")]
    NoGoodData { location: String },

    #[error("No track points were produced from the dataset {location}")]
    NoRecordsProduced { location: String },
}

impl TrajectoryError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid time units error
    pub fn invalid_time_units(units: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTimeUnits {
            units: units.into(),
            reason: reason.into(),
        }
    }

    /// Create a vertical coordinate error
    pub fn vertical_coordinate(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::VerticalCoordinate {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error aborts a conversion before any extraction happens
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::DuplicateCoordinate { .. }
                | Self::MissingCoordinate { .. }
                | Self::InvalidTimeUnits { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrajectoryError>;
