//! Trajectory KML Library
//!
//! Converts quality-controlled oceanographic trajectory datasets (gliders,
//! drifters, profilers) into KML documents viewable in Google Earth.
//!
//! This library provides tools for:
//! - Reading dataset metadata and arrays through the [`catalog::VariableCatalog`] seam
//!   (NetCDF behind the `netcdf` feature, JSON always)
//! - Discovering the time, latitude, longitude and vertical coordinates
//! - Resolving quality-control ancillary variables and filtering bad positions
//! - Formatting measurements with units and vertical levels
//! - Rendering placemarks, styles and the track line as KML
//! - Optionally exporting the extracted track as Parquet

pub mod catalog;
pub mod cli;
pub mod config;
pub mod constants;
pub mod converter;
pub mod error;
pub mod export;
pub mod extractor;
pub mod formatter;
pub mod kml;
pub mod models;
pub mod quality;
pub mod timeunits;

// Re-export commonly used types
pub use catalog::{MemoryCatalog, VariableCatalog, open_catalog};
pub use config::{ConversionConfig, DeploymentInfo, QcConventions};
pub use converter::convert;
pub use error::{Result, TrajectoryError};
pub use extractor::TrajectoryExtractor;
pub use kml::KmlRenderer;
pub use models::{ConversionStats, Trajectory, TrackPoint};
