//! Extraction scenario tests
//!
//! Builds small glider-like trajectories in memory and walks them through
//! the complete extraction pipeline.

pub mod unfiltered_track;

use crate::catalog::{MemoryCatalog, MemoryVariable};
use crate::constants;
use crate::models::ArrayData;

/// Seconds since epoch of 2011-09-07 00:00:00 UTC
pub const START_SECONDS: f64 = 1_315_353_600.0;

/// A trajectory with `n` hourly samples and a temperature series, no QC
pub fn glider_catalog(n: usize) -> MemoryCatalog {
    let times: Vec<f64> = (0..n).map(|i| START_SECONDS + 3_600.0 * i as f64).collect();
    let lats: Vec<f64> = (0..n).map(|i| 39.5 + 0.1 * i as f64).collect();
    let lons: Vec<f64> = (0..n).map(|i| 2.5 + 0.1 * i as f64).collect();
    let temps: Vec<f32> = (0..n).map(|i| 14.0 + i as f32).collect();

    MemoryCatalog::new("memory://glider")
        .with_global_attribute(constants::TITLE, "Glider sdeep00")
        .with_global_attribute(constants::FEATURE_TYPE, "trajectory")
        .with_variable(
            MemoryVariable::new("trajectory", &[("trajectory", 1)], ArrayData::Int(vec![1]))
                .with_attribute(constants::CF_ROLE, "trajectory_id"),
        )
        .with_variable(
            MemoryVariable::new("time", &[("time", n)], ArrayData::Double(times))
                .with_attribute(constants::STANDARD_NAME, "time")
                .with_attribute(constants::UNITS, "seconds since 1970-01-01 00:00:00"),
        )
        .with_variable(
            MemoryVariable::new("LAT", &[("time", n)], ArrayData::Double(lats))
                .with_attribute(constants::STANDARD_NAME, "latitude")
                .with_attribute(constants::UNITS, "degrees_north"),
        )
        .with_variable(
            MemoryVariable::new("LON", &[("time", n)], ArrayData::Double(lons))
                .with_attribute(constants::STANDARD_NAME, "longitude")
                .with_attribute(constants::UNITS, "degrees_east"),
        )
        .with_variable(
            MemoryVariable::new("TEMP", &[("time", n)], ArrayData::Float(temps))
                .with_attribute(constants::UNITS, "Celsius")
                .with_attribute(constants::COORDINATES, "time LAT LON")
                .with_attribute(constants::FILL_VALUE, 99999.0),
        )
}

/// Add latitude and longitude QC variables linked through `ancillary_variables`
pub fn with_position_qc(catalog: MemoryCatalog, lat_qc: Vec<i64>, lon_qc: Vec<i64>) -> MemoryCatalog {
    let n = lat_qc.len();
    catalog
        .with_variable_attribute("LAT", constants::ANCILLARY_VARIABLES, "QC_LAT")
        .with_variable_attribute("LON", constants::ANCILLARY_VARIABLES, "QC_LON")
        .with_variable(MemoryVariable::new("QC_LAT", &[("time", n)], ArrayData::Int(lat_qc)))
        .with_variable(MemoryVariable::new("QC_LON", &[("time", n)], ArrayData::Int(lon_qc)))
}
