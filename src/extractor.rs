//! Trajectory extraction.
//!
//! Walks the time series inside the good data range, keeps the steps with
//! an acceptable position, annotates each with the displayed variables and
//! closes its time interval at the next good step. An optional deployment
//! point is emitted first. Records are produced lazily by [`Records`];
//! [`TrajectoryExtractor::extract`] collects them into a marked
//! [`Trajectory`].

#[cfg(test)]
pub mod tests;

use crate::catalog::{AxisRole, CoordinateAxes, VariableCatalog, validate_dataset};
use crate::config::ConversionConfig;
use crate::constants;
use crate::error::{Result, TrajectoryError};
use crate::formatter::VariableValueFormatter;
use crate::models::{ArrayData, Marker, PointSource, Scalar, TrackPoint, Trajectory};
use crate::quality::{AncillaryResolver, GoodDataRange, PositionQuality, QcArray, ValueQuality};
use crate::timeunits::{TimeUnits, parse_instant};
use chrono::{DateTime, Utc};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Caller-supplied start of the track, resolved to a timestamp
#[derive(Debug, Clone, PartialEq)]
struct Deployment {
    time: DateTime<Utc>,
    longitude: f64,
    latitude: f64,
}

/// Everything needed to walk a trajectory, read once from the catalog
#[derive(Debug, Clone)]
pub struct TrajectoryExtractor {
    location: String,
    title: String,
    time_units: TimeUnits,
    times: ArrayData,
    latitudes: ArrayData,
    longitudes: ArrayData,
    position: PositionQuality,
    values: ValueQuality,
    formatter: VariableValueFormatter,
    range: GoodDataRange,
    deployment: Option<Deployment>,
}

impl TrajectoryExtractor {
    /// Discover the coordinates, validate the dataset and read everything
    /// the walk needs. Configuration problems fail here, before any record
    /// is produced.
    pub fn build(catalog: &dyn VariableCatalog, config: &ConversionConfig) -> Result<Self> {
        let axes = CoordinateAxes::discover(catalog)?;
        validate_dataset(catalog, &axes)?;
        Self::with_axes(catalog, &axes, config)
    }

    pub fn with_axes(
        catalog: &dyn VariableCatalog,
        axes: &CoordinateAxes,
        config: &ConversionConfig,
    ) -> Result<Self> {
        let time_name = axes.require(AxisRole::Time)?;
        let lat_name = axes.require(AxisRole::Latitude)?;
        let lon_name = axes.require(AxisRole::Longitude)?;

        let time_info = catalog
            .variable(time_name)
            .ok_or_else(|| TrajectoryError::VariableNotFound {
                name: time_name.to_string(),
            })?;
        let time_units = match time_info.units() {
            Some(units) => TimeUnits::parse(units)?,
            None => {
                return Err(TrajectoryError::invalid_time_units(
                    "",
                    format!("the time coordinate {} has no units", time_name),
                ));
            }
        };

        let resolver = AncillaryResolver::resolve(
            catalog,
            axes,
            &config.qc,
            config.display_ancillary_variables,
        );

        let load_qc = |coordinate: &str| -> Option<QcArray> {
            let qc_name = resolver.qc_variable(coordinate)?;
            match QcArray::load(catalog, qc_name) {
                Ok(array) => Some(array),
                Err(e) => {
                    warn!("Cannot read QC variable {} of {}: {}", qc_name, coordinate, e);
                    None
                }
            }
        };
        let position = PositionQuality::new(load_qc(lat_name), load_qc(lon_name), &config.qc);
        let range = position.good_data_range();

        let values = ValueQuality::load(catalog, &resolver, &config.qc);
        let formatter = VariableValueFormatter::load(catalog, axes, resolver.primary_variables());

        let deployment = config
            .deployment
            .as_ref()
            .map(|info| -> Result<Deployment> {
                Ok(Deployment {
                    time: parse_instant(&info.time)?,
                    longitude: info.longitude,
                    latitude: info.latitude,
                })
            })
            .transpose()?;

        let title = config
            .style
            .title
            .clone()
            .or_else(|| {
                catalog
                    .global_attribute(constants::TITLE)
                    .and_then(|v| v.as_str())
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
            })
            .unwrap_or_else(|| constants::DEFAULT_TITLE.to_string());

        info!(
            "Extracting '{}' from {}: {} displayed variables, range {:?}",
            title,
            catalog.location(),
            formatter.len(),
            range
        );

        Ok(Self {
            location: catalog.location().to_string(),
            title,
            time_units,
            times: catalog.read(time_name)?,
            latitudes: catalog.read(lat_name)?,
            longitudes: catalog.read(lon_name)?,
            position,
            values,
            formatter,
            range,
            deployment,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn range(&self) -> GoodDataRange {
        self.range
    }

    /// Names of the variables shown in each record
    pub fn displayed_variables(&self) -> Vec<&str> {
        self.formatter.names().collect()
    }

    fn series_len(&self) -> usize {
        self.times
            .len()
            .min(self.latitudes.len())
            .min(self.longitudes.len())
    }

    /// Lazy iterator over the records; fails when no step has good positions
    pub fn records(&self) -> Result<Records<'_>> {
        let indices = self
            .range
            .indices(self.series_len())
            .ok_or_else(|| TrajectoryError::NoGoodData {
                location: self.location.clone(),
            })?;
        let last = indices.end.checked_sub(1);

        Ok(Records {
            extractor: self,
            deployment_pending: self.deployment.is_some(),
            indices,
            last,
        })
    }

    /// Collect the records, mark the first and last points and build the path
    pub fn extract(&self) -> Result<Trajectory> {
        let mut points: Vec<TrackPoint> = self.records()?.collect();

        let samples = points
            .iter()
            .filter(|p| matches!(p.source, PointSource::Sample { .. }))
            .count();
        if samples == 0 {
            return Err(TrajectoryError::NoRecordsProduced {
                location: self.location.clone(),
            });
        }

        let count = points.len();
        for (i, point) in points.iter_mut().enumerate() {
            point.marker = if i == 0 {
                Marker::Start
            } else if i + 1 == count {
                Marker::End
            } else {
                Marker::Regular
            };
        }

        let path = points.iter().map(|p| (p.longitude, p.latitude)).collect();
        info!("Extracted {} points ({} samples)", count, samples);

        Ok(Trajectory {
            title: self.title.clone(),
            points,
            path,
        })
    }

    fn time_at(&self, index: usize) -> Option<DateTime<Utc>> {
        let raw = self.times.get(index)?;
        self.time_units.to_datetime(raw.as_f64())
    }

    fn position_at(&self, index: usize) -> Option<(Scalar, Scalar)> {
        let latitude = self.latitudes.get(index)?;
        let longitude = self.longitudes.get(index)?;
        if latitude.is_nan() || longitude.is_nan() {
            return None;
        }
        Some((latitude, longitude))
    }

    /// Time of the first step the walk will emit
    fn first_accepted_time(&self, indices: Range<usize>) -> Option<DateTime<Utc>> {
        indices
            .filter(|&i| self.position.accepts(i) && self.position_at(i).is_some())
            .find_map(|i| self.time_at(i))
    }

    fn deployment_record(&self, deployment: &Deployment, indices: Range<usize>) -> TrackPoint {
        TrackPoint {
            source: PointSource::Deployment,
            begin: deployment.time,
            end: self.first_accepted_time(indices),
            latitude: Scalar::Double(deployment.latitude),
            longitude: Scalar::Double(deployment.longitude),
            fields: Vec::new(),
            marker: Marker::Start,
        }
    }

    fn record_at(&self, index: usize, last: usize) -> Option<TrackPoint> {
        if !self.position.accepts(index) {
            debug!("Index {}: position rejected by QC", index);
            return None;
        }

        let Some((latitude, longitude)) = self.position_at(index) else {
            debug!("Index {}: missing position", index);
            return None;
        };

        let Some(begin) = self.time_at(index) else {
            warn!("Index {}: time value cannot be converted, step skipped", index);
            return None;
        };

        let fields = self.formatter.format_step(index, &self.values);

        let end = if index < last {
            let next = self.position.next_good_index(index, last);
            self.time_at(next)
        } else {
            None
        };

        Some(TrackPoint {
            source: PointSource::Sample { index },
            begin,
            end,
            latitude,
            longitude,
            fields,
            marker: Marker::Regular,
        })
    }
}

/// Lazy walk over the good data range
#[derive(Debug)]
pub struct Records<'a> {
    extractor: &'a TrajectoryExtractor,
    deployment_pending: bool,
    indices: Range<usize>,
    last: Option<usize>,
}

impl Iterator for Records<'_> {
    type Item = TrackPoint;

    fn next(&mut self) -> Option<TrackPoint> {
        if self.deployment_pending {
            self.deployment_pending = false;
            if let Some(deployment) = &self.extractor.deployment {
                return Some(
                    self.extractor
                        .deployment_record(deployment, self.indices.clone()),
                );
            }
        }

        let last = self.last?;
        for index in self.indices.by_ref() {
            if let Some(record) = self.extractor.record_at(index, last) {
                return Some(record);
            }
        }
        None
    }
}
