//! Parquet export of an extracted track.
//!
//! One row per track point with the interval, the position, the marker and
//! one string column per displayed variable (null where the field was
//! omitted).

use crate::config::{CompressionAlgorithm, ExportConfig};
use crate::error::Result;
use crate::models::{PointSource, Trajectory};
use polars::prelude::{
    Column, DataFrame, DataType, ParquetWriter as PolarsParquetWriter, StatisticsOptions,
    TimeUnit,
};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrackExporter {
    compression: CompressionAlgorithm,
}

impl TrackExporter {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            compression: config.compression,
        }
    }

    pub fn to_dataframe(&self, trajectory: &Trajectory) -> Result<DataFrame> {
        let points = &trajectory.points;
        let datetime = DataType::Datetime(TimeUnit::Milliseconds, None);

        let begin: Vec<i64> = points.iter().map(|p| p.begin.timestamp_millis()).collect();
        let end: Vec<Option<i64>> = points
            .iter()
            .map(|p| p.end.map(|t| t.timestamp_millis()))
            .collect();
        let index: Vec<Option<u64>> = points
            .iter()
            .map(|p| match p.source {
                PointSource::Sample { index } => Some(index as u64),
                PointSource::Deployment => None,
            })
            .collect();
        let latitude: Vec<f64> = points.iter().map(|p| p.latitude.as_f64()).collect();
        let longitude: Vec<f64> = points.iter().map(|p| p.longitude.as_f64()).collect();
        let marker: Vec<&str> = points.iter().map(|p| p.marker.as_str()).collect();

        let mut columns = vec![
            Column::new("time".into(), begin).cast(&datetime)?,
            Column::new("time_end".into(), end).cast(&datetime)?,
            Column::new("sample_index".into(), index),
            Column::new("latitude".into(), latitude),
            Column::new("longitude".into(), longitude),
            Column::new("marker".into(), marker),
        ];

        let mut names: Vec<&str> = Vec::new();
        for field in points.iter().flat_map(|p| &p.fields) {
            if !names.contains(&field.name.as_str()) {
                names.push(&field.name);
            }
        }
        for name in names {
            let values: Vec<Option<&str>> = points.iter().map(|p| p.field(name)).collect();
            let column_name = variable_column_name(name, &columns);
            if column_name != name {
                debug!("Variable {} exported as column {}", name, column_name);
            }
            columns.push(Column::new(column_name.into(), values));
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Write the track; returns the number of rows written
    pub fn write(&self, trajectory: &Trajectory, path: &Path) -> Result<usize> {
        let mut df = self.to_dataframe(trajectory)?;
        let file = std::fs::File::create(path)?;
        PolarsParquetWriter::new(file)
            .with_compression(self.compression.to_polars_compression())
            .with_statistics(StatisticsOptions::full())
            .finish(&mut df)?;

        debug!("Wrote {} track rows to {}", df.height(), path.display());
        Ok(df.height())
    }
}

/// `name`, suffixed with `_value` until it no longer clashes with a column
fn variable_column_name(name: &str, columns: &[Column]) -> String {
    let taken = |candidate: &str| columns.iter().any(|c| c.name().as_str() == candidate);
    let mut column_name = name.to_string();
    while taken(&column_name) {
        column_name.push_str("_value");
    }
    column_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DisplayField, Marker, Scalar, TrackPoint};
    use chrono::{TimeZone, Utc};
    use polars::prelude::{ParquetReader, SerReader};
    use tempfile::TempDir;

    fn trajectory() -> Trajectory {
        let deployment = TrackPoint {
            source: PointSource::Deployment,
            begin: Utc.with_ymd_and_hms(2011, 9, 6, 18, 0, 0).unwrap(),
            end: Some(Utc.with_ymd_and_hms(2011, 9, 7, 0, 0, 0).unwrap()),
            latitude: Scalar::Double(39.45),
            longitude: Scalar::Double(2.35),
            fields: Vec::new(),
            marker: Marker::Start,
        };
        let sample = TrackPoint {
            source: PointSource::Sample { index: 0 },
            begin: Utc.with_ymd_and_hms(2011, 9, 7, 0, 0, 0).unwrap(),
            end: None,
            latitude: Scalar::Float(39.5),
            longitude: Scalar::Float(2.5),
            fields: vec![DisplayField {
                name: "TEMP".to_string(),
                value: "14.5 Celsius".to_string(),
            }],
            marker: Marker::End,
        };
        let points = vec![deployment, sample];
        let path = points.iter().map(|p| (p.longitude, p.latitude)).collect();
        Trajectory {
            title: "Glider".to_string(),
            points,
            path,
        }
    }

    #[test]
    fn test_to_dataframe() {
        let exporter = TrackExporter::new(&ExportConfig::default());
        let df = exporter.to_dataframe(&trajectory()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec![
                "time",
                "time_end",
                "sample_index",
                "latitude",
                "longitude",
                "marker",
                "TEMP"
            ]
        );

        let temp = df.column("TEMP").unwrap().str().unwrap();
        assert_eq!(temp.get(0), None);
        assert_eq!(temp.get(1), Some("14.5 Celsius"));

        let marker = df.column("marker").unwrap().str().unwrap();
        assert_eq!(marker.get(0), Some("start"));
        assert_eq!(df.column("time_end").unwrap().null_count(), 1);
    }

    #[test]
    fn test_variable_named_like_a_track_column() {
        let mut track = trajectory();
        track.points[1].fields.push(DisplayField {
            name: "time".to_string(),
            value: "1315353600".to_string(),
        });
        let df = TrackExporter::new(&ExportConfig::default())
            .to_dataframe(&track)
            .unwrap();

        assert_eq!(df.width(), 8);
        let renamed = df.column("time_value").unwrap().str().unwrap();
        assert_eq!(renamed.get(1), Some("1315353600"));
        assert!(matches!(
            df.column("time").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_write_parquet() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("track.parquet");
        let exporter = TrackExporter::new(&ExportConfig {
            parquet: true,
            compression: CompressionAlgorithm::Zstd,
        });

        let rows = exporter.write(&trajectory(), &path).unwrap();
        assert_eq!(rows, 2);

        let file = std::fs::File::open(&path).unwrap();
        let df = ParquetReader::new(file).finish().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 7);
    }
}
