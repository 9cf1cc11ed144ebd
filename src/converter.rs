//! One-shot conversion of a dataset file into a KML document.

use crate::catalog::open_catalog;
use crate::config::ConversionConfig;
use crate::error::Result;
use crate::export::TrackExporter;
use crate::extractor::TrajectoryExtractor;
use crate::kml::KmlRenderer;
use crate::models::ConversionStats;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// `track.nc` becomes `track.kml` in the same directory
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("kml")
}

/// Parquet track written next to the KML output
pub fn parquet_output_path(output: &Path) -> PathBuf {
    output.with_extension("parquet")
}

/// Open, validate and extract `input`, then write the KML to `output`.
/// The dataset is released when this returns, on success or failure.
pub fn convert(input: &Path, output: &Path, config: &ConversionConfig) -> Result<ConversionStats> {
    let start = Instant::now();
    config.validate()?;

    let catalog = open_catalog(input)?;
    let extractor = TrajectoryExtractor::build(catalog.as_ref(), config)?;
    let trajectory = extractor.extract()?;

    KmlRenderer::new(config).write_file(&trajectory, output)?;

    let parquet_path = if config.export.parquet {
        let path = parquet_output_path(output);
        TrackExporter::new(&config.export).write(&trajectory, &path)?;
        Some(path)
    } else {
        None
    };
    drop(catalog);

    let stats = ConversionStats {
        input_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        parquet_path,
        points_written: trajectory.points.len(),
        variables_displayed: extractor.displayed_variables().len(),
        processing_time_ms: start.elapsed().as_millis(),
    };
    info!(
        "Converted {} -> {} ({} points in {} ms)",
        input.display(),
        output.display(),
        stats.points_written,
        stats.processing_time_ms
    );
    Ok(stats)
}
