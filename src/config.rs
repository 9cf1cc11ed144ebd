//! Configuration management and validation.
//!
//! Provides the quality control naming conventions, the KML styling,
//! the optional deployment position and the Parquet export settings.
//! Everything is serde-serializable so a JSON file can be layered under
//! the command-line flags.

use crate::constants;
use crate::error::{Result, TrajectoryError};
use chrono::format::{Item, StrftimeItems};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Quality control naming conventions and acceptance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConventions {
    /// Codes strictly below the threshold are accepted
    pub good_data_threshold: i32,

    pub qc_prefix: String,
    pub qc_suffix: String,
    pub quality_control_prefix: String,
    pub quality_control_suffix: String,

    /// Also search `<name>_quality_control` and `quality_control_<name>`
    pub search_quality_control_names: bool,
}

impl Default for QcConventions {
    fn default() -> Self {
        Self {
            good_data_threshold: constants::PROBABLY_GOOD_DATA,
            qc_prefix: constants::QC_PREFIX.to_string(),
            qc_suffix: constants::QC_SUFFIX.to_string(),
            quality_control_prefix: constants::QUALITY_CONTROL_PREFIX.to_string(),
            quality_control_suffix: constants::QUALITY_CONTROL_SUFFIX.to_string(),
            search_quality_control_names: true,
        }
    }
}

impl QcConventions {
    /// Candidate QC variable names for `variable`, in priority order
    pub fn candidate_names(&self, variable: &str) -> Vec<String> {
        let mut names = vec![
            format!("{}{}", variable, self.qc_suffix),
            format!("{}{}", variable, self.qc_suffix.to_uppercase()),
            format!("{}{}", self.qc_prefix, variable),
            format!("{}{}", self.qc_prefix.to_uppercase(), variable),
        ];
        if self.search_quality_control_names {
            names.push(format!("{}{}", variable, self.quality_control_suffix));
            names.push(format!("{}{}", self.quality_control_prefix, variable));
        }
        names
    }

    /// Case-insensitive check of a name against the QC markers
    pub fn is_qc_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let mut markers = vec![
            self.qc_suffix.to_lowercase(),
            self.qc_prefix.to_lowercase(),
            self.quality_control_suffix.to_lowercase(),
        ];
        if self.search_quality_control_names {
            markers.push(self.quality_control_prefix.to_lowercase());
        }
        markers
            .iter()
            .any(|marker| !marker.is_empty() && lower.contains(marker.as_str()))
    }

    pub fn is_good(&self, code: i32) -> bool {
        code < self.good_data_threshold
    }
}

/// KML document styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmlStyle {
    /// Document and balloon title; the dataset `title` when unset
    pub title: Option<String>,

    /// chrono format of the "Time" line in balloons
    pub date_format: String,

    /// Track line color (aabbggrr)
    pub line_color: String,

    pub line_width: f64,

    /// Icon of the first placemark
    pub home_icon_url: String,

    /// Icon of every placemark between the first and the last
    pub regular_icon_url: String,

    /// Icon of the last placemark
    pub end_icon_url: String,
}

impl Default for KmlStyle {
    fn default() -> Self {
        Self {
            title: None,
            date_format: constants::DEFAULT_DATE_FORMAT.to_string(),
            line_color: constants::DEFAULT_LINE_COLOR.to_string(),
            line_width: constants::DEFAULT_LINE_WIDTH,
            home_icon_url: constants::DEFAULT_HOME_ICON_URL.to_string(),
            regular_icon_url: constants::DEFAULT_REGULAR_ICON_URL.to_string(),
            end_icon_url: constants::DEFAULT_END_ICON_URL.to_string(),
        }
    }
}

/// Known launch position of the platform, shown before the first sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// UDUNITS time ("1 day since 2011-09-07 00:00:00") or an ISO-8601 date
    pub time: String,
    /// Degrees east
    pub longitude: f64,
    /// Degrees north
    pub latitude: f64,
}

impl DeploymentInfo {
    pub fn new(time: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            time: time.into(),
            longitude,
            latitude,
        }
    }
}

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }

    /// Parse the CLI spelling (snappy, zstd, lz4, none)
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "snappy" => Ok(Self::Snappy),
            "zstd" => Ok(Self::Zstd),
            "lz4" => Ok(Self::Lz4),
            "none" | "uncompressed" => Ok(Self::Uncompressed),
            other => Err(TrajectoryError::configuration(format!(
                "Unknown compression algorithm '{}' (expected snappy, zstd, lz4 or none)",
                other
            ))),
        }
    }
}

/// Parquet export of the extracted track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Write `<output>.parquet` next to the KML
    pub parquet: bool,
    pub compression: CompressionAlgorithm,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            parquet: false,
            compression: CompressionAlgorithm::Snappy,
        }
    }
}

/// Global configuration for a conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub qc: QcConventions,

    pub style: KmlStyle,

    pub deployment: Option<DeploymentInfo>,

    /// OPeNDAP link added to every balloon
    pub thredds_link: Option<String>,

    /// Display non-QC ancillary variables with the measurements
    pub display_ancillary_variables: bool,

    pub export: ExportConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            qc: QcConventions::default(),
            style: KmlStyle::default(),
            deployment: None,
            thredds_link: None,
            display_ancillary_variables: false,
            export: ExportConfig::default(),
        }
    }
}

impl ConversionConfig {
    /// Load a configuration file written as JSON
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TrajectoryError::configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the conversion cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.qc.qc_prefix.is_empty() || self.qc.qc_suffix.is_empty() {
            return Err(TrajectoryError::configuration(
                "QC prefix and suffix must not be empty",
            ));
        }
        if self.style.date_format.trim().is_empty() {
            return Err(TrajectoryError::configuration("Date format must not be empty"));
        }
        if StrftimeItems::new(&self.style.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(TrajectoryError::configuration(format!(
                "Invalid date format '{}'",
                self.style.date_format
            )));
        }
        if let Some(deployment) = &self.deployment {
            if !(-90.0..=90.0).contains(&deployment.latitude) {
                return Err(TrajectoryError::configuration(format!(
                    "Deployment latitude {} is out of range",
                    deployment.latitude
                )));
            }
            if !(-180.0..=360.0).contains(&deployment.longitude) {
                return Err(TrajectoryError::configuration(format!(
                    "Deployment longitude {} is out of range",
                    deployment.longitude
                )));
            }
        }
        Ok(())
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.style.title = Some(title.into());
        self
    }

    /// Prepend a deployment position to the track
    pub fn with_deployment(mut self, deployment: DeploymentInfo) -> Self {
        self.deployment = Some(deployment);
        self
    }

    /// Add an OPeNDAP link to every balloon
    pub fn with_thredds_link(mut self, link: impl Into<String>) -> Self {
        self.thredds_link = Some(link.into());
        self
    }

    /// Display non-QC ancillary variables
    pub fn with_ancillary_variables(mut self) -> Self {
        self.display_ancillary_variables = true;
        self
    }

    /// Use alternate QC conventions
    pub fn with_qc_conventions(mut self, conventions: QcConventions) -> Self {
        self.qc = conventions;
        self
    }

    /// Enable the Parquet track export
    pub fn with_parquet_export(mut self, compression: CompressionAlgorithm) -> Self {
        self.export = ExportConfig {
            parquet: true,
            compression,
        };
        self
    }
}
