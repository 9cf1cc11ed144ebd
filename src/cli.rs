//! Command-line interface components.

use crate::config::{CompressionAlgorithm, ConversionConfig, DeploymentInfo};
use crate::constants;
use crate::converter::default_output_path;
use crate::models::ConversionStats;
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "trajectory-kml")]
#[command(about = "Convert oceanographic trajectory datasets into KML tracks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Dataset files, directories or glob patterns (.nc, .json)
    #[arg(value_name = "INPUT", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Output KML file, or output directory when converting several inputs
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// JSON configuration file, overridden by the flags below
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Document title (defaults to the dataset `title` attribute)
    #[arg(long)]
    pub title: Option<String>,

    /// OPeNDAP link added to every balloon
    #[arg(long, value_name = "URL")]
    pub thredds_link: Option<String>,

    /// Deployment time: "1 day since 2011-09-07 00:00:00" or an ISO date
    #[arg(long, requires_all = ["deployment_lat", "deployment_lon"])]
    pub deployment_time: Option<String>,

    /// Deployment latitude (degrees north)
    #[arg(long, allow_hyphen_values = true, requires = "deployment_time")]
    pub deployment_lat: Option<f64>,

    /// Deployment longitude (degrees east)
    #[arg(long, allow_hyphen_values = true, requires = "deployment_time")]
    pub deployment_lon: Option<f64>,

    /// Also display non-QC ancillary variables
    #[arg(long)]
    pub display_ancillary: bool,

    /// Also write the track as Parquet next to the KML
    #[arg(long)]
    pub parquet: bool,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Configuration file (if any) with the command-line flags applied on top
    pub fn build_config(&self) -> Result<ConversionConfig> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?,
            None => ConversionConfig::default(),
        };

        if let Some(title) = &self.title {
            config = config.with_title(title.clone());
        }
        if let Some(link) = &self.thredds_link {
            config = config.with_thredds_link(link.clone());
        }
        if let (Some(time), Some(lat), Some(lon)) =
            (&self.deployment_time, self.deployment_lat, self.deployment_lon)
        {
            config = config.with_deployment(DeploymentInfo::new(time.clone(), lon, lat));
        }
        if self.display_ancillary {
            config = config.with_ancillary_variables();
        }
        if self.parquet {
            config = config.with_parquet_export(CompressionAlgorithm::parse(&self.compression)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Where the KML for `input` goes
    pub fn output_path_for(&self, input: &Path, batch: bool) -> PathBuf {
        match &self.output {
            Some(output) if batch || output.is_dir() => {
                let name = input.file_name().map(PathBuf::from).unwrap_or_default();
                output.join(name).with_extension("kml")
            }
            Some(output) => output.clone(),
            None => default_output_path(input),
        }
    }
}

/// Set up structured logging on stderr
pub fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("trajectory_kml={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    debug!("Logging initialized at level: {}", log_level);
}

fn is_dataset_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| {
            ext == constants::JSON_EXTENSION || constants::NETCDF_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Expand the command-line inputs into dataset files. Directories are
/// walked for dataset files; patterns are expanded with `glob`; anything
/// else is kept so the conversion reports it.
pub fn collect_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_dataset_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            debug!("Found {} datasets under {}", found.len(), path.display());
            files.extend(found);
        } else if path.exists() {
            files.push(path.to_path_buf());
        } else if input.contains(['*', '?', '[']) {
            let matches = glob::glob(input)
                .with_context(|| format!("Invalid input pattern '{}'", input))?;
            for entry in matches {
                let matched = entry.context("Failed to read a pattern match")?;
                if matched.is_file() {
                    files.push(matched);
                }
            }
        } else {
            files.push(path.to_path_buf());
        }
    }

    let mut seen = HashSet::new();
    files.retain(|file| seen.insert(file.clone()));
    Ok(files)
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Print the converted and failed inputs
pub fn print_summary(converted: &[ConversionStats], failed: &[(PathBuf, String)]) {
    println!();
    println!("{}", "Conversion summary".bright_green().bold());
    for stats in converted {
        println!(
            "  {} {} -> {} {}",
            "✓".green(),
            stats.input_path.display(),
            stats.output_path.display().to_string().bright_cyan(),
            format!(
                "({} points, {} variables, {} ms)",
                stats.points_written, stats.variables_displayed, stats.processing_time_ms
            )
            .bright_black()
        );
        if let Some(parquet) = &stats.parquet_path {
            println!("      {}", parquet.display().to_string().bright_black());
        }
    }
    for (input, reason) in failed {
        println!("  {} {}: {}", "✗".red(), input.display(), reason.red());
    }
    println!(
        "{} converted, {} failed",
        converted.len().to_string().bright_yellow().bold(),
        if failed.is_empty() {
            "0".normal()
        } else {
            failed.len().to_string().red().bold()
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("trajectory-kml").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(parse(&["a.nc"]).get_log_level(), "info");
        assert_eq!(parse(&["a.nc", "-v"]).get_log_level(), "debug");
        assert_eq!(parse(&["a.nc", "-vv"]).get_log_level(), "trace");
        assert_eq!(parse(&["a.nc", "-q"]).get_log_level(), "warn");
    }

    #[test]
    fn test_inputs_required() {
        assert!(Args::try_parse_from(["trajectory-kml"]).is_err());
    }

    #[test]
    fn test_deployment_needs_position() {
        let result = Args::try_parse_from([
            "trajectory-kml",
            "a.nc",
            "--deployment-time",
            "2011-09-07",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_config_from_flags() {
        let args = parse(&[
            "a.nc",
            "--title",
            "Mission",
            "--thredds-link",
            "http://thredds/a.nc",
            "--deployment-time",
            "2011-09-07T00:00:00Z",
            "--deployment-lat",
            "39.5",
            "--deployment-lon",
            "-2.5",
            "--display-ancillary",
            "--parquet",
            "--compression",
            "zstd",
        ]);
        let config = args.build_config().unwrap();

        assert_eq!(config.style.title.as_deref(), Some("Mission"));
        assert_eq!(config.thredds_link.as_deref(), Some("http://thredds/a.nc"));
        let deployment = config.deployment.unwrap();
        assert_eq!(deployment.latitude, 39.5);
        assert_eq!(deployment.longitude, -2.5);
        assert!(config.display_ancillary_variables);
        assert!(config.export.parquet);
        assert_eq!(config.export.compression, CompressionAlgorithm::Zstd);
    }

    #[test]
    fn test_build_config_rejects_bad_compression() {
        let args = parse(&["a.nc", "--parquet", "--compression", "gzip9"]);
        assert!(args.build_config().is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{ "style": { "title": "From file", "line_width": 2.0 } }"#,
        )
        .unwrap();

        let config_arg = config_path.to_string_lossy().to_string();
        let from_file = parse(&["a.nc", "--config", &config_arg]).build_config().unwrap();
        assert_eq!(from_file.style.title.as_deref(), Some("From file"));
        assert_eq!(from_file.style.line_width, 2.0);

        let overridden = parse(&["a.nc", "--config", &config_arg, "--title", "From flag"])
            .build_config()
            .unwrap();
        assert_eq!(overridden.style.title.as_deref(), Some("From flag"));
        assert_eq!(overridden.style.line_width, 2.0);
    }

    #[test]
    fn test_output_path_for() {
        let dir = TempDir::new().unwrap();
        let input = Path::new("/data/glider.nc");

        assert_eq!(
            parse(&["x"]).output_path_for(input, false),
            PathBuf::from("/data/glider.kml")
        );
        assert_eq!(
            parse(&["x", "-o", "/tmp/track.kml"]).output_path_for(input, false),
            PathBuf::from("/tmp/track.kml")
        );

        let out_dir = dir.path().to_string_lossy().to_string();
        assert_eq!(
            parse(&["x", "-o", &out_dir]).output_path_for(input, true),
            dir.path().join("glider.kml")
        );
    }

    #[test]
    fn test_collect_inputs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("2011");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(nested.join("a.nc"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let root = dir.path().to_string_lossy().to_string();
        let walked = collect_inputs(&[root.clone()]).unwrap();
        assert_eq!(walked.len(), 2);
        assert!(walked.iter().all(|p| is_dataset_file(p)));

        let pattern = format!("{}/*.json", root);
        let globbed = collect_inputs(&[pattern]).unwrap();
        assert_eq!(globbed, vec![dir.path().join("b.json")]);

        let overlapping = collect_inputs(&[
            format!("{}/b.json", root),
            root.clone(),
            format!("{}/*.json", root),
        ])
        .unwrap();
        assert_eq!(overlapping.len(), 2);
        assert_eq!(overlapping[0], dir.path().join("b.json"));

        let missing = collect_inputs(&["missing.nc".to_string()]).unwrap();
        assert_eq!(missing, vec![PathBuf::from("missing.nc")]);
    }
}
