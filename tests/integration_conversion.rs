//! Integration tests for the conversion pipeline
//!
//! These tests write small trajectory datasets to disk, run the complete
//! conversion and inspect the generated KML document.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trajectory_kml::converter::{convert, default_output_path};
use trajectory_kml::{ConversionConfig, DeploymentInfo, TrajectoryError};

/// A profiling glider: salinity on (time, depth) with position QC
const PROFILER: &str = r#"{
    "attributes": {
        "title": "Profiler ideep02",
        "featureType": "trajectoryProfile"
    },
    "dimensions": { "time": 4, "depth": 2 },
    "variables": [
        { "name": "time", "dimensions": ["time"],
          "attributes": { "standard_name": "time", "units": "hours since 2014-05-01 00:00:00" },
          "values": [0, 6, 12, 18] },
        { "name": "DEPTH", "dimensions": ["depth"],
          "attributes": { "standard_name": "depth", "units": "m", "positive": "down" },
          "values": [0.5, 10.0] },
        { "name": "LAT", "dimensions": ["time"],
          "attributes": { "standard_name": "latitude", "units": "degrees_north",
                          "ancillary_variables": "QC_LAT" },
          "values": [38.5, 38.75, 39.0, 39.25] },
        { "name": "LON", "dimensions": ["time"],
          "attributes": { "standard_name": "longitude", "units": "degrees_east",
                          "ancillary_variables": "QC_LON" },
          "values": [-0.5, -0.25, 0.25, 0.5] },
        { "name": "QC_LAT", "dimensions": ["time"], "type": "int", "values": [1, 1, 1, 4] },
        { "name": "QC_LON", "dimensions": ["time"], "type": "int", "values": [1, 1, 1, 4] },
        { "name": "PSAL", "dimensions": ["time", "depth"], "type": "float",
          "attributes": { "units": "psu", "ancillary_variables": "QC_PSAL",
                          "coordinates": "time DEPTH LAT LON" },
          "values": [37.9, 37.5, 38.1, 37.6, 38.2, 37.7, 38.3, 37.8] },
        { "name": "QC_PSAL", "dimensions": ["time", "depth"], "type": "int",
          "values": [1, 1, 4, 1, 1, 1, 1, 1] }
    ]
}"#;

fn write_dataset(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Text of every element named `tag`, in document order
fn element_texts(xml: &str, tag: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut texts = Vec::new();
    let mut inside = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => inside = e.name().as_ref() == tag.as_bytes(),
            Ok(Event::Text(t)) if inside => {
                let text = t.unescape().unwrap();
                if !text.trim().is_empty() {
                    texts.push(text.into_owned());
                }
            }
            Ok(Event::CData(t)) if inside => {
                texts.push(String::from_utf8_lossy(&t.into_inner()).into_owned())
            }
            Ok(Event::End(_)) => inside = false,
            Ok(Event::Eof) => break,
            Err(e) => panic!("invalid XML: {}", e),
            _ => {}
        }
    }
    texts
}

#[test]
fn test_profiler_track() {
    let dir = TempDir::new().unwrap();
    let input = write_dataset(dir.path(), "ideep02.json", PROFILER);
    let output = default_output_path(&input);

    let stats = convert(&input, &output, &ConversionConfig::default()).unwrap();
    assert_eq!(stats.points_written, 3);
    assert_eq!(stats.variables_displayed, 1);

    let kml = fs::read_to_string(&output).unwrap();
    assert_eq!(
        element_texts(&kml, "styleUrl"),
        vec![
            "#styleForHomeIcon",
            "#styleForRegularIcon",
            "#styleForFinalIcon",
            "#lineStyle"
        ]
    );
    assert_eq!(
        element_texts(&kml, "begin"),
        vec![
            "2014-05-01T00:00:00",
            "2014-05-01T06:00:00",
            "2014-05-01T12:00:00"
        ]
    );
    // the track ends at the last good position, which stays open
    assert_eq!(
        element_texts(&kml, "end"),
        vec!["2014-05-01T06:00:00", "2014-05-01T12:00:00"]
    );

    let descriptions = element_texts(&kml, "description");
    assert_eq!(descriptions.len(), 3);
    assert!(descriptions[0].contains("<strong>PSAL: </strong>37.9 psu at 0.5m"));
    assert!(descriptions[1].contains("<strong>PSAL: </strong>N/A"));
    assert!(descriptions[2].contains("<strong>PSAL: </strong>38.2 psu at 0.5m"));
    assert!(descriptions[0].contains("N38.5 W0.5"));
    assert!(!descriptions[0].contains("QC_PSAL"));

    let coordinates = element_texts(&kml, "coordinates");
    assert_eq!(coordinates.last().unwrap(), "-0.5,38.5 -0.25,38.75 0.25,39.0");
}

#[test]
fn test_deployment_and_thredds_link() {
    let dir = TempDir::new().unwrap();
    let input = write_dataset(dir.path(), "ideep02.json", PROFILER);
    let output = dir.path().join("mission.kml");
    let config = ConversionConfig::default()
        .with_title("Mission 2014")
        .with_thredds_link("http://thredds.example.org/dodsC/ideep02.nc")
        .with_deployment(DeploymentInfo::new("2014-04-30", -0.75, 38.25));

    let stats = convert(&input, &output, &config).unwrap();
    assert_eq!(stats.points_written, 4);

    let kml = fs::read_to_string(&output).unwrap();
    assert_eq!(element_texts(&kml, "name")[0], "Mission 2014");
    assert_eq!(
        element_texts(&kml, "begin")[0],
        "2014-04-30T00:00:00"
    );
    assert_eq!(element_texts(&kml, "end")[0], "2014-05-01T00:00:00");

    let descriptions = element_texts(&kml, "description");
    assert!(!descriptions[0].contains("Time: "));
    assert!(descriptions[0].contains("N38.25 W0.75"));
    assert!(
        descriptions
            .iter()
            .all(|d| d.contains("http://thredds.example.org/dodsC/ideep02.nc"))
    );
}

#[test]
fn test_all_positions_rejected() {
    let dir = TempDir::new().unwrap();
    let rejected = PROFILER.replace("[1, 1, 1, 4]", "[4, 4, 4, 4]");
    assert_ne!(rejected, PROFILER);
    let input = write_dataset(dir.path(), "bad.json", &rejected);
    let output = dir.path().join("bad.kml");

    let result = convert(&input, &output, &ConversionConfig::default());
    assert!(matches!(result, Err(TrajectoryError::NoGoodData { .. })));
    assert!(!output.exists());
}

#[test]
fn test_missing_time_coordinate() {
    let dir = TempDir::new().unwrap();
    let no_time = PROFILER.replace(
        r#"{ "standard_name": "time", "units": "hours since 2014-05-01 00:00:00" }"#,
        "{}",
    );
    let input = write_dataset(dir.path(), "no_time.json", &no_time);

    let result = convert(
        &input,
        &dir.path().join("no_time.kml"),
        &ConversionConfig::default(),
    );
    assert!(matches!(
        result,
        Err(TrajectoryError::MissingCoordinate { .. })
    ));
}

#[test]
fn test_unsupported_input() {
    let dir = TempDir::new().unwrap();
    let input = write_dataset(dir.path(), "track.csv", "time,lat,lon\n");

    let result = convert(
        &input,
        &dir.path().join("track.kml"),
        &ConversionConfig::default(),
    );
    assert!(matches!(
        result,
        Err(TrajectoryError::UnsupportedInput { .. })
    ));
}
