//! Trajectories without position QC: every step becomes a record

use super::{START_SECONDS, glider_catalog};
use crate::config::ConversionConfig;
use crate::extractor::TrajectoryExtractor;
use crate::models::{Marker, PointSource, Scalar};
use crate::quality::GoodDataRange;
use chrono::{DateTime, TimeZone, Utc};

fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2011, 9, 7, h, 0, 0).unwrap()
}

#[test]
fn test_every_sample_is_emitted() {
    let catalog = glider_catalog(5);
    let extractor = TrajectoryExtractor::build(&catalog, &ConversionConfig::default()).unwrap();

    assert_eq!(extractor.range(), GoodDataRange::Unbounded);
    assert_eq!(extractor.title(), "Glider sdeep00");
    assert_eq!(extractor.displayed_variables(), vec!["TEMP"]);

    let trajectory = extractor.extract().unwrap();
    assert_eq!(trajectory.points.len(), 5);
    assert_eq!(trajectory.sample_count(), 5);
    assert_eq!(trajectory.path.len(), 5);

    let indices: Vec<Option<usize>> = trajectory.points.iter().map(|p| p.time_index()).collect();
    assert_eq!(indices, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
}

#[test]
fn test_intervals_close_at_next_sample() {
    let catalog = glider_catalog(3);
    let extractor = TrajectoryExtractor::build(&catalog, &ConversionConfig::default()).unwrap();
    let trajectory = extractor.extract().unwrap();

    assert_eq!(trajectory.points[0].begin, hour(0));
    assert_eq!(trajectory.points[0].end, Some(hour(1)));
    assert_eq!(trajectory.points[1].end, Some(hour(2)));
    assert_eq!(trajectory.points[2].begin, hour(2));
    assert_eq!(trajectory.points[2].end, None);
}

#[test]
fn test_markers_and_path() {
    let catalog = glider_catalog(4);
    let trajectory = TrajectoryExtractor::build(&catalog, &ConversionConfig::default())
        .unwrap()
        .extract()
        .unwrap();

    let markers: Vec<Marker> = trajectory.points.iter().map(|p| p.marker).collect();
    assert_eq!(
        markers,
        vec![Marker::Start, Marker::Regular, Marker::Regular, Marker::End]
    );
    assert_eq!(
        trajectory.path[0],
        (Scalar::Double(2.5), Scalar::Double(39.5))
    );
    assert_eq!(trajectory.points[0].coordinate(), (2.5, 39.5));
}

#[test]
fn test_single_sample_is_the_start() {
    let catalog = glider_catalog(1);
    let trajectory = TrajectoryExtractor::build(&catalog, &ConversionConfig::default())
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(trajectory.points.len(), 1);
    assert_eq!(trajectory.points[0].marker, Marker::Start);
    assert_eq!(trajectory.points[0].end, None);
}

#[test]
fn test_field_values() {
    let catalog = glider_catalog(2);
    let trajectory = TrajectoryExtractor::build(&catalog, &ConversionConfig::default())
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(trajectory.points[0].field("TEMP"), Some("14.0 Celsius"));
    assert_eq!(trajectory.points[1].field("TEMP"), Some("15.0 Celsius"));
    assert_eq!(trajectory.points[0].field("trajectory"), None);
}

#[test]
fn test_records_are_lazy() {
    let catalog = glider_catalog(100);
    let extractor = TrajectoryExtractor::build(&catalog, &ConversionConfig::default()).unwrap();

    let first_two: Vec<_> = extractor.records().unwrap().take(2).collect();
    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[1].source, PointSource::Sample { index: 1 });
    assert_eq!(first_two[0].begin.timestamp() as f64, START_SECONDS);
}

#[test]
fn test_title_override_and_default() {
    let catalog = glider_catalog(2);
    let config = ConversionConfig::default().with_title("Mission 42");
    let extractor = TrajectoryExtractor::build(&catalog, &config).unwrap();
    assert_eq!(extractor.title(), "Mission 42");

    let mut untitled = glider_catalog(2);
    untitled.remove_global_attribute(crate::constants::TITLE);
    let extractor = TrajectoryExtractor::build(&untitled, &ConversionConfig::default()).unwrap();
    assert_eq!(extractor.title(), "Trajectory data");
}
