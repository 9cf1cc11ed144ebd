//! Position quality: which time steps have an acceptable latitude and
//! longitude, the range of good data, and forward seeking to the next good
//! step.

use super::QcArray;
use crate::config::QcConventions;
use std::ops::Range;
use tracing::{debug, warn};

/// Time steps worth walking, from the position QC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoodDataRange {
    /// No position QC, every step is considered
    Unbounded,
    /// Position QC exists but no step passes it
    Degenerate,
    /// First and last steps with good positions, inclusive
    Bounded { first: usize, last: usize },
}

impl GoodDataRange {
    /// Indices to iterate for a series of `len` steps; `None` when degenerate
    pub fn indices(&self, len: usize) -> Option<Range<usize>> {
        match *self {
            GoodDataRange::Unbounded => Some(0..len),
            GoodDataRange::Degenerate => None,
            GoodDataRange::Bounded { first, last } => {
                let end = (last + 1).min(len);
                Some(first.min(end)..end)
            }
        }
    }
}

/// Position acceptance based on the latitude and longitude QC variables
#[derive(Debug, Clone, PartialEq)]
pub struct PositionQuality {
    qc: Option<(QcArray, QcArray)>,
    threshold: i32,
}

impl PositionQuality {
    /// Filtering only applies when both coordinates have QC variables
    pub fn new(
        latitude: Option<QcArray>,
        longitude: Option<QcArray>,
        conventions: &QcConventions,
    ) -> Self {
        let qc = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            (None, None) => None,
            (lat, lon) => {
                let present = lat.or(lon).map(|qc| qc.name().to_string()).unwrap_or_default();
                warn!(
                    "Only one position QC variable ({}) found, positions are not filtered",
                    present
                );
                None
            }
        };
        Self {
            qc,
            threshold: conventions.good_data_threshold,
        }
    }

    pub fn has_qc(&self) -> bool {
        self.qc.is_some()
    }

    /// Steps where both codes are good, from first to last
    pub fn good_data_range(&self) -> GoodDataRange {
        let Some((lat, lon)) = &self.qc else {
            return GoodDataRange::Unbounded;
        };

        let len = lat.len().min(lon.len());
        let mut first: Option<usize> = None;
        let mut last: Option<usize> = None;
        for index in 0..len {
            if self.accepts(index) {
                first.get_or_insert(index);
                last = Some(index);
            }
        }

        match (first, last) {
            (Some(first), Some(last)) if first <= last => {
                debug!("Good position data from index {} to {}", first, last);
                GoodDataRange::Bounded { first, last }
            }
            _ => GoodDataRange::Degenerate,
        }
    }

    /// True when both position codes at `index` are good. Steps past the end
    /// of either QC array are rejected.
    pub fn accepts(&self, index: usize) -> bool {
        let Some((lat, lon)) = &self.qc else {
            return true;
        };
        match (lat.code_at(index), lon.code_at(index)) {
            (Some(lat_code), Some(lon_code)) => {
                lat_code < self.threshold && lon_code < self.threshold
            }
            _ => false,
        }
    }

    /// Next step after `current`, up to `last`, with a good position;
    /// `current + 1` when there is none
    pub fn next_good_index(&self, current: usize, last: usize) -> usize {
        if self.qc.is_none() {
            return current + 1;
        }
        (current + 1..=last)
            .find(|&index| self.accepts(index))
            .unwrap_or(current + 1)
    }
}
