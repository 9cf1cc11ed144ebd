//! Per-value quality: whether a measurement at a time step is displayed.

use super::{AncillaryResolver, QcArray};
use crate::catalog::VariableCatalog;
use crate::config::QcConventions;
use std::collections::{BTreeSet, HashMap};
use tracing::error;

/// QC arrays of the displayed variables, read once
#[derive(Debug, Clone, Default)]
pub struct ValueQuality {
    arrays: HashMap<String, QcArray>,
    unreadable: BTreeSet<String>,
    threshold: i32,
}

impl ValueQuality {
    /// Read the QC variable of every primary variable. A QC variable that
    /// cannot be read rejects every value of its variable.
    pub fn load(
        catalog: &dyn VariableCatalog,
        resolver: &AncillaryResolver,
        conventions: &QcConventions,
    ) -> Self {
        let mut quality = Self {
            threshold: conventions.good_data_threshold,
            ..Default::default()
        };

        for variable in resolver.primary_variables() {
            let Some(qc_name) = resolver.qc_variable(variable) else {
                continue;
            };
            match QcArray::load(catalog, qc_name) {
                Ok(qc) => {
                    quality.arrays.insert(variable.clone(), qc);
                }
                Err(e) => {
                    error!("Cannot read the QC variable {} of {}: {}", qc_name, variable, e);
                    quality.unreadable.insert(variable.clone());
                }
            }
        }
        quality
    }

    pub fn with_array(mut self, variable: impl Into<String>, qc: QcArray) -> Self {
        self.arrays.insert(variable.into(), qc);
        self
    }

    pub fn with_threshold(mut self, threshold: i32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Variables without QC are always accepted; otherwise the code at
    /// `index` must be below the threshold
    pub fn accepts(&self, variable: &str, index: usize) -> bool {
        if self.unreadable.contains(variable) {
            return false;
        }
        match self.arrays.get(variable) {
            None => true,
            Some(qc) => qc
                .code_at(index)
                .is_some_and(|code| code < self.threshold),
        }
    }
}
