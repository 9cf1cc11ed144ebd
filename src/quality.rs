//! Quality control of trajectory samples.
//!
//! Quality control codes follow the OceanSITES/SOCIB scale: 0 means no QC
//! performed, larger values mean worse data. A code is accepted when it is
//! strictly below the configured threshold (2, "probably good data").
//!
//! - [`ancillary`] links every variable to its QC companion
//! - [`position`] decides which time steps have a usable position
//! - [`value`] decides which measurement values are displayed

pub mod ancillary;
pub mod position;
pub mod value;

use crate::catalog::VariableCatalog;
use crate::error::Result;
use crate::models::Shape;

pub use ancillary::AncillaryResolver;
pub use position::{GoodDataRange, PositionQuality};
pub use value::ValueQuality;

/// QC codes of one variable, addressed by time index
#[derive(Debug, Clone, PartialEq)]
pub struct QcArray {
    name: String,
    codes: Vec<i32>,
    shape: Shape,
}

impl QcArray {
    /// Read a QC variable from the catalog
    pub fn load(catalog: &dyn VariableCatalog, name: &str) -> Result<Self> {
        let info = catalog
            .variable(name)
            .ok_or_else(|| crate::error::TrajectoryError::VariableNotFound {
                name: name.to_string(),
            })?;
        let shape = Shape::from_dimensions(name, &info.shape())?;
        let codes = catalog.read(name)?.to_codes();
        Ok(Self {
            name: name.to_string(),
            codes,
            shape,
        })
    }

    /// 1-D QC array from raw codes
    pub fn from_codes(name: impl Into<String>, codes: Vec<i32>) -> Self {
        let shape = Shape::TimeOnly { len: codes.len() };
        Self {
            name: name.into(),
            codes,
            shape,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of time steps covered
    pub fn len(&self) -> usize {
        self.shape.times()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code at `(time_index)` or `(time_index, 0)`; `None` past the end
    pub fn code_at(&self, time_index: usize) -> Option<i32> {
        if time_index >= self.shape.times() {
            return None;
        }
        self.codes.get(self.shape.flat_index(time_index)).copied()
    }
}
