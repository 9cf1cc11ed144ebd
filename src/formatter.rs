//! Display values of measurement variables.
//!
//! Every displayed variable is read once into a [`LoadedVariable`]. A
//! value renders as `"<value> <units>"`; values of `(time, level)`
//! variables are taken at the first level and followed by the vertical
//! coordinate, e.g. `"37.9 psu at 0.5m"`. Rejected, NaN and fill values
//! render as `"N/A"`.

use crate::catalog::{AxisRole, CoordinateAxes, VariableCatalog, axis_role, coordinate_names};
use crate::constants;
use crate::error::{Result, TrajectoryError};
use crate::models::{ArrayData, DisplayField, Scalar, Shape, VariableInfo};
use crate::quality::ValueQuality;
use tracing::{debug, error, warn};

/// How a vertical coordinate is addressed for a time step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerticalLayout {
    /// `depth(level)`, read at level 0
    AlongLevel,
    /// `depth(time)`, read at the time index
    AlongTime,
    /// `depth(time, level)`, read at `(time, 0)`
    TimeByLevel { levels: usize },
}

#[derive(Debug, Clone, PartialEq)]
struct VerticalCoordinate {
    name: String,
    data: ArrayData,
    units: String,
    layout: VerticalLayout,
}

impl VerticalCoordinate {
    fn value_at(&self, time_index: usize) -> Result<Scalar> {
        let flat = match self.layout {
            VerticalLayout::AlongLevel => 0,
            VerticalLayout::AlongTime => time_index,
            VerticalLayout::TimeByLevel { levels } => time_index * levels,
        };
        self.data
            .get(flat)
            .ok_or_else(|| TrajectoryError::IndexOutOfBounds {
                name: self.name.clone(),
                index: flat,
                len: self.data.len(),
            })
    }
}

/// A displayed variable with its data, read once
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedVariable {
    name: String,
    shape: Shape,
    data: ArrayData,
    units: Option<String>,
    fill_value: Option<f64>,
    vertical: Option<VerticalCoordinate>,
}

impl LoadedVariable {
    pub fn load(
        catalog: &dyn VariableCatalog,
        axes: &CoordinateAxes,
        info: &VariableInfo,
    ) -> Result<Self> {
        let shape = Shape::from_dimensions(&info.name, &info.shape())?;
        let data = catalog.read(&info.name)?;

        let vertical = match shape {
            Shape::TimeOnly { .. } => None,
            Shape::TimeByLevel { .. } => {
                let coordinate = load_vertical_coordinate(catalog, axes, info)?;
                if coordinate.is_none() {
                    warn!(
                        "No vertical coordinate found for {}, values are shown without depth",
                        info.name
                    );
                }
                coordinate
            }
        };

        Ok(Self {
            name: info.name.clone(),
            shape,
            data,
            units: info.units().map(str::to_string),
            fill_value: info.fill_value(),
            vertical,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display value at a time step; `accepted` is the value QC decision
    pub fn format(&self, index: usize, accepted: bool) -> Result<String> {
        let len = self.shape.times();
        if index >= len {
            return Err(TrajectoryError::IndexOutOfBounds {
                name: self.name.clone(),
                index,
                len,
            });
        }
        let flat = self.shape.flat_index(index);
        let value = self
            .data
            .get(flat)
            .ok_or_else(|| TrajectoryError::IndexOutOfBounds {
                name: self.name.clone(),
                index: flat,
                len: self.data.len(),
            })?;

        let is_fill = self.fill_value.is_some_and(|fill| value.equals_fill(fill));
        if !accepted || value.is_nan() || is_fill {
            return Ok(constants::NOT_AVAILABLE.to_string());
        }

        let mut text = format!("{}{}", value, unit_suffix(self.units.as_deref()));
        if let Some(vertical) = &self.vertical {
            let level = vertical.value_at(index)?;
            text.push_str(&format!(" at {}{}", level, vertical.units));
        }
        Ok(text)
    }
}

/// `" <units>"`, or nothing for empty and dimensionless units
fn unit_suffix(units: Option<&str>) -> String {
    match units.map(str::trim) {
        None | Some("") | Some(constants::DIMENSIONLESS_UNITS) => String::new(),
        Some(units) => format!(" {}", units),
    }
}

/// Height/depth coordinate of a `(time, level)` variable, looked up through
/// its `coordinates` attribute, then its dimension coordinates, then the
/// dataset vertical axis when that axis lies along the variable's dimensions
fn load_vertical_coordinate(
    catalog: &dyn VariableCatalog,
    axes: &CoordinateAxes,
    info: &VariableInfo,
) -> Result<Option<VerticalCoordinate>> {
    let mut candidates: Vec<&str> = coordinate_names(info);
    candidates.extend(info.dimensions.iter().map(|d| d.name.as_str()));
    if let Some(axis) = axes.get(AxisRole::Height) {
        candidates.push(axis);
    }

    let found = candidates
        .into_iter()
        .filter_map(|name| catalog.variable(name))
        .filter(|candidate| candidate.name != info.name)
        .find(|candidate| {
            axis_role(candidate) == Some(AxisRole::Height)
                && candidate
                    .dimensions
                    .iter()
                    .all(|d| info.dimensions.iter().any(|own| own.name == d.name))
        });
    let Some(coordinate) = found else {
        return Ok(None);
    };

    let time_dim = &info.dimensions[0].name;
    let level_dim = &info.dimensions[1].name;
    let layout = match coordinate.dimensions.as_slice() {
        [dim] if &dim.name == level_dim => VerticalLayout::AlongLevel,
        [dim] if &dim.name == time_dim => VerticalLayout::AlongTime,
        [time, level] if &time.name == time_dim => VerticalLayout::TimeByLevel { levels: level.len },
        dims => {
            return Err(TrajectoryError::vertical_coordinate(
                &info.name,
                format!(
                    "{} must be 1 or 2 dimensional along the variable, found {} dimensions",
                    coordinate.name,
                    dims.len()
                ),
            ));
        }
    };

    debug!("Vertical coordinate of {}: {} ({:?})", info.name, coordinate.name, layout);
    Ok(Some(VerticalCoordinate {
        name: coordinate.name.clone(),
        data: catalog.read(&coordinate.name)?,
        units: coordinate.units().unwrap_or_default().to_string(),
        layout,
    }))
}

/// Formats the displayed variables of a time step
#[derive(Debug, Clone, Default)]
pub struct VariableValueFormatter {
    variables: Vec<LoadedVariable>,
}

impl VariableValueFormatter {
    /// Load the named variables. A variable that cannot be loaded is
    /// reported once and left out of every record.
    pub fn load(catalog: &dyn VariableCatalog, axes: &CoordinateAxes, names: &[String]) -> Self {
        let variables = names
            .iter()
            .filter_map(|name| {
                let info = catalog.variable(name)?;
                match LoadedVariable::load(catalog, axes, info) {
                    Ok(variable) => Some(variable),
                    Err(e) => {
                        error!("Variable {} is not displayed: {}", name, e);
                        None
                    }
                }
            })
            .collect();
        Self { variables }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(LoadedVariable::name)
    }

    /// Display fields of a time step; a field that fails to format is
    /// logged and omitted
    pub fn format_step(&self, index: usize, quality: &ValueQuality) -> Vec<DisplayField> {
        self.variables
            .iter()
            .filter_map(|variable| {
                let accepted = quality.accepts(variable.name(), index);
                match variable.format(index, accepted) {
                    Ok(value) => Some(DisplayField {
                        name: variable.name().to_string(),
                        value,
                    }),
                    Err(e) => {
                        error!("Cannot format {} at index {}: {}", variable.name(), index, e);
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, MemoryVariable};
    use crate::quality::QcArray;

    fn load(catalog: &MemoryCatalog, name: &str) -> Result<LoadedVariable> {
        let axes = CoordinateAxes::discover(catalog).unwrap();
        LoadedVariable::load(catalog, &axes, catalog.variable(name).unwrap())
    }

    #[test]
    fn test_one_dimensional_value_with_units() {
        let catalog = MemoryCatalog::new("memory://fmt").with_variable(
            MemoryVariable::new("TEMP", &[("time", 2)], ArrayData::Float(vec![14.5, 15.25]))
                .with_attribute(constants::UNITS, "Celsius"),
        );
        let temp = load(&catalog, "TEMP").unwrap();

        assert_eq!(temp.format(0, true).unwrap(), "14.5 Celsius");
        assert_eq!(temp.format(1, true).unwrap(), "15.25 Celsius");
        assert_eq!(temp.format(1, false).unwrap(), "N/A");
    }

    #[test]
    fn test_dimensionless_and_missing_units() {
        let catalog = MemoryCatalog::new("memory://fmt")
            .with_variable(
                MemoryVariable::new("PSAL", &[("time", 1)], ArrayData::Double(vec![37.9]))
                    .with_attribute(constants::UNITS, "1"),
            )
            .with_variable(MemoryVariable::new(
                "COUNT",
                &[("time", 1)],
                ArrayData::Int(vec![3]),
            ));

        assert_eq!(load(&catalog, "PSAL").unwrap().format(0, true).unwrap(), "37.9");
        assert_eq!(load(&catalog, "COUNT").unwrap().format(0, true).unwrap(), "3");
    }

    #[test]
    fn test_fill_value_is_not_available_regardless_of_qc() {
        let catalog = MemoryCatalog::new("memory://fmt").with_variable(
            MemoryVariable::new(
                "TEMP",
                &[("time", 3)],
                ArrayData::Float(vec![99999.0, f32::NAN, 14.0]),
            )
            .with_attribute(constants::UNITS, "Celsius")
            .with_attribute(constants::FILL_VALUE, 99999.0),
        );
        let axes = CoordinateAxes::discover(&catalog).unwrap();
        let formatter = VariableValueFormatter::load(&catalog, &axes, &["TEMP".to_string()]);
        let quality = ValueQuality::default()
            .with_threshold(constants::PROBABLY_GOOD_DATA)
            .with_array("TEMP", QcArray::from_codes("TEMP_QC", vec![1, 1, 1]));

        assert_eq!(formatter.format_step(0, &quality)[0].value, "N/A");
        assert_eq!(formatter.format_step(1, &quality)[0].value, "N/A");
        assert_eq!(formatter.format_step(2, &quality)[0].value, "14.0 Celsius");
    }

    #[test]
    fn test_profile_value_with_level_coordinate() {
        let catalog = MemoryCatalog::new("memory://fmt")
            .with_variable(
                MemoryVariable::new("depth", &[("depth", 3)], ArrayData::Float(vec![0.5, 1.0, 2.0]))
                    .with_attribute(constants::STANDARD_NAME, "depth")
                    .with_attribute(constants::UNITS, "m"),
            )
            .with_variable(
                MemoryVariable::new(
                    "PSAL",
                    &[("time", 2), ("depth", 3)],
                    ArrayData::Float(vec![37.9, 38.0, 38.1, 37.5, 37.6, 37.7]),
                )
                .with_attribute(constants::UNITS, "psu"),
            );
        let psal = load(&catalog, "PSAL").unwrap();

        assert_eq!(psal.format(0, true).unwrap(), "37.9 psu at 0.5m");
        assert_eq!(psal.format(1, true).unwrap(), "37.5 psu at 0.5m");
    }

    #[test]
    fn test_profile_value_with_time_varying_coordinate() {
        let catalog = MemoryCatalog::new("memory://fmt")
            .with_variable(
                MemoryVariable::new("DEPTH", &[("time", 2)], ArrayData::Double(vec![5.0, 7.5]))
                    .with_attribute(constants::POSITIVE, "down")
                    .with_attribute(constants::UNITS, "m"),
            )
            .with_variable(
                MemoryVariable::new(
                    "TEMP",
                    &[("time", 2), ("level", 2)],
                    ArrayData::Double(vec![14.0, 13.0, 15.0, 12.0]),
                )
                .with_attribute(constants::COORDINATES, "DEPTH")
                .with_attribute(constants::UNITS, "Celsius"),
            );
        let temp = load(&catalog, "TEMP").unwrap();

        assert_eq!(temp.format(1, true).unwrap(), "15.0 Celsius at 7.5m");
    }

    #[test]
    fn test_three_dimensional_variable_is_omitted() {
        let catalog = MemoryCatalog::new("memory://fmt")
            .with_variable(MemoryVariable::new(
                "CUBE",
                &[("time", 1), ("y", 1), ("x", 1)],
                ArrayData::Double(vec![1.0]),
            ))
            .with_variable(MemoryVariable::new(
                "TEMP",
                &[("time", 1)],
                ArrayData::Double(vec![14.0]),
            ));
        assert!(matches!(
            load(&catalog, "CUBE"),
            Err(TrajectoryError::UnsupportedShape { dimensions: 3, .. })
        ));

        let axes = CoordinateAxes::discover(&catalog).unwrap();
        let formatter = VariableValueFormatter::load(
            &catalog,
            &axes,
            &["CUBE".to_string(), "TEMP".to_string()],
        );
        assert_eq!(formatter.names().collect::<Vec<_>>(), vec!["TEMP"]);
    }

    #[test]
    fn test_out_of_range_index_omits_field() {
        let catalog = MemoryCatalog::new("memory://fmt").with_variable(MemoryVariable::new(
            "TEMP",
            &[("time", 1)],
            ArrayData::Double(vec![14.0]),
        ));
        let axes = CoordinateAxes::discover(&catalog).unwrap();
        let formatter = VariableValueFormatter::load(&catalog, &axes, &["TEMP".to_string()]);

        assert!(formatter.format_step(5, &ValueQuality::default()).is_empty());
    }
}
