//! Ancillary variable resolution.
//!
//! A measurement points at its QC variable through the
//! `ancillary_variables` attribute. Datasets that omit the attribute are
//! searched by naming convention (`TEMP_qc`, `QC_TEMP`, ...). The resolver
//! also decides which variables are shown in the track balloons.

use crate::catalog::{CoordinateAxes, VariableCatalog};
use crate::config::QcConventions;
use crate::constants;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Links between variables and their QC variables, plus the displayable set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncillaryResolver {
    links: BTreeMap<String, Option<String>>,
    referenced: BTreeSet<String>,
    primary: Vec<String>,
}

impl AncillaryResolver {
    pub fn resolve(
        catalog: &dyn VariableCatalog,
        axes: &CoordinateAxes,
        conventions: &QcConventions,
        display_ancillary_variables: bool,
    ) -> Self {
        let mut links = BTreeMap::new();
        let mut referenced = BTreeSet::new();

        for info in catalog.variables() {
            let listed: Vec<&str> = info
                .attribute(constants::ANCILLARY_VARIABLES)
                .filter(|value| !value.is_empty())
                .and_then(|value| value.as_str())
                .map(|names| names.split_whitespace().collect())
                .unwrap_or_default();

            let qc_variable = if listed.is_empty() {
                let found = conventions
                    .candidate_names(&info.name)
                    .into_iter()
                    .find(|candidate| catalog.variable(candidate).is_some());
                if let Some(name) = &found {
                    debug!("{} is quality controlled by {} (naming convention)", info.name, name);
                    referenced.insert(name.clone());
                }
                found
            } else {
                let mut selected: Option<String> = None;
                for name in listed {
                    if catalog.variable(name).is_none() {
                        warn!(
                            "The ancillary variable {} of {} doesn't exist in the dataset",
                            name, info.name
                        );
                        continue;
                    }
                    referenced.insert(name.to_string());
                    if !conventions.is_qc_name(name) {
                        continue;
                    }
                    match &selected {
                        None => selected = Some(name.to_string()),
                        Some(first) => warn!(
                            "{} lists several QC variables, keeping {} and discarding {}",
                            info.name, first, name
                        ),
                    }
                }
                if let Some(name) = &selected {
                    debug!("{} is quality controlled by {}", info.name, name);
                }
                selected
            };

            links.insert(info.name.clone(), qc_variable);
        }

        let primary = catalog
            .variables()
            .iter()
            .filter(|info| {
                let name = info.name.as_str();
                if axes.contains(name) || info.has_attribute(constants::CF_ROLE) {
                    return false;
                }
                if conventions.is_qc_name(name) {
                    return false;
                }
                !referenced.contains(name) || display_ancillary_variables
            })
            .map(|info| info.name.clone())
            .collect::<Vec<_>>();

        debug!("Displayable variables: {:?}", primary);

        Self {
            links,
            referenced,
            primary,
        }
    }

    /// QC variable linked to `variable`
    pub fn qc_variable(&self, variable: &str) -> Option<&str> {
        self.links.get(variable).and_then(|link| link.as_deref())
    }

    /// Variables to display, in dataset order
    pub fn primary_variables(&self) -> &[String] {
        &self.primary
    }

    /// Whether another variable references `name` as an ancillary variable
    pub fn is_ancillary(&self, name: &str) -> bool {
        self.referenced.contains(name)
    }

    pub fn links(&self) -> &BTreeMap<String, Option<String>> {
        &self.links
    }
}
