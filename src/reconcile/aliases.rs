//! Station name aliasing
//!
//! SYNOP reports and bulletins do not always spell station names the same
//! way ("M'SILA" vs "MSILA"). Aliasing is a one-way, case-sensitive
//! substitution applied to observation tables before any join.

use crate::error::{BulletinError, Result};
use crate::models::StationTable;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Read a JSON object of station name pairs
pub(crate) fn read_name_map(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Err(BulletinError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Fixed alias table mapping source station names to bulletin names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationAliases {
    mapping: BTreeMap<String, String>,
}

impl StationAliases {
    pub fn new(mapping: BTreeMap<String, String>) -> Self {
        Self { mapping }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Load a JSON object of `"source name": "bulletin name"` pairs
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let mapping = read_name_map(path)?;
        debug!("Loaded {} station aliases from {}", mapping.len(), path.display());
        Ok(Self::new(mapping))
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Canonical name for a station; unknown names pass through unchanged
    pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
        self.mapping.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Rewrite the station column of a table, returning how many rows changed
    pub fn apply_to_table(&self, table: &mut StationTable) -> usize {
        if self.mapping.is_empty() {
            return 0;
        }

        let mut renamed = 0;
        for row in table.rows_mut() {
            if let Some(target) = self.mapping.get(&row.station) {
                if *target != row.station {
                    row.station = target.clone();
                    renamed += 1;
                }
            }
        }
        renamed
    }

    /// Aliases whose target is itself aliased. With none of these, applying
    /// the table twice gives the same result as applying it once.
    pub fn chained(&self) -> Vec<String> {
        self.mapping
            .iter()
            .filter(|(source, target)| source != target && self.mapping.contains_key(*target))
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Aliases whose target is not one of the given stations
    pub fn targets_outside(&self, stations: &[String]) -> Vec<String> {
        let known: HashSet<&str> = stations.iter().map(String::as_str).collect();
        self.mapping
            .iter()
            .filter(|(_, target)| !known.contains(target.as_str()))
            .map(|(source, _)| source.clone())
            .collect()
    }
}
