//! Outer joins on station name and reindexing to a station list

use crate::config::Region;
use crate::error::{BulletinError, Result};
use crate::models::{Reading, StationRow, StationTable};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outer-join two tables on station name.
///
/// Left rows come first, each combined with every right row of the same
/// station (or with missing values when there is none); right rows that
/// matched nothing follow in their original order. Non-key columns must
/// not overlap.
pub fn outer_merge(left: &StationTable, right: &StationTable, source_name: &str) -> Result<StationTable> {
    for column in right.columns() {
        if left.column_index(column).is_some() {
            return Err(BulletinError::ColumnConflict {
                column: column.clone(),
                source_name: source_name.to_string(),
            });
        }
    }

    let mut columns = left.columns().to_vec();
    columns.extend(right.columns().iter().cloned());
    let mut merged = StationTable::new(columns);

    let mut right_index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        right_index.entry(row.station.as_str()).or_default().push(i);
    }

    let right_width = right.columns().len();
    let left_width = left.columns().len();
    let mut matched: HashSet<&str> = HashSet::new();

    for left_row in left.rows() {
        match right_index.get(left_row.station.as_str()) {
            Some(indices) => {
                matched.insert(left_row.station.as_str());
                for &i in indices {
                    let mut values = left_row.values.clone();
                    values.extend_from_slice(&right.rows()[i].values);
                    merged.push_unchecked(StationRow::new(left_row.station.clone(), values));
                }
            }
            None => {
                let mut values = left_row.values.clone();
                values.extend(std::iter::repeat_n(Reading::Missing, right_width));
                merged.push_unchecked(StationRow::new(left_row.station.clone(), values));
            }
        }
    }

    for right_row in right.rows() {
        if matched.contains(right_row.station.as_str()) {
            continue;
        }
        let mut values = vec![Reading::Missing; left_width];
        values.extend_from_slice(&right_row.values);
        merged.push_unchecked(StationRow::new(right_row.station.clone(), values));
    }

    debug!(
        "Merged '{}': {} + {} rows -> {} rows",
        source_name,
        left.len(),
        right.len(),
        merged.len()
    );

    Ok(merged)
}

/// Reorder a table to exactly the given stations.
///
/// Stations with no row get an all-missing row. The first row of a station
/// is used if it occurs more than once. Returns the reindexed table and the
/// stations that had rows but are not in the list.
pub fn reindex(table: &StationTable, stations: &[String]) -> (StationTable, Vec<String>) {
    let mut first_rows: HashMap<&str, &StationRow> = HashMap::new();
    for row in table.rows() {
        first_rows.entry(row.station.as_str()).or_insert(row);
    }

    let width = table.columns().len();
    let mut reindexed = StationTable::new(table.columns().to_vec());
    for station in stations {
        let values = match first_rows.get(station.as_str()) {
            Some(row) => row.values.clone(),
            None => vec![Reading::Missing; width],
        };
        reindexed.push_unchecked(StationRow::new(station.clone(), values));
    }

    let wanted: HashSet<&str> = stations.iter().map(String::as_str).collect();
    let mut dropped: Vec<String> = Vec::new();
    for station in table.stations() {
        if !wanted.contains(station) && !dropped.iter().any(|d| d == station) {
            dropped.push(station.to_string());
        }
    }

    (reindexed, dropped)
}

/// Split a bulletin table into one table per region, each in region order
pub fn split_regions(table: &StationTable, regions: &[Region]) -> Vec<(String, StationTable)> {
    regions
        .iter()
        .map(|region| {
            let (regional, _) = reindex(table, &region.stations);
            (region.name.clone(), regional)
        })
        .collect()
}
