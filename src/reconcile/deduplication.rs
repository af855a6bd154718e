//! Duplicate station rows in observation tables
//!
//! A SYNOP bulletin regularly carries the same station more than once
//! (corrected reports, relays). For each station the row with the fewest
//! missing fields is kept; ties keep the earliest row.

use crate::models::{StationRow, StationTable};
use std::collections::HashMap;
use tracing::{debug, info};

/// Keep one row per station, choosing the row with the fewest missing values.
///
/// The output keeps the order in which stations first appear in the input.
/// Returns the deduplicated table and the number of rows removed.
pub fn deduplicate_fewest_missing(table: StationTable) -> (StationTable, usize) {
    let columns = table.columns().to_vec();
    let input_count = table.len();

    // station -> index into `kept`
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<StationRow> = Vec::new();

    for row in table.into_rows() {
        match positions.get(&row.station) {
            Some(&index) => {
                if row.missing_count() < kept[index].missing_count() {
                    debug!(
                        "Station {}: replacing row with {} missing fields by row with {}",
                        row.station,
                        kept[index].missing_count(),
                        row.missing_count()
                    );
                    kept[index] = row;
                }
            }
            None => {
                positions.insert(row.station.clone(), kept.len());
                kept.push(row);
            }
        }
    }

    let removed = input_count - kept.len();
    if removed > 0 {
        info!(
            "Deduplication complete: removed {} duplicate rows, {} stations remaining",
            removed,
            kept.len()
        );
    }

    let mut deduplicated = StationTable::new(columns);
    for row in kept {
        deduplicated.push_unchecked(row);
    }
    (deduplicated, removed)
}

/// Count station names that occur on more than one row
pub fn count_duplicate_stations(table: &StationTable) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for station in table.stations() {
        *counts.entry(station).or_insert(0) += 1;
    }
    counts.values().filter(|&&count| count > 1).count()
}
