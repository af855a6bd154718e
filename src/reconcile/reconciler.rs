//! The station reconciliation procedure
//!
//! Aligns one forecast table and any number of observation tables on a
//! canonical station list:
//!
//! 1. alias observation station names
//! 2. keep the fewest-missing row per station in each observation table
//! 3. outer-merge the forecast with each observation table, in order
//! 4. reindex to the station list
//! 5. round every value to a whole degree
//!
//! Missing values stay [`Reading::Missing`]; the `/` placeholder only
//! appears when the table is written.

use super::aliases::StationAliases;
use super::deduplication::{count_duplicate_stations, deduplicate_fewest_missing};
use super::merge::{outer_merge, reindex};
use crate::error::Result;
use crate::models::{Reading, StationTable};
use tracing::{debug, info, warn};

/// An observation table entering the reconciliation
#[derive(Debug, Clone)]
pub struct ObservationSource<'a> {
    /// Name used in logs and conflict errors
    pub name: String,
    pub table: StationTable,
    pub aliases: Option<&'a StationAliases>,
}

impl<'a> ObservationSource<'a> {
    pub fn new(name: impl Into<String>, table: StationTable) -> Self {
        Self {
            name: name.into(),
            table,
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &'a StationAliases) -> Self {
        self.aliases = Some(aliases);
        self
    }
}

/// Inputs of one reconciliation
#[derive(Debug, Clone)]
pub struct ReconcileRequest<'a> {
    pub stations: &'a [String],
    pub forecast: StationTable,
    pub observations: Vec<ObservationSource<'a>>,
    /// Output column order; `None` keeps forecast columns then observation
    /// columns in merge order
    pub column_order: Option<&'a [String]>,
}

/// What happened during a reconciliation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileStats {
    pub aliased_rows: usize,
    pub duplicates_removed: usize,
    /// Stations with data in some source but absent from the station list
    pub dropped_stations: Vec<String>,
    /// Stations of the list with no value in any column
    pub empty_stations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub table: StationTable,
    pub stats: ReconcileStats,
}

/// Run the reconciliation procedure.
///
/// The result has exactly one row per listed station, in list order.
pub fn reconcile(request: ReconcileRequest<'_>) -> Result<Reconciled> {
    let ReconcileRequest {
        stations,
        forecast,
        observations,
        column_order,
    } = request;

    let mut stats = ReconcileStats::default();
    let mut merged = forecast;

    for source in observations {
        let ObservationSource {
            name,
            mut table,
            aliases,
        } = source;

        if let Some(aliases) = aliases {
            let renamed = aliases.apply_to_table(&mut table);
            if renamed > 0 {
                debug!("Source '{}': {} station names aliased", name, renamed);
            }
            stats.aliased_rows += renamed;
        }

        let duplicated = count_duplicate_stations(&table);
        if duplicated > 0 {
            debug!("Source '{}': {} stations reported more than once", name, duplicated);
        }
        let (table, removed) = deduplicate_fewest_missing(table);
        stats.duplicates_removed += removed;

        merged = outer_merge(&merged, &table, &name)?;
    }

    let (reindexed, dropped) = reindex(&merged, stations);
    for station in &dropped {
        warn!(
            "Station '{}' has data but is not in the station list; its row is dropped",
            station
        );
    }
    stats.dropped_stations = dropped;

    let mut table = match column_order {
        Some(order) => reindexed.select_columns(order),
        None => reindexed,
    };
    table.map_values(Reading::rounded);

    stats.empty_stations = table
        .rows()
        .iter()
        .filter(|row| row.values.iter().all(Reading::is_missing))
        .map(|row| row.station.clone())
        .collect();

    info!(
        "Reconciled {} stations ({} without any data, {} duplicates removed)",
        table.len(),
        stats.empty_stations.len(),
        stats.duplicates_removed
    );

    Ok(Reconciled { table, stats })
}
