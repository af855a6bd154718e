//! Station reconciliation for bulletin tables
//!
//! This module merges forecast and observation station data by name into
//! one row per bulletin station.
//!
//! # Architecture
//!
//! - [`aliases`] - one-way station name substitution
//! - [`deduplication`] - fewest-missing selection among duplicate rows
//! - [`merge`] - outer joins, reindexing and regional splits
//! - [`reconciler`] - the full procedure with its statistics
//!
//! # Example Usage
//!
//! ```rust
//! use bulletin_tables::models::{Reading, StationTable};
//! use bulletin_tables::reconcile::{ObservationSource, ReconcileRequest, reconcile};
//!
//! # fn example() -> bulletin_tables::Result<()> {
//! let stations = vec!["A".to_string(), "B".to_string()];
//! let mut forecast = StationTable::with_columns(["prev_min", "prev_max"]);
//! forecast.push_row("A", vec![Reading::Present(10.2), Reading::Present(19.7)])?;
//!
//! let result = reconcile(ReconcileRequest {
//!     stations: &stations,
//!     forecast,
//!     observations: vec![ObservationSource::new("tmin_tmax", StationTable::with_columns(["tmin_obs"]))],
//!     column_order: None,
//! })?;
//!
//! assert_eq!(result.table.len(), 2);
//! assert_eq!(result.table.get("A", "prev_max"), Some(Reading::Present(20.0)));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod aliases;
pub mod deduplication;
pub mod merge;
pub mod reconciler;

#[cfg(test)]
pub mod tests;

pub use aliases::StationAliases;
pub use deduplication::{count_duplicate_stations, deduplicate_fewest_missing};
pub use merge::{outer_merge, reindex, split_regions};
pub use reconciler::{ObservationSource, ReconcileRequest, ReconcileStats, Reconciled, reconcile};
