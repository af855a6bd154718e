//! Tests for the station reconciliation module
//!
//! Shared table builders live here; each submodule covers one stage of the
//! procedure.


use crate::models::{Reading, StationTable};

/// Shorthand for building readings from options
pub fn r(value: Option<f64>) -> Reading {
    Reading::from_option(value)
}

/// Build a table from `(station, values)` rows
pub fn table(columns: &[&str], rows: &[(&str, &[Option<f64>])]) -> StationTable {
    let mut table = StationTable::with_columns(columns.iter().copied());
    for (station, values) in rows {
        table
            .push_row(*station, values.iter().map(|v| r(*v)).collect())
            .unwrap();
    }
    table
}

pub fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
