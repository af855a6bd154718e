//! Observation tables built from decoded SYNOP reports.
//!
//! Each report contributes one column. Reports are left-joined onto the
//! canonical station list, so a station reported twice yields two candidate
//! rows; the candidate with the fewest missing values wins.

use crate::config::{HourlySlot, TemperatureUnit};
use crate::constants::{observation_columns, synop_columns};
use crate::error::Result;
use crate::models::{StationRow, StationTable};
use crate::reconcile::{StationAliases, deduplicate_fewest_missing, outer_merge};
use std::collections::HashSet;
use tracing::{debug, info};

/// An observation table ready to be written
#[derive(Debug, Clone)]
pub struct ObservationTable {
    pub table: StationTable,
    pub duplicates_removed: usize,
}

/// Extract one report column as a single-column table named `target`.
///
/// Station names go through the alias table and temperatures are converted
/// to Celsius. A missing report gives an empty table.
pub fn report_column(
    report: Option<&StationTable>,
    source_column: &str,
    target: &str,
    aliases: &StationAliases,
    unit: TemperatureUnit,
) -> StationTable {
    let mut column = StationTable::with_columns([target]);
    let Some(report) = report else {
        return column;
    };

    let Some(index) = report.column_index(source_column) else {
        debug!("Report has no '{}' column", source_column);
        return column;
    };

    for row in report.rows() {
        let value = row.values[index].map(|v| unit.to_celsius(v));
        column.push_unchecked(StationRow::new(aliases.apply(&row.station), vec![value]));
    }
    column
}

/// Left-join report columns onto the station list, in order, then keep the
/// fewest-missing candidate per station.
pub fn left_join_reports(stations: &[String], columns: Vec<(String, StationTable)>) -> Result<ObservationTable> {
    let mut joined = StationTable::new(Vec::new());
    for station in stations {
        joined.push_unchecked(StationRow::new(station.clone(), Vec::new()));
    }

    for (name, column) in &columns {
        joined = outer_merge(&joined, column, name)?;
    }

    let listed: HashSet<&str> = stations.iter().map(String::as_str).collect();
    let mut restricted = StationTable::new(joined.columns().to_vec());
    for row in joined.into_rows() {
        if listed.contains(row.station.as_str()) {
            restricted.push_unchecked(row);
        }
    }

    let (table, duplicates_removed) = deduplicate_fewest_missing(restricted);
    Ok(ObservationTable {
        table,
        duplicates_removed,
    })
}

/// Hourly air temperature table, one column per slot.
///
/// `reports` is aligned with `slots`; a `None` report leaves its column
/// entirely missing.
pub fn build_hourly_table(
    stations: &[String],
    slots: &[HourlySlot],
    reports: &[Option<StationTable>],
    aliases: &StationAliases,
    unit: TemperatureUnit,
) -> Result<ObservationTable> {
    let columns = slots
        .iter()
        .zip(reports)
        .map(|(slot, report)| {
            (
                slot.column.clone(),
                report_column(
                    report.as_ref(),
                    synop_columns::AIR_TEMPERATURE,
                    &slot.column,
                    aliases,
                    unit,
                ),
            )
        })
        .collect();

    let result = left_join_reports(stations, columns)?;
    info!(
        "Hourly observations: {} stations, {} of {} reports available",
        result.table.len(),
        reports.iter().filter(|r| r.is_some()).count(),
        slots.len()
    );
    Ok(result)
}

/// Minimum (today 06 UTC report) and maximum (yesterday 18 UTC report)
/// temperature table
pub fn build_min_max_table(
    stations: &[String],
    tmin_report: Option<&StationTable>,
    tmax_report: Option<&StationTable>,
    aliases: &StationAliases,
    unit: TemperatureUnit,
) -> Result<ObservationTable> {
    let columns = vec![
        (
            observation_columns::TMIN.to_string(),
            report_column(
                tmin_report,
                synop_columns::MIN_TEMPERATURE,
                observation_columns::TMIN,
                aliases,
                unit,
            ),
        ),
        (
            observation_columns::TMAX.to_string(),
            report_column(
                tmax_report,
                synop_columns::MAX_TEMPERATURE,
                observation_columns::TMAX,
                aliases,
                unit,
            ),
        ),
    ];

    let result = left_join_reports(stations, columns)?;
    info!(
        "Min/max observations: {} stations, {} duplicate rows resolved",
        result.table.len(),
        result.duplicates_removed
    );
    Ok(result)
}
