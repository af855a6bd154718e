//! Core data structures and types for bulletin processing.
//!
//! Defines the tagged reading value, station tables keyed by station name,
//! the run date that replaces ambient date variables, and stage statistics.

use crate::constants::PLACEHOLDER;
use crate::error::{BulletinError, Result};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single numeric value that may be absent.
///
/// Missing values stay typed all the way to the output boundary, where
/// [`Reading::display`] renders them as the `/` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Reading {
    Present(f64),
    #[default]
    Missing,
}

impl Reading {
    /// Wrap a float, treating NaN and infinities as missing
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Reading::Present(value)
        } else {
            Reading::Missing
        }
    }

    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Reading::Missing, Reading::from_f64)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reading::Missing)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Present(v) => Some(*v),
            Reading::Missing => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Reading::Present(v) => Reading::from_f64(f(v)),
            Reading::Missing => Reading::Missing,
        }
    }

    /// Round to the nearest whole degree (ties to even, as the bulletin
    /// spreadsheets always did)
    pub fn rounded(self) -> Self {
        self.map(f64::round_ties_even)
    }

    /// Printable form used by the bulletin tables: whole numbers or `/`
    pub fn display(&self) -> String {
        match self {
            Reading::Present(v) => format!("{}", v.round_ties_even() as i64),
            Reading::Missing => PLACEHOLDER.to_string(),
        }
    }
}

impl From<Option<f64>> for Reading {
    fn from(value: Option<f64>) -> Self {
        Reading::from_option(value)
    }
}

/// Station entry from the official station catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub sid: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
}

/// One row of a station table: a station name and readings aligned with
/// the table's columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationRow {
    pub station: String,
    pub values: Vec<Reading>,
}

impl StationRow {
    pub fn new(station: impl Into<String>, values: Vec<Reading>) -> Self {
        Self {
            station: station.into(),
            values,
        }
    }

    /// Number of missing readings across all non-key columns
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }
}

/// Ordered table of per-station readings.
///
/// Rows keep insertion order and may repeat a station name until the table
/// goes through deduplication.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationTable {
    columns: Vec<String>,
    rows: Vec<StationRow>,
}

impl StationTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(columns.into_iter().map(Into::into).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StationRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<StationRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row; the number of values must match the column count
    pub fn push_row(&mut self, station: impl Into<String>, values: Vec<Reading>) -> Result<()> {
        let station = station.into();
        if values.len() != self.columns.len() {
            return Err(BulletinError::configuration(format!(
                "row for station '{}' has {} values but the table has {} columns",
                station,
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(StationRow { station, values });
        Ok(())
    }

    pub(crate) fn push_unchecked(&mut self, row: StationRow) {
        debug_assert_eq!(row.values.len(), self.columns.len());
        self.rows.push(row);
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [StationRow] {
        &mut self.rows
    }

    /// First row for a station
    pub fn row(&self, station: &str) -> Option<&StationRow> {
        self.rows.iter().find(|r| r.station == station)
    }

    /// Reading at (station, column), using the first row for the station
    pub fn get(&self, station: &str, column: &str) -> Option<Reading> {
        let index = self.column_index(column)?;
        self.row(station).map(|row| row.values[index])
    }

    pub fn column(&self, column: &str) -> Option<Vec<Reading>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }

    pub fn stations(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.station.as_str())
    }

    /// Rename columns in place; names absent from the map are kept
    pub fn rename_columns(&mut self, renames: &BTreeMap<String, String>) {
        for column in &mut self.columns {
            if let Some(new_name) = renames.get(column) {
                *column = new_name.clone();
            }
        }
    }

    /// Project onto the given columns, in that order. Columns the table
    /// doesn't have come back entirely missing.
    pub fn select_columns(&self, columns: &[String]) -> StationTable {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| StationRow {
                station: row.station.clone(),
                values: indices
                    .iter()
                    .map(|index| index.map_or(Reading::Missing, |i| row.values[i]))
                    .collect(),
            })
            .collect();

        StationTable {
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn map_values(&mut self, f: impl Fn(Reading) -> Reading) {
        for row in &mut self.rows {
            for value in &mut row.values {
                *value = f(*value);
            }
        }
    }

    /// Printable grid: one `Vec<String>` per row, station first
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.station.clone())
                    .chain(row.values.iter().map(Reading::display))
                    .collect()
            })
            .collect()
    }
}

/// Hour slot of a SYNOP report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynopSlot {
    pub date: NaiveDate,
    pub hour: u32,
}

impl SynopSlot {
    /// Location of the decoded export relative to the observation root:
    /// `YYYY/MM/DD/synop_YYYYMMDDHH00.csv`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.date.year()))
            .join(format!("{:02}", self.date.month()))
            .join(format!("{:02}", self.date.day()))
            .join(format!(
                "synop_{}{:02}00.csv",
                self.date.format("%Y%m%d"),
                self.hour
            ))
    }
}

/// Date of the weather cycle being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate {
    today: NaiveDate,
}

impl RunDate {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today_local() -> Self {
        Self::new(Local::now().date_naive())
    }

    /// Parse a `YYYY-MM-DD` date
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map(Self::new)
            .map_err(|e| BulletinError::InvalidDate {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.today.pred_opt().unwrap_or(self.today)
    }

    /// `YYYYMMDD` stamp used in every dated file name
    pub fn stamp(&self) -> String {
        self.today.format("%Y%m%d").to_string()
    }

    pub fn today_slot(&self, hour: u32) -> SynopSlot {
        SynopSlot {
            date: self.today,
            hour,
        }
    }

    pub fn yesterday_slot(&self, hour: u32) -> SynopSlot {
        SynopSlot {
            date: self.yesterday(),
            hour,
        }
    }

    /// The agricultural year starts on September 1st
    pub fn is_agricultural_year_start(&self) -> bool {
        self.today.month() == 9 && self.today.day() == 1
    }
}

/// Statistics for one pipeline stage
#[derive(Debug, Clone, Default)]
pub struct StageStats {
    pub stage: String,
    pub rows_written: usize,
    pub files_written: Vec<PathBuf>,
    pub fallbacks: usize,
    pub duplicates_removed: usize,
    pub dropped_stations: Vec<String>,
    pub processing_time_ms: u128,
}

impl StageStats {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            ..Default::default()
        }
    }
}

/// Statistics for a full in-process run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub stages: Vec<StageStats>,
    pub processing_time_ms: u128,
}

impl RunSummary {
    pub fn files_written(&self) -> usize {
        self.stages.iter().map(|s| s.files_written.len()).sum()
    }

    pub fn fallbacks(&self) -> usize {
        self.stages.iter().map(|s| s.fallbacks).sum()
    }
}
