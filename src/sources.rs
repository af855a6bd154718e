//! CSV inputs: station catalogue, forecast samples and SYNOP exports.
//!
//! Every file is read through polars with all columns as strings, then
//! values are cast to `f64` non-strictly so that placeholders and other
//! unparsable cells become [`Reading::Missing`].

use crate::constants::{forecast_columns, synop_columns};
use crate::error::{BulletinError, Result};
use crate::forecast::ForecastSample;
use crate::models::{Reading, Station, StationRow, StationTable};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Read a headed CSV with every column as a string
fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(BulletinError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .collect())
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Reading>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().map(Reading::from_option).collect())
}

fn require_column(df: &DataFrame, path: &Path, name: &str) -> Result<()> {
    if has_column(df, name) {
        Ok(())
    } else {
        Err(BulletinError::invalid_table(
            path,
            format!("missing required column '{}'", name),
        ))
    }
}

/// Load the official station catalogue (`station,SID,lon,lat[,alt]`).
///
/// The catalogue is a required input: a missing or empty file is an error.
/// Rows without a name or coordinates are skipped.
pub fn load_station_catalogue(path: &Path) -> Result<Vec<Station>> {
    let df = read_csv(path)?;
    if df.height() == 0 {
        return Err(BulletinError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    for name in [
        forecast_columns::STATION,
        forecast_columns::LONGITUDE,
        forecast_columns::LATITUDE,
    ] {
        require_column(&df, path, name)?;
    }

    let names = string_values(&df, forecast_columns::STATION)?;
    let longitudes = float_values(&df, forecast_columns::LONGITUDE)?;
    let latitudes = float_values(&df, forecast_columns::LATITUDE)?;
    let sids = if has_column(&df, forecast_columns::SID) {
        string_values(&df, forecast_columns::SID)?
    } else {
        vec![None; df.height()]
    };
    let altitudes = if has_column(&df, forecast_columns::ALTITUDE) {
        float_values(&df, forecast_columns::ALTITUDE)?
    } else {
        vec![Reading::Missing; df.height()]
    };

    let mut stations = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        match (&names[i], longitudes[i].value(), latitudes[i].value()) {
            (Some(name), Some(longitude), Some(latitude)) => stations.push(Station {
                name: name.clone(),
                sid: sids[i].clone(),
                longitude,
                latitude,
                altitude: altitudes[i].value(),
            }),
            _ => warn!("Skipping catalogue row {} in {}: incomplete station", i + 1, path.display()),
        }
    }

    info!("Loaded {} stations from {}", stations.len(), path.display());
    Ok(stations)
}

/// Load a station table keyed by `station_column`, keeping `value_columns`
/// in the given order.
///
/// Requested columns that the file lacks come back entirely missing; rows
/// without a station name are dropped.
pub fn load_station_table(path: &Path, station_column: &str, value_columns: &[&str]) -> Result<StationTable> {
    let df = read_csv(path)?;
    require_column(&df, path, station_column)?;

    let names = string_values(&df, station_column)?;
    let mut columns: Vec<Vec<Reading>> = Vec::with_capacity(value_columns.len());
    for name in value_columns {
        if has_column(&df, name) {
            columns.push(float_values(&df, name)?);
        } else {
            debug!("Column '{}' absent from {}, filled as missing", name, path.display());
            columns.push(vec![Reading::Missing; df.height()]);
        }
    }

    let mut table = StationTable::with_columns(value_columns.iter().copied());
    let mut unnamed = 0usize;
    for (i, name) in names.into_iter().enumerate() {
        match name {
            Some(station) => {
                let values = columns.iter().map(|column| column[i]).collect();
                table.push_unchecked(StationRow::new(station, values));
            }
            None => unnamed += 1,
        }
    }

    if unnamed > 0 {
        debug!("Dropped {} rows without a station name from {}", unnamed, path.display());
    }
    Ok(table)
}

/// Like [`load_station_table`], but any failure is logged and replaced by
/// an empty table with the requested columns.
///
/// The flag is `true` when the fallback was used.
pub fn load_station_table_or_empty(
    path: &Path,
    station_column: &str,
    value_columns: &[&str],
) -> (StationTable, bool) {
    match load_station_table(path, station_column, value_columns) {
        Ok(table) => (table, false),
        Err(e) => {
            error!("Failed to load {}: {}; continuing with an empty table", path.display(), e);
            (StationTable::with_columns(value_columns.iter().copied()), true)
        }
    }
}

/// Load long-form forecast samples (`station,step,t2m`)
pub fn load_forecast_samples(path: &Path) -> Result<Vec<ForecastSample>> {
    let df = read_csv(path)?;
    for name in [forecast_columns::STATION, forecast_columns::STEP, forecast_columns::T2M] {
        require_column(&df, path, name)?;
    }

    let names = string_values(&df, forecast_columns::STATION)?;
    let steps = float_values(&df, forecast_columns::STEP)?;
    let values = float_values(&df, forecast_columns::T2M)?;

    let samples: Vec<ForecastSample> = names
        .into_iter()
        .zip(steps)
        .zip(values)
        .filter_map(|((name, step), value)| {
            let step = step.value().filter(|s| *s >= 0.0 && s.fract() == 0.0)?;
            Some(ForecastSample {
                station: name?,
                step: step as u32,
                value,
            })
        })
        .collect();

    info!("Loaded {} forecast samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load one decoded SYNOP export with all known value columns
pub fn load_synop_export(path: &Path) -> Result<StationTable> {
    load_station_table(path, synop_columns::STATION, synop_columns::VALUE_COLUMNS)
}

/// Keep the rows of a SYNOP frame whose `timePeriod` equals `period`
fn filter_time_period(df: DataFrame, period: f64) -> Result<DataFrame> {
    Ok(df
        .lazy()
        .filter(
            col(synop_columns::TIME_PERIOD)
                .cast(DataType::Float64)
                .eq(lit(period)),
        )
        .collect()?)
}

fn rows_to_table(df: &DataFrame, value_columns: &[&str]) -> Result<StationTable> {
    let names = string_values(df, synop_columns::STATION)?;
    let mut columns = Vec::with_capacity(value_columns.len());
    for name in value_columns {
        if has_column(df, name) {
            columns.push(float_values(df, name)?);
        } else {
            columns.push(vec![Reading::Missing; df.height()]);
        }
    }

    let mut table = StationTable::with_columns(value_columns.iter().copied());
    for (i, name) in names.into_iter().enumerate() {
        if let Some(station) = name {
            let values = columns.iter().map(|column| column[i]).collect();
            table.push_unchecked(StationRow::new(station, values));
        }
    }
    Ok(table)
}

/// Load the SYNOP rows reported over `period` hours, with all known value
/// columns
pub fn load_synop_period(path: &Path, period: f64) -> Result<StationTable> {
    let df = read_csv(path)?;
    require_column(&df, path, synop_columns::STATION)?;
    require_column(&df, path, synop_columns::TIME_PERIOD)?;

    let total_rows = df.height();
    let filtered = filter_time_period(df, period)?;
    let table = rows_to_table(&filtered, synop_columns::VALUE_COLUMNS)?;

    debug!(
        "{} of {} SYNOP records have timePeriod {} in {}",
        table.len(),
        total_rows,
        period,
        path.display()
    );
    Ok(table)
}

/// Keep the SYNOP rows whose precipitation covers the last 24 hours
pub fn load_precipitation_reports(path: &Path) -> Result<StationTable> {
    let df = read_csv(path)?;
    require_column(&df, path, synop_columns::STATION)?;
    require_column(&df, path, synop_columns::TIME_PERIOD)?;
    if !has_column(&df, synop_columns::TOTAL_PRECIPITATION) {
        warn!("No precipitation column in {}", path.display());
    }

    let total_rows = df.height();
    let filtered = filter_time_period(df, crate::constants::PRECIP_24H_PERIOD)?;
    let table = rows_to_table(&filtered, &[synop_columns::TOTAL_PRECIPITATION])?;

    info!(
        "{} of {} SYNOP records report 24h precipitation in {}",
        table.len(),
        total_rows,
        path.display()
    );
    Ok(table)
}
