//! Forecast table construction from per-station model samples.
//!
//! The external GRIB reader extracts 2m temperature at each station for
//! every lead time. This module arranges those samples into a stations x
//! lead-times matrix, reduces it with missing-aware min/max over the
//! configured windows, and produces the forecast table written by the
//! forecast stage.

use crate::config::{ReductionKind, ReductionWindow};
use crate::constants::forecast_columns;
use crate::models::{Reading, Station, StationTable};
use std::collections::HashMap;
use tracing::{debug, warn};

/// One extracted sample: station, lead time in hours, temperature
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    pub station: String,
    pub step: u32,
    pub value: Reading,
}

/// Missing-aware min and max of each row.
///
/// A row with at least one present value yields present min and max; a
/// row with no present value (or no values) yields missing for both.
pub fn nan_min_max(rows: &[Vec<Reading>]) -> (Vec<Reading>, Vec<Reading>) {
    rows.iter()
        .map(|row| {
            let present = row.iter().filter_map(Reading::value);
            let (min, max) = present.fold((None, None), |(min, max): (Option<f64>, Option<f64>), v| {
                (
                    Some(min.map_or(v, |m| m.min(v))),
                    Some(max.map_or(v, |m| m.max(v))),
                )
            });
            (Reading::from_option(min), Reading::from_option(max))
        })
        .unzip()
}

/// Reduce one row over a window of the step axis
fn reduce_window(row: &[Reading], steps: &[u32], window: &ReductionWindow) -> Reading {
    let selected: Vec<Reading> = steps
        .iter()
        .zip(row)
        .filter(|(step, _)| window.contains(**step))
        .map(|(_, value)| *value)
        .collect();

    let (min, max) = nan_min_max(std::slice::from_ref(&selected));
    match window.kind {
        ReductionKind::Min => min[0],
        ReductionKind::Max => max[0],
    }
}

/// Arrange samples into a stations x steps matrix in catalogue order.
///
/// Samples for stations outside the catalogue or steps outside `steps` are
/// ignored; a repeated (station, step) sample overwrites the earlier one
/// only when the earlier one is missing.
pub fn sample_matrix(stations: &[Station], samples: &[ForecastSample], steps: &[u32]) -> Vec<Vec<Reading>> {
    let station_index: HashMap<&str, usize> = stations
        .iter()
        .enumerate()
        .map(|(i, s)| (s.name.as_str(), i))
        .collect();
    let step_index: HashMap<u32, usize> = steps.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut matrix = vec![vec![Reading::Missing; steps.len()]; stations.len()];
    let mut ignored = 0usize;

    for sample in samples {
        match (
            station_index.get(sample.station.as_str()),
            step_index.get(&sample.step),
        ) {
            (Some(&row), Some(&col)) => {
                if matrix[row][col].is_missing() {
                    matrix[row][col] = sample.value;
                }
            }
            _ => ignored += 1,
        }
    }

    if ignored > 0 {
        debug!("Ignored {} samples outside the catalogue or step range", ignored);
    }
    matrix
}

/// Build the forecast table: one `t2m_<step>` column per step followed by
/// one column per reduction window, one row per catalogue station.
pub fn build_forecast_table(
    stations: &[Station],
    samples: &[ForecastSample],
    steps: &[u32],
    windows: &[ReductionWindow],
) -> StationTable {
    let matrix = sample_matrix(stations, samples, steps);

    let mut columns: Vec<String> = steps.iter().map(|s| forecast_columns::step_column(*s)).collect();
    columns.extend(windows.iter().map(|w| w.column.clone()));
    let mut table = StationTable::new(columns);

    let mut empty_stations = 0usize;
    for (station, row) in stations.iter().zip(&matrix) {
        if row.iter().all(Reading::is_missing) {
            empty_stations += 1;
        }

        let mut values = row.clone();
        values.extend(windows.iter().map(|w| reduce_window(row, steps, w)));
        table.push_unchecked(crate::models::StationRow::new(station.name.clone(), values));
    }

    if empty_stations > 0 {
        warn!(
            "{} of {} stations have no forecast sample at any step",
            empty_stations,
            stations.len()
        );
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(name: &str) -> Station {
        Station {
            name: name.to_string(),
            sid: None,
            longitude: 3.0,
            latitude: 36.0,
            altitude: None,
        }
    }

    fn sample(station: &str, step: u32, value: Option<f64>) -> ForecastSample {
        ForecastSample {
            station: station.to_string(),
            step,
            value: Reading::from_option(value),
        }
    }

    #[test]
    fn test_nan_min_max_ignores_missing() {
        let rows = vec![
            vec![Reading::Present(12.0), Reading::Missing, Reading::Present(7.5)],
            vec![Reading::Missing, Reading::Present(-1.0)],
        ];

        let (min, max) = nan_min_max(&rows);

        assert_eq!(min, vec![Reading::Present(7.5), Reading::Present(-1.0)]);
        assert_eq!(max, vec![Reading::Present(12.0), Reading::Present(-1.0)]);
    }

    #[test]
    fn test_nan_min_max_all_missing_row() {
        let rows = vec![vec![Reading::Missing; 3], vec![]];

        let (min, max) = nan_min_max(&rows);

        assert_eq!(min, vec![Reading::Missing, Reading::Missing]);
        assert_eq!(max, vec![Reading::Missing, Reading::Missing]);
    }

    #[test]
    fn test_nan_min_max_present_row_never_missing() {
        for present_at in 0..4 {
            let mut row = vec![Reading::Missing; 4];
            row[present_at] = Reading::Present(present_at as f64);
            let (min, max) = nan_min_max(&[row]);
            assert!(!min[0].is_missing());
            assert!(!max[0].is_missing());
        }
    }

    #[test]
    fn test_build_forecast_table_windows() {
        let stations = vec![station("A"), station("B"), station("C")];
        let samples = vec![
            sample("A", 0, Some(8.0)),
            sample("A", 12, Some(18.0)),
            sample("A", 24, Some(9.0)),
            sample("A", 36, Some(21.0)),
            sample("A", 48, Some(10.0)),
            sample("B", 24, None),
            sample("B", 30, Some(4.0)),
            sample("UNKNOWN", 24, Some(99.0)),
        ];
        let steps = vec![0, 12, 24, 30, 36, 48];
        let windows = vec![
            ReductionWindow::new("t2m_min", 0, 24, ReductionKind::Min),
            ReductionWindow::new("t2m_max", 0, 24, ReductionKind::Max),
            ReductionWindow::new("t2m_max_48", 24, 48, ReductionKind::Max),
        ];

        let table = build_forecast_table(&stations, &samples, &steps, &windows);

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns().len(), steps.len() + windows.len());
        assert_eq!(table.get("A", "t2m_min"), Some(Reading::Present(8.0)));
        assert_eq!(table.get("A", "t2m_max"), Some(Reading::Present(18.0)));
        assert_eq!(table.get("A", "t2m_max_48"), Some(Reading::Present(21.0)));
        assert_eq!(table.get("B", "t2m_min"), Some(Reading::Missing));
        assert_eq!(table.get("B", "t2m_max_48"), Some(Reading::Present(4.0)));
        assert_eq!(table.get("B", "t2m_30"), Some(Reading::Present(4.0)));
        assert!(table.row("C").unwrap().values.iter().all(Reading::is_missing));
    }

    #[test]
    fn test_repeated_sample_fills_missing_only() {
        let stations = vec![station("A")];
        let samples = vec![
            sample("A", 24, None),
            sample("A", 24, Some(11.0)),
            sample("A", 24, Some(30.0)),
        ];

        let matrix = sample_matrix(&stations, &samples, &[24]);

        assert_eq!(matrix[0][0], Reading::Present(11.0));
    }
}
