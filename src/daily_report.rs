//! Daily observation bulletin (BQRM).
//!
//! One row per bulletin station built from the morning SYNOP report (wind,
//! cloud cover, weather codes, night minimum), the 24h precipitation group
//! of the same report, and the previous day's maximum from the evening
//! report. Stations are matched under their SYNOP names after aliasing.

use crate::config::TemperatureUnit;
use crate::constants::{PLACEHOLDER, daily_columns, synop_columns};
use crate::models::{Reading, StationTable};
use crate::reconcile::{StationAliases, deduplicate_fewest_missing};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Largest present-weather code (`ww`) kept in the bulletin, exclusive
pub const PRESENT_WEATHER_LIMIT: f64 = 100.0;

/// Largest past-weather code (`w1`, `w2`) kept in the bulletin, exclusive
pub const PAST_WEATHER_LIMIT: f64 = 10.0;

/// Wind speed below which the direction is reported as variable, in m/s
pub const VARIABLE_WIND_SPEED: f64 = 2.0;

/// Wind direction on an 8-point rose, or calm/variable wind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindDirection {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    Calm,
    Variable,
}

impl WindDirection {
    /// Sector of a direction in degrees. Fractions are truncated; values
    /// outside 0..=360 have no sector.
    pub fn from_degrees(degrees: f64) -> Option<Self> {
        if !(0.0..=360.0).contains(&degrees) {
            return None;
        }
        let sector = match degrees.trunc() as u32 {
            0..=22 | 338..=360 => WindDirection::N,
            23..=67 => WindDirection::NE,
            68..=112 => WindDirection::E,
            113..=157 => WindDirection::SE,
            158..=202 => WindDirection::S,
            203..=247 => WindDirection::SW,
            248..=292 => WindDirection::W,
            _ => WindDirection::NW,
        };
        Some(sector)
    }

    /// Bulletin direction from the reported direction and speed: calm at
    /// 0 m/s, variable under 2 m/s, otherwise the rose sector
    pub fn classify(direction: Reading, speed: Reading) -> Option<Self> {
        match speed.value() {
            Some(v) if v == 0.0 => Some(WindDirection::Calm),
            Some(v) if v > 0.0 && v < VARIABLE_WIND_SPEED => Some(WindDirection::Variable),
            _ => direction.value().and_then(Self::from_degrees),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WindDirection::N => "N",
            WindDirection::NE => "NE",
            WindDirection::E => "E",
            WindDirection::SE => "SE",
            WindDirection::S => "S",
            WindDirection::SW => "SW",
            WindDirection::W => "W",
            WindDirection::NW => "NW",
            WindDirection::Calm => "Calme",
            WindDirection::Variable => "VRB",
        }
    }
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Total cloud cover from percent to oktas
pub fn cloud_oktas(percent: Reading) -> Reading {
    percent.map(|p| (p * 8.0 / 100.0).round_ties_even())
}

/// Keep a weather code only below `limit`
pub fn weather_code(code: Reading, limit: f64) -> Reading {
    match code {
        Reading::Present(v) if v < limit => code,
        _ => Reading::Missing,
    }
}

/// 24h amount shown in the bulletin: anything not above zero, missing
/// amounts included, reads 0
pub fn bulletin_precipitation(amount: Reading) -> Reading {
    match amount {
        Reading::Present(v) if v > 0.0 => amount,
        _ => Reading::Present(0.0),
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

/// One station row of the daily observation bulletin
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub station: String,
    pub altitude: Reading,
    pub direction: Option<WindDirection>,
    pub speed: Reading,
    pub cloud_oktas: Reading,
    pub present_weather: Reading,
    pub precipitation: Reading,
    pub past_weather_1: Reading,
    pub past_weather_2: Reading,
    pub max_previous_day: Reading,
    pub min_night: Reading,
}

impl DailyObservation {
    /// Row of a station that sent no usable morning report
    pub fn missing(station: impl Into<String>) -> Self {
        Self {
            station: station.into(),
            altitude: Reading::Missing,
            direction: None,
            speed: Reading::Missing,
            cloud_oktas: Reading::Missing,
            present_weather: Reading::Missing,
            precipitation: Reading::Missing,
            past_weather_1: Reading::Missing,
            past_weather_2: Reading::Missing,
            max_previous_day: Reading::Missing,
            min_night: Reading::Missing,
        }
    }

    /// Printable cells in [`daily_columns::ORDER`]
    pub fn cells(&self) -> Vec<String> {
        let decimal = |r: Reading| r.value().map_or(PLACEHOLDER.to_string(), |v| format!("{:.1}", v));
        let whole = |r: Reading| r.value().map_or(PLACEHOLDER.to_string(), |v| format!("{}", v.round_ties_even() as i64));

        vec![
            self.station.clone(),
            self.altitude.value().map_or(PLACEHOLDER.to_string(), |v| format!("{}", v)),
            self.direction.map_or(PLACEHOLDER.to_string(), |d| d.to_string()),
            decimal(self.speed),
            whole(self.cloud_oktas),
            whole(self.present_weather),
            decimal(self.precipitation),
            whole(self.past_weather_1),
            whole(self.past_weather_2),
            decimal(self.max_previous_day),
            decimal(self.min_night),
        ]
    }
}

/// The daily observation bulletin, in station list order
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBulletin {
    pub rows: Vec<DailyObservation>,
    /// Bulletin stations without a usable morning report
    pub missing_stations: Vec<String>,
}

impl DailyBulletin {
    pub fn headers() -> &'static [&'static str] {
        daily_columns::ORDER
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(DailyObservation::cells).collect()
    }
}

const MORNING_COLUMNS: &[&str] = &[
    synop_columns::ALTITUDE,
    synop_columns::WIND_DIRECTION,
    synop_columns::WIND_SPEED,
    synop_columns::CLOUD_COVER,
    synop_columns::PRESENT_WEATHER,
    synop_columns::PAST_WEATHER_1,
    synop_columns::PAST_WEATHER_2,
    synop_columns::MIN_TEMPERATURE,
];

/// Project a report onto `columns`, alias its station names and drop rows
/// without a station altitude. Remaining duplicates keep the
/// fewest-missing row.
fn located_rows(report: &StationTable, columns: &[&str], aliases: &StationAliases) -> StationTable {
    let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let mut projected = report.select_columns(&names);
    aliases.apply_to_table(&mut projected);

    let mut located = StationTable::new(names);
    let mut unlocated = 0usize;
    for row in projected.into_rows() {
        if row.values[0].is_missing() {
            unlocated += 1;
        } else {
            located.push_unchecked(row);
        }
    }
    if unlocated > 0 {
        debug!("Dropped {} report rows without a station altitude", unlocated);
    }

    let (table, duplicates) = deduplicate_fewest_missing(located);
    if duplicates > 0 {
        debug!("Resolved {} duplicate report rows", duplicates);
    }
    table
}

/// Build the daily observation bulletin.
///
/// `morning` is today's 06 UTC report, `precipitation` its 24h groups and
/// `evening` yesterday's 18 UTC instantaneous groups. Only stations with an
/// altitude in the morning report get values.
pub fn build_daily_bulletin(
    stations: &[String],
    morning: &StationTable,
    precipitation: Option<&StationTable>,
    evening: Option<&StationTable>,
    aliases: &StationAliases,
    unit: TemperatureUnit,
) -> DailyBulletin {
    let morning = located_rows(morning, MORNING_COLUMNS, aliases);

    let mut amounts: HashMap<String, Reading> = HashMap::new();
    if let Some(report) = precipitation {
        if let Some(index) = report.column_index(synop_columns::TOTAL_PRECIPITATION) {
            for row in report.rows() {
                amounts
                    .entry(aliases.apply(&row.station).to_string())
                    .or_insert(row.values[index]);
            }
        }
    }

    let maxima = evening.map(|report| {
        located_rows(
            report,
            &[synop_columns::ALTITUDE, synop_columns::MAX_TEMPERATURE],
            aliases,
        )
    });

    let mut rows = Vec::with_capacity(stations.len());
    let mut missing_stations = Vec::new();
    for station in stations {
        let Some(row) = morning.row(station) else {
            warn!("Station '{}' not found in the morning report", station);
            missing_stations.push(station.clone());
            rows.push(DailyObservation::missing(station.clone()));
            continue;
        };
        let value = |column: &str| {
            morning
                .column_index(column)
                .map_or(Reading::Missing, |i| row.values[i])
        };

        let max_previous_day = maxima
            .as_ref()
            .and_then(|table| table.get(station, synop_columns::MAX_TEMPERATURE))
            .unwrap_or(Reading::Missing)
            .map(|v| unit.to_celsius(v));

        rows.push(DailyObservation {
            station: station.clone(),
            altitude: value(synop_columns::ALTITUDE),
            direction: WindDirection::classify(
                value(synop_columns::WIND_DIRECTION),
                value(synop_columns::WIND_SPEED),
            ),
            speed: value(synop_columns::WIND_SPEED),
            cloud_oktas: cloud_oktas(value(synop_columns::CLOUD_COVER)),
            present_weather: weather_code(value(synop_columns::PRESENT_WEATHER), PRESENT_WEATHER_LIMIT),
            precipitation: bulletin_precipitation(amounts.get(station).copied().unwrap_or(Reading::Missing)),
            past_weather_1: weather_code(value(synop_columns::PAST_WEATHER_1), PAST_WEATHER_LIMIT),
            past_weather_2: weather_code(value(synop_columns::PAST_WEATHER_2), PAST_WEATHER_LIMIT),
            max_previous_day,
            min_night: value(synop_columns::MIN_TEMPERATURE).map(|v| round_tenth(unit.to_celsius(v))),
        });
    }

    info!(
        "Daily observations: {} of {} stations reported",
        stations.len() - missing_stations.len(),
        stations.len()
    );
    DailyBulletin {
        rows,
        missing_stations,
    }
}
