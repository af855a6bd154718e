//! 24-hour precipitation bulletin and the agricultural-year ledger.
//!
//! Each bulletin station is looked up in the station mapping to find the
//! SYNOP station reporting for it; reports covering the last 24 hours are
//! then read under that name. Each run also adds the day's amounts to a
//! running total that restarts every September 1st.

use crate::constants::{PLACEHOLDER, observation_columns, synop_columns};
use crate::error::Result;
use crate::models::{Reading, RunDate, StationRow, StationTable};
use crate::reconcile::aliases::read_name_map;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

/// Bulletin station name -> SYNOP station name.
///
/// Several bulletin stations may share one SYNOP station. A bulletin
/// station absent from the mapping never receives a report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationMapping {
    mapping: BTreeMap<String, String>,
}

impl StationMapping {
    pub fn new(mapping: BTreeMap<String, String>) -> Self {
        Self { mapping }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Load a JSON object of `"bulletin name": "SYNOP name"` pairs
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let mapping = read_name_map(path)?;
        info!("Loaded {} station mappings from {}", mapping.len(), path.display());
        Ok(Self::new(mapping))
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn synop_name(&self, station: &str) -> Option<&str> {
        self.mapping.get(station).map(String::as_str)
    }

    /// Bulletin stations with no mapping entry
    pub fn unmapped(&self, stations: &[String]) -> Vec<String> {
        stations
            .iter()
            .filter(|station| !self.mapping.contains_key(station.as_str()))
            .cloned()
            .collect()
    }
}

/// Bulletin rendering of a 24h amount in millimetres.
///
/// Missing and non-positive amounts read `0`, amounts under 0.1 mm are a
/// trace (`Tr`), anything else has one decimal.
pub fn format_precip(amount: Reading) -> String {
    match amount {
        Reading::Missing => "0".to_string(),
        Reading::Present(v) if v <= 0.0 => "0".to_string(),
        Reading::Present(v) if v < 0.1 => "Tr".to_string(),
        Reading::Present(v) => format!("{:.1}", v),
    }
}

/// First day of the agricultural year containing `date`
pub fn agricultural_period_start(date: NaiveDate) -> NaiveDate {
    let year = if date.month() < 9 { date.year() - 1 } else { date.year() };
    NaiveDate::from_ymd_opt(year, 9, 1).unwrap_or(date)
}

/// 24h amounts of the bulletin stations
#[derive(Debug, Clone, PartialEq)]
pub struct PrecipitationBulletin {
    /// Bulletin station and its amount; `None` when no report matched
    pub amounts: Vec<(String, Option<Reading>)>,
}

impl PrecipitationBulletin {
    /// Match 24h reports to the bulletin stations through `mapping`. The
    /// first report of a SYNOP station wins.
    pub fn from_reports(stations: &[String], reports: &StationTable, mapping: &StationMapping) -> Self {
        let mut by_synop: HashMap<&str, Reading> = HashMap::new();
        if let Some(index) = reports.column_index(synop_columns::TOTAL_PRECIPITATION) {
            for row in reports.rows() {
                by_synop.entry(row.station.as_str()).or_insert(row.values[index]);
            }
        }

        let amounts = stations
            .iter()
            .map(|station| {
                let amount = match mapping.synop_name(station) {
                    Some(synop) => {
                        let amount = by_synop.get(synop).copied();
                        if amount.is_none() {
                            warn!("Station '{}' ({}): no 24h precipitation report", station, synop);
                        }
                        amount
                    }
                    None => {
                        warn!("Station '{}': no SYNOP mapping, marked as missing", station);
                        None
                    }
                };
                (station.clone(), amount)
            })
            .collect();

        Self { amounts }
    }

    /// Stations without a report, sorted and unique
    pub fn missing_stations(&self) -> Vec<String> {
        self.amounts
            .iter()
            .filter(|(_, amount)| amount.is_none())
            .map(|(station, _)| station.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Printable rows: station and formatted amount, `/` without a report
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.amounts
            .iter()
            .map(|(station, amount)| {
                let cell = match amount {
                    Some(reading) => format_precip(*reading),
                    None => PLACEHOLDER.to_string(),
                };
                vec![station.clone(), cell]
            })
            .collect()
    }
}

/// Running precipitation totals since September 1st
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeLedger {
    totals: Vec<(String, f64)>,
}

impl CumulativeLedger {
    /// Ledger over `stations` seeded from a previous ledger table.
    ///
    /// Stations absent from the previous table and non-numeric previous
    /// values start at zero.
    pub fn from_previous(stations: &[String], previous: &StationTable) -> Self {
        let totals = stations
            .iter()
            .map(|station| {
                let total = match previous.get(station, observation_columns::CUMUL) {
                    Some(Reading::Present(v)) => v,
                    Some(Reading::Missing) => {
                        warn!("Invalid cumulative value for station '{}', treating as 0", station);
                        0.0
                    }
                    None => 0.0,
                };
                (station.clone(), total)
            })
            .collect();
        Self { totals }
    }

    pub fn total(&self, station: &str) -> Option<f64> {
        self.totals.iter().find(|(s, _)| s == station).map(|(_, v)| *v)
    }

    /// Reset on the first day of the agricultural year, then add the day's
    /// amounts. Stations without a present amount keep their total.
    pub fn update(&mut self, bulletin: &PrecipitationBulletin, run_date: &RunDate) {
        if run_date.is_agricultural_year_start() {
            info!("Start of the agricultural year: resetting cumulative precipitation");
            for (_, total) in &mut self.totals {
                *total = 0.0;
            }
        }

        let amounts: HashMap<&str, Reading> = bulletin
            .amounts
            .iter()
            .filter_map(|(station, amount)| amount.map(|a| (station.as_str(), a)))
            .collect();

        for (station, total) in &mut self.totals {
            match amounts.get(station.as_str()).and_then(Reading::value) {
                Some(amount) => {
                    let updated = ((*total + amount.max(0.0)) * 100.0).round() / 100.0;
                    debug!("Station {}: cumulative {:.1} -> {:.1}", station, total, updated);
                    *total = updated;
                }
                None => debug!("Station {}: no amount today, cumulative kept", station),
            }
        }
    }

    pub fn to_table(&self) -> StationTable {
        let mut table = StationTable::with_columns([observation_columns::CUMUL]);
        for (station, total) in &self.totals {
            table.push_unchecked(StationRow::new(station.clone(), vec![Reading::Present(*total)]));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reports(rows: &[(&str, Option<f64>)]) -> StationTable {
        let mut table = StationTable::with_columns([synop_columns::TOTAL_PRECIPITATION]);
        for (station, amount) in rows {
            table.push_row(*station, vec![Reading::from_option(*amount)]).unwrap();
        }
        table
    }

    fn stations(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn run_date(y: i32, m: u32, d: u32) -> RunDate {
        RunDate::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_format_precip() {
        assert_eq!(format_precip(Reading::Missing), "0");
        assert_eq!(format_precip(Reading::Present(0.0)), "0");
        assert_eq!(format_precip(Reading::Present(-0.1)), "0");
        assert_eq!(format_precip(Reading::Present(0.05)), "Tr");
        assert_eq!(format_precip(Reading::Present(0.1)), "0.1");
        assert_eq!(format_precip(Reading::Present(12.34)), "12.3");
    }

    #[test]
    fn test_agricultural_period_start() {
        let start = agricultural_period_start(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        let start = agricultural_period_start(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
    }

    fn identity(names: &[&str]) -> StationMapping {
        let pairs: Vec<(&str, &str)> = names.iter().map(|n| (*n, *n)).collect();
        StationMapping::from_pairs(&pairs)
    }

    #[test]
    fn test_bulletin_matches_mapping_and_lists_missing() {
        let mapping = StationMapping::from_pairs(&[
            ("ORAN", "ORAN"),
            ("ALGER", "DAR-EL-BEIDA"),
            ("ADRAR", "ADRAR"),
            ("BECHAR", "BECHAR"),
        ]);
        let bulletin = PrecipitationBulletin::from_reports(
            &stations(&["ORAN", "ALGER", "ADRAR", "BECHAR"]),
            &reports(&[("DAR-EL-BEIDA", Some(4.26)), ("ORAN", None), ("ORAN", Some(9.0))]),
            &mapping,
        );

        let rows = bulletin.display_rows();
        assert_eq!(rows[0], ["ORAN", "0"]);
        assert_eq!(rows[1], ["ALGER", "4.3"]);
        assert_eq!(rows[2], ["ADRAR", "/"]);
        assert_eq!(bulletin.missing_stations(), ["ADRAR", "BECHAR"]);
    }

    #[test]
    fn test_unmapped_station_ignores_same_named_report() {
        let mapping = StationMapping::from_pairs(&[("ALGER", "DAR-EL-BEIDA")]);
        let bulletin = PrecipitationBulletin::from_reports(
            &stations(&["ALGER", "ORAN"]),
            &reports(&[("DAR-EL-BEIDA", Some(1.2)), ("ORAN", Some(5.0))]),
            &mapping,
        );

        assert_eq!(bulletin.display_rows()[1], ["ORAN", "/"]);
        assert_eq!(bulletin.missing_stations(), ["ORAN"]);
        assert_eq!(mapping.unmapped(&stations(&["ALGER", "ORAN"])), ["ORAN"]);
    }

    #[test]
    fn test_one_synop_station_feeds_two_bulletin_stations() {
        let mapping = StationMapping::from_pairs(&[("Alger", "DAR-EL-BEIDA"), ("Alger Port", "DAR-EL-BEIDA")]);
        let bulletin = PrecipitationBulletin::from_reports(
            &stations(&["Alger", "Alger Port"]),
            &reports(&[("DAR-EL-BEIDA", Some(12.0))]),
            &mapping,
        );

        assert_eq!(bulletin.display_rows(), [["Alger", "12.0"], ["Alger Port", "12.0"]]);
        assert!(bulletin.missing_stations().is_empty());
    }

    #[test]
    fn test_mapping_from_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ListStation.json");
        std::fs::write(&path, r#"{"Alger": "DAR-EL-BEIDA", "Oran": "ORAN-SENIA"}"#).unwrap();

        let mapping = StationMapping::from_json_file(&path).unwrap();

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.synop_name("Oran"), Some("ORAN-SENIA"));
        assert_eq!(mapping.synop_name("ORAN-SENIA"), None);
    }

    #[test]
    fn test_ledger_adds_present_amounts_only() {
        let list = stations(&["ALGER", "ORAN", "ADRAR"]);
        let mut previous = StationTable::with_columns([observation_columns::CUMUL]);
        previous.push_row("ALGER", vec![Reading::Present(100.2)]).unwrap();
        previous.push_row("ORAN", vec![Reading::Missing]).unwrap();

        let mut ledger = CumulativeLedger::from_previous(&list, &previous);
        let bulletin = PrecipitationBulletin::from_reports(
            &list,
            &reports(&[("ALGER", Some(3.1)), ("ORAN", Some(0.4))]),
            &identity(&["ALGER", "ORAN", "ADRAR"]),
        );
        ledger.update(&bulletin, &run_date(2025, 1, 15));

        assert_eq!(ledger.total("ALGER"), Some(103.3));
        assert_eq!(ledger.total("ORAN"), Some(0.4));
        assert_eq!(ledger.total("ADRAR"), Some(0.0));
    }

    #[test]
    fn test_ledger_resets_on_september_first() {
        let list = stations(&["ALGER", "ORAN"]);
        let mut previous = StationTable::with_columns([observation_columns::CUMUL]);
        previous.push_row("ALGER", vec![Reading::Present(512.0)]).unwrap();
        previous.push_row("ORAN", vec![Reading::Present(230.0)]).unwrap();

        let mut ledger = CumulativeLedger::from_previous(&list, &previous);
        let bulletin = PrecipitationBulletin::from_reports(
            &list,
            &reports(&[("ALGER", Some(2.0))]),
            &identity(&["ALGER", "ORAN"]),
        );
        ledger.update(&bulletin, &run_date(2025, 9, 1));

        assert_eq!(ledger.total("ALGER"), Some(2.0));
        assert_eq!(ledger.total("ORAN"), Some(0.0));
    }
}
