//! Configuration management and validation.
//!
//! Provides the per-pipeline configuration (station lists, alias tables,
//! forecast windows, column layouts and file locations), built-in defaults
//! for each operational bulletin, JSON loading, and load-time validation.

use crate::constants::{
    self, BMSLA_ALIASES, BMSLA_STATIONS, BQCP24H_MAPPING, BQCP24H_STATIONS, BQRM_STATIONS,
    DEFAULT_CLEANUP_PATTERNS, PRECIP_REPORT_HOUR, SONELGAZ_ALIASES, SONELGAZ_FORECAST_SLOTS,
    SONELGAZ_OBSERVATION_SLOTS, SONELGAZ_REGIONS, forecast_columns, layout, observation_columns,
};
use crate::error::{BulletinError, Result};
use crate::models::{RunDate, SynopSlot};
use crate::precipitation::StationMapping;
use crate::reconcile::StationAliases;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Operational bulletin variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Single-table min/max bulletin with a 48h maximum column
    Bmsla,
    /// Regional bulletins with hourly forecast and observation slots
    Sonelgaz,
    /// Daily observation bulletin: wind, cloud cover, weather, extremes
    Bqrm,
    /// 24h precipitation bulletin with agricultural-year totals
    Bqcp24h,
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Bmsla => "bmsla",
            Profile::Sonelgaz => "sonelgaz",
            Profile::Bqrm => "bqrm",
            Profile::Bqcp24h => "bqcp24h",
        }
    }
}

/// Unit of the temperatures found in decoded SYNOP exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Kelvin,
    Celsius,
}

impl TemperatureUnit {
    pub fn to_celsius(&self, value: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => value - constants::KELVIN_OFFSET,
            TemperatureUnit::Celsius => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionKind {
    Min,
    Max,
}

/// Min or max over an inclusive range of forecast lead times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionWindow {
    pub column: String,
    pub first_step: u32,
    pub last_step: u32,
    pub kind: ReductionKind,
}

impl ReductionWindow {
    pub fn new(column: impl Into<String>, first_step: u32, last_step: u32, kind: ReductionKind) -> Self {
        Self {
            column: column.into(),
            first_step,
            last_step,
            kind,
        }
    }

    pub fn contains(&self, step: u32) -> bool {
        (self.first_step..=self.last_step).contains(&step)
    }
}

/// Named group of stations rendered as its own bulletin table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub stations: Vec<String>,
}

/// One SYNOP report used as an hourly observation column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySlot {
    pub hour: u32,
    /// Day relative to the run date (-1 = yesterday)
    pub day_offset: i64,
    pub column: String,
}

impl HourlySlot {
    pub fn synop_slot(&self, run_date: &RunDate) -> SynopSlot {
        SynopSlot {
            date: run_date.today() + Duration::days(self.day_offset),
            hour: self.hour,
        }
    }
}

/// Configuration for one bulletin pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletinConfig {
    pub profile: Profile,

    /// Root holding `template/`, `tmp/`, `outputs/` and `bufr_data/`
    pub work_dir: PathBuf,

    /// Canonical station list, in bulletin order
    pub stations: Vec<String>,

    /// Regional split of the bulletin; empty means one table for all stations
    #[serde(default)]
    pub regions: Vec<Region>,

    /// SYNOP station name -> bulletin station name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,

    /// Fail instead of warning when an alias points outside the station list
    #[serde(default)]
    pub strict_aliases: bool,

    pub forecast_first_step: u32,
    pub forecast_last_step: u32,
    pub reduction_windows: Vec<ReductionWindow>,

    /// Subtracted from raw forecast samples when they are in Kelvin
    #[serde(default)]
    pub forecast_kelvin_offset: Option<f64>,

    /// Forecast table column -> bulletin column
    pub forecast_columns: BTreeMap<String, String>,

    /// SYNOP reports read into the hourly observation table
    #[serde(default)]
    pub hourly_slots: Vec<HourlySlot>,

    /// Hourly observation column -> bulletin column
    #[serde(default)]
    pub hourly_columns: BTreeMap<String, String>,

    /// Min/max observation column -> bulletin column
    pub min_max_columns: BTreeMap<String, String>,

    /// Bulletin columns, in output order (station column excluded)
    pub column_order: Vec<String>,

    pub synop_temperature_unit: TemperatureUnit,

    /// Bulletin station -> SYNOP station for the precipitation bulletin;
    /// empty means `<work_dir>/template/ListStation.json`
    #[serde(default)]
    pub precipitation_mapping: BTreeMap<String, String>,

    /// SYNOP report carrying the 24h precipitation (06 or 18 UTC)
    #[serde(default = "default_precipitation_hour")]
    pub precipitation_report_hour: u32,

    #[serde(default = "default_cleanup_patterns")]
    pub cleanup_patterns: Vec<String>,
}

fn default_cleanup_patterns() -> Vec<String> {
    DEFAULT_CLEANUP_PATTERNS.iter().map(|p| p.to_string()).collect()
}

fn default_precipitation_hour() -> u32 {
    PRECIP_REPORT_HOUR
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Sonelgaz)
    }
}

impl BulletinConfig {
    /// Built-in configuration of an operational bulletin
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Bmsla => Self::bmsla(),
            Profile::Sonelgaz => Self::sonelgaz(),
            Profile::Bqrm => Self::bqrm(),
            Profile::Bqcp24h => Self::bqcp24h(),
        }
    }

    /// Configuration without forecast or bulletin table layout, shared by
    /// the observation-only bulletins
    fn observation_only(profile: Profile, stations: &[&str]) -> Self {
        Self {
            profile,
            work_dir: PathBuf::from("."),
            stations: to_strings(stations),
            regions: Vec::new(),
            aliases: BTreeMap::new(),
            strict_aliases: false,
            forecast_first_step: 0,
            forecast_last_step: 0,
            reduction_windows: Vec::new(),
            forecast_kelvin_offset: None,
            forecast_columns: BTreeMap::new(),
            hourly_slots: Vec::new(),
            hourly_columns: BTreeMap::new(),
            min_max_columns: BTreeMap::new(),
            column_order: Vec::new(),
            synop_temperature_unit: TemperatureUnit::Kelvin,
            precipitation_mapping: BTreeMap::new(),
            precipitation_report_hour: PRECIP_REPORT_HOUR,
            cleanup_patterns: default_cleanup_patterns(),
        }
    }

    fn bqrm() -> Self {
        Self::observation_only(Profile::Bqrm, BQRM_STATIONS)
    }

    fn bqcp24h() -> Self {
        let mut config = Self::observation_only(Profile::Bqcp24h, BQCP24H_STATIONS);
        config.precipitation_mapping = to_map(BQCP24H_MAPPING);
        config
    }

    fn bmsla() -> Self {
        let forecast_columns = to_map(&[
            ("t2m_min", "prev_min"),
            ("t2m_max", "prev_max"),
            ("t2m_max_48", "prev_max_48"),
        ]);

        Self {
            profile: Profile::Bmsla,
            work_dir: PathBuf::from("."),
            stations: to_strings(BMSLA_STATIONS),
            regions: Vec::new(),
            aliases: to_map(BMSLA_ALIASES),
            strict_aliases: false,
            forecast_first_step: 0,
            forecast_last_step: 48,
            reduction_windows: vec![
                ReductionWindow::new("t2m_min", 0, 24, ReductionKind::Min),
                ReductionWindow::new("t2m_max", 0, 24, ReductionKind::Max),
                ReductionWindow::new("t2m_max_48", 24, 48, ReductionKind::Max),
            ],
            forecast_kelvin_offset: None,
            forecast_columns,
            hourly_slots: Vec::new(),
            hourly_columns: BTreeMap::new(),
            min_max_columns: Self::min_max_renames(),
            column_order: to_strings(&["tmin_obs", "prev_min", "tmax_obs", "prev_max", "prev_max_48"]),
            synop_temperature_unit: TemperatureUnit::Kelvin,
            precipitation_mapping: BTreeMap::new(),
            precipitation_report_hour: PRECIP_REPORT_HOUR,
            cleanup_patterns: default_cleanup_patterns(),
        }
    }

    fn sonelgaz() -> Self {
        let regions: Vec<Region> = SONELGAZ_REGIONS
            .iter()
            .map(|(name, stations)| Region {
                name: name.to_string(),
                stations: to_strings(stations),
            })
            .collect();

        let mut stations = Vec::new();
        for region in &regions {
            for station in &region.stations {
                if !stations.contains(station) {
                    stations.push(station.clone());
                }
            }
        }

        let mut forecast_columns = BTreeMap::new();
        for (step, label) in SONELGAZ_FORECAST_SLOTS {
            forecast_columns.insert(forecast_columns::step_column(*step), format!("prev_{}", label));
        }
        forecast_columns.insert("t2m_min".to_string(), "prev_min".to_string());
        forecast_columns.insert("t2m_max".to_string(), "prev_max".to_string());

        let hourly_slots: Vec<HourlySlot> = SONELGAZ_OBSERVATION_SLOTS
            .iter()
            .map(|(hour, day_offset, label)| HourlySlot {
                hour: *hour,
                day_offset: *day_offset,
                column: format!("t2m_{}", label),
            })
            .collect();
        let hourly_columns = hourly_slots
            .iter()
            .map(|slot| (slot.column.clone(), slot.column.replacen("t2m_", "obs_", 1)))
            .collect();

        let mut column_order = to_strings(&["tmin_obs", "prev_min", "tmax_obs", "prev_max"]);
        column_order.extend(SONELGAZ_OBSERVATION_SLOTS.iter().map(|(_, _, l)| format!("obs_{}", l)));
        column_order.extend(SONELGAZ_FORECAST_SLOTS.iter().map(|(_, l)| format!("prev_{}", l)));

        Self {
            profile: Profile::Sonelgaz,
            work_dir: PathBuf::from("."),
            stations,
            regions,
            aliases: to_map(SONELGAZ_ALIASES),
            strict_aliases: false,
            forecast_first_step: 24,
            forecast_last_step: 48,
            reduction_windows: vec![
                ReductionWindow::new("t2m_min", 24, 48, ReductionKind::Min),
                ReductionWindow::new("t2m_max", 24, 48, ReductionKind::Max),
            ],
            forecast_kelvin_offset: None,
            forecast_columns,
            hourly_slots,
            hourly_columns,
            min_max_columns: Self::min_max_renames(),
            column_order,
            synop_temperature_unit: TemperatureUnit::Kelvin,
            precipitation_mapping: BTreeMap::new(),
            precipitation_report_hour: PRECIP_REPORT_HOUR,
            cleanup_patterns: default_cleanup_patterns(),
        }
    }

    fn min_max_renames() -> BTreeMap<String, String> {
        let mut renames = BTreeMap::new();
        renames.insert(observation_columns::TMIN.to_string(), "tmin_obs".to_string());
        renames.insert(observation_columns::TMAX.to_string(), "tmax_obs".to_string());
        renames
    }

    /// Load a full configuration from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BulletinError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: BulletinConfig = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} configuration from {}",
            config.profile.name(),
            path.display()
        );
        config.validate()?;
        Ok(config)
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn with_stations<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stations = stations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_aliases(mut self, aliases: BTreeMap<String, String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_regions(mut self, regions: Vec<Region>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_strict_aliases(mut self) -> Self {
        self.strict_aliases = true;
        self
    }

    pub fn with_synop_temperature_unit(mut self, unit: TemperatureUnit) -> Self {
        self.synop_temperature_unit = unit;
        self
    }

    pub fn with_forecast_kelvin_offset(mut self, offset: f64) -> Self {
        self.forecast_kelvin_offset = Some(offset);
        self
    }

    pub fn with_precipitation_mapping(mut self, mapping: BTreeMap<String, String>) -> Self {
        self.precipitation_mapping = mapping;
        self
    }

    pub fn with_precipitation_report_hour(mut self, hour: u32) -> Self {
        self.precipitation_report_hour = hour;
        self
    }

    /// Check the configuration for structural errors.
    ///
    /// Returns the aliases whose target is not a canonical station. Such an
    /// alias makes that station's observations disappear at reindexing, so
    /// each one is reported (or rejected with `strict_aliases`).
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.stations.is_empty() {
            return Err(BulletinError::configuration("station list is empty"));
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if !seen.insert(station.as_str()) {
                return Err(BulletinError::configuration(format!(
                    "station '{}' appears more than once in the station list",
                    station
                )));
            }
        }

        for region in &self.regions {
            for station in &region.stations {
                if !seen.contains(station.as_str()) {
                    return Err(BulletinError::configuration(format!(
                        "region '{}' lists unknown station '{}'",
                        region.name, station
                    )));
                }
            }
        }

        if self.forecast_first_step > self.forecast_last_step {
            return Err(BulletinError::configuration(format!(
                "forecast steps {}..={} are empty",
                self.forecast_first_step, self.forecast_last_step
            )));
        }

        for window in &self.reduction_windows {
            if window.first_step < self.forecast_first_step
                || window.last_step > self.forecast_last_step
                || window.first_step > window.last_step
            {
                return Err(BulletinError::configuration(format!(
                    "reduction window '{}' ({}..={}) is outside the forecast steps {}..={}",
                    window.column,
                    window.first_step,
                    window.last_step,
                    self.forecast_first_step,
                    self.forecast_last_step
                )));
            }
        }

        if self.precipitation_report_hour > 23 {
            return Err(BulletinError::configuration(format!(
                "precipitation report hour {} is not an hour of the day",
                self.precipitation_report_hour
            )));
        }

        if !self.precipitation_mapping.is_empty() {
            let mapping = StationMapping::new(self.precipitation_mapping.clone());
            for station in mapping.unmapped(&self.stations) {
                warn!("Station '{}' has no SYNOP mapping; its precipitation will read '/'", station);
            }
        }

        let aliases = self.station_aliases();
        let chained = aliases.chained();
        if !chained.is_empty() {
            return Err(BulletinError::configuration(format!(
                "aliases point at other aliases: {}",
                chained.join(", ")
            )));
        }

        let unknown = aliases.targets_outside(&self.stations);
        for alias in &unknown {
            warn!(
                "Alias '{}' -> '{}' points outside the station list; its observations will be dropped",
                alias,
                self.aliases[alias]
            );
        }
        if self.strict_aliases && !unknown.is_empty() {
            return Err(BulletinError::configuration(format!(
                "aliases point outside the station list: {}",
                unknown.join(", ")
            )));
        }

        Ok(unknown)
    }

    pub fn station_aliases(&self) -> StationAliases {
        StationAliases::new(self.aliases.clone())
    }

    pub fn forecast_steps(&self) -> Vec<u32> {
        (self.forecast_first_step..=self.forecast_last_step).collect()
    }

    /// Precipitation mapping from the configuration, or from the mapping
    /// file in the template directory when none is configured
    pub fn precipitation_mapping(&self) -> Result<StationMapping> {
        if self.precipitation_mapping.is_empty() {
            StationMapping::from_json_file(&self.station_mapping_path())
        } else {
            Ok(StationMapping::new(self.precipitation_mapping.clone()))
        }
    }

    pub fn station_mapping_path(&self) -> PathBuf {
        self.work_dir
            .join(layout::TEMPLATE_DIR)
            .join(layout::STATION_MAPPING_FILE)
    }

    pub fn station_catalogue_path(&self) -> PathBuf {
        self.work_dir
            .join(layout::TEMPLATE_DIR)
            .join(layout::STATION_CATALOGUE)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.work_dir.join(layout::TMP_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.work_dir.join(layout::OUTPUTS_DIR)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.work_dir.join(layout::LOGS_DIR)
    }

    pub fn forecast_samples_path(&self, run_date: &RunDate) -> PathBuf {
        self.tmp_dir().join(layout::forecast_samples(&run_date.stamp()))
    }

    pub fn forecast_table_path(&self, run_date: &RunDate) -> PathBuf {
        self.outputs_dir()
            .join(layout::FORECAST_DIR)
            .join(layout::forecast_table(&run_date.stamp()))
    }

    pub fn hourly_observations_path(&self, run_date: &RunDate) -> PathBuf {
        self.outputs_dir()
            .join(layout::OBSERVATIONS_DIR)
            .join(layout::hourly_observations(&run_date.stamp()))
    }

    pub fn min_max_observations_path(&self, run_date: &RunDate) -> PathBuf {
        self.outputs_dir()
            .join(layout::OBSERVATIONS_DIR)
            .join(layout::min_max_observations(&run_date.stamp()))
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.outputs_dir().join(layout::TABLES_DIR)
    }

    pub fn precip_dir(&self) -> PathBuf {
        self.outputs_dir().join(layout::PRECIP_DIR)
    }

    pub fn daily_table_path(&self, run_date: &RunDate) -> PathBuf {
        self.outputs_dir()
            .join(layout::DAILY_DIR)
            .join(layout::daily_table(&run_date.stamp()))
    }

    pub fn synop_path(&self, slot: &SynopSlot) -> PathBuf {
        self.work_dir.join(layout::SYNOP_ROOT).join(slot.relative_path())
    }

    /// Log file used when no shared log file is given
    pub fn default_log_path(&self, run_date: &RunDate) -> PathBuf {
        self.logs_dir()
            .join(format!("{}_{}.log", self.profile.name(), run_date.stamp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_builtin_profiles_validate() {
        for profile in [Profile::Bmsla, Profile::Sonelgaz, Profile::Bqrm, Profile::Bqcp24h] {
            let config = BulletinConfig::for_profile(profile);
            let unknown = config.validate().unwrap();
            assert!(unknown.is_empty(), "{:?} has dangling aliases: {:?}", profile, unknown);
        }
    }

    #[test]
    fn test_sonelgaz_layout() {
        let config = BulletinConfig::for_profile(Profile::Sonelgaz);
        assert_eq!(config.regions.len(), 4);
        assert_eq!(config.forecast_columns["t2m_30"], "prev_06");
        assert_eq!(config.hourly_columns["t2m_24"], "obs_24");
        assert_eq!(config.column_order.len(), 14);
        assert_eq!(config.forecast_steps().len(), 25);
    }

    #[test]
    fn test_precipitation_profile_has_its_own_mapping() {
        let config = BulletinConfig::for_profile(Profile::Bqcp24h);
        let mapping = config.precipitation_mapping().unwrap();

        assert_eq!(mapping.synop_name("Alger"), Some("DAR-EL-BEIDA"));
        assert_eq!(mapping.unmapped(&config.stations), ["Miliana"]);
        assert_eq!(config.precipitation_report_hour, 6);
    }

    #[test]
    fn test_precipitation_mapping_file_fallback() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = BulletinConfig::for_profile(Profile::Bmsla).with_work_dir(dir.path());
        assert!(matches!(
            config.precipitation_mapping(),
            Err(BulletinError::MissingInput { .. })
        ));

        std::fs::create_dir_all(dir.path().join("template")).unwrap();
        std::fs::write(config.station_mapping_path(), r#"{"MSILA": "M'SILA"}"#).unwrap();
        let mapping = config.precipitation_mapping().unwrap();
        assert_eq!(mapping.synop_name("MSILA"), Some("M'SILA"));
    }

    #[test]
    fn test_report_hour_must_be_an_hour() {
        let config = BulletinConfig::for_profile(Profile::Bqcp24h).with_precipitation_report_hour(24);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dangling_alias_is_reported() {
        let mut aliases = BTreeMap::new();
        aliases.insert("Ax".to_string(), "A".to_string());
        aliases.insert("Zx".to_string(), "Z".to_string());

        let config = BulletinConfig::for_profile(Profile::Bmsla)
            .with_stations(["A", "B"])
            .with_aliases(aliases);

        assert_eq!(config.validate().unwrap(), vec!["Zx".to_string()]);

        let strict = config.with_strict_aliases();
        assert!(matches!(
            strict.validate(),
            Err(BulletinError::Configuration { .. })
        ));
    }

    #[test]
    fn test_duplicate_station_is_rejected() {
        let config = BulletinConfig::for_profile(Profile::Bmsla).with_stations(["A", "B", "A"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_outside_steps_is_rejected() {
        let mut config = BulletinConfig::for_profile(Profile::Sonelgaz);
        config.reduction_windows.push(ReductionWindow::new("t2m_early", 0, 12, ReductionKind::Min));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let config = BulletinConfig::for_profile(Profile::Bmsla).with_work_dir("/srv/bmsla");
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = BulletinConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.profile, Profile::Bmsla);
        assert_eq!(loaded.work_dir, PathBuf::from("/srv/bmsla"));
        assert_eq!(loaded.stations, config.stations);
    }

    #[test]
    fn test_paths_are_dated() {
        let config = BulletinConfig::for_profile(Profile::Sonelgaz).with_work_dir("/w");
        let date = RunDate::parse("2025-01-15").unwrap();
        assert_eq!(
            config.forecast_table_path(&date),
            PathBuf::from("/w/outputs/arpege/station_arpege_20250115.csv")
        );
        assert_eq!(
            config.synop_path(&date.today_slot(6)),
            PathBuf::from("/w/bufr_data/observations/2025/01/15/synop_202501150600.csv")
        );
    }
}
