//! Pipeline tests for the processor module
//!
//! Each test lays out a small work directory (catalogue, forecast samples,
//! SYNOP exports) for the run date 2025-03-15 and drives the stages.

pub mod basic_processing;
pub mod precipitation_stage;

use crate::config::{BulletinConfig, Profile};
use crate::models::RunDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const CATALOGUE: &str = "station,SID,lon,lat,alt
ALGER,60390,3.25,36.68,25
ORAN,60490,-0.6,35.63,90
ADRAR,60620,-0.28,27.88,264
";

pub const SAMPLES: &str = "station,step,t2m
ALGER,0,8.4
ALGER,12,17.6
ALGER,24,9.1
ALGER,36,21.4
ORAN,6,11.0
ORAN,18,19.5
ORAN,30,23.5
";

/// Today 06 UTC: minimum temperatures and 24h precipitation
pub const SYNOP_TODAY_06: &str = "stationOrSiteName,minimumTemperatureAtHeightAndOverPeriodSpecified,airTemperature,timePeriod,totalPrecipitationOrTotalWaterEquivalent
DAR-EL-BEIDA,280.15,283.15,-24,4.2
ORAN,,284.15,-24,
ORAN,279.15,284.15,-12,0.3
";

/// Yesterday 18 UTC: maximum temperatures
pub const SYNOP_YESTERDAY_18: &str = "stationOrSiteName,maximumTemperatureAtHeightAndOverPeriodSpecified
DAR-EL-BEIDA,294.15
ORAN,296.15
";

pub fn run_date() -> RunDate {
    RunDate::parse("2025-03-15").unwrap()
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Three-station configuration rooted at `dir`
pub fn test_config(dir: &TempDir) -> BulletinConfig {
    let mut aliases = BTreeMap::new();
    aliases.insert("DAR-EL-BEIDA".to_string(), "ALGER".to_string());

    BulletinConfig::for_profile(Profile::Bmsla)
        .with_work_dir(dir.path())
        .with_stations(["ALGER", "ORAN", "ADRAR"])
        .with_aliases(aliases)
}

/// Precipitation bulletin over the same three stations, ALGER reported by
/// DAR-EL-BEIDA
pub fn precipitation_config(dir: &TempDir) -> BulletinConfig {
    let mut mapping = BTreeMap::new();
    mapping.insert("ALGER".to_string(), "DAR-EL-BEIDA".to_string());
    mapping.insert("ORAN".to_string(), "ORAN".to_string());
    mapping.insert("ADRAR".to_string(), "ADRAR".to_string());

    BulletinConfig::for_profile(Profile::Bqcp24h)
        .with_work_dir(dir.path())
        .with_stations(["ALGER", "ORAN", "ADRAR"])
        .with_precipitation_mapping(mapping)
}

pub fn write_catalogue_and_samples(root: &Path) {
    write_file(root, "template/station_onm_officielle.csv", CATALOGUE);
    write_file(root, "tmp/t2m_samples_20250315.csv", SAMPLES);
}

pub fn write_synop_reports(root: &Path) {
    write_file(
        root,
        "bufr_data/observations/2025/03/15/synop_202503150600.csv",
        SYNOP_TODAY_06,
    );
    write_file(
        root,
        "bufr_data/observations/2025/03/14/synop_202503141800.csv",
        SYNOP_YESTERDAY_18,
    );
}

/// Work directory with every input of a full run
pub fn full_work_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_catalogue_and_samples(dir.path());
    write_synop_reports(dir.path());
    dir
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
