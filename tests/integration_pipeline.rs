//! End-to-end tests of the bulletin pipeline
//!
//! A work directory is laid out in a TempDir with the files the external
//! GRIB and BUFR readers would leave behind, then the library pipeline and
//! the `bulletin` binary are run against it.

use bulletin_tables::config::{BulletinConfig, Profile, TemperatureUnit};
use bulletin_tables::models::RunDate;
use bulletin_tables::BulletinProcessor;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const STATIONS: &[&str] = &["ALGER", "MSILA", "TAMANRASSET"];

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Work directory for the run date 2025-09-01 with Celsius SYNOP exports
fn work_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write_file(
        root,
        "template/station_onm_officielle.csv",
        "station,SID,lon,lat,alt\nALGER,60390,3.25,36.68,25\nMSILA,60467,4.5,35.67,442\nTAMANRASSET,60680,5.43,22.8,1377\n",
    );
    write_file(
        root,
        "tmp/t2m_samples_20250901.csv",
        "station,step,t2m\nALGER,0,22.2\nALGER,24,31.6\nMSILA,12,35.2\nMSILA,36,37.8\nTAMANRASSET,6,\n",
    );
    write_file(root, "tmp/arpege_20250901.grib", "GRIB");
    write_file(
        root,
        "bufr_data/observations/2025/09/01/synop_202509010600.csv",
        "stationOrSiteName,minimumTemperatureAtHeightAndOverPeriodSpecified,timePeriod,totalPrecipitationOrTotalWaterEquivalent\n\
         ALGER,21.4,-24,0.05\n\
         M'SILA,,-24,3.0\n\
         M'SILA,19.8,-24,\n",
    );
    write_file(
        root,
        "bufr_data/observations/2025/08/31/synop_202508311800.csv",
        "stationOrSiteName,maximumTemperatureAtHeightAndOverPeriodSpecified\nALGER,30.6\nM'SILA,36.1\nBISKRA,40.2\n",
    );
    write_file(
        root,
        "template/ListStation.json",
        r#"{"ALGER": "ALGER", "MSILA": "M'SILA", "TAMANRASSET": "TAMANRASSET"}"#,
    );
    write_file(
        root,
        "outputs/precip/cumul_agri_06.csv",
        "Station,cumul\nALGER,650.3\nMSILA,210.0\nTAMANRASSET,12.0\n",
    );
    dir
}

fn config(dir: &TempDir) -> BulletinConfig {
    let mut alias_map = BTreeMap::new();
    alias_map.insert("M'SILA".to_string(), "MSILA".to_string());

    BulletinConfig::for_profile(Profile::Bmsla)
        .with_work_dir(dir.path())
        .with_stations(STATIONS.iter().copied())
        .with_aliases(alias_map)
        .with_synop_temperature_unit(TemperatureUnit::Celsius)
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_full_cycle_in_process() {
    let dir = work_dir();
    let processor = BulletinProcessor::new(config(&dir), RunDate::parse("2025-09-01").unwrap()).unwrap();

    let summary = processor.run_all().unwrap();
    processor.run_precipitation_stage().unwrap();

    assert_eq!(summary.stages.len(), 4);
    assert_eq!(summary.fallbacks(), 0);

    let table = lines(&dir.path().join("outputs/tab_reg/all_stations.csv"));
    assert_eq!(
        table,
        [
            "Station,tmin_obs,prev_min,tmax_obs,prev_max,prev_max_48",
            "ALGER,21,22,31,32,32",
            "MSILA,20,35,36,35,38",
            "TAMANRASSET,/,/,/,/,/",
        ]
    );

    // September 1st restarts the agricultural year
    let ledger = lines(&dir.path().join("outputs/precip/cumul_agri_06.csv"));
    assert_eq!(ledger[1], "ALGER,0.05");
    assert_eq!(ledger[2], "MSILA,3.0");
    assert_eq!(ledger[3], "TAMANRASSET,0.0");

    let precip = lines(&dir.path().join("outputs/precip/precip_24h_20250901_06.csv"));
    assert_eq!(precip[1], "ALGER,Tr");
    assert_eq!(precip[2], "MSILA,3.0");
    assert_eq!(precip[3], "TAMANRASSET,/");

    assert!(!dir.path().join("tmp/arpege_20250901.grib").exists());
}

#[test]
fn test_binary_exit_codes_and_shared_log() {
    let dir = work_dir();
    let log_file = dir.path().join("shared.log");
    let bin = env!("CARGO_BIN_EXE_bulletin");

    let status = Command::new(bin)
        .args(["forecast", "--profile", "bmsla", "--date", "2025-09-01"])
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--shared-log-file")
        .arg(&log_file)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("outputs/arpege/station_arpege_20250901.csv").exists());

    let status = Command::new(bin)
        .args(["forecast", "--profile", "bmsla", "--date", "2025-09-02"])
        .arg("--work-dir")
        .arg(dir.path())
        .arg("--shared-log-file")
        .arg(&log_file)
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    let log = fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("Forecast stage"));
    assert!(log.lines().count() >= 2);
}

#[test]
fn test_binary_default_log_location() {
    let dir = work_dir();

    let output = Command::new(env!("CARGO_BIN_EXE_bulletin"))
        .args(["cleanup", "--profile", "bmsla", "--date", "2025-09-01"])
        .arg("--work-dir")
        .arg(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(dir.path().join("logs/bmsla_20250901.log").exists());
    assert!(!dir.path().join("tmp/t2m_samples_20250901.csv").exists());
}
