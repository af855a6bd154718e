//! Precipitation bulletin and cumulative ledger

use super::*;
use crate::error::BulletinError;
use crate::processor::BulletinProcessor;

#[test]
fn test_precipitation_outputs() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(precipitation_config(&dir), run_date()).unwrap();

    let stats = processor.run_precipitation_stage().unwrap();

    assert_eq!(stats.dropped_stations, ["ADRAR"]);
    let precip = read_lines(&dir.path().join("outputs/precip/precip_24h_20250315_06.csv"));
    assert_eq!(precip, ["Station,precip_24h", "ALGER,4.2", "ORAN,0", "ADRAR,/"]);

    let missing = read_lines(&dir.path().join("outputs/precip/missing_stations_20250315_06.txt"));
    assert_eq!(missing, ["ADRAR"]);

    let ledger = read_lines(&dir.path().join("outputs/precip/cumul_agri_06.csv"));
    assert_eq!(ledger[0], "Station,cumul");
    assert_eq!(ledger[1], "ALGER,4.2");
}

#[test]
fn test_ledger_accumulates_across_runs() {
    let dir = full_work_dir();
    write_file(
        dir.path(),
        "outputs/precip/cumul_agri_06.csv",
        "Station,cumul\nALGER,120.5\nORAN,abc\n",
    );
    let processor = BulletinProcessor::new(precipitation_config(&dir), run_date()).unwrap();

    processor.run_precipitation_stage().unwrap();

    let ledger = read_lines(&dir.path().join("outputs/precip/cumul_agri_06.csv"));
    assert_eq!(ledger[1], "ALGER,124.7");
    assert_eq!(ledger[2], "ORAN,0.0");
}

#[test]
fn test_unmapped_station_is_missing_despite_report() {
    let dir = full_work_dir();
    let mut mapping = BTreeMap::new();
    mapping.insert("ALGER".to_string(), "DAR-EL-BEIDA".to_string());
    let config = precipitation_config(&dir).with_precipitation_mapping(mapping);
    let processor = BulletinProcessor::new(config, run_date()).unwrap();

    let stats = processor.run_precipitation_stage().unwrap();

    assert_eq!(stats.dropped_stations, ["ADRAR", "ORAN"]);
    let precip = read_lines(&dir.path().join("outputs/precip/precip_24h_20250315_06.csv"));
    assert_eq!(precip[2], "ORAN,/");
}

#[test]
fn test_evening_report_hour() {
    let dir = full_work_dir();
    write_file(
        dir.path(),
        "bufr_data/observations/2025/03/15/synop_202503151800.csv",
        "stationOrSiteName,timePeriod,totalPrecipitationOrTotalWaterEquivalent\nADRAR,-24,0.05\nORAN,-24,1.26\n",
    );
    let config = precipitation_config(&dir).with_precipitation_report_hour(18);
    let processor = BulletinProcessor::new(config, run_date()).unwrap();

    let stats = processor.run_precipitation_stage().unwrap();

    assert_eq!(stats.dropped_stations, ["ALGER"]);
    let precip = read_lines(&dir.path().join("outputs/precip/precip_24h_20250315_18.csv"));
    assert_eq!(precip[1..], ["ALGER,/", "ORAN,1.3", "ADRAR,Tr"]);
    assert!(dir.path().join("outputs/precip/missing_stations_20250315_18.txt").exists());
    assert!(dir.path().join("outputs/precip/cumul_agri_18.csv").exists());
    assert!(!dir.path().join("outputs/precip/cumul_agri_06.csv").exists());
}

#[test]
fn test_mapping_file_in_template_dir() {
    let dir = full_work_dir();
    write_file(
        dir.path(),
        "template/ListStation.json",
        r#"{"ALGER": "DAR-EL-BEIDA", "ADRAR": "ADRAR"}"#,
    );
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();

    let stats = processor.run_precipitation_stage().unwrap();

    assert_eq!(stats.dropped_stations, ["ADRAR", "ORAN"]);
}

#[test]
fn test_missing_mapping_file_fails() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();

    assert!(matches!(
        processor.run_precipitation_stage(),
        Err(BulletinError::MissingInput { .. })
    ));
}

#[test]
fn test_missing_precipitation_report_fails() {
    let dir = TempDir::new().unwrap();
    let processor = BulletinProcessor::new(precipitation_config(&dir), run_date()).unwrap();

    assert!(processor.run_precipitation_stage().is_err());
}
