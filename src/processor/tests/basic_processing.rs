//! Full-run tests

use super::*;
use crate::processor::BulletinProcessor;

#[test]
fn test_run_all_writes_bulletin_table() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();

    let summary = processor.run_all().unwrap();

    let stage_names: Vec<&str> = summary.stages.iter().map(|s| s.stage.as_str()).collect();
    assert_eq!(stage_names, ["forecast", "observations", "tables", "cleanup"]);
    assert_eq!(summary.fallbacks(), 0);

    let lines = read_lines(&dir.path().join("outputs/tab_reg/all_stations.csv"));
    assert_eq!(
        lines,
        [
            "Station,tmin_obs,prev_min,tmax_obs,prev_max,prev_max_48",
            "ALGER,7,8,21,18,21",
            "ORAN,6,11,23,20,24",
            "ADRAR,/,/,/,/,/",
        ]
    );
}

#[test]
fn test_run_all_removes_temporary_samples() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();

    let summary = processor.run_all().unwrap();

    assert!(!dir.path().join("tmp/t2m_samples_20250315.csv").exists());
    let cleanup = summary.stages.iter().find(|s| s.stage == "cleanup").unwrap();
    assert_eq!(cleanup.rows_written, 1);
}

#[test]
fn test_observation_stage_resolves_duplicates() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();

    let stats = processor.run_observation_stage().unwrap();

    assert_eq!(stats.duplicates_removed, 1);
    assert_eq!(stats.rows_written, 3);
    assert!(dir.path().join("outputs/observations/tmin_tmax_20250315.csv").exists());
}

#[test]
fn test_tables_stage_is_repeatable() {
    let dir = full_work_dir();
    let processor = BulletinProcessor::new(test_config(&dir), run_date()).unwrap();
    processor.run_forecast_stage().unwrap();
    processor.run_observation_stage().unwrap();

    processor.run_tables_stage().unwrap();
    let first = read_lines(&dir.path().join("outputs/tab_reg/all_stations.csv"));
    processor.run_tables_stage().unwrap();
    let second = read_lines(&dir.path().join("outputs/tab_reg/all_stations.csv"));

    assert_eq!(first, second);
}
