//! In-process bulletin pipeline.
//!
//! Runs the stages of one bulletin cycle against a single configuration and
//! run date: forecast table, observation tables, reconciled bulletin
//! tables and cleanup, plus the precipitation and daily observation
//! bulletins. Each stage writes its own dated files under the work
//! directory and returns [`StageStats`].

use crate::cleanup::cleanup_temp_files;
use crate::config::{BulletinConfig, Profile};
use crate::constants::{
    CURRENT_PERIOD, DAILY_EVENING_HOUR, DAILY_MORNING_HOUR, STATION_HEADER, TMAX_REPORT_HOUR,
    TMIN_REPORT_HOUR, layout, observation_columns,
};
use crate::daily_report::{DailyBulletin, build_daily_bulletin};
use crate::error::{BulletinError, Result};
use crate::forecast::build_forecast_table;
use crate::models::{RunDate, RunSummary, StageStats, StationTable, SynopSlot};
use crate::observations::{build_hourly_table, build_min_max_table};
use crate::precipitation::{CumulativeLedger, PrecipitationBulletin, agricultural_period_start};
use crate::reconcile::{ObservationSource, ReconcileRequest, StationAliases, reconcile, split_regions};
use crate::sources::{
    load_forecast_samples, load_precipitation_reports, load_station_catalogue, load_station_table,
    load_station_table_or_empty, load_synop_export, load_synop_period,
};
use crate::writer::{write_lines, write_numeric_csv, write_rows_csv, write_table_csv};
use colored::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Runs the bulletin stages for one configuration and date
pub struct BulletinProcessor {
    config: BulletinConfig,
    run_date: RunDate,
    aliases: StationAliases,
}

impl BulletinProcessor {
    /// Validate the configuration and prepare a processor
    pub fn new(config: BulletinConfig, run_date: RunDate) -> Result<Self> {
        let unknown_targets = config.validate()?;
        if !unknown_targets.is_empty() {
            warn!(
                "{} alias targets are outside the station list; their reports will be dropped",
                unknown_targets.len()
            );
        }

        let aliases = config.station_aliases();
        Ok(Self {
            config,
            run_date,
            aliases,
        })
    }

    pub fn config(&self) -> &BulletinConfig {
        &self.config
    }

    pub fn run_date(&self) -> &RunDate {
        &self.run_date
    }

    /// Build the forecast table from the extracted model samples
    pub fn run_forecast_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("forecast");

        let stations = load_station_catalogue(&self.config.station_catalogue_path())?;
        let mut samples = load_forecast_samples(&self.config.forecast_samples_path(&self.run_date))?;
        if let Some(offset) = self.config.forecast_kelvin_offset {
            debug!("Converting forecast samples with offset {}", offset);
            for sample in &mut samples {
                sample.value = sample.value.map(|v| v - offset);
            }
        }

        let table = build_forecast_table(
            &stations,
            &samples,
            &self.config.forecast_steps(),
            &self.config.reduction_windows,
        );

        let path = self.config.forecast_table_path(&self.run_date);
        write_numeric_csv(&table, &path, STATION_HEADER)?;

        stats.rows_written = table.len();
        stats.files_written.push(path);
        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Read an optional SYNOP input with `loader`. An absent or unreadable
    /// file gives `None` and counts as a fallback.
    fn load_optional(
        &self,
        path: &Path,
        loader: impl FnOnce(&Path) -> Result<StationTable>,
        stats: &mut StageStats,
    ) -> Option<StationTable> {
        if !path.exists() {
            warn!("SYNOP report not found: {}", path.display());
            stats.fallbacks += 1;
            return None;
        }
        match loader(path) {
            Ok(table) => Some(table),
            Err(e) => {
                error!("Failed to load {}: {}; continuing without it", path.display(), e);
                stats.fallbacks += 1;
                None
            }
        }
    }

    /// Read one SYNOP export, or `None` when the slot is absent or unreadable
    fn load_report(&self, slot: &SynopSlot, stats: &mut StageStats) -> Option<StationTable> {
        self.load_optional(&self.config.synop_path(slot), load_synop_export, stats)
    }

    /// Build the hourly and min/max observation tables
    pub fn run_observation_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("observations");
        let unit = self.config.synop_temperature_unit;

        if !self.config.hourly_slots.is_empty() {
            let reports: Vec<Option<StationTable>> = self
                .config
                .hourly_slots
                .iter()
                .map(|slot| self.load_report(&slot.synop_slot(&self.run_date), &mut stats))
                .collect();

            let hourly = build_hourly_table(
                &self.config.stations,
                &self.config.hourly_slots,
                &reports,
                &self.aliases,
                unit,
            )?;

            let path = self.config.hourly_observations_path(&self.run_date);
            write_numeric_csv(&hourly.table, &path, STATION_HEADER)?;
            stats.rows_written += hourly.table.len();
            stats.duplicates_removed += hourly.duplicates_removed;
            stats.files_written.push(path);
        }

        let tmin_slot = self.run_date.today_slot(TMIN_REPORT_HOUR);
        let tmax_slot = self.run_date.yesterday_slot(TMAX_REPORT_HOUR);
        let tmin_report = self.load_report(&tmin_slot, &mut stats);
        let tmax_report = self.load_report(&tmax_slot, &mut stats);

        if tmin_report.is_none() && tmax_report.is_none() {
            return Err(BulletinError::MissingInput {
                path: self.config.synop_path(&tmin_slot),
            });
        }

        let min_max = build_min_max_table(
            &self.config.stations,
            tmin_report.as_ref(),
            tmax_report.as_ref(),
            &self.aliases,
            unit,
        )?;

        let path = self.config.min_max_observations_path(&self.run_date);
        write_numeric_csv(&min_max.table, &path, STATION_HEADER)?;
        stats.rows_written += min_max.table.len();
        stats.duplicates_removed += min_max.duplicates_removed;
        stats.files_written.push(path);

        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Load an intermediate table and rename its columns for the bulletin.
    /// Returns the table and whether the empty fallback was used.
    fn load_renamed(&self, path: &Path, renames: &BTreeMap<String, String>) -> (StationTable, bool) {
        let columns: Vec<&str> = renames.keys().map(String::as_str).collect();
        let (mut table, fell_back) = load_station_table_or_empty(path, STATION_HEADER, &columns);
        table.rename_columns(renames);
        (table, fell_back)
    }

    /// Reconcile the forecast and observation tables into bulletin tables
    pub fn run_tables_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("tables");

        let (forecast, fell_back) = self.load_renamed(
            &self.config.forecast_table_path(&self.run_date),
            &self.config.forecast_columns,
        );
        stats.fallbacks += usize::from(fell_back);

        let (min_max, fell_back) = self.load_renamed(
            &self.config.min_max_observations_path(&self.run_date),
            &self.config.min_max_columns,
        );
        stats.fallbacks += usize::from(fell_back);

        let mut observations = vec![ObservationSource::new("tmin_tmax", min_max).with_aliases(&self.aliases)];

        if !self.config.hourly_columns.is_empty() {
            let (hourly, fell_back) = self.load_renamed(
                &self.config.hourly_observations_path(&self.run_date),
                &self.config.hourly_columns,
            );
            stats.fallbacks += usize::from(fell_back);
            observations.push(ObservationSource::new("hourly", hourly).with_aliases(&self.aliases));
        }

        let reconciled = reconcile(ReconcileRequest {
            stations: &self.config.stations,
            forecast,
            observations,
            column_order: Some(&self.config.column_order),
        })?;

        stats.duplicates_removed = reconciled.stats.duplicates_removed;
        stats.dropped_stations = reconciled.stats.dropped_stations.clone();

        let tables_dir = self.config.tables_dir();
        if self.config.regions.is_empty() {
            let path = tables_dir.join(layout::ALL_STATIONS_FILE);
            write_table_csv(&reconciled.table, &path)?;
            stats.rows_written = reconciled.table.len();
            stats.files_written.push(path);
        } else {
            for (region, table) in split_regions(&reconciled.table, &self.config.regions) {
                let path = tables_dir.join(layout::region_table(&region));
                write_table_csv(&table, &path)?;
                stats.rows_written += table.len();
                stats.files_written.push(path);
            }
        }

        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Build the 24h precipitation bulletin and update the cumulative ledger
    pub fn run_precipitation_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("precipitation");
        let hour = self.config.precipitation_report_hour;

        let mapping = self.config.precipitation_mapping()?;
        let slot = self.run_date.today_slot(hour);
        let reports = load_precipitation_reports(&self.config.synop_path(&slot))?;
        let stations = &self.config.stations;

        let bulletin = PrecipitationBulletin::from_reports(stations, &reports, &mapping);
        let precip_dir = self.config.precip_dir();
        let stamp = self.run_date.stamp();

        let table_path = precip_dir.join(layout::precip_table(&stamp, hour));
        write_rows_csv(
            &table_path,
            &[STATION_HEADER, observation_columns::PRECIP_24H],
            &bulletin.display_rows(),
        )?;
        stats.rows_written += bulletin.amounts.len();
        stats.files_written.push(table_path);

        let missing = bulletin.missing_stations();
        let missing_path = precip_dir.join(layout::missing_stations(&stamp, hour));
        write_lines(&missing_path, &missing)?;
        if !missing.is_empty() {
            warn!(
                "{} stations without 24h precipitation, listed in {}",
                missing.len(),
                missing_path.display()
            );
        }
        stats.dropped_stations = missing;
        stats.files_written.push(missing_path);

        let ledger_path = precip_dir.join(layout::cumul_ledger(hour));
        let previous = if ledger_path.exists() {
            load_station_table(&ledger_path, STATION_HEADER, &[observation_columns::CUMUL])?
        } else {
            info!("No cumulative ledger yet, starting from zero");
            StationTable::with_columns([observation_columns::CUMUL])
        };

        let mut ledger = CumulativeLedger::from_previous(stations, &previous);
        ledger.update(&bulletin, &self.run_date);
        write_numeric_csv(&ledger.to_table(), &ledger_path, STATION_HEADER)?;
        stats.files_written.push(ledger_path);

        info!(
            "Cumulative precipitation since {}",
            agricultural_period_start(self.run_date.today()).format("%d/%m/%Y")
        );

        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Build the daily observation bulletin from today's 06 UTC report and
    /// yesterday's 18 UTC report
    pub fn run_daily_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("daily");

        let morning_path = self.config.synop_path(&self.run_date.today_slot(DAILY_MORNING_HOUR));
        let morning = load_synop_export(&morning_path)?;
        let precipitation = self.load_optional(&morning_path, load_precipitation_reports, &mut stats);

        let evening_path = self.config.synop_path(&self.run_date.yesterday_slot(DAILY_EVENING_HOUR));
        let evening = self.load_optional(
            &evening_path,
            |path| load_synop_period(path, CURRENT_PERIOD),
            &mut stats,
        );

        let bulletin = build_daily_bulletin(
            &self.config.stations,
            &morning,
            precipitation.as_ref(),
            evening.as_ref(),
            &self.aliases,
            self.config.synop_temperature_unit,
        );

        let path = self.config.daily_table_path(&self.run_date);
        write_rows_csv(&path, DailyBulletin::headers(), &bulletin.display_rows())?;
        info!("Daily bulletin written: {} ({} stations)", path.display(), bulletin.rows.len());

        stats.rows_written = bulletin.rows.len();
        stats.dropped_stations = bulletin.missing_stations;
        stats.files_written.push(path);
        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Remove temporary inputs from the tmp directory
    pub fn run_cleanup_stage(&self) -> Result<StageStats> {
        let start = Instant::now();
        let mut stats = StageStats::new("cleanup");
        stats.rows_written = cleanup_temp_files(&self.config.tmp_dir(), &self.config.cleanup_patterns)?;
        stats.processing_time_ms = start.elapsed().as_millis();
        Ok(stats)
    }

    /// Every stage of the profile's bulletin, then cleanup. Forecast
    /// bulletins run forecast, observations and tables, in that order. The
    /// first failing stage stops the run.
    pub fn run_all(&self) -> Result<RunSummary> {
        let start = Instant::now();
        info!(
            "Starting {} bulletin run for {}",
            self.config.profile.name(),
            self.run_date.today()
        );

        let mut stages = match self.config.profile {
            Profile::Bmsla | Profile::Sonelgaz => vec![
                self.run_forecast_stage()?,
                self.run_observation_stage()?,
                self.run_tables_stage()?,
            ],
            Profile::Bqrm => vec![self.run_daily_stage()?],
            Profile::Bqcp24h => vec![self.run_precipitation_stage()?],
        };
        stages.push(self.run_cleanup_stage()?);

        let summary = RunSummary {
            stages,
            processing_time_ms: start.elapsed().as_millis(),
        };
        info!(
            "Run complete: {} files written, {} fallbacks in {}ms",
            summary.files_written(),
            summary.fallbacks(),
            summary.processing_time_ms
        );
        Ok(summary)
    }
}

/// Print a human-readable summary of a run
pub fn print_summary(summary: &RunSummary) {
    println!("\n{}", "Bulletin Summary".bright_green().bold());
    for stage in &summary.stages {
        println!(
            "  {} {} rows, {} files in {}ms",
            format!("{}:", stage.stage).bright_cyan(),
            stage.rows_written.to_string().bright_white().bold(),
            stage.files_written.len().to_string().bright_white(),
            stage.processing_time_ms
        );
        if stage.fallbacks > 0 {
            println!(
                "    {} {}",
                "Inputs replaced by empty tables:".bright_red(),
                stage.fallbacks.to_string().bright_red().bold()
            );
        }
        if stage.duplicates_removed > 0 {
            println!(
                "    {} {}",
                "Duplicate rows resolved:".bright_yellow(),
                stage.duplicates_removed
            );
        }
        if !stage.dropped_stations.is_empty() {
            println!(
                "    {} {}",
                "Stations left out:".bright_yellow(),
                stage.dropped_stations.join(", ")
            );
        }
    }
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        summary.processing_time_ms.to_string().bright_white()
    );
}

#[cfg(test)]
mod tests;
