//! Command-line argument definitions for the bulletin pipeline
//!
//! Every stage of a bulletin cycle is a subcommand; `run` chains the
//! forecast, observation, table and cleanup stages in one process.

use crate::config::{BulletinConfig, Profile};
use crate::models::RunDate;
use crate::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the bulletin table generator
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bulletin",
    version,
    about = "Build operational weather bulletin tables from NWP forecasts and SYNOP observations",
    long_about = "Reconciles per-station model forecasts with decoded SYNOP observations into \
                  bulletin tables (one row per official station, '/' for missing values), and \
                  produces the 24h precipitation bulletin with its agricultural-year totals and \
                  the daily observation bulletin."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Built-in bulletin configuration
    #[arg(long, value_enum, default_value_t = Profile::Sonelgaz, global = true)]
    pub profile: Profile,

    /// JSON configuration file replacing the built-in profile
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Work directory holding template/, tmp/, outputs/ and bufr_data/
    #[arg(long, value_name = "DIR", global = true)]
    pub work_dir: Option<PathBuf>,

    /// Run date (defaults to today, local time)
    #[arg(long, value_name = "YYYY-MM-DD", global = true)]
    pub date: Option<String>,

    /// SYNOP report hour of the precipitation bulletin (06 or 18 UTC)
    #[arg(long, value_name = "HH", global = true, value_parser = clap::value_parser!(u32).range(0..24))]
    pub precip_hour: Option<u32>,

    /// Log file shared by every stage of the cycle (appended to)
    #[arg(long, value_name = "PATH", global = true)]
    pub shared_log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Build the forecast table from extracted model samples
    Forecast,
    /// Build the hourly and min/max observation tables
    Observations,
    /// Reconcile forecasts and observations into bulletin tables
    Tables,
    /// Build the 24h precipitation bulletin and update the cumulative totals
    Precip,
    /// Build the daily observation bulletin (wind, cloud cover, weather)
    Daily,
    /// Remove temporary decoder files
    Cleanup,
    /// Every stage of the selected profile, then cleanup
    Run,
}

impl Args {
    /// Configuration from `--config` or the selected profile, with the
    /// work directory and report hour overrides applied
    pub fn load_config(&self) -> Result<BulletinConfig> {
        let mut config = match &self.config {
            Some(path) => BulletinConfig::from_json_file(path)?,
            None => BulletinConfig::for_profile(self.profile),
        };

        if let Some(dir) = &self.work_dir {
            config = config.with_work_dir(dir.clone());
        }
        if let Some(hour) = self.precip_hour {
            config = config.with_precipitation_report_hour(hour);
        }
        Ok(config)
    }

    pub fn run_date(&self) -> Result<RunDate> {
        match &self.date {
            Some(value) => RunDate::parse(value),
            None => Ok(RunDate::today_local()),
        }
    }

    /// Determine the log level from the verbosity count
    pub fn get_log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
