//! Bulletin Tables Library
//!
//! Builds operational weather bulletin tables by reconciling per-station
//! NWP forecasts with decoded SYNOP observations.
//!
//! This library provides tools for:
//! - Loading the station catalogue, forecast samples and SYNOP exports
//! - Reducing forecast lead times with missing-aware min/max
//! - Building hourly and min/max observation tables
//! - Reconciling sources by station name (aliases, deduplication, merge)
//! - Writing bulletin tables with `/` for missing values
//! - The 24h precipitation bulletin and its agricultural-year ledger
//! - The daily observation bulletin (wind, cloud cover, weather codes)

pub mod cleanup;
pub mod config;
pub mod constants;
pub mod daily_report;
pub mod error;
pub mod forecast;
pub mod models;
pub mod observations;
pub mod precipitation;
pub mod processor;
pub mod reconcile;
pub mod sources;
pub mod writer;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{BulletinConfig, Profile};
pub use error::{BulletinError, Result};
pub use models::{Reading, RunDate, Station, StationTable};
pub use processor::BulletinProcessor;
