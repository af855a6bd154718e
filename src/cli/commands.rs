//! Command implementations for the bulletin CLI
//!
//! Sets up logging for the cycle, builds the processor and dispatches the
//! selected stage.

use crate::cli::args::{Args, Commands};
use crate::error::BulletinError;
use crate::models::{RunSummary, StageStats};
use crate::processor::{BulletinProcessor, print_summary};
use crate::Result;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, info};

/// Set up structured logging: compact output on stderr plus an appending,
/// uncoloured copy in `log_file`
pub fn setup_logging(log_level: &str, log_file: &Path) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bulletin_tables={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| BulletinError::configuration(format!("cannot initialise logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

fn single_stage(stats: StageStats, start: Instant) -> RunSummary {
    RunSummary {
        stages: vec![stats],
        processing_time_ms: start.elapsed().as_millis(),
    }
}

/// Main command runner
pub fn run(args: &Args) -> Result<RunSummary> {
    let start = Instant::now();
    let config = args.load_config()?;
    let run_date = args.run_date()?;

    let log_file = match &args.shared_log_file {
        Some(path) => path.clone(),
        None => config.default_log_path(&run_date),
    };
    setup_logging(args.get_log_level(), &log_file)?;
    info!(
        "{:?} stage, profile {}, run date {}, log {}",
        args.command,
        config.profile.name(),
        run_date.today(),
        log_file.display()
    );

    let processor = BulletinProcessor::new(config, run_date)?;
    let summary = match args.command {
        Commands::Forecast => single_stage(processor.run_forecast_stage()?, start),
        Commands::Observations => single_stage(processor.run_observation_stage()?, start),
        Commands::Tables => single_stage(processor.run_tables_stage()?, start),
        Commands::Precip => single_stage(processor.run_precipitation_stage()?, start),
        Commands::Daily => single_stage(processor.run_daily_stage()?, start),
        Commands::Cleanup => single_stage(processor.run_cleanup_stage()?, start),
        Commands::Run => processor.run_all()?,
    };

    print_summary(&summary);
    Ok(summary)
}
