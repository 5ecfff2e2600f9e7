//! Energy CLI - Command-line interface for Synheart Energy
//!
//! Commands:
//! - sync: Reconcile one metric of a day against a sample batch
//! - recompute: Recompute derivations and maintenance over a date range
//! - resolve: Look up the latest earlier value of a metric
//!
//! Day records live in a JSON array file that is rewritten after each
//! mutating command.

use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use synheart_energy::platform::HealthPlatform;
use synheart_energy::types::{DayRecord, ExternalSample, HealthMetric};
use synheart_energy::units::EnergyUnit;
use synheart_energy::{
    DayStore, EnergyProcessor, EngineConfig, EngineError, Settings, StaticPlatform,
    ENGINE_VERSION, PRODUCER_NAME,
};

/// Energy - On-device reconciliation engine for body metrics and maintenance energy
#[derive(Parser)]
#[command(name = "energy")]
#[command(author = "Synheart AI Inc")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Reconcile body metrics and compute maintenance energy", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one metric of a day against a sample batch
    Sync {
        /// Day store file (created if missing)
        #[arg(long)]
        store: PathBuf,

        /// Day to reconcile (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Metric (weight, height, lean_body_mass, fat_percentage)
        #[arg(long)]
        metric: String,

        /// Sample batch file, a JSON array (use - for stdin)
        #[arg(long)]
        samples: PathBuf,
    },

    /// Recompute derivations and maintenance over a date range
    Recompute {
        /// Day store file
        #[arg(long)]
        store: PathBuf,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Platform fixture providing daily energy sums
        #[arg(long)]
        platform: Option<PathBuf>,
    },

    /// Look up the latest value of a metric recorded before a date
    Resolve {
        /// Day store file
        #[arg(long)]
        store: PathBuf,

        /// Metric (weight, height, lean_body_mass, fat_percentage)
        #[arg(long)]
        metric: String,

        /// Day to resolve as of (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("synheart_energy={default_level},energy={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), EnergyCliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync {
            store,
            date,
            metric,
            samples,
        } => cmd_sync(config, &store, date, &metric, &samples),

        Commands::Recompute {
            store,
            from,
            to,
            platform,
        } => cmd_recompute(config, &store, from, to, platform.as_deref()),

        Commands::Resolve { store, metric, date } => cmd_resolve(config, &store, &metric, date),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, EnergyCliError> {
    match path {
        Some(path) => {
            let config = EngineConfig::from_json(&fs::read_to_string(path)?)?;
            debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_store(path: &Path, config: &EngineConfig, create: bool) -> Result<DayStore, EnergyCliError> {
    if create && !path.exists() {
        info!(path = %path.display(), "creating new day store");
        return Ok(DayStore::new(config.settings.clone()));
    }
    Ok(DayStore::from_json(&fs::read_to_string(path)?, config.settings.clone())?)
}

fn read_input(path: &Path) -> Result<String, EnergyCliError> {
    if path.to_string_lossy() == "-" {
        Ok(io::read_to_string(io::stdin())?)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn cmd_sync(
    config: EngineConfig,
    store_path: &Path,
    date: NaiveDate,
    metric: &str,
    samples_path: &Path,
) -> Result<(), EnergyCliError> {
    let metric: HealthMetric = metric.parse()?;
    let samples: Vec<ExternalSample> = serde_json::from_str(&read_input(samples_path)?)?;

    let settings = config.settings.clone();
    let store = load_store(store_path, &config, true)?;
    let mut processor = EnergyProcessor::new(store, config);
    let day = processor.sync_metric(date, metric, &samples);

    fs::write(store_path, processor.repository().to_json()?)?;
    info!(%date, %metric, samples = samples.len(), "synced");

    print_output(&SyncReport::new(metric, &day, &settings))
}

fn cmd_recompute(
    config: EngineConfig,
    store_path: &Path,
    from: NaiveDate,
    to: NaiveDate,
    platform_path: Option<&Path>,
) -> Result<(), EnergyCliError> {
    if from > to {
        return Err(EnergyCliError::InvalidRange { from, to });
    }

    let platform = platform_path
        .map(|path| -> Result<StaticPlatform, EnergyCliError> {
            Ok(StaticPlatform::from_json(&fs::read_to_string(path)?)?)
        })
        .transpose()?;

    let energy_unit = config.settings.energy_unit;
    let store = load_store(store_path, &config, false)?;
    let mut processor = EnergyProcessor::new(store, config);
    let results = processor.recompute_range(
        from,
        to,
        platform.as_ref().map(|p| p as &dyn HealthPlatform),
    );

    fs::write(store_path, processor.repository().to_json()?)?;

    let report = RecomputeReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        energy_unit,
        days: results
            .into_iter()
            .map(|(date, kcal)| RecomputedDay {
                date,
                maintenance: kcal.map(|kcal| energy_unit.from_kcal(kcal)),
            })
            .collect(),
    };
    print_output(&report)
}

fn cmd_resolve(
    config: EngineConfig,
    store_path: &Path,
    metric: &str,
    date: NaiveDate,
) -> Result<(), EnergyCliError> {
    let metric: HealthMetric = metric.parse()?;
    let store = load_store(store_path, &config, false)?;
    let processor = EnergyProcessor::new(store, config);

    let resolved = processor
        .resolve_latest(metric, date)
        .ok_or(EnergyCliError::NotFound { metric, date })?;

    print_output(&ResolveReport {
        metric,
        as_of: date,
        date: resolved.date,
        value: resolved.value,
    })
}

fn print_output<T: Serialize>(value: &T) -> Result<(), EnergyCliError> {
    let output = if atty::is(atty::Stream::Stdout) {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

// Error handling

#[derive(Debug)]
enum EnergyCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    InvalidRange { from: NaiveDate, to: NaiveDate },
    NotFound { metric: HealthMetric, date: NaiveDate },
}

impl From<io::Error> for EnergyCliError {
    fn from(e: io::Error) -> Self {
        EnergyCliError::Io(e)
    }
}

impl From<EngineError> for EnergyCliError {
    fn from(e: EngineError) -> Self {
        EnergyCliError::Engine(e)
    }
}

impl From<serde_json::Error> for EnergyCliError {
    fn from(e: serde_json::Error) -> Self {
        EnergyCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EnergyCliError> for CliError {
    fn from(e: EnergyCliError) -> Self {
        match e {
            EnergyCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EnergyCliError::Engine(EngineError::UnknownMetric(name)) => CliError {
                code: "UNKNOWN_METRIC".to_string(),
                message: format!("Unknown metric: {}", name),
                hint: Some("Use weight, height, lean_body_mass or fat_percentage".to_string()),
            },
            EnergyCliError::Engine(EngineError::InvalidConfig(msg)) => CliError {
                code: "INVALID_CONFIG".to_string(),
                message: msg,
                hint: Some("Check the --config file".to_string()),
            },
            EnergyCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EnergyCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            EnergyCliError::InvalidRange { from, to } => CliError {
                code: "INVALID_RANGE".to_string(),
                message: format!("{} is after {}", from, to),
                hint: Some("Pass --from on or before --to".to_string()),
            },
            EnergyCliError::NotFound { metric, date } => CliError {
                code: "NOT_FOUND".to_string(),
                message: format!("No {} recorded before {}", metric, date),
                hint: None,
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct SyncReport {
    date: NaiveDate,
    metric: HealthMetric,
    measurements: usize,
    tombstoned: usize,
    /// Daily value in the user's preferred unit
    value: Option<f64>,
}

impl SyncReport {
    fn new(metric: HealthMetric, day: &DayRecord, settings: &Settings) -> Self {
        let container = day.health_details.container(metric);
        Self {
            date: day.date,
            metric,
            measurements: container.measurements().len(),
            tombstoned: container.tombstoned_external_ids().len(),
            value: container.value().map(|v| settings.from_canonical(metric, v)),
        }
    }
}

#[derive(Serialize)]
struct RecomputeReport {
    producer: String,
    version: String,
    energy_unit: EnergyUnit,
    days: Vec<RecomputedDay>,
}

#[derive(Serialize)]
struct RecomputedDay {
    date: NaiveDate,
    maintenance: Option<f64>,
}

#[derive(Serialize)]
struct ResolveReport {
    metric: HealthMetric,
    as_of: NaiveDate,
    date: NaiveDate,
    value: f64,
}
