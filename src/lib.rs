//! Synheart Energy - On-device reconciliation engine for body metrics and
//! maintenance energy
//!
//! Energy keeps per-day body measurements consistent with an external health
//! platform and computes maintenance energy through a deterministic pipeline:
//! source synchronization → cross-metric derivation → historical resolution
//! → dietary energy reconciliation → maintenance calculation.
//!
//! ## Modules
//!
//! - **Measurements**: Reconcile weight, height, lean body mass and fat % with platform samples
//! - **Maintenance**: Adaptive (energy balance) and estimated (resting + active) maintenance

pub mod config;
pub mod derivation;
pub mod dietary;
pub mod equations;
pub mod error;
pub mod maintenance;
pub mod pipeline;
pub mod platform;
pub mod reducer;
pub mod repository;
pub mod resolver;
pub mod sync;
pub mod types;
pub mod units;

pub use config::{EngineConfig, Settings};
pub use error::{EngineError, PlatformError};
pub use pipeline::{sync_day_json, EnergyProcessor};
pub use platform::{EnergyQuantity, HealthPlatform, StaticPlatform};
pub use repository::{DayRepository, DayStore};
pub use types::{DayRecord, ExternalSample, HealthMetric, Maintenance, Measurement, MeasurementId};

/// Engine version recorded in CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for CLI output
pub const PRODUCER_NAME: &str = "synheart-energy";
