//! External health platform
//!
//! The platform client is a collaborator: it answers "all samples of a metric
//! between two dates" and "daily sums of an energy quantity between two
//! dates". `StaticPlatform` serves both from a JSON fixture, for tests and the
//! CLI.
//!
//! Date ranges are inclusive and days are UTC calendar days.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, PlatformError};
use crate::types::{ExternalSample, HealthMetric};

/// Energy quantities the platform reports as daily sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyQuantity {
    DietaryEnergy,
    RestingEnergy,
    ActiveEnergy,
}

/// Read access to an external health platform
pub trait HealthPlatform {
    /// All samples of a metric recorded between `from` and `to`
    fn fetch_samples(
        &self,
        metric: HealthMetric,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExternalSample>, PlatformError>;

    /// Daily sums of an energy quantity between `from` and `to`, in kcal.
    ///
    /// Days without data are absent from the map.
    fn fetch_daily_sums(
        &self,
        quantity: EnergyQuantity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, PlatformError>;
}

/// Fixture-backed platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPlatform {
    #[serde(default)]
    samples: BTreeMap<HealthMetric, Vec<ExternalSample>>,
    #[serde(default)]
    daily_sums: BTreeMap<EnergyQuantity, BTreeMap<NaiveDate, f64>>,
    /// Simulate revoked read permission
    #[serde(default)]
    unauthorized: bool,
}

impl StaticPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_samples(mut self, metric: HealthMetric, samples: Vec<ExternalSample>) -> Self {
        self.samples.entry(metric).or_default().extend(samples);
        self
    }

    pub fn with_daily_sum(mut self, quantity: EnergyQuantity, date: NaiveDate, kcal: f64) -> Self {
        self.daily_sums.entry(quantity).or_default().insert(date, kcal);
        self
    }

    pub fn unauthorized() -> Self {
        Self {
            unauthorized: true,
            ..Self::default()
        }
    }

    fn check_access(&self) -> Result<(), PlatformError> {
        if self.unauthorized {
            Err(PlatformError::Unauthorized)
        } else {
            Ok(())
        }
    }
}

impl HealthPlatform for StaticPlatform {
    fn fetch_samples(
        &self,
        metric: HealthMetric,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ExternalSample>, PlatformError> {
        self.check_access()?;

        // Samples without a timestamp cannot be placed on a day; pass them
        // through so reconciliation sees the batch as the platform sent it.
        let samples = self
            .samples
            .get(&metric)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| {
                        s.timestamp.map_or(true, |ts| {
                            let date = ts.date_naive();
                            date >= from && date <= to
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(samples)
    }

    fn fetch_daily_sums(
        &self,
        quantity: EnergyQuantity,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>, PlatformError> {
        self.check_access()?;

        Ok(self
            .daily_sums
            .get(&quantity)
            .map(|sums| {
                sums.range(from..=to)
                    .map(|(date, kcal)| (*date, *kcal))
                    .collect()
            })
            .unwrap_or_default())
    }
}
