//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Energy. Each operation
//! takes a snapshot of a day record from the repository, runs the stages in
//! order, and writes the snapshot back only once every stage has finished:
//!
//! 1. SourceSynchronizer - Merge external samples into the measurement store
//! 2. CrossMetricDeriver - Regenerate lean body mass / fat % derivations
//! 3. HistoricalResolver - Fill "as of" inputs from earlier days
//! 4. DietaryEnergyReconciler - Per-day dietary energy with average filling
//! 5. MaintenanceCalculator - Adaptive and estimated maintenance

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::derivation::CrossMetricDeriver;
use crate::equations::LeanBodyMassEquation;
use crate::error::EngineError;
use crate::maintenance::{adaptive_window, resolve_equation_inputs, MaintenanceCalculator, PlatformEnergy};
use crate::platform::{EnergyQuantity, HealthPlatform};
use crate::reducer::average;
use crate::repository::DayRepository;
use crate::resolver::{HistoricalResolver, ResolvedValue};
use crate::sync::{self, SourceSynchronizer};
use crate::types::{
    ActiveEnergySource, DayRecord, ExternalSample, HealthDetails, HealthMetric, Measurement,
    MeasurementId, PlatformWindow, Provenance, RestingEnergySource,
};

/// Reconcile one metric of a serialized day record against a serialized
/// sample batch (stateless, one-shot).
///
/// Derivations use the day's own weight only, since no history is available.
///
/// # Example
/// ```ignore
/// let day_json = sync_day_json(&day_json, HealthMetric::Weight, &samples_json)?;
/// ```
pub fn sync_day_json(
    day_json: &str,
    metric: HealthMetric,
    samples_json: &str,
) -> Result<String, EngineError> {
    let mut day: DayRecord = serde_json::from_str(day_json)?;
    let samples: Vec<ExternalSample> = serde_json::from_str(samples_json)?;

    let reconciled = SourceSynchronizer::reconcile(day.health_details.container(metric), &samples);
    *day.health_details.container_mut(metric) = reconciled;

    let weight = day.health_details.value(HealthMetric::Weight);
    regenerate_with_weight(&mut day.health_details, weight);

    Ok(serde_json::to_string(&day)?)
}

fn regenerate_with_weight(details: &mut HealthDetails, weight: Option<f64>) {
    CrossMetricDeriver::derive(details, HealthMetric::FatPercentage, weight);
    CrossMetricDeriver::derive(details, HealthMetric::LeanBodyMass, weight);
}

/// Stateful processor over a day repository.
///
/// Days are independent except through historical lookups, so recompute
/// history in chronological order when earlier days have changed.
pub struct EnergyProcessor<R> {
    repository: R,
    config: EngineConfig,
    resolver: HistoricalResolver,
    calculator: MaintenanceCalculator,
}

impl<R: DayRepository> EnergyProcessor<R> {
    pub fn new(repository: R, config: EngineConfig) -> Self {
        Self {
            resolver: HistoricalResolver::new(config.earliest_tracked_date),
            calculator: MaintenanceCalculator::new(config.adaptive_minimum_kcal),
            repository,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Direct access for edits outside the measurement stores, such as
    /// profile details or dietary energy points
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }

    pub fn into_repository(self) -> R {
        self.repository
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconcile one metric of a day against an already fetched batch
    pub fn sync_metric(
        &mut self,
        date: NaiveDate,
        metric: HealthMetric,
        samples: &[ExternalSample],
    ) -> DayRecord {
        let mut day = self.snapshot(date);

        let reconciled = SourceSynchronizer::reconcile(day.health_details.container(metric), samples);
        *day.health_details.container_mut(metric) = reconciled;
        self.regenerate_derivations(&mut day);

        self.repository.put(day.clone());
        day
    }

    /// Fetch and reconcile every metric of a day from the platform.
    ///
    /// A failed fetch leaves that metric as it was; it is never treated as an
    /// empty batch, which would remove every imported measurement.
    pub fn sync_from_platform(&mut self, date: NaiveDate, platform: &dyn HealthPlatform) -> DayRecord {
        let mut day = self.snapshot(date);

        for metric in HealthMetric::ALL {
            match platform.fetch_samples(metric, date, date) {
                Ok(samples) => {
                    let reconciled =
                        SourceSynchronizer::reconcile(day.health_details.container(metric), &samples);
                    *day.health_details.container_mut(metric) = reconciled;
                }
                Err(error) => {
                    warn!(%date, %metric, %error, "no platform data, keeping stored measurements");
                }
            }
        }
        self.regenerate_derivations(&mut day);

        self.repository.put(day.clone());
        day
    }

    /// Add a manual measurement entered in the user's preferred unit.
    ///
    /// Non-finite values are rejected and leave the day unchanged.
    pub fn add_measurement(
        &mut self,
        date: NaiveDate,
        metric: HealthMetric,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Option<MeasurementId> {
        let canonical = self.config.settings.to_canonical(metric, value);
        let mut day = self.snapshot(date);

        let id = sync::add_manual(day.health_details.container_mut(metric), timestamp, canonical)?;
        self.regenerate_derivations(&mut day);

        self.repository.put(day);
        Some(id)
    }

    /// Remove a measurement, tombstoning it if it was imported
    pub fn remove_measurement(
        &mut self,
        date: NaiveDate,
        metric: HealthMetric,
        id: &MeasurementId,
    ) -> Option<Measurement> {
        let mut day = self.repository.get(date)?;
        day.health_details.apply_settings(&self.config.settings);

        let removed = sync::remove(day.health_details.container_mut(metric), id)?;
        self.regenerate_derivations(&mut day);

        self.repository.put(day);
        Some(removed)
    }

    /// Add a lean body mass measurement predicted by an equation.
    ///
    /// Returns `None` when the equation's inputs cannot be resolved.
    pub fn add_lean_body_mass_from_equation(
        &mut self,
        date: NaiveDate,
        equation: LeanBodyMassEquation,
        timestamp: DateTime<Utc>,
    ) -> Option<MeasurementId> {
        let mut day = self.snapshot(date);

        let inputs = resolve_equation_inputs(&day, &self.resolver, &self.repository);
        let kg = equation.calculate(&inputs)?;

        let id = sync::add(
            &mut day.health_details.lean_body_mass,
            Measurement::local(timestamp, kg, Provenance::Equation),
        )?;
        self.regenerate_derivations(&mut day);

        self.repository.put(day);
        Some(id)
    }

    /// Latest earlier value of a metric, for fallback display
    pub fn resolve_latest(&self, metric: HealthMetric, date: NaiveDate) -> Option<ResolvedValue> {
        self.resolver.resolve_latest(metric, date, &self.repository)
    }

    /// Recompute a day's maintenance record and return the reported kcal
    pub fn recompute_maintenance(
        &mut self,
        date: NaiveDate,
        platform: Option<&dyn HealthPlatform>,
    ) -> Option<f64> {
        let mut day = self.snapshot(date);
        let current = day.health_details.maintenance.clone().unwrap_or_default();

        let mut energy = PlatformEnergy::default();
        if let Some(platform) = platform {
            if let Some((from, to)) = adaptive_window(&current.adaptive, date) {
                energy.dietary = daily_sums(platform, EnergyQuantity::DietaryEnergy, from, to);
            }
            let resting = &current.estimate.resting_energy;
            if resting.source == RestingEnergySource::Platform {
                energy.resting_kcal =
                    window_kcal(platform, EnergyQuantity::RestingEnergy, resting.platform_window, date);
            }
            let active = &current.estimate.active_energy;
            if active.source == ActiveEnergySource::Platform {
                energy.active_kcal =
                    window_kcal(platform, EnergyQuantity::ActiveEnergy, active.platform_window, date);
            }
        }

        let maintenance =
            self.calculator
                .calculate(&current, &day, &self.resolver, &self.repository, &energy);
        let kcal = maintenance.kcal;

        day.health_details.maintenance = Some(maintenance);
        self.repository.put(day);
        kcal
    }

    /// Recompute derivations and maintenance for every day in `from..=to`,
    /// oldest first
    pub fn recompute_range(
        &mut self,
        from: NaiveDate,
        to: NaiveDate,
        platform: Option<&dyn HealthPlatform>,
    ) -> Vec<(NaiveDate, Option<f64>)> {
        let mut results = Vec::new();

        for date in from.iter_days().take_while(|date| *date <= to) {
            let mut day = self.snapshot(date);
            self.regenerate_derivations(&mut day);
            self.repository.put(day);

            let kcal = self.recompute_maintenance(date, platform);
            results.push((date, kcal));
        }

        let computed = results.iter().filter(|(_, kcal)| kcal.is_some()).count();
        info!(%from, %to, days = results.len(), computed, "recomputed maintenance");
        results
    }

    /// The stored day, or a new one, with the configured daily value policies
    fn snapshot(&mut self, date: NaiveDate) -> DayRecord {
        let mut day = self.repository.get_or_create(date);
        day.health_details.apply_settings(&self.config.settings);
        day
    }

    fn regenerate_derivations(&self, day: &mut DayRecord) {
        let fat = CrossMetricDeriver::derive_fat_percentage_from_lean_body_mass(
            day,
            &self.resolver,
            &self.repository,
        );
        let lbm = CrossMetricDeriver::derive_lean_body_mass_from_fat_percentage(
            day,
            &self.resolver,
            &self.repository,
        );
        debug!(date = %day.date, fat, lbm, "regenerated derived entries");
    }
}

fn daily_sums(
    platform: &dyn HealthPlatform,
    quantity: EnergyQuantity,
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<NaiveDate, f64> {
    platform
        .fetch_daily_sums(quantity, from, to)
        .unwrap_or_else(|error| {
            warn!(?quantity, %error, "no platform energy data");
            BTreeMap::new()
        })
}

/// Average of the platform's daily sums over a window
fn window_kcal(
    platform: &dyn HealthPlatform,
    quantity: EnergyQuantity,
    window: PlatformWindow,
    date: NaiveDate,
) -> Option<f64> {
    let (from, to) = window.range(date)?;
    average(daily_sums(platform, quantity, from, to).into_values())
}
