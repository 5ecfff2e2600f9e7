//! Maintenance energy calculation
//!
//! Two independent estimates of the energy at which body weight holds steady:
//! - Adaptive: energy balance over an interval. Dietary intake minus the
//!   energy equivalent of the weight change, per day.
//! - Estimated: resting energy plus active energy, from the platform,
//!   predictive equations, activity multipliers or manual entry.
//!
//! The reported value prefers the configured type. An adaptive maintenance
//! that cannot be computed falls back to the estimate when allowed.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use crate::dietary::DietaryEnergyReconciler;
use crate::equations::EquationInputs;
use crate::reducer::average;
use crate::repository::DayRepository;
use crate::resolver::HistoricalResolver;
use crate::types::{
    ActiveEnergy, ActiveEnergySource, AdaptiveMaintenance, DayRecord, HealthMetric, Maintenance,
    MaintenanceEstimate, MaintenanceType, RestingEnergy, RestingEnergySource, WeightChange,
    WeightChangePoint, WeightChangePoints, WeightChangeType,
};
use crate::units::energy_equivalent_kcal;

/// Platform energy already fetched for one maintenance calculation
#[derive(Debug, Clone, Default)]
pub struct PlatformEnergy {
    /// Dietary energy daily sums covering the adaptive window
    pub dietary: BTreeMap<NaiveDate, f64>,
    /// Resting energy over the resting energy's platform window
    pub resting_kcal: Option<f64>,
    /// Active energy over the active energy's platform window
    pub active_kcal: Option<f64>,
}

/// Inclusive range of the adaptive window for `date`: the interval's days
/// ending the day before
pub fn adaptive_window(maintenance: &AdaptiveMaintenance, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let start = maintenance.interval.start_date(date)?;
    let end = date.pred_opt()?;
    (start <= end).then_some((start, end))
}

/// Calculator for maintenance energy
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceCalculator {
    adaptive_minimum_kcal: f64,
}

impl MaintenanceCalculator {
    pub fn new(adaptive_minimum_kcal: f64) -> Self {
        Self {
            adaptive_minimum_kcal,
        }
    }

    /// Adaptive maintenance from energy balance.
    ///
    /// Results below the configured minimum are rejected; they almost always
    /// come from a bad weight entry.
    pub fn adaptive_kcal(
        &self,
        interval_days: i64,
        weight_delta_kcal: Option<f64>,
        kcal_per_day: Option<f64>,
    ) -> Option<f64> {
        if interval_days <= 0 {
            return None;
        }
        let days = interval_days as f64;
        let total_dietary_kcal = kcal_per_day? * days;
        let kcal = (total_dietary_kcal - weight_delta_kcal?) / days;

        if !kcal.is_finite() || kcal < self.adaptive_minimum_kcal {
            warn!(
                kcal,
                minimum = self.adaptive_minimum_kcal,
                "rejecting implausible adaptive maintenance"
            );
            return None;
        }
        Some(kcal)
    }

    /// Estimated maintenance: resting plus active energy
    pub fn estimate_kcal(resting_kcal: Option<f64>, active_kcal: Option<f64>) -> Option<f64> {
        Some(resting_kcal? + active_kcal?)
    }

    /// Reported maintenance under the composition rule
    pub fn compose(
        maintenance_type: MaintenanceType,
        adaptive_kcal: Option<f64>,
        estimate_kcal: Option<f64>,
        use_estimate_as_fallback: bool,
    ) -> Option<f64> {
        match maintenance_type {
            MaintenanceType::Adaptive => {
                adaptive_kcal.or_else(|| estimate_kcal.filter(|_| use_estimate_as_fallback))
            }
            MaintenanceType::Estimated => estimate_kcal,
        }
    }

    /// Recompute a day's full maintenance record, keeping the user's choices
    /// (types, sources, equation, interval) from `current`
    pub fn calculate<R>(
        &self,
        current: &Maintenance,
        day: &DayRecord,
        resolver: &HistoricalResolver,
        repository: &R,
        platform: &PlatformEnergy,
    ) -> Maintenance
    where
        R: DayRepository + ?Sized,
    {
        let adaptive = self.calculate_adaptive(&current.adaptive, day.date, repository, &platform.dietary);
        let estimate = Self::calculate_estimate(&current.estimate, day, resolver, repository, platform);
        let kcal = Self::compose(
            current.maintenance_type,
            adaptive.kcal,
            estimate.kcal,
            current.use_estimate_as_fallback,
        );

        debug!(
            date = %day.date,
            adaptive = ?adaptive.kcal,
            estimate = ?estimate.kcal,
            reported = ?kcal,
            "calculated maintenance"
        );

        Maintenance {
            maintenance_type: current.maintenance_type,
            kcal,
            adaptive,
            estimate,
            use_estimate_as_fallback: current.use_estimate_as_fallback,
        }
    }

    /// Recompute the adaptive sub-record for `date`
    pub fn calculate_adaptive<R>(
        &self,
        current: &AdaptiveMaintenance,
        date: NaiveDate,
        repository: &R,
        dietary_sums: &BTreeMap<NaiveDate, f64>,
    ) -> AdaptiveMaintenance
    where
        R: DayRepository + ?Sized,
    {
        let Some((start, end)) = adaptive_window(current, date) else {
            return AdaptiveMaintenance {
                kcal: None,
                interval: current.interval,
                dietary_energy: Default::default(),
                weight_change: current.weight_change.clone(),
            };
        };
        let interval_days = (end - start).num_days() + 1;

        let dietary_energy = DietaryEnergyReconciler::build_window(start, end, repository, dietary_sums);
        let weight_change = calculate_weight_change(&current.weight_change, start, end, repository);
        let weight_delta_kcal = weight_change.kg.map(energy_equivalent_kcal);

        let kcal = self.adaptive_kcal(interval_days, weight_delta_kcal, dietary_energy.kcal_per_day);

        AdaptiveMaintenance {
            kcal,
            interval: current.interval,
            dietary_energy,
            weight_change,
        }
    }

    /// Recompute the estimate sub-record for a day
    pub fn calculate_estimate<R>(
        current: &MaintenanceEstimate,
        day: &DayRecord,
        resolver: &HistoricalResolver,
        repository: &R,
        platform: &PlatformEnergy,
    ) -> MaintenanceEstimate
    where
        R: DayRepository + ?Sized,
    {
        let resting_energy = calculate_resting_energy(
            &current.resting_energy,
            day,
            resolver,
            repository,
            platform.resting_kcal,
        );
        let active_energy = calculate_active_energy(
            &current.active_energy,
            resting_energy.kcal,
            platform.active_kcal,
        );

        MaintenanceEstimate {
            kcal: Self::estimate_kcal(resting_energy.kcal, active_energy.kcal),
            resting_energy,
            active_energy,
        }
    }
}

/// Weight change between the first and last day of the window
pub fn calculate_weight_change<R>(
    current: &WeightChange,
    start: NaiveDate,
    end: NaiveDate,
    repository: &R,
) -> WeightChange
where
    R: DayRepository + ?Sized,
{
    match current.change_type {
        WeightChangeType::Manual => WeightChange {
            points: None,
            ..current.clone()
        },
        WeightChangeType::Weights => {
            let point = |date: NaiveDate| WeightChangePoint {
                date,
                kg: point_weight(date, current.moving_average_days, repository),
            };
            let points = WeightChangePoints {
                start: point(start),
                end: point(end),
            };
            let kg = match (points.start.kg, points.end.kg) {
                (Some(start_kg), Some(end_kg)) => Some(end_kg - start_kg),
                _ => None,
            };

            WeightChange {
                kg,
                change_type: WeightChangeType::Weights,
                points: Some(points),
                moving_average_days: current.moving_average_days,
            }
        }
    }
}

/// Weight for one end of the window, optionally a trailing moving average
fn point_weight<R>(date: NaiveDate, moving_average_days: Option<u32>, repository: &R) -> Option<f64>
where
    R: DayRepository + ?Sized,
{
    let day_weight = |d: NaiveDate| {
        repository
            .get(d)
            .and_then(|day| day.health_details.value(HealthMetric::Weight))
    };

    match moving_average_days {
        Some(days) if days > 1 => {
            let first = date.checked_sub_days(Days::new(u64::from(days - 1)))?;
            average(
                first
                    .iter_days()
                    .take_while(|d| *d <= date)
                    .filter_map(day_weight),
            )
        }
        _ => day_weight(date),
    }
}

/// Resolve the equation variables as of a day
pub fn resolve_equation_inputs<R>(
    day: &DayRecord,
    resolver: &HistoricalResolver,
    repository: &R,
) -> EquationInputs
where
    R: DayRepository + ?Sized,
{
    EquationInputs {
        sex: resolver.detail_as_of(day, repository, |details| details.sex),
        age_years: resolver
            .detail_as_of(day, repository, |details| details.age.clone())
            .and_then(|age| age.years_as_of(day.date)),
        weight_kg: resolver.value_as_of(HealthMetric::Weight, day, repository),
        height_cm: resolver.value_as_of(HealthMetric::Height, day, repository),
        lean_body_mass_kg: resolver.value_as_of(HealthMetric::LeanBodyMass, day, repository),
    }
}

fn calculate_resting_energy<R>(
    current: &RestingEnergy,
    day: &DayRecord,
    resolver: &HistoricalResolver,
    repository: &R,
    platform_kcal: Option<f64>,
) -> RestingEnergy
where
    R: DayRepository + ?Sized,
{
    let kcal = match current.source {
        RestingEnergySource::Platform => platform_kcal,
        RestingEnergySource::Manual => current.kcal,
        RestingEnergySource::Equation => current.equation.and_then(|equation| {
            let mut inputs = resolve_equation_inputs(day, resolver, repository);
            if current.prefer_lean_body_mass && equation.uses_weight() {
                if let Some(lbm) = inputs.lean_body_mass_kg {
                    inputs.weight_kg = Some(lbm);
                }
            }
            equation.calculate(&inputs)
        }),
    };

    RestingEnergy {
        kcal,
        ..current.clone()
    }
}

fn calculate_active_energy(
    current: &ActiveEnergy,
    resting_kcal: Option<f64>,
    platform_kcal: Option<f64>,
) -> ActiveEnergy {
    let kcal = match current.source {
        ActiveEnergySource::Platform => platform_kcal,
        ActiveEnergySource::Manual => current.kcal,
        ActiveEnergySource::ActivityLevel => current
            .activity_level
            .zip(resting_kcal)
            .map(|(level, resting)| level.active_energy(resting)),
    };

    ActiveEnergy {
        kcal,
        ..current.clone()
    }
}
