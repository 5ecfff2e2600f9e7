//! Cross-metric derivation
//!
//! Fat percentage and lean body mass are two views of the same body
//! composition given a weight. Each can be derived from the other:
//! - fat % = (weight - lean body mass) / weight * 100
//! - lean body mass = weight * (1 - fat % / 100)
//!
//! Derived entries are tagged with the metric they came from. Every call
//! regenerates the full derived set, never patches it, and derived entries are
//! never used as derivation sources, so the two directions cannot feed each
//! other.

use std::collections::HashSet;

use tracing::debug;
use uuid::Uuid;

use crate::repository::DayRepository;
use crate::resolver::HistoricalResolver;
use crate::types::{DayRecord, HealthDetails, HealthMetric, Measurement, MeasurementId};

/// Deriver for the lean body mass / fat percentage pair
pub struct CrossMetricDeriver;

impl CrossMetricDeriver {
    /// Regenerate derived fat percentage entries from lean body mass
    pub fn derive_fat_percentage_from_lean_body_mass<R>(
        day: &mut DayRecord,
        resolver: &HistoricalResolver,
        repository: &R,
    ) -> usize
    where
        R: DayRepository + ?Sized,
    {
        let weight = resolver.value_as_of(HealthMetric::Weight, day, repository);
        Self::derive(&mut day.health_details, HealthMetric::FatPercentage, weight)
    }

    /// Regenerate derived lean body mass entries from fat percentage
    pub fn derive_lean_body_mass_from_fat_percentage<R>(
        day: &mut DayRecord,
        resolver: &HistoricalResolver,
        repository: &R,
    ) -> usize
    where
        R: DayRepository + ?Sized,
    {
        let weight = resolver.value_as_of(HealthMetric::Weight, day, repository);
        Self::derive(&mut day.health_details, HealthMetric::LeanBodyMass, weight)
    }

    /// Regenerate the derived entries of `target` using the given weight.
    ///
    /// Returns the number of derived entries written. Targets without a
    /// derivation source are left untouched.
    pub fn derive(details: &mut HealthDetails, target: HealthMetric, weight_kg: Option<f64>) -> usize {
        let Some(source) = target.derivation_source() else {
            return 0;
        };

        let mut measurements: Vec<Measurement> = details
            .container(target)
            .measurements()
            .iter()
            .filter(|m| m.derived_from != Some(source))
            .cloned()
            .collect();

        let Some(weight) = weight_kg else {
            debug!(%target, "no weight available, skipping derivation");
            details.container_mut(target).set_measurements(measurements);
            return 0;
        };

        // Minutes at which the platform already supplies the target metric
        let external_minutes: HashSet<i64> = measurements
            .iter()
            .filter(|m| m.external_id().is_some())
            .map(Measurement::minute)
            .collect();

        let mut derived = 0usize;
        for entry in details.container(source).measurements() {
            if entry.is_derived() || external_minutes.contains(&entry.minute()) {
                continue;
            }

            let Some(value) = convert(source, entry.value, weight) else {
                debug!(%source, value = entry.value, weight, "skipping invalid derivation input");
                continue;
            };

            measurements.push(Measurement {
                id: derived_id(source, entry),
                timestamp: entry.timestamp,
                value,
                provenance: entry.provenance,
                derived_from: Some(source),
            });
            derived += 1;
        }

        details.container_mut(target).set_measurements(measurements);
        derived
    }
}

/// Convert a source value into the paired metric, weight-normalized
fn convert(source: HealthMetric, value: f64, weight: f64) -> Option<f64> {
    if weight <= 0.0 || !weight.is_finite() {
        return None;
    }

    let converted = match source {
        HealthMetric::LeanBodyMass => ((weight - value) / weight) * 100.0,
        HealthMetric::FatPercentage => weight * (1.0 - value / 100.0),
        HealthMetric::Height | HealthMetric::Weight => return None,
    };

    match source {
        HealthMetric::LeanBodyMass if (0.0..=100.0).contains(&converted) => Some(converted),
        HealthMetric::FatPercentage if (0.0..=100.0).contains(&value) => Some(converted),
        _ => None,
    }
}

/// Stable id for a derived entry, keyed on its source metric, timestamp and source id
fn derived_id(source: HealthMetric, entry: &Measurement) -> MeasurementId {
    let source_id = match &entry.id {
        MeasurementId::Local(uuid) => uuid.to_string(),
        MeasurementId::External(id) => id.clone(),
    };
    let key = format!(
        "{}:{}:{}",
        source.as_str(),
        entry.timestamp.timestamp_millis(),
        source_id
    );
    MeasurementId::Local(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()))
}
