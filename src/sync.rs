//! Source synchronization
//!
//! Reconciles a metric container against a freshly fetched batch of external
//! platform samples, and applies manual edits to the measurement store.
//!
//! Reconciliation steps:
//! 1. Drop malformed samples (missing id, timestamp or value)
//! 2. Dedupe the batch: same minute and same value to one decimal place
//! 3. Remove stored external records and tombstones no longer on the platform
//! 4. Import samples not yet stored and not tombstoned
//!
//! Reconciliation returns a new container, so an interrupted sync never leaves
//! a partially imported store behind.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{minute_of, ExternalSample, Measurement, MeasurementId, MetricContainer};

/// A sample that passed validation
#[derive(Debug, Clone, PartialEq)]
struct ValidSample<'a> {
    external_id: &'a str,
    timestamp: DateTime<Utc>,
    value: f64,
}

/// Synchronizer for external platform samples
pub struct SourceSynchronizer;

impl SourceSynchronizer {
    /// Reconcile a container against the platform's current samples for its day
    pub fn reconcile(container: &MetricContainer, samples: &[ExternalSample]) -> MetricContainer {
        let valid = valid_samples(samples);
        let deduped = dedupe(&valid);

        let live_ids: HashSet<&str> = deduped.iter().map(|s| s.external_id).collect();
        let batch_ids: HashSet<&str> = samples.iter().map(|s| s.external_id.as_str()).collect();

        // Stale removal
        let mut measurements: Vec<Measurement> = container
            .measurements()
            .iter()
            .filter(|m| m.external_id().map_or(true, |id| live_ids.contains(id)))
            .cloned()
            .collect();

        let tombstones: Vec<String> = container
            .tombstoned_external_ids()
            .iter()
            .filter(|id| batch_ids.contains(id.as_str()))
            .cloned()
            .collect();

        let removed = container.measurements().len() - measurements.len();
        if removed > 0 {
            debug!(removed, "removed stale external measurements");
        }

        // Import
        let stored: HashSet<String> = measurements
            .iter()
            .filter_map(|m| m.external_id().map(str::to_string))
            .collect();

        let mut imported = 0usize;
        for sample in deduped {
            if stored.contains(sample.external_id)
                || tombstones.iter().any(|id| id == sample.external_id)
            {
                continue;
            }
            measurements.push(Measurement::external(
                sample.external_id,
                sample.timestamp,
                sample.value,
            ));
            imported += 1;
        }

        if imported > 0 {
            debug!(imported, "imported external measurements");
        }

        let mut reconciled = container.clone();
        reconciled.set_tombstoned_external_ids(tombstones);
        reconciled.set_measurements(measurements);
        reconciled
    }
}

/// Filter out samples missing an id, a timestamp or a finite value
fn valid_samples(samples: &[ExternalSample]) -> Vec<ValidSample<'_>> {
    let mut skipped = 0usize;
    let valid: Vec<ValidSample<'_>> = samples
        .iter()
        .filter_map(|sample| match (sample.timestamp, sample.value) {
            (Some(timestamp), Some(value))
                if !sample.external_id.is_empty() && value.is_finite() =>
            {
                Some(ValidSample {
                    external_id: sample.external_id.as_str(),
                    timestamp,
                    value,
                })
            }
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, "skipped malformed external samples");
    }
    valid
}

/// Value bucket at one decimal place.
///
/// Values are truncated to the tenth so readings that differ only in the
/// second decimal (70.04 and 70.06) land in the same bucket.
fn tenths(value: f64) -> i64 {
    (value * 10.0 + 1e-9).floor() as i64
}

/// Collapse duplicates, keeping the lexicographically smallest external id
fn dedupe<'a>(samples: &[ValidSample<'a>]) -> Vec<ValidSample<'a>> {
    let mut buckets: BTreeMap<(i64, i64), ValidSample<'a>> = BTreeMap::new();

    for sample in samples {
        let key = (minute_of(sample.timestamp), tenths(sample.value));
        let keep_existing = buckets
            .get(&key)
            .is_some_and(|kept| kept.external_id <= sample.external_id);

        if keep_existing {
            debug!(dropped = sample.external_id, "dropped duplicate external sample");
            continue;
        }
        buckets.insert(key, sample.clone());
    }

    buckets.into_values().collect()
}

/// Add a manually entered measurement, returning its id.
///
/// Non-finite values are skipped and `None` is returned.
pub fn add_manual(
    container: &mut MetricContainer,
    timestamp: DateTime<Utc>,
    value: f64,
) -> Option<MeasurementId> {
    add(container, Measurement::manual(timestamp, value))
}

/// Add a locally created measurement of any provenance, returning its id
pub fn add(container: &mut MetricContainer, measurement: Measurement) -> Option<MeasurementId> {
    if !measurement.value.is_finite() {
        debug!(value = measurement.value, "skipped non-finite measurement");
        return None;
    }

    let id = measurement.id.clone();
    let mut measurements = container.measurements().to_vec();
    measurements.push(measurement);
    container.set_measurements(measurements);
    Some(id)
}

/// Remove a measurement.
///
/// Removing an external measurement tombstones its id so the next sync does
/// not bring it back.
pub fn remove(container: &mut MetricContainer, id: &MeasurementId) -> Option<Measurement> {
    let mut measurements = container.measurements().to_vec();
    let index = measurements.iter().position(|m| &m.id == id)?;
    let removed = measurements.remove(index);

    if let Some(external_id) = removed.external_id() {
        let mut tombstones = container.tombstoned_external_ids().to_vec();
        if !tombstones.iter().any(|t| t == external_id) {
            tombstones.push(external_id.to_string());
        }
        container.set_tombstoned_external_ids(tombstones);
    }

    container.set_measurements(measurements);
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailyValueType, Provenance};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, second).unwrap()
    }

    fn make_container() -> MetricContainer {
        MetricContainer::new(DailyValueType::Average)
    }

    #[test]
    fn test_imports_new_samples() {
        let samples = vec![
            ExternalSample::new("b", at(18, 0, 0), 72.0),
            ExternalSample::new("a", at(8, 0, 0), 70.0),
        ];

        let reconciled = SourceSynchronizer::reconcile(&make_container(), &samples);

        assert_eq!(reconciled.measurements().len(), 2);
        assert_eq!(reconciled.measurements()[0].external_id(), Some("a"));
        assert_eq!(reconciled.measurements()[0].provenance, Provenance::External);
        assert!((reconciled.value().unwrap() - 71.0).abs() < 0.001);
    }

    #[test]
    fn test_dedupes_same_minute_same_tenth() {
        let samples = vec![
            ExternalSample::new("zz-2", at(7, 30, 12), 70.06),
            ExternalSample::new("aa-1", at(7, 30, 48), 70.04),
        ];

        let reconciled = SourceSynchronizer::reconcile(&make_container(), &samples);

        assert_eq!(reconciled.measurements().len(), 1);
        assert_eq!(reconciled.measurements()[0].external_id(), Some("aa-1"));
        assert_eq!(reconciled.measurements()[0].value, 70.04);
    }

    #[test]
    fn test_distinct_minutes_are_not_duplicates() {
        let samples = vec![
            ExternalSample::new("a", at(7, 30, 0), 70.0),
            ExternalSample::new("b", at(7, 31, 0), 70.0),
            ExternalSample::new("c", at(7, 30, 0), 70.3),
        ];

        let reconciled = SourceSynchronizer::reconcile(&make_container(), &samples);
        assert_eq!(reconciled.measurements().len(), 3);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut container = make_container();
        add_manual(&mut container, at(6, 0, 0), 69.5);

        let samples = vec![
            ExternalSample::new("x-2", at(7, 30, 5), 70.06),
            ExternalSample::new("x-1", at(7, 30, 40), 70.04),
            ExternalSample::new("x-3", at(20, 0, 0), 71.2),
        ];

        let once = SourceSynchronizer::reconcile(&container, &samples);
        let twice = SourceSynchronizer::reconcile(&once, &samples);

        assert_eq!(twice, once);
        assert_eq!(once.measurements().len(), 3);
    }

    #[test]
    fn test_removes_stale_externals_and_keeps_manual() {
        let mut container = make_container();
        add_manual(&mut container, at(6, 0, 0), 69.5);
        let container = SourceSynchronizer::reconcile(
            &container,
            &[
                ExternalSample::new("gone", at(7, 0, 0), 70.0),
                ExternalSample::new("kept", at(8, 0, 0), 70.2),
            ],
        );

        let reconciled = SourceSynchronizer::reconcile(
            &container,
            &[ExternalSample::new("kept", at(8, 0, 0), 70.2)],
        );

        let ids: Vec<Option<&str>> = reconciled
            .measurements()
            .iter()
            .map(|m| m.external_id())
            .collect();
        assert_eq!(ids, vec![None, Some("kept")]);
    }

    #[test]
    fn test_tombstoned_samples_are_not_reimported() {
        let samples = vec![ExternalSample::new("deleted", at(7, 0, 0), 70.0)];
        let mut container = SourceSynchronizer::reconcile(&make_container(), &samples);

        let id = container.measurements()[0].id.clone();
        remove(&mut container, &id).unwrap();
        assert_eq!(container.tombstoned_external_ids(), ["deleted".to_string()]);
        assert_eq!(container.value(), None);

        let reconciled = SourceSynchronizer::reconcile(&container, &samples);
        assert!(reconciled.is_empty());
        assert_eq!(reconciled.tombstoned_external_ids().len(), 1);

        // Once the platform drops the sample the tombstone is no longer needed
        let reconciled = SourceSynchronizer::reconcile(&reconciled, &[]);
        assert!(reconciled.tombstoned_external_ids().is_empty());
    }

    #[test]
    fn test_malformed_samples_are_skipped() {
        let samples = vec![
            ExternalSample {
                external_id: "no-value".to_string(),
                timestamp: Some(at(7, 0, 0)),
                value: None,
            },
            ExternalSample {
                external_id: "no-time".to_string(),
                timestamp: None,
                value: Some(70.0),
            },
            ExternalSample::new("", at(7, 5, 0), 70.0),
            ExternalSample::new("ok", at(8, 0, 0), 70.5),
        ];

        let reconciled = SourceSynchronizer::reconcile(&make_container(), &samples);

        assert_eq!(reconciled.measurements().len(), 1);
        assert_eq!(reconciled.value(), Some(70.5));
    }

    #[test]
    fn test_remove_manual_does_not_tombstone() {
        let mut container = make_container();
        let id = add_manual(&mut container, at(9, 0, 0), 80.0).unwrap();

        let removed = remove(&mut container, &id).unwrap();
        assert_eq!(removed.value, 80.0);
        assert!(container.tombstoned_external_ids().is_empty());
        assert!(remove(&mut container, &id).is_none());
    }

    #[test]
    fn test_non_finite_manual_values_are_skipped() {
        let mut container = make_container();
        add_manual(&mut container, at(7, 0, 0), 80.0).unwrap();

        assert!(add_manual(&mut container, at(8, 0, 0), f64::NAN).is_none());
        assert!(add_manual(&mut container, at(9, 0, 0), f64::INFINITY).is_none());

        assert_eq!(container.measurements().len(), 1);
        assert_eq!(container.value(), Some(80.0));
    }
}
