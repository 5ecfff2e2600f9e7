//! Dietary energy reconciliation
//!
//! Builds one dietary energy point per day from its source, then fills the
//! days that are not counted with the average of the days that are.
//!
//! | source            | kcal                                   |
//! |-------------------|----------------------------------------|
//! | log               | the day's logged energy total          |
//! | external platform | the platform's daily sum for that date |
//! | fasted            | 0                                      |
//! | manual            | the entered value                      |
//! | not counted       | window average, after the fill pass    |

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::reducer::average;
use crate::repository::DayRepository;
use crate::types::{DayRecord, DietaryEnergy, DietaryEnergyPoint, DietaryEnergySource};

/// Reconciler for per-day dietary energy
pub struct DietaryEnergyReconciler;

impl DietaryEnergyReconciler {
    /// Point used for a day that has none stored
    pub fn default_point(date: NaiveDate, day: Option<&DayRecord>) -> DietaryEnergyPoint {
        let source = match day.and_then(|d| d.logged_energy_kcal) {
            Some(_) => DietaryEnergySource::Log,
            None => DietaryEnergySource::NotCounted,
        };
        DietaryEnergyPoint {
            date,
            kcal: None,
            source,
        }
    }

    /// Assign a point's kcal from its source
    pub fn reconcile_day(
        point: &DietaryEnergyPoint,
        day: Option<&DayRecord>,
        platform_kcal: Option<f64>,
    ) -> DietaryEnergyPoint {
        let kcal = match point.source {
            DietaryEnergySource::Log => day.and_then(|d| d.logged_energy_kcal),
            DietaryEnergySource::ExternalPlatform => platform_kcal,
            DietaryEnergySource::Fasted => Some(0.0),
            DietaryEnergySource::Manual => point.kcal,
            DietaryEnergySource::NotCounted => None,
        };

        DietaryEnergyPoint {
            date: point.date,
            kcal,
            source: point.source,
        }
    }

    /// Fill not-counted points with the average of the counted ones.
    ///
    /// The average is taken only over points whose source is not
    /// `NotCounted`, so filled values never feed back into the base and
    /// repeated fills are stable. Points of other sources are never
    /// overwritten, even when their kcal is missing.
    pub fn fill_averages(points: Vec<DietaryEnergyPoint>) -> Vec<DietaryEnergyPoint> {
        let counted = average(
            points
                .iter()
                .filter(|p| p.source != DietaryEnergySource::NotCounted)
                .filter_map(|p| p.kcal),
        );

        let Some(avg) = counted else {
            debug!("no counted dietary energy days, leaving uncounted days empty");
            return points
                .into_iter()
                .map(|p| match p.source {
                    DietaryEnergySource::NotCounted => DietaryEnergyPoint { kcal: None, ..p },
                    _ => p,
                })
                .collect();
        };

        points
            .into_iter()
            .map(|p| match p.source {
                DietaryEnergySource::NotCounted => DietaryEnergyPoint {
                    kcal: Some(avg),
                    ..p
                },
                _ => p,
            })
            .collect()
    }

    /// Per-day mean and total over the points with a value
    pub fn totals(points: Vec<DietaryEnergyPoint>) -> DietaryEnergy {
        let values: Vec<f64> = points.iter().filter_map(|p| p.kcal).collect();
        let total_kcal = (!values.is_empty()).then(|| values.iter().sum());

        DietaryEnergy {
            kcal_per_day: average(values),
            total_kcal,
            points,
        }
    }

    /// Build the reconciled, filled dietary energy for the days `start..=end`
    pub fn build_window<R>(
        start: NaiveDate,
        end: NaiveDate,
        repository: &R,
        platform_sums: &BTreeMap<NaiveDate, f64>,
    ) -> DietaryEnergy
    where
        R: DayRepository + ?Sized,
    {
        let points: Vec<DietaryEnergyPoint> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let day = repository.get(date);
                let point = day
                    .as_ref()
                    .and_then(|d| d.dietary_energy_point.clone())
                    .unwrap_or_else(|| Self::default_point(date, day.as_ref()));
                Self::reconcile_day(&point, day.as_ref(), platform_sums.get(&date).copied())
            })
            .collect();

        Self::totals(Self::fill_averages(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::repository::DayStore;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn point(d: u32, kcal: Option<f64>, source: DietaryEnergySource) -> DietaryEnergyPoint {
        DietaryEnergyPoint {
            date: date(d),
            kcal,
            source,
        }
    }

    #[test]
    fn test_fill_average() {
        let points = vec![
            point(1, Some(2000.0), DietaryEnergySource::Log),
            point(2, None, DietaryEnergySource::NotCounted),
            point(3, Some(1800.0), DietaryEnergySource::Manual),
        ];

        let filled = DietaryEnergyReconciler::fill_averages(points);
        assert_eq!(filled[1].kcal, Some(1900.0));

        let energy = DietaryEnergyReconciler::totals(filled);
        assert!((energy.kcal_per_day.unwrap() - 1900.0).abs() < 0.001);
        assert!((energy.total_kcal.unwrap() - 5700.0).abs() < 0.001);
    }

    #[test]
    fn test_fill_is_stable_on_repeat() {
        let points = vec![
            point(1, Some(2400.0), DietaryEnergySource::Log),
            point(2, None, DietaryEnergySource::NotCounted),
            point(3, None, DietaryEnergySource::NotCounted),
            point(4, Some(1600.0), DietaryEnergySource::Log),
        ];

        let once = DietaryEnergyReconciler::fill_averages(points);
        let twice = DietaryEnergyReconciler::fill_averages(once.clone());

        assert_eq!(twice, once);
        assert_eq!(once[2].kcal, Some(2000.0));
    }

    #[test]
    fn test_missing_platform_data_is_not_filled() {
        let points = vec![
            point(1, Some(2000.0), DietaryEnergySource::Log),
            point(2, None, DietaryEnergySource::ExternalPlatform),
            point(3, None, DietaryEnergySource::NotCounted),
        ];

        let filled = DietaryEnergyReconciler::fill_averages(points);

        assert_eq!(filled[1].kcal, None);
        assert_eq!(filled[2].kcal, Some(2000.0));
    }

    #[test]
    fn test_no_counted_days() {
        let points = vec![
            point(1, None, DietaryEnergySource::NotCounted),
            point(2, None, DietaryEnergySource::ExternalPlatform),
        ];

        let energy = DietaryEnergyReconciler::totals(DietaryEnergyReconciler::fill_averages(points));

        assert!(energy.points.iter().all(|p| p.kcal.is_none()));
        assert_eq!(energy.kcal_per_day, None);
        assert_eq!(energy.total_kcal, None);
    }

    #[test]
    fn test_reconcile_day_sources() {
        let mut day = DayRecord::new(date(1), &Settings::default());
        day.logged_energy_kcal = Some(2150.0);

        let log = DietaryEnergyReconciler::reconcile_day(
            &point(1, None, DietaryEnergySource::Log),
            Some(&day),
            Some(999.0),
        );
        assert_eq!(log.kcal, Some(2150.0));

        let platform = DietaryEnergyReconciler::reconcile_day(
            &point(1, None, DietaryEnergySource::ExternalPlatform),
            Some(&day),
            Some(1980.0),
        );
        assert_eq!(platform.kcal, Some(1980.0));

        let fasted = DietaryEnergyReconciler::reconcile_day(
            &point(1, Some(500.0), DietaryEnergySource::Fasted),
            Some(&day),
            None,
        );
        assert_eq!(fasted.kcal, Some(0.0));

        let manual = DietaryEnergyReconciler::reconcile_day(
            &point(1, Some(1750.0), DietaryEnergySource::Manual),
            Some(&day),
            Some(1980.0),
        );
        assert_eq!(manual.kcal, Some(1750.0));

        let uncounted = DietaryEnergyReconciler::reconcile_day(
            &point(1, Some(1750.0), DietaryEnergySource::NotCounted),
            Some(&day),
            None,
        );
        assert_eq!(uncounted.kcal, None);
    }

    #[test]
    fn test_build_window() {
        let mut store = DayStore::default();

        let mut logged = store.get_or_create(date(1));
        logged.logged_energy_kcal = Some(2200.0);
        store.put(logged);

        let mut synced = store.get_or_create(date(2));
        synced.dietary_energy_point = Some(point(2, None, DietaryEnergySource::ExternalPlatform));
        store.put(synced);

        let mut fasted = store.get_or_create(date(3));
        fasted.dietary_energy_point = Some(point(3, None, DietaryEnergySource::Fasted));
        store.put(fasted);

        // Day 4 has no record at all
        let sums = BTreeMap::from([(date(2), 2000.0)]);
        let energy = DietaryEnergyReconciler::build_window(date(1), date(4), &store, &sums);

        let kcal: Vec<Option<f64>> = energy.points.iter().map(|p| p.kcal).collect();
        assert_eq!(kcal, vec![Some(2200.0), Some(2000.0), Some(0.0), Some(1400.0)]);
        assert_eq!(energy.points[0].source, DietaryEnergySource::Log);
        assert_eq!(energy.points[3].source, DietaryEnergySource::NotCounted);
        assert!((energy.kcal_per_day.unwrap() - 1400.0).abs() < 0.001);
    }
}
