//! Historical replacement resolution
//!
//! When a day lacks a value, the most recent earlier day that has it stands
//! in: for fallback display, and for any computation that needs a value "as
//! of" a date. The walk goes backward through the repository's earlier
//! dates, nearest first, and stops at the configured earliest tracked date.
//! No interpolation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::repository::DayRepository;
use crate::types::{DayRecord, HealthDetails, HealthMetric};

/// A value found on an earlier day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedValue<T = f64> {
    pub date: NaiveDate,
    pub value: T,
}

/// Resolver for "most recent known value" lookups
#[derive(Debug, Clone, Copy)]
pub struct HistoricalResolver {
    earliest_tracked_date: NaiveDate,
}

impl HistoricalResolver {
    pub fn new(earliest_tracked_date: NaiveDate) -> Self {
        Self {
            earliest_tracked_date,
        }
    }

    /// Latest day strictly before `as_of` with the metric set
    pub fn resolve_latest<R>(
        &self,
        metric: HealthMetric,
        as_of: NaiveDate,
        repository: &R,
    ) -> Option<ResolvedValue>
    where
        R: DayRepository + ?Sized,
    {
        self.resolve_latest_with(as_of, repository, |details| details.value(metric))
    }

    /// Latest day strictly before `as_of` for which `select` yields a value
    pub fn resolve_latest_with<R, T, F>(
        &self,
        as_of: NaiveDate,
        repository: &R,
        select: F,
    ) -> Option<ResolvedValue<T>>
    where
        R: DayRepository + ?Sized,
        F: Fn(&HealthDetails) -> Option<T>,
    {
        let mut cursor = repository.previous_date(as_of);

        while let Some(date) = cursor.filter(|date| *date >= self.earliest_tracked_date) {
            if let Some(value) = repository
                .get(date)
                .and_then(|day| select(&day.health_details))
            {
                return Some(ResolvedValue { date, value });
            }
            cursor = repository.previous_date(date);
        }

        None
    }

    /// The day's own value of a metric, else the latest earlier one
    pub fn value_as_of<R>(&self, metric: HealthMetric, day: &DayRecord, repository: &R) -> Option<f64>
    where
        R: DayRepository + ?Sized,
    {
        day.health_details
            .value(metric)
            .or_else(|| {
                self.resolve_latest(metric, day.date, repository)
                    .map(|resolved| resolved.value)
            })
    }

    /// The day's own value of any health detail, else the latest earlier one
    pub fn detail_as_of<R, T, F>(&self, day: &DayRecord, repository: &R, select: F) -> Option<T>
    where
        R: DayRepository + ?Sized,
        F: Fn(&HealthDetails) -> Option<T>,
    {
        select(&day.health_details).or_else(|| {
            self.resolve_latest_with(day.date, repository, select)
                .map(|resolved| resolved.value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::repository::DayStore;
    use crate::sync::add_manual;
    use crate::types::BiologicalSex;
    use chrono::{Days, TimeZone, Utc};
    use std::cell::Cell;
    use std::collections::HashMap;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn store_with_weight(days: &[(u32, f64)]) -> DayStore {
        let mut store = DayStore::new(Settings::default());
        for (d, kg) in days {
            let mut day = store.get_or_create(date(*d));
            add_manual(
                &mut day.health_details.weight,
                Utc.with_ymd_and_hms(2024, 1, *d, 8, 0, 0).unwrap(),
                *kg,
            );
            store.put(day);
        }
        store
    }

    /// Repository without an ordered index, counting lookups
    #[derive(Default)]
    struct DayByDayRepository {
        days: HashMap<NaiveDate, DayRecord>,
        lookups: Cell<usize>,
    }

    impl DayRepository for DayByDayRepository {
        fn get(&self, date: NaiveDate) -> Option<DayRecord> {
            self.lookups.set(self.lookups.get() + 1);
            self.days.get(&date).cloned()
        }

        fn get_or_create(&mut self, date: NaiveDate) -> DayRecord {
            self.days
                .entry(date)
                .or_insert_with(|| DayRecord::new(date, &Settings::default()))
                .clone()
        }

        fn put(&mut self, day: DayRecord) {
            self.days.insert(day.date, day);
        }
    }

    #[test]
    fn test_finds_nearest_earlier_day() {
        let mut store = store_with_weight(&[(2, 82.0), (4, 80.0)]);
        // Days in the gap exist but have no weight
        for d in 5..=10 {
            store.get_or_create(date(d));
        }
        let resolver = HistoricalResolver::new(date(1));

        let resolved = resolver
            .resolve_latest(HealthMetric::Weight, date(10), &store)
            .unwrap();

        // Day 10 minus six days
        assert_eq!(resolved.date, date(10).checked_sub_days(Days::new(6)).unwrap());
        assert_eq!(resolved.value, 80.0);
    }

    #[test]
    fn test_excludes_as_of_day() {
        let store = store_with_weight(&[(4, 80.0), (5, 79.0)]);
        let resolver = HistoricalResolver::new(date(1));

        let resolved = resolver
            .resolve_latest(HealthMetric::Weight, date(5), &store)
            .unwrap();
        assert_eq!(resolved.date, date(4));

        let day = store.get(date(5)).unwrap();
        assert_eq!(resolver.value_as_of(HealthMetric::Weight, &day, &store), Some(79.0));
    }

    #[test]
    fn test_bounded_by_earliest_date() {
        let store = store_with_weight(&[(2, 82.0)]);
        let resolver = HistoricalResolver::new(date(3));

        assert!(resolver
            .resolve_latest(HealthMetric::Weight, date(10), &store)
            .is_none());
    }

    #[test]
    fn test_absent_history() {
        let store = DayStore::default();
        let resolver = HistoricalResolver::new(date(1));

        assert!(resolver
            .resolve_latest(HealthMetric::Height, date(20), &store)
            .is_none());
        assert!(resolver
            .resolve_latest(HealthMetric::Height, date(1), &store)
            .is_none());
    }

    #[test]
    fn test_resolves_non_metric_details() {
        let mut store = DayStore::default();
        let mut day = store.get_or_create(date(3));
        day.health_details.sex = Some(BiologicalSex::Male);
        store.put(day);

        let resolver = HistoricalResolver::new(date(1));
        let today = store.get_or_create(date(9));

        assert_eq!(
            resolver.detail_as_of(&today, &store, |details| details.sex),
            Some(BiologicalSex::Male)
        );
    }

    #[test]
    fn test_sparse_history_reads_only_stored_days() {
        let store = store_with_weight(&[(2, 82.0), (4, 80.0)]);
        let resolver = HistoricalResolver::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());

        // Years of history before the first stored day resolve to nothing
        assert!(resolver
            .resolve_latest(HealthMetric::Height, date(4), &store)
            .is_none());

        let as_of = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let resolved = resolver
            .resolve_latest(HealthMetric::Weight, as_of, &store)
            .unwrap();
        assert_eq!(resolved.date, date(4));
    }

    #[test]
    fn test_day_by_day_walk_for_unindexed_repository() {
        let mut repository = DayByDayRepository::default();
        let mut day = repository.get_or_create(date(3));
        add_manual(
            &mut day.health_details.weight,
            Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap(),
            79.5,
        );
        repository.put(day);
        let resolver = HistoricalResolver::new(date(1));

        let resolved = resolver
            .resolve_latest(HealthMetric::Weight, date(10), &repository)
            .unwrap();

        assert_eq!(resolved, ResolvedValue { date: date(3), value: 79.5 });
        // Days 9 down to 3
        assert_eq!(repository.lookups.get(), 7);

        repository.lookups.set(0);
        assert!(resolver
            .resolve_latest(HealthMetric::Height, date(10), &repository)
            .is_none());
        assert_eq!(repository.lookups.get(), 9);
    }
}
