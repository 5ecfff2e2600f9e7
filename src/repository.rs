//! Day repository
//!
//! Day records are owned by the caller's storage. The engine reads and writes
//! them through `DayRepository`, keyed by calendar date. `DayStore` is an
//! in-memory implementation that persists as a JSON array of day records.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::config::Settings;
use crate::error::EngineError;
use crate::types::DayRecord;

/// Storage collaborator for day records
pub trait DayRepository {
    /// Fetch the record for a date, if one exists
    fn get(&self, date: NaiveDate) -> Option<DayRecord>;

    /// Fetch the record for a date, creating an empty one on first access
    fn get_or_create(&mut self, date: NaiveDate) -> DayRecord;

    /// Store a record, replacing any existing record for its date
    fn put(&mut self, day: DayRecord);

    /// Latest date before `before` that may hold a record.
    ///
    /// Defaults to the previous calendar day. Stores with an ordered index
    /// should return the nearest stored date so history walks skip gaps.
    fn previous_date(&self, before: NaiveDate) -> Option<NaiveDate> {
        before.pred_opt()
    }
}

/// In-memory day repository
#[derive(Debug, Clone, Default)]
pub struct DayStore {
    days: BTreeMap<NaiveDate, DayRecord>,
    settings: Settings,
}

impl DayStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            days: BTreeMap::new(),
            settings,
        }
    }

    /// Load day records from a JSON array.
    ///
    /// Every record takes the daily value policies of `settings`, whatever
    /// policy it was saved with.
    pub fn from_json(json: &str, settings: Settings) -> Result<Self, EngineError> {
        let records: Vec<DayRecord> = serde_json::from_str(json)?;
        let mut store = Self::new(settings);
        for mut record in records {
            record.health_details.apply_settings(&store.settings);
            store.days.insert(record.date, record);
        }
        Ok(store)
    }

    /// Serialize all day records, in date order, to a JSON array
    pub fn to_json(&self) -> Result<String, EngineError> {
        let records: Vec<&DayRecord> = self.days.values().collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }
}

impl DayRepository for DayStore {
    fn get(&self, date: NaiveDate) -> Option<DayRecord> {
        self.days.get(&date).cloned()
    }

    fn get_or_create(&mut self, date: NaiveDate) -> DayRecord {
        let settings = &self.settings;
        self.days
            .entry(date)
            .or_insert_with(|| DayRecord::new(date, settings))
            .clone()
    }

    fn put(&mut self, day: DayRecord) {
        self.days.insert(day.date, day);
    }

    fn previous_date(&self, before: NaiveDate) -> Option<NaiveDate> {
        self.days.range(..before).next_back().map(|(date, _)| *date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DailyValueType, Measurement};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_get_or_create_initializes_empty_day() {
        let mut store = DayStore::default();
        assert!(store.get(date(1)).is_none());

        let day = store.get_or_create(date(1));
        assert_eq!(day.date, date(1));
        assert!(day.health_details.weight.is_empty());
        assert_eq!(
            day.health_details.height.daily_value_type(),
            DailyValueType::Last
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = DayStore::default();
        let mut day = store.get_or_create(date(3));
        day.health_details.weight.set_measurements(vec![Measurement::manual(
            Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap(),
            81.3,
        )]);
        day.logged_energy_kcal = Some(2100.0);
        store.put(day.clone());
        store.get_or_create(date(1));

        let json = store.to_json().unwrap();
        let loaded = DayStore::from_json(&json, Settings::default()).unwrap();

        assert_eq!(loaded.dates().collect::<Vec<_>>(), vec![date(1), date(3)]);
        assert_eq!(loaded.get(date(3)), Some(day));
    }

    #[test]
    fn test_load_applies_current_policy() {
        let mut store = DayStore::default();
        let mut day = store.get_or_create(date(3));
        day.health_details.weight.set_measurements(vec![
            Measurement::manual(Utc.with_ymd_and_hms(2024, 1, 3, 7, 0, 0).unwrap(), 80.0),
            Measurement::manual(Utc.with_ymd_and_hms(2024, 1, 3, 20, 0, 0).unwrap(), 82.0),
        ]);
        store.put(day);
        assert_eq!(store.get(date(3)).unwrap().health_details.weight.value(), Some(81.0));

        let mut settings = Settings::default();
        settings.daily_value_types.weight = DailyValueType::Last;
        let loaded = DayStore::from_json(&store.to_json().unwrap(), settings).unwrap();

        let weight = loaded.get(date(3)).unwrap().health_details.weight;
        assert_eq!(weight.daily_value_type(), DailyValueType::Last);
        assert_eq!(weight.value(), Some(82.0));
    }

    #[test]
    fn test_previous_date_skips_gaps() {
        let mut store = DayStore::default();
        store.get_or_create(date(2));
        store.get_or_create(date(9));
        store.get_or_create(date(20));

        assert_eq!(store.previous_date(date(20)), Some(date(9)));
        assert_eq!(store.previous_date(date(15)), Some(date(9)));
        assert_eq!(store.previous_date(date(9)), Some(date(2)));
        assert_eq!(store.previous_date(date(2)), None);
    }
}
