//! Core types for the Synheart Energy engine
//!
//! This module defines the records that flow through each stage: measurement
//! records and their per-metric containers, day records, dietary energy points,
//! and maintenance energy records. All of them serialize to plain JSON.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::Settings;
use crate::equations::{ActivityLevel, RestingEnergyEquation};
use crate::error::EngineError;
use crate::reducer;

/// Body metrics tracked as per-day measurement lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMetric {
    Height,
    Weight,
    LeanBodyMass,
    FatPercentage,
}

impl HealthMetric {
    pub const ALL: [HealthMetric; 4] = [
        HealthMetric::Height,
        HealthMetric::Weight,
        HealthMetric::LeanBodyMass,
        HealthMetric::FatPercentage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthMetric::Height => "height",
            HealthMetric::Weight => "weight",
            HealthMetric::LeanBodyMass => "lean_body_mass",
            HealthMetric::FatPercentage => "fat_percentage",
        }
    }

    /// The metric this one can be derived from, weight-normalized
    pub fn derivation_source(&self) -> Option<HealthMetric> {
        match self {
            HealthMetric::FatPercentage => Some(HealthMetric::LeanBodyMass),
            HealthMetric::LeanBodyMass => Some(HealthMetric::FatPercentage),
            HealthMetric::Height | HealthMetric::Weight => None,
        }
    }
}

impl fmt::Display for HealthMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "height" => Ok(HealthMetric::Height),
            "weight" => Ok(HealthMetric::Weight),
            "lean_body_mass" | "lbm" => Ok(HealthMetric::LeanBodyMass),
            "fat_percentage" | "body_fat" => Ok(HealthMetric::FatPercentage),
            _ => Err(EngineError::UnknownMetric(s.to_string())),
        }
    }
}

/// Where a measurement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Manual,
    External,
    Equation,
}

/// Origin identifier of a measurement.
///
/// A record is either created locally or imported from the external platform,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementId {
    Local(Uuid),
    External(String),
}

/// Policy for collapsing a day's measurements into one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyValueType {
    #[default]
    Average,
    Last,
    First,
}

/// A single measurement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: MeasurementId,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub provenance: Provenance,
    /// Source metric for cross-metric derived entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<HealthMetric>,
}

impl Measurement {
    /// Create a manually entered measurement with a fresh local id
    pub fn manual(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self::local(timestamp, value, Provenance::Manual)
    }

    /// Create a locally identified measurement with the given provenance
    pub fn local(timestamp: DateTime<Utc>, value: f64, provenance: Provenance) -> Self {
        Self {
            id: MeasurementId::Local(Uuid::new_v4()),
            timestamp,
            value,
            provenance,
            derived_from: None,
        }
    }

    /// Create a measurement imported from the external platform
    pub fn external(external_id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            id: MeasurementId::External(external_id.into()),
            timestamp,
            value,
            provenance: Provenance::External,
            derived_from: None,
        }
    }

    pub fn external_id(&self) -> Option<&str> {
        match &self.id {
            MeasurementId::External(id) => Some(id.as_str()),
            MeasurementId::Local(_) => None,
        }
    }

    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }

    /// Timestamp truncated to the minute, as minutes since the epoch
    pub fn minute(&self) -> i64 {
        minute_of(self.timestamp)
    }
}

/// Minutes since the epoch, ignoring seconds
pub fn minute_of(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(60)
}

/// Per-metric measurement container.
///
/// The measurement list is kept sorted by timestamp and the resolved daily
/// value is recomputed on every write and on load; it is never set directly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "StoredMetricContainer")]
pub struct MetricContainer {
    measurements: Vec<Measurement>,
    /// External ids the user deleted locally
    #[serde(default)]
    tombstoned_external_ids: Vec<String>,
    daily_value_type: DailyValueType,
    resolved_daily_value: Option<f64>,
}

impl MetricContainer {
    pub fn new(daily_value_type: DailyValueType) -> Self {
        Self {
            daily_value_type,
            ..Default::default()
        }
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn tombstoned_external_ids(&self) -> &[String] {
        &self.tombstoned_external_ids
    }

    pub fn daily_value_type(&self) -> DailyValueType {
        self.daily_value_type
    }

    /// Cached reduction of the current measurement list
    pub fn value(&self) -> Option<f64> {
        self.resolved_daily_value
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Replace the measurement list, re-sorting and recomputing the daily value
    pub fn set_measurements(&mut self, mut measurements: Vec<Measurement>) {
        measurements.sort_by_key(|m| m.timestamp);
        self.resolved_daily_value = reducer::reduce(&measurements, self.daily_value_type);
        self.measurements = measurements;
    }

    pub fn set_tombstoned_external_ids(&mut self, ids: Vec<String>) {
        self.tombstoned_external_ids = ids;
    }

    /// Change the daily value policy and recompute the cached value
    pub fn set_daily_value_type(&mut self, daily_value_type: DailyValueType) {
        self.daily_value_type = daily_value_type;
        self.resolved_daily_value = reducer::reduce(&self.measurements, daily_value_type);
    }
}

/// Persisted form of a container. The stored daily value is ignored.
#[derive(Deserialize)]
struct StoredMetricContainer {
    measurements: Vec<Measurement>,
    #[serde(default)]
    tombstoned_external_ids: Vec<String>,
    daily_value_type: DailyValueType,
}

impl From<StoredMetricContainer> for MetricContainer {
    fn from(stored: StoredMetricContainer) -> Self {
        let mut container = MetricContainer::new(stored.daily_value_type);
        container.set_tombstoned_external_ids(stored.tombstoned_external_ids);
        container.set_measurements(stored.measurements);
        container
    }
}

/// Biological sex, as used by predictive equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiologicalSex {
    Female,
    Male,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyStatus {
    NotPregnantOrLactating,
    Pregnant,
    Lactating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmokingStatus {
    NonSmoker,
    Smoker,
}

/// Age, either entered directly or derived from a date of birth
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Age {
    pub years: Option<u32>,
    pub date_of_birth: Option<NaiveDate>,
}

impl Age {
    /// Whole years as of a date; the date of birth takes precedence
    pub fn years_as_of(&self, date: NaiveDate) -> Option<u32> {
        match self.date_of_birth {
            Some(dob) if dob <= date => {
                let mut years = date.year() - dob.year();
                if (date.month(), date.day()) < (dob.month(), dob.day()) {
                    years -= 1;
                }
                u32::try_from(years).ok()
            }
            Some(_) => None,
            None => self.years,
        }
    }
}

/// Health details held by each day record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDetails {
    pub height: MetricContainer,
    pub weight: MetricContainer,
    pub lean_body_mass: MetricContainer,
    pub fat_percentage: MetricContainer,
    #[serde(default)]
    pub age: Option<Age>,
    #[serde(default)]
    pub sex: Option<BiologicalSex>,
    #[serde(default)]
    pub pregnancy_status: Option<PregnancyStatus>,
    #[serde(default)]
    pub smoking_status: Option<SmokingStatus>,
    #[serde(default)]
    pub maintenance: Option<Maintenance>,
}

impl Default for HealthDetails {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl HealthDetails {
    /// Empty health details with containers using the settings' daily value policies
    pub fn new(settings: &Settings) -> Self {
        Self {
            height: MetricContainer::new(settings.daily_value_type(HealthMetric::Height)),
            weight: MetricContainer::new(settings.daily_value_type(HealthMetric::Weight)),
            lean_body_mass: MetricContainer::new(
                settings.daily_value_type(HealthMetric::LeanBodyMass),
            ),
            fat_percentage: MetricContainer::new(
                settings.daily_value_type(HealthMetric::FatPercentage),
            ),
            age: None,
            sex: None,
            pregnancy_status: None,
            smoking_status: None,
            maintenance: None,
        }
    }

    pub fn container(&self, metric: HealthMetric) -> &MetricContainer {
        match metric {
            HealthMetric::Height => &self.height,
            HealthMetric::Weight => &self.weight,
            HealthMetric::LeanBodyMass => &self.lean_body_mass,
            HealthMetric::FatPercentage => &self.fat_percentage,
        }
    }

    pub fn container_mut(&mut self, metric: HealthMetric) -> &mut MetricContainer {
        match metric {
            HealthMetric::Height => &mut self.height,
            HealthMetric::Weight => &mut self.weight,
            HealthMetric::LeanBodyMass => &mut self.lean_body_mass,
            HealthMetric::FatPercentage => &mut self.fat_percentage,
        }
    }

    /// Resolved daily value of a metric on this day
    pub fn value(&self, metric: HealthMetric) -> Option<f64> {
        self.container(metric).value()
    }

    /// Bring every container's daily value policy in line with the settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        for metric in HealthMetric::ALL {
            let policy = settings.daily_value_type(metric);
            let container = self.container_mut(metric);
            if container.daily_value_type() != policy {
                container.set_daily_value_type(policy);
            }
        }
    }
}

/// Source of a day's dietary energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryEnergySource {
    Log,
    ExternalPlatform,
    Fasted,
    Manual,
    NotCounted,
}

/// Dietary energy attributed to a single day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietaryEnergyPoint {
    pub date: NaiveDate,
    pub kcal: Option<f64>,
    pub source: DietaryEnergySource,
}

/// One calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub health_details: HealthDetails,
    #[serde(default)]
    pub dietary_energy_point: Option<DietaryEnergyPoint>,
    /// Total energy of the day's food log
    #[serde(default)]
    pub logged_energy_kcal: Option<f64>,
}

impl DayRecord {
    pub fn new(date: NaiveDate, settings: &Settings) -> Self {
        Self {
            date,
            health_details: HealthDetails::new(settings),
            dietary_energy_point: None,
            logged_energy_kcal: None,
        }
    }
}

/// A sample returned by the external health platform.
///
/// Timestamp and value are optional on the wire; samples missing either are
/// skipped during reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSample {
    pub external_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl ExternalSample {
    pub fn new(external_id: impl Into<String>, timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            external_id: external_id.into(),
            timestamp: Some(timestamp),
            value: Some(value),
        }
    }
}

/// Which maintenance estimate is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceType {
    #[default]
    Adaptive,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
}

/// A span of time such as "2 weeks"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInterval {
    pub count: u32,
    pub unit: IntervalUnit,
}

impl Default for HealthInterval {
    fn default() -> Self {
        Self {
            count: 1,
            unit: IntervalUnit::Week,
        }
    }
}

impl HealthInterval {
    pub fn new(count: u32, unit: IntervalUnit) -> Self {
        Self { count, unit }
    }

    /// First day of the interval ending the day before `date`
    pub fn start_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            IntervalUnit::Day => date.checked_sub_days(Days::new(u64::from(self.count))),
            IntervalUnit::Week => {
                date.checked_sub_days(Days::new(u64::from(self.count) * 7))
            }
            IntervalUnit::Month => date.checked_sub_months(Months::new(self.count)),
        }
    }

    /// Number of calendar days covered when the interval ends the day before `date`
    pub fn number_of_days(&self, date: NaiveDate) -> Option<i64> {
        self.start_date(date)
            .map(|start| (date - start).num_days())
            .filter(|days| *days > 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightChangeType {
    #[default]
    Weights,
    Manual,
}

/// Body weight at one end of the adaptive window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChangePoint {
    pub date: NaiveDate,
    pub kg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChangePoints {
    pub start: WeightChangePoint,
    pub end: WeightChangePoint,
}

/// Weight change over the adaptive window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightChange {
    pub kg: Option<f64>,
    #[serde(rename = "type")]
    pub change_type: WeightChangeType,
    #[serde(default)]
    pub points: Option<WeightChangePoints>,
    /// Average each point over this many days ending at the point's date
    #[serde(default)]
    pub moving_average_days: Option<u32>,
}

/// Dietary energy totals over the adaptive window
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DietaryEnergy {
    pub kcal_per_day: Option<f64>,
    pub total_kcal: Option<f64>,
    #[serde(default)]
    pub points: Vec<DietaryEnergyPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdaptiveMaintenance {
    pub kcal: Option<f64>,
    pub interval: HealthInterval,
    pub dietary_energy: DietaryEnergy,
    pub weight_change: WeightChange,
}

/// Window of platform daily sums used for platform-sourced energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PlatformWindow {
    #[default]
    SameDay,
    PreviousDay,
    Average { days: u32 },
}

impl PlatformWindow {
    /// Inclusive range of daily sums this window reads for `date`
    pub fn range(&self, date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            PlatformWindow::SameDay => Some((date, date)),
            PlatformWindow::PreviousDay => date.pred_opt().map(|d| (d, d)),
            PlatformWindow::Average { days } if *days > 0 => {
                let end = date.pred_opt()?;
                let start = date.checked_sub_days(Days::new(u64::from(*days)))?;
                Some((start, end))
            }
            PlatformWindow::Average { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestingEnergySource {
    Platform,
    #[default]
    Equation,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingEnergy {
    pub kcal: Option<f64>,
    pub source: RestingEnergySource,
    #[serde(default)]
    pub equation: Option<RestingEnergyEquation>,
    #[serde(default)]
    pub prefer_lean_body_mass: bool,
    #[serde(default)]
    pub platform_window: PlatformWindow,
}

impl Default for RestingEnergy {
    fn default() -> Self {
        Self {
            kcal: None,
            source: RestingEnergySource::Equation,
            equation: Some(RestingEnergyEquation::MifflinStJeor),
            prefer_lean_body_mass: false,
            platform_window: PlatformWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveEnergySource {
    Platform,
    #[default]
    ActivityLevel,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEnergy {
    pub kcal: Option<f64>,
    pub source: ActiveEnergySource,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub platform_window: PlatformWindow,
}

impl Default for ActiveEnergy {
    fn default() -> Self {
        Self {
            kcal: None,
            source: ActiveEnergySource::ActivityLevel,
            activity_level: Some(ActivityLevel::Sedentary),
            platform_window: PlatformWindow::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaintenanceEstimate {
    pub kcal: Option<f64>,
    pub resting_energy: RestingEnergy,
    pub active_energy: ActiveEnergy,
}

/// Maintenance energy record stored on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    #[serde(rename = "type")]
    pub maintenance_type: MaintenanceType,
    pub kcal: Option<f64>,
    pub adaptive: AdaptiveMaintenance,
    pub estimate: MaintenanceEstimate,
    pub use_estimate_as_fallback: bool,
}

impl Default for Maintenance {
    fn default() -> Self {
        Self {
            maintenance_type: MaintenanceType::Adaptive,
            kcal: None,
            adaptive: AdaptiveMaintenance::default(),
            estimate: MaintenanceEstimate::default(),
            use_estimate_as_fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_container_sorts_and_caches() {
        let mut container = MetricContainer::new(DailyValueType::Last);
        let late = Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();

        container.set_measurements(vec![
            Measurement::manual(late, 72.0),
            Measurement::manual(early, 70.0),
        ]);

        assert_eq!(container.measurements()[0].timestamp, early);
        assert_eq!(container.value(), Some(72.0));

        container.set_daily_value_type(DailyValueType::First);
        assert_eq!(container.value(), Some(70.0));
    }

    #[test]
    fn test_container_load_recomputes_cache() {
        let mut container = MetricContainer::new(DailyValueType::Last);
        container.set_measurements(vec![
            Measurement::manual(Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap(), 70.0),
            Measurement::manual(Utc.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap(), 72.0),
        ]);

        // Hand-edited storage: measurements out of order and a stale cached value
        let mut stored = serde_json::to_value(&container).unwrap();
        stored["measurements"].as_array_mut().unwrap().reverse();
        stored["resolved_daily_value"] = serde_json::json!(999.0);

        let loaded: MetricContainer = serde_json::from_value(stored).unwrap();

        assert_eq!(loaded, container);
        assert_eq!(loaded.value(), Some(72.0));

        let without_cache: MetricContainer = serde_json::from_value(serde_json::json!({
            "measurements": serde_json::to_value(container.measurements()).unwrap(),
            "daily_value_type": "first",
        }))
        .unwrap();
        assert_eq!(without_cache.value(), Some(70.0));
    }

    #[test]
    fn test_age_from_date_of_birth() {
        let age = Age {
            years: Some(99),
            date_of_birth: Some(date(1990, 6, 15)),
        };
        assert_eq!(age.years_as_of(date(2024, 6, 14)), Some(33));
        assert_eq!(age.years_as_of(date(2024, 6, 15)), Some(34));

        let entered = Age {
            years: Some(40),
            date_of_birth: None,
        };
        assert_eq!(entered.years_as_of(date(2024, 1, 1)), Some(40));
    }

    #[test]
    fn test_interval_days() {
        let d = date(2024, 3, 15);
        assert_eq!(HealthInterval::new(2, IntervalUnit::Week).number_of_days(d), Some(14));
        assert_eq!(HealthInterval::new(1, IntervalUnit::Month).number_of_days(d), Some(29));
        assert_eq!(HealthInterval::new(0, IntervalUnit::Day).number_of_days(d), None);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("lean-body-mass".parse::<HealthMetric>().unwrap(), HealthMetric::LeanBodyMass);
        assert!("bmi".parse::<HealthMetric>().is_err());
    }

    #[test]
    fn test_day_record_round_trip() {
        let settings = Settings::default();
        let mut day = DayRecord::new(date(2024, 1, 15), &settings);
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap();

        day.health_details.weight.set_measurements(vec![
            Measurement::manual(ts, 80.2),
            Measurement::external("hk-1", ts, 80.4),
        ]);
        day.health_details
            .weight
            .set_tombstoned_external_ids(vec!["hk-0".to_string()]);
        day.health_details.sex = Some(BiologicalSex::Female);
        day.health_details.age = Some(Age {
            years: None,
            date_of_birth: Some(date(1988, 2, 3)),
        });
        day.health_details.maintenance = Some(Maintenance {
            kcal: Some(2350.0),
            ..Default::default()
        });
        day.dietary_energy_point = Some(DietaryEnergyPoint {
            date: day.date,
            kcal: Some(1850.0),
            source: DietaryEnergySource::Manual,
        });
        day.logged_energy_kcal = Some(1700.0);

        let json = serde_json::to_string(&day).unwrap();
        let restored: DayRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, day);
    }
}
