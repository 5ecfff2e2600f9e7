//! Engine configuration and user settings
//!
//! `Settings` is read-only user preference state (per-metric daily value
//! policy, preferred units). `EngineConfig` carries the engine's own knobs.
//! Both round-trip through JSON so callers can persist them next to day records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{DailyValueType, HealthMetric};
use crate::units::{BodyMassUnit, EnergyUnit, HeightUnit};

/// Default sanity floor for adaptive maintenance (kcal/day)
pub const DEFAULT_ADAPTIVE_MINIMUM_KCAL: f64 = 1000.0;

/// Per-metric daily value policies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyValueTypes {
    pub height: DailyValueType,
    pub weight: DailyValueType,
    pub lean_body_mass: DailyValueType,
    pub fat_percentage: DailyValueType,
}

impl Default for DailyValueTypes {
    fn default() -> Self {
        Self {
            height: DailyValueType::Last,
            weight: DailyValueType::Average,
            lean_body_mass: DailyValueType::Average,
            fat_percentage: DailyValueType::Average,
        }
    }
}

/// User settings consumed by the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub daily_value_types: DailyValueTypes,
    #[serde(default)]
    pub body_mass_unit: BodyMassUnit,
    #[serde(default)]
    pub height_unit: HeightUnit,
    #[serde(default)]
    pub energy_unit: EnergyUnit,
}

impl Settings {
    /// Daily value policy for a metric
    pub fn daily_value_type(&self, metric: HealthMetric) -> DailyValueType {
        let types = &self.daily_value_types;
        match metric {
            HealthMetric::Height => types.height,
            HealthMetric::Weight => types.weight,
            HealthMetric::LeanBodyMass => types.lean_body_mass,
            HealthMetric::FatPercentage => types.fat_percentage,
        }
    }

    /// Convert a value entered in the user's preferred unit to the metric's canonical unit
    pub fn to_canonical(&self, metric: HealthMetric, value: f64) -> f64 {
        match metric {
            HealthMetric::Height => self.height_unit.to_cm(value),
            HealthMetric::Weight | HealthMetric::LeanBodyMass => self.body_mass_unit.to_kg(value),
            HealthMetric::FatPercentage => value,
        }
    }

    /// Convert a canonical value to the user's preferred unit
    pub fn from_canonical(&self, metric: HealthMetric, value: f64) -> f64 {
        match metric {
            HealthMetric::Height => self.height_unit.from_cm(value),
            HealthMetric::Weight | HealthMetric::LeanBodyMass => {
                self.body_mass_unit.from_kg(value)
            }
            HealthMetric::FatPercentage => value,
        }
    }
}

/// Engine configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Oldest date the historical resolver will look at
    pub earliest_tracked_date: NaiveDate,
    /// Adaptive maintenance results below this are discarded
    pub adaptive_minimum_kcal: f64,
    pub settings: Settings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            earliest_tracked_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN),
            adaptive_minimum_kcal: DEFAULT_ADAPTIVE_MINIMUM_KCAL,
            settings: Settings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), EngineError> {
        if !self.adaptive_minimum_kcal.is_finite() || self.adaptive_minimum_kcal < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "adaptive_minimum_kcal must be a non-negative number, got {}",
                self.adaptive_minimum_kcal
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policies() {
        let settings = Settings::default();
        assert_eq!(
            settings.daily_value_type(HealthMetric::Height),
            DailyValueType::Last
        );
        assert_eq!(
            settings.daily_value_type(HealthMetric::Weight),
            DailyValueType::Average
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_json(
            r#"{"earliest_tracked_date": "2023-06-01", "adaptive_minimum_kcal": 1200.0}"#,
        )
        .unwrap();

        assert_eq!(
            config.earliest_tracked_date,
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
        );
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_rejects_negative_floor() {
        let result = EngineConfig::from_json(
            r#"{"earliest_tracked_date": "2023-06-01", "adaptive_minimum_kcal": -5.0}"#,
        );
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_manual_entry_conversion() {
        let settings = Settings {
            body_mass_unit: BodyMassUnit::Lb,
            height_unit: HeightUnit::In,
            ..Default::default()
        };

        assert!((settings.to_canonical(HealthMetric::Weight, 220.0) - 99.79).abs() < 0.01);
        assert!((settings.to_canonical(HealthMetric::Height, 70.0) - 177.8).abs() < 0.001);
        assert_eq!(settings.to_canonical(HealthMetric::FatPercentage, 21.5), 21.5);

        let pounds = settings.from_canonical(HealthMetric::Weight, 99.79);
        assert!((pounds - 220.0).abs() < 0.01);
    }
}
