//! Unit conversions
//!
//! Measurements are stored in canonical units (kg, cm, percent, kcal). Manual
//! entries arrive in the user's preferred unit and are converted here before
//! they reach the measurement store.

use serde::{Deserialize, Serialize};

/// Kilograms in one avoirdupois pound
pub const KG_PER_POUND: f64 = 0.45359237;

/// Pounds in one stone
pub const POUNDS_PER_STONE: f64 = 14.0;

/// Centimetres in one inch
pub const CM_PER_INCH: f64 = 2.54;

/// Kilojoules in one kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;

/// Unit for body mass metrics (weight, lean body mass)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyMassUnit {
    #[default]
    Kg,
    Lb,
    St,
}

impl BodyMassUnit {
    /// Convert a value in this unit to kilograms
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            BodyMassUnit::Kg => value,
            BodyMassUnit::Lb => value * KG_PER_POUND,
            BodyMassUnit::St => value * POUNDS_PER_STONE * KG_PER_POUND,
        }
    }

    /// Convert kilograms to this unit
    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            BodyMassUnit::Kg => kg,
            BodyMassUnit::Lb => kg / KG_PER_POUND,
            BodyMassUnit::St => kg / KG_PER_POUND / POUNDS_PER_STONE,
        }
    }
}

/// Unit for height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightUnit {
    #[default]
    Cm,
    In,
    M,
}

impl HeightUnit {
    pub fn to_cm(&self, value: f64) -> f64 {
        match self {
            HeightUnit::Cm => value,
            HeightUnit::In => value * CM_PER_INCH,
            HeightUnit::M => value * 100.0,
        }
    }

    pub fn from_cm(&self, cm: f64) -> f64 {
        match self {
            HeightUnit::Cm => cm,
            HeightUnit::In => cm / CM_PER_INCH,
            HeightUnit::M => cm / 100.0,
        }
    }
}

/// Unit for dietary and expended energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyUnit {
    #[default]
    Kcal,
    Kj,
}

impl EnergyUnit {
    pub fn to_kcal(&self, value: f64) -> f64 {
        match self {
            EnergyUnit::Kcal => value,
            EnergyUnit::Kj => value / KJ_PER_KCAL,
        }
    }

    pub fn from_kcal(&self, kcal: f64) -> f64 {
        match self {
            EnergyUnit::Kcal => kcal,
            EnergyUnit::Kj => kcal * KJ_PER_KCAL,
        }
    }
}

/// Energy equivalent of a body mass change, using 3500 kcal per pound
pub fn energy_equivalent_kcal(kg: f64) -> f64 {
    3500.0 * kg / KG_PER_POUND
}
