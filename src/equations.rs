//! Predictive equations
//!
//! Resting energy equations, lean body mass equations and activity level
//! multipliers. Every equation declares the variables it needs; a missing or
//! degenerate variable yields `None` rather than an error.
//!
//! Units: weight and lean body mass in kg, height in cm, age in whole years,
//! energy in kcal/day.

use serde::{Deserialize, Serialize};

use crate::types::BiologicalSex;

/// Variables an equation may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquationVariable {
    Sex,
    Age,
    Weight,
    Height,
    LeanBodyMass,
}

/// Inputs resolved for an equation as of a date
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EquationInputs {
    pub sex: Option<BiologicalSex>,
    pub age_years: Option<u32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub lean_body_mass_kg: Option<f64>,
}

impl EquationInputs {
    fn weight(&self) -> Option<f64> {
        self.weight_kg.filter(|w| *w > 0.0)
    }

    fn height(&self) -> Option<f64> {
        self.height_cm.filter(|h| *h > 0.0)
    }

    fn lean_body_mass(&self) -> Option<f64> {
        self.lean_body_mass_kg.filter(|lbm| *lbm > 0.0)
    }

    fn age(&self) -> Option<f64> {
        self.age_years.map(f64::from)
    }
}

/// Resting energy prediction equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestingEnergyEquation {
    KatchMcArdle,
    Cunningham,
    MifflinStJeor,
    HarrisBenedict,
    RozaShizgal,
    HenryOxford,
    Schofield,
}

impl RestingEnergyEquation {
    pub const ALL: [RestingEnergyEquation; 7] = [
        RestingEnergyEquation::KatchMcArdle,
        RestingEnergyEquation::Cunningham,
        RestingEnergyEquation::MifflinStJeor,
        RestingEnergyEquation::HarrisBenedict,
        RestingEnergyEquation::RozaShizgal,
        RestingEnergyEquation::HenryOxford,
        RestingEnergyEquation::Schofield,
    ];

    pub fn required_variables(&self) -> &'static [EquationVariable] {
        use EquationVariable::*;
        match self {
            RestingEnergyEquation::KatchMcArdle | RestingEnergyEquation::Cunningham => {
                &[LeanBodyMass]
            }
            RestingEnergyEquation::HenryOxford | RestingEnergyEquation::Schofield => {
                &[Sex, Age, Weight]
            }
            RestingEnergyEquation::MifflinStJeor
            | RestingEnergyEquation::HarrisBenedict
            | RestingEnergyEquation::RozaShizgal => &[Sex, Age, Weight, Height],
        }
    }

    /// Whether the equation takes body weight as an input
    pub fn uses_weight(&self) -> bool {
        self.required_variables().contains(&EquationVariable::Weight)
    }

    /// Predicted resting energy in kcal/day
    pub fn calculate(&self, inputs: &EquationInputs) -> Option<f64> {
        let kcal = match self {
            RestingEnergyEquation::KatchMcArdle => 370.0 + 21.6 * inputs.lean_body_mass()?,
            RestingEnergyEquation::Cunningham => 500.0 + 22.0 * inputs.lean_body_mass()?,
            RestingEnergyEquation::MifflinStJeor => {
                let base = 10.0 * inputs.weight()? + 6.25 * inputs.height()? - 5.0 * inputs.age()?;
                match inputs.sex? {
                    BiologicalSex::Male => base + 5.0,
                    BiologicalSex::Female => base - 161.0,
                }
            }
            RestingEnergyEquation::HarrisBenedict => {
                let (w, h, a) = (inputs.weight()?, inputs.height()?, inputs.age()?);
                match inputs.sex? {
                    BiologicalSex::Male => 66.473 + 13.7516 * w + 5.0033 * h - 6.755 * a,
                    BiologicalSex::Female => 655.0955 + 9.5634 * w + 1.8496 * h - 4.6756 * a,
                }
            }
            RestingEnergyEquation::RozaShizgal => {
                let (w, h, a) = (inputs.weight()?, inputs.height()?, inputs.age()?);
                match inputs.sex? {
                    BiologicalSex::Male => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
                    BiologicalSex::Female => 447.593 + 9.247 * w + 3.098 * h - 4.330 * a,
                }
            }
            RestingEnergyEquation::HenryOxford => {
                let (slope, intercept) = henry_oxford(inputs.sex?, inputs.age_years?);
                slope * inputs.weight()? + intercept
            }
            RestingEnergyEquation::Schofield => {
                let (slope, intercept) = schofield(inputs.sex?, inputs.age_years?);
                slope * inputs.weight()? + intercept
            }
        };

        (kcal.is_finite() && kcal > 0.0).then_some(kcal)
    }
}

/// Age bands shared by the weight-only equations
fn age_band(age: u32) -> usize {
    match age {
        0..=2 => 0,
        3..=9 => 1,
        10..=17 => 2,
        18..=29 => 3,
        30..=59 => 4,
        _ => 5,
    }
}

/// Henry (2005) weight-only coefficients as (slope, intercept)
fn henry_oxford(sex: BiologicalSex, age: u32) -> (f64, f64) {
    const MALE: [(f64, f64); 6] = [
        (61.0, -33.7),
        (23.3, 514.0),
        (18.4, 581.0),
        (16.0, 545.0),
        (14.2, 593.0),
        (13.5, 514.0),
    ];
    const FEMALE: [(f64, f64); 6] = [
        (58.9, -23.1),
        (20.1, 507.0),
        (11.1, 761.0),
        (13.1, 558.0),
        (9.74, 694.0),
        (10.1, 569.0),
    ];
    match sex {
        BiologicalSex::Male => MALE[age_band(age)],
        BiologicalSex::Female => FEMALE[age_band(age)],
    }
}

/// Schofield (1985) coefficients as (slope, intercept)
fn schofield(sex: BiologicalSex, age: u32) -> (f64, f64) {
    const MALE: [(f64, f64); 6] = [
        (59.512, -30.4),
        (22.706, 504.3),
        (17.686, 658.2),
        (15.057, 692.2),
        (11.472, 873.1),
        (11.711, 587.7),
    ];
    const FEMALE: [(f64, f64); 6] = [
        (58.317, -31.1),
        (20.315, 485.9),
        (13.384, 692.6),
        (14.818, 486.6),
        (8.126, 845.6),
        (9.082, 658.5),
    ];
    match sex {
        BiologicalSex::Male => MALE[age_band(age)],
        BiologicalSex::Female => FEMALE[age_band(age)],
    }
}

/// Lean body mass prediction equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeanBodyMassEquation {
    Boer,
    James,
    Hume,
}

impl LeanBodyMassEquation {
    /// Predicted lean body mass in kg
    pub fn calculate(&self, inputs: &EquationInputs) -> Option<f64> {
        let (w, h, sex) = (inputs.weight()?, inputs.height()?, inputs.sex?);
        let kg = match (self, sex) {
            (LeanBodyMassEquation::Boer, BiologicalSex::Male) => 0.407 * w + 0.267 * h - 19.2,
            (LeanBodyMassEquation::Boer, BiologicalSex::Female) => 0.252 * w + 0.473 * h - 48.3,
            (LeanBodyMassEquation::James, BiologicalSex::Male) => {
                1.1 * w - 128.0 * (w / h).powi(2)
            }
            (LeanBodyMassEquation::James, BiologicalSex::Female) => {
                1.07 * w - 148.0 * (w / h).powi(2)
            }
            (LeanBodyMassEquation::Hume, BiologicalSex::Male) => {
                0.32810 * w + 0.33929 * h - 29.5336
            }
            (LeanBodyMassEquation::Hume, BiologicalSex::Female) => {
                0.29569 * w + 0.41813 * h - 43.2933
            }
        };

        (kg.is_finite() && kg > 0.0 && kg <= w).then_some(kg)
    }
}

/// Activity level multipliers applied to resting energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn scale_factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }

    /// Active energy on top of resting energy
    pub fn active_energy(&self, resting_kcal: f64) -> f64 {
        self.scale_factor() * resting_kcal - resting_kcal
    }
}
