//! Daily value reduction
//!
//! Collapses a day's measurement list into a single value under the metric's
//! `DailyValueType`. Lists are expected in timestamp order; `MetricContainer`
//! guarantees this before calling in.

use crate::types::{DailyValueType, Measurement};

/// Reduce a day's measurements to one value
pub fn reduce(measurements: &[Measurement], policy: DailyValueType) -> Option<f64> {
    match policy {
        DailyValueType::Average => average(measurements.iter().map(|m| m.value)),
        DailyValueType::Last => measurements.last().map(|m| m.value),
        DailyValueType::First => measurements.first().map(|m| m.value),
    }
}

/// Arithmetic mean, `None` for an empty sequence
pub fn average(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
