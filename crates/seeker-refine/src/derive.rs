//! Derived metric formulas.
//!
//! Every function here works on a period axis ordered latest first, so the
//! same quarter one year earlier sits four positions later.

use chrono::NaiveDate;
use seeker_core::RawPageTable;
use seeker_core::period::days_in_season;

/// Distance between a period and the same period one year earlier.
pub const YEAR_LAG: usize = 4;

/// Year-over-year growth in percent.
///
/// `growth[i] = (v[i] - v[i + 4]) / |v[i + 4]| * 100`, missing unless both
/// values are present and the prior-year value is non-zero.
#[must_use]
pub fn yoy_growth(values: &[Option<f64>]) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let current = values[i]?;
            let prior = values.get(i + YEAR_LAG).copied().flatten()?;
            (prior != 0.0).then(|| (current - prior) / prior.abs() * 100.0)
        })
        .collect()
}

/// Mean daily value of `metric` over the calendar window of `period_end`.
///
/// Days with a missing or non-positive value inherit the last strictly
/// positive value seen earlier in the same window; days before the first
/// positive value are ignored. Missing if the window has no positive value.
#[must_use]
pub fn seasonal_average(prices: &RawPageTable, metric: &str, period_end: NaiveDate) -> Option<f64> {
    let mut last = None;
    let mut sum = 0.0;
    let mut count = 0usize;

    for day in days_in_season(period_end) {
        match prices.value(day, metric) {
            Some(v) if v > 0.0 => last = Some(v),
            _ => {}
        }
        if let Some(v) = last {
            sum += v;
            count += 1;
        }
    }

    (count > 0).then(|| sum / count as f64)
}

/// Replaces a non-positive denominator with `floor`.
#[must_use]
pub fn floor_denominator(value: f64, floor: f64) -> f64 {
    if value > 0.0 { value } else { floor }
}

/// `numerator / denominator` with the denominator floored and the result
/// capped at `ceiling`. Missing if either operand is missing.
#[must_use]
pub fn capped_ratio(
    numerator: Option<f64>,
    denominator: Option<f64>,
    floor: f64,
    ceiling: f64,
) -> Option<f64> {
    let ratio = numerator? / floor_denominator(denominator?, floor);
    Some(ratio.min(ceiling))
}
