//! Reporting-period calendar arithmetic.
//!
//! Fiscal quarters start on Jan/Apr/Jul/Oct 1st and a reporting period is
//! identified by the last day of its quarter. Every period axis in this
//! workspace is ordered latest first.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, SeekerError};

/// Returns the first month of the quarter containing `month` (1, 4, 7 or 10).
///
/// # Panics
///
/// Panics in debug builds if `month` is outside `1..=12`.
#[must_use]
pub const fn season_start_month(month: u32) -> u32 {
    debug_assert!(month >= 1 && month <= 12);
    (month - 1) / 3 * 3 + 1
}

/// Returns the first day of the quarter containing `day`.
#[must_use]
pub fn season_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1)
        .and_then(|d| d.with_month(season_start_month(day.month())))
        .unwrap_or(day)
}

/// Returns the end date of the last completed quarter before `day`.
#[must_use]
pub fn last_season_end(day: NaiveDate) -> NaiveDate {
    let start = season_start(day);
    start.pred_opt().unwrap_or(start)
}

/// Returns the start dates of the last `n` quarters, latest first.
///
/// The first entry is the start of the quarter containing `day`.
pub fn last_n_season_starts(day: NaiveDate, n: usize) -> Result<Vec<NaiveDate>> {
    if n == 0 {
        return Err(SeekerError::InvalidParameter(
            "Number of seasons must be positive".to_string(),
        ));
    }

    let current = i64::from(day.year()) * 4 + i64::from((day.month() - 1) / 3);
    (0..n as i64)
        .map(|i| {
            let index = current - i;
            let year = i32::try_from(index.div_euclid(4))
                .map_err(|e| SeekerError::InvalidParameter(e.to_string()))?;
            let month = (index.rem_euclid(4) * 3 + 1) as u32;
            NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
                SeekerError::InvalidParameter(format!("Season {year}-{month} out of range"))
            })
        })
        .collect()
}

/// Returns the canonical reporting-period axis: the end dates of the last `n`
/// quarters completed before `reference`, latest first and duplicate-free.
pub fn canonical_periods(reference: NaiveDate, n: usize) -> Result<Vec<NaiveDate>> {
    Ok(last_n_season_starts(reference, n)?
        .into_iter()
        .filter_map(|start| start.pred_opt())
        .collect())
}

/// Returns the fiscal quarter (1-4) a period end date belongs to.
#[must_use]
pub fn quarter_of(period_end: NaiveDate) -> u32 {
    (period_end.month0()) / 3 + 1
}

/// Multiplier turning a cumulative year-to-date figure into an annual one.
///
/// Q1 reports cover three months, Q2 six, Q3 nine and Q4 the full year.
#[must_use]
pub fn annualization_factor(period_end: NaiveDate) -> f64 {
    match quarter_of(period_end) {
        1 => 4.0,
        2 => 2.0,
        3 => 4.0 / 3.0,
        _ => 1.0,
    }
}

/// Returns the calendar window `(first day, last day)` of a period, inclusive.
#[must_use]
pub fn season_window(period_end: NaiveDate) -> (NaiveDate, NaiveDate) {
    (season_start(period_end), period_end)
}

/// Iterates over every calendar day of a period's window, earliest first.
pub fn days_in_season(period_end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let (start, end) = season_window(period_end);
    start.iter_days().take_while(move |d| *d <= end)
}

/// Binary search for `target` on an axis sorted latest first.
///
/// Returns `None` when the period is absent.
#[must_use]
pub fn find_period_desc(periods: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    periods.binary_search_by(|p| target.cmp(p)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_start_month() {
        let expected = [1, 1, 1, 4, 4, 4, 7, 7, 7, 10, 10, 10];
        for (month, want) in (1..=12).zip(expected) {
            assert_eq!(season_start_month(month), want);
        }
    }

    #[test]
    fn test_last_season_end() {
        assert_eq!(last_season_end(date(2024, 5, 17)), date(2024, 3, 31));
        assert_eq!(last_season_end(date(2024, 1, 1)), date(2023, 12, 31));
        assert_eq!(last_season_end(date(2024, 12, 31)), date(2024, 9, 30));
    }

    #[test]
    fn test_canonical_periods_cross_year() {
        let periods = canonical_periods(date(2024, 5, 17), 6).unwrap();
        assert_eq!(
            periods,
            vec![
                date(2024, 3, 31),
                date(2023, 12, 31),
                date(2023, 9, 30),
                date(2023, 6, 30),
                date(2023, 3, 31),
                date(2022, 12, 31),
            ]
        );
    }

    #[test]
    fn test_canonical_periods_are_descending_and_unique() {
        let periods = canonical_periods(date(2025, 11, 2), 48).unwrap();
        assert_eq!(periods.len(), 48);
        assert!(periods.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_zero_seasons_rejected() {
        assert!(canonical_periods(date(2024, 1, 1), 0).is_err());
    }

    #[test]
    fn test_annualization_factor() {
        assert_eq!(annualization_factor(date(2024, 3, 31)), 4.0);
        assert_eq!(annualization_factor(date(2024, 6, 30)), 2.0);
        assert!((annualization_factor(date(2024, 9, 30)) - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(annualization_factor(date(2024, 12, 31)), 1.0);
    }

    #[test]
    fn test_days_in_season() {
        let days: Vec<_> = days_in_season(date(2024, 3, 31)).collect();
        assert_eq!(days.len(), 91); // leap year
        assert_eq!(days[0], date(2024, 1, 1));
        assert_eq!(days[90], date(2024, 3, 31));
    }

    #[test]
    fn test_find_period_desc() {
        let periods = canonical_periods(date(2024, 5, 17), 8).unwrap();

        assert_eq!(find_period_desc(&periods, date(2024, 3, 31)), Some(0));
        assert_eq!(find_period_desc(&periods, date(2022, 6, 30)), Some(7));
        assert_eq!(find_period_desc(&periods, date(2023, 6, 30)), Some(3));

        // absent: newer than the first, older than the last, and not a period end
        assert_eq!(find_period_desc(&periods, date(2024, 6, 30)), None);
        assert_eq!(find_period_desc(&periods, date(2022, 3, 31)), None);
        assert_eq!(find_period_desc(&periods, date(2023, 5, 1)), None);
        assert_eq!(find_period_desc(&[], date(2024, 3, 31)), None);
    }
}
