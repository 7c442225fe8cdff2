//! Raw page tables as written by a fetcher.
//!
//! Two layouts are understood:
//!
//! - statement pages are wide: the first column holds the metric label and the
//!   remaining header cells are period end dates;
//! - the price-history page is long: the first column holds the trading day and
//!   the remaining header cells are metric labels.
//!
//! Either way the parsed [`RawPageTable`] maps a date to `{metric -> value}`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SeekerError};

/// Date format used in page headers and refined artifacts.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A logical page published by the data provider for every stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Balance sheet.
    Balance,
    /// Income statement.
    Income,
    /// Cashflow statement.
    Cash,
    /// Main financial metrics.
    MainMetrics,
    /// Profitability metrics.
    ProfitMetrics,
    /// Solvency metrics.
    LiabilityMetrics,
    /// Growth metrics.
    GrowthMetrics,
    /// Operating efficiency metrics.
    OperatingMetrics,
    /// Daily price history.
    PriceHistory,
}

impl PageKind {
    /// Every page kind, statement pages first.
    pub const ALL: [Self; 9] = [
        Self::Balance,
        Self::Income,
        Self::Cash,
        Self::MainMetrics,
        Self::ProfitMetrics,
        Self::LiabilityMetrics,
        Self::GrowthMetrics,
        Self::OperatingMetrics,
        Self::PriceHistory,
    ];

    /// Pages keyed by reporting period, i.e. everything but the price history.
    pub const STATEMENTS: [Self; 8] = [
        Self::Balance,
        Self::Income,
        Self::Cash,
        Self::MainMetrics,
        Self::ProfitMetrics,
        Self::LiabilityMetrics,
        Self::GrowthMetrics,
        Self::OperatingMetrics,
    ];

    /// Stable identifier used in file names and qualified metric names.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Income => "income",
            Self::Cash => "cash",
            Self::MainMetrics => "main_metrics",
            Self::ProfitMetrics => "profit_metrics",
            Self::LiabilityMetrics => "liability_metrics",
            Self::GrowthMetrics => "growth_metrics",
            Self::OperatingMetrics => "operating_metrics",
            Self::PriceHistory => "price_history",
        }
    }

    /// Returns true for the daily price-history page.
    #[must_use]
    pub const fn is_price_history(&self) -> bool {
        matches!(self, Self::PriceHistory)
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = SeekerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SeekerError::Parse(format!("Unknown page kind: {s}")))
    }
}

/// Qualifies a native metric label with its source page: `label@page`.
///
/// The same label can appear on several pages with different meanings.
#[must_use]
pub fn qualify(label: &str, page: PageKind) -> String {
    format!("{}@{}", label.trim(), page.as_str())
}

/// Parses a cell that is lexically numeric: optionally signed, optionally
/// decimal (`^-?\d+(\.\d+)?$`). Anything else is a missing value.
#[must_use]
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int) || frac.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    cell.parse().ok()
}

/// Parses a header or first-column cell as a date.
#[must_use]
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), DATE_FORMAT).ok()
}

/// One parsed raw page: `{date -> {qualified metric -> value}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawPageTable {
    page: PageKind,
    rows: BTreeMap<NaiveDate, BTreeMap<String, Option<f64>>>,
}

impl RawPageTable {
    /// Creates an empty table for a page.
    #[must_use]
    pub const fn new(page: PageKind) -> Self {
        Self {
            page,
            rows: BTreeMap::new(),
        }
    }

    /// Parses raw CSV text in the layout appropriate for `page`.
    pub fn parse(page: PageKind, text: &str) -> Result<Self> {
        if page.is_price_history() {
            Self::parse_long(page, text)
        } else {
            Self::parse_wide(page, text)
        }
    }

    /// Wide layout: first column label, remaining columns period dates.
    fn parse_wide(page: PageKind, text: &str) -> Result<Self> {
        let mut reader = csv_reader(text);
        let headers = reader
            .headers()
            .map_err(|e| SeekerError::Parse(format!("{page}: {e}")))?
            .clone();

        let columns: Vec<(usize, NaiveDate)> = headers
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, h)| parse_date(h).map(|d| (i, d)))
            .collect();

        let mut table = Self::new(page);
        for record in reader.records() {
            let record = record.map_err(|e| SeekerError::Parse(format!("{page}: {e}")))?;
            let Some(label) = record.get(0).map(str::trim).filter(|l| !l.is_empty()) else {
                continue;
            };
            let metric = qualify(label, page);
            for &(i, date) in &columns {
                let value = record.get(i).and_then(parse_numeric);
                table.insert(date, metric.clone(), value);
            }
        }
        Ok(table)
    }

    /// Long layout: first column date, remaining columns metrics.
    fn parse_long(page: PageKind, text: &str) -> Result<Self> {
        let mut reader = csv_reader(text);
        let headers = reader
            .headers()
            .map_err(|e| SeekerError::Parse(format!("{page}: {e}")))?
            .clone();
        let metrics: Vec<String> = headers.iter().skip(1).map(|h| qualify(h, page)).collect();

        let mut table = Self::new(page);
        for record in reader.records() {
            let record = record.map_err(|e| SeekerError::Parse(format!("{page}: {e}")))?;
            let Some(date) = record.get(0).and_then(parse_date) else {
                continue;
            };
            for (i, metric) in metrics.iter().enumerate() {
                let value = record.get(i + 1).and_then(parse_numeric);
                table.insert(date, metric.clone(), value);
            }
        }
        Ok(table)
    }

    /// Sets one cell.
    pub fn insert(&mut self, date: NaiveDate, metric: impl Into<String>, value: Option<f64>) {
        self.rows
            .entry(date)
            .or_default()
            .insert(metric.into(), value);
    }

    /// The page this table was parsed from.
    #[must_use]
    pub const fn page(&self) -> PageKind {
        self.page
    }

    /// Returns a value; `None` when the date, the metric or the value is missing.
    #[must_use]
    pub fn value(&self, date: NaiveDate, metric: &str) -> Option<f64> {
        self.rows.get(&date)?.get(metric).copied().flatten()
    }

    /// Returns every metric recorded for a date.
    #[must_use]
    pub fn row(&self, date: NaiveDate) -> Option<&BTreeMap<String, Option<f64>>> {
        self.rows.get(&date)
    }

    /// Iterates over the dates present in this table, earliest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Number of dated rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table holds no dated rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("42"), Some(42.0));
        assert_eq!(parse_numeric("-3.25"), Some(-3.25));
        assert_eq!(parse_numeric(" 7.5 "), Some(7.5));
        assert_eq!(parse_numeric(""), None);
        assert_eq!(parse_numeric("--"), None);
        assert_eq!(parse_numeric("1e5"), None);
        assert_eq!(parse_numeric("+1"), None);
        assert_eq!(parse_numeric(".5"), None);
        assert_eq!(parse_numeric("5."), None);
        assert_eq!(parse_numeric("1,000"), None);
        assert_eq!(parse_numeric("NaN"), None);
    }

    #[test]
    fn test_page_kind_round_trip() {
        for page in PageKind::ALL {
            assert_eq!(page.as_str().parse::<PageKind>().unwrap(), page);
        }
        assert!("prices".parse::<PageKind>().is_err());
        assert!(!PageKind::STATEMENTS.contains(&PageKind::PriceHistory));
    }

    #[test]
    fn test_parse_wide_statement_page() {
        let text = "报告日期,2024-03-31,2023-12-31,2023-09-30,\n\
                    主营业务收入(万元),100,--,80.5,\n\
                    净利润(万元),-12.5,30,,\n\
                    ,,,,\n";
        let table = RawPageTable::parse(PageKind::MainMetrics, text).unwrap();

        let revenue = "主营业务收入(万元)@main_metrics";
        assert_eq!(table.value(date(2024, 3, 31), revenue), Some(100.0));
        assert_eq!(table.value(date(2023, 12, 31), revenue), None);
        assert_eq!(table.value(date(2023, 9, 30), revenue), Some(80.5));
        assert_eq!(
            table.value(date(2024, 3, 31), "净利润(万元)@main_metrics"),
            Some(-12.5)
        );
        assert_eq!(table.len(), 3);
        // the header's label cell is not a date column
        assert_eq!(table.dates().next(), Some(date(2023, 9, 30)));
    }

    #[test]
    fn test_same_label_on_two_pages_is_disambiguated() {
        let text = "报告日期,2024-03-31\n净利润(万元),1\n";
        let main = RawPageTable::parse(PageKind::MainMetrics, text).unwrap();
        let income = RawPageTable::parse(PageKind::Income, text).unwrap();

        assert!(main.value(date(2024, 3, 31), "净利润(万元)@main_metrics").is_some());
        assert!(main.value(date(2024, 3, 31), "净利润(万元)@income").is_none());
        assert!(income.value(date(2024, 3, 31), "净利润(万元)@income").is_some());
    }

    #[test]
    fn test_parse_long_price_history() {
        let text = "日期,股票代码,名称,收盘价,总市值\n\
                    2024-03-29,'000977,浪潮信息,35.2,51800000000\n\
                    2024-03-28,'000977,浪潮信息,0,0\n";
        let table = RawPageTable::parse(PageKind::PriceHistory, text).unwrap();

        assert_eq!(table.value(date(2024, 3, 29), "收盘价@price_history"), Some(35.2));
        assert_eq!(table.value(date(2024, 3, 28), "收盘价@price_history"), Some(0.0));
        assert_eq!(table.value(date(2024, 3, 29), "股票代码@price_history"), None);
        assert_eq!(table.len(), 2);
    }
}
