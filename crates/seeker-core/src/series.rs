//! Refined per-stock time series.
//!
//! A [`RefinedSeries`] holds one row per qualified metric, aligned on a
//! descending reporting-period axis. Its CSV form is the refined artifact:
//! header `指标` followed by ISO dates, missing values as empty cells.

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, ParquetWriter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::error::{Result, SeekerError};
use crate::page::{DATE_FORMAT, parse_date, parse_numeric};

/// Header of the label column in the refined artifact.
pub const INDICATOR_COLUMN: &str = "指标";

/// Suffix of year-over-year growth rows.
pub const GROWTH_SUFFIX: &str = "_growth";

/// Price-to-earnings from average price and per-share earnings.
pub const PE: &str = "PE";
/// Price-to-earnings from average market value and net profit.
pub const PE_MV: &str = "PE_MV";
/// Price-to-book from average market value and net assets.
pub const PB_MV: &str = "PB_MV";
/// Average market value.
pub const MV: &str = "MV";

/// Name of the growth row derived from `metric`.
#[must_use]
pub fn growth_name(metric: &str) -> String {
    format!("{metric}{GROWTH_SUFFIX}")
}

/// Metric rows aligned on a descending period axis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinedSeries {
    periods: Vec<NaiveDate>,
    rows: BTreeMap<String, Vec<Option<f64>>>,
}

impl RefinedSeries {
    /// Creates an empty series over `periods`, which must be strictly descending.
    pub fn new(periods: Vec<NaiveDate>) -> Result<Self> {
        if !periods.windows(2).all(|w| w[0] > w[1]) {
            return Err(SeekerError::InvalidParameter(
                "Period axis must be strictly descending".to_string(),
            ));
        }
        Ok(Self {
            periods,
            rows: BTreeMap::new(),
        })
    }

    /// Adds or replaces a metric row. Its length must match the period axis.
    pub fn insert(&mut self, metric: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let metric = metric.into();
        if values.len() != self.periods.len() {
            return Err(SeekerError::InvalidParameter(format!(
                "Row {metric} has {} values for {} periods",
                values.len(),
                self.periods.len()
            )));
        }
        self.rows.insert(metric, values);
        Ok(())
    }

    /// The period axis, latest first.
    #[must_use]
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Returns a metric row.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&[Option<f64>]> {
        self.rows.get(metric).map(Vec::as_slice)
    }

    /// Returns one value; `None` when the metric, the period or the value is missing.
    #[must_use]
    pub fn value(&self, metric: &str, period: NaiveDate) -> Option<f64> {
        let index = crate::period::find_period_desc(&self.periods, period)?;
        self.rows.get(metric)?.get(index).copied().flatten()
    }

    /// Iterates over metric names in artifact order.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of metric rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no metric rows are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the refined artifact as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.periods.len() + 1);
        header.push(INDICATOR_COLUMN.to_string());
        header.extend(self.periods.iter().map(|p| p.format(DATE_FORMAT).to_string()));
        writer
            .write_record(&header)
            .map_err(|e| SeekerError::Store(e.to_string()))?;

        for (metric, values) in &self.rows {
            let mut record = Vec::with_capacity(values.len() + 1);
            record.push(metric.clone());
            record.extend(
                values
                    .iter()
                    .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer
                .write_record(&record)
                .map_err(|e| SeekerError::Store(e.to_string()))?;
        }

        writer.flush().map_err(|e| SeekerError::Store(e.to_string()))
    }

    /// Reads a refined artifact written by [`write_csv`](Self::write_csv).
    ///
    /// Columns are re-sorted latest first; malformed cells read as missing.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| SeekerError::Parse(e.to_string()))?
            .clone();
        let mut columns: Vec<(usize, NaiveDate)> = headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, h)| {
                parse_date(h)
                    .map(|d| (i, d))
                    .ok_or_else(|| SeekerError::Parse(format!("Invalid period header: {h}")))
            })
            .collect::<Result<_>>()?;
        columns.sort_by(|a, b| b.1.cmp(&a.1));

        let mut series = Self::new(columns.iter().map(|(_, d)| *d).collect())?;
        for record in reader.records() {
            let record = record.map_err(|e| SeekerError::Parse(e.to_string()))?;
            let Some(metric) = record.get(0).filter(|m| !m.is_empty()) else {
                continue;
            };
            let values = columns
                .iter()
                .map(|(i, _)| record.get(*i).and_then(parse_numeric))
                .collect();
            series.insert(metric, values)?;
        }
        Ok(series)
    }

    /// Exposes the series as a DataFrame: an `indicator` column followed by
    /// one `f64` column per period, latest first.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.periods.len() + 1);
        columns.push(Column::new(
            "indicator".into(),
            self.rows.keys().cloned().collect::<Vec<String>>(),
        ));
        for (i, period) in self.periods.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.values().map(|row| row[i]).collect();
            columns.push(Column::new(
                period.format(DATE_FORMAT).to_string().into(),
                values,
            ));
        }
        DataFrame::new(columns).map_err(|e| SeekerError::Other(e.to_string()))
    }

    /// Writes [`to_frame`](Self::to_frame) as Parquet.
    pub fn write_parquet<W: Write>(&self, writer: W) -> Result<()> {
        let mut df = self.to_frame()?;
        ParquetWriter::new(writer)
            .finish(&mut df)
            .map_err(|e| SeekerError::Store(format!("write parquet: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{ParquetReader, SerReader};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> RefinedSeries {
        let mut series =
            RefinedSeries::new(vec![date(2024, 3, 31), date(2023, 12, 31), date(2023, 9, 30)])
                .unwrap();
        series
            .insert("主营业务收入(万元)@main_metrics", vec![Some(100.0), None, Some(80.25)])
            .unwrap();
        series
            .insert(MV, vec![Some(5.18e10), Some(-1.5), None])
            .unwrap();
        series
    }

    #[test]
    fn test_rejects_unsorted_axis() {
        assert!(RefinedSeries::new(vec![date(2023, 9, 30), date(2024, 3, 31)]).is_err());
        assert!(RefinedSeries::new(vec![date(2024, 3, 31), date(2024, 3, 31)]).is_err());
    }

    #[test]
    fn test_rejects_misaligned_row() {
        let mut series = RefinedSeries::new(vec![date(2024, 3, 31)]).unwrap();
        assert!(series.insert("x", vec![Some(1.0), None]).is_err());
    }

    #[test]
    fn test_value_lookup() {
        let series = sample();
        assert_eq!(series.value(MV, date(2024, 3, 31)), Some(5.18e10));
        assert_eq!(series.value(MV, date(2023, 9, 30)), None);
        assert_eq!(series.value(MV, date(2022, 9, 30)), None);
        assert_eq!(series.value("unknown", date(2024, 3, 31)), None);
    }

    #[test]
    fn test_csv_artifact_is_stable() {
        let series = sample();
        let mut first = Vec::new();
        series.write_csv(&mut first).unwrap();

        let text = String::from_utf8(first.clone()).unwrap();
        assert!(text.starts_with("指标,2024-03-31,2023-12-31,2023-09-30\n"));
        assert!(text.contains("MV,51800000000,-1.5,\n"));

        let reread = RefinedSeries::read_csv(first.as_slice()).unwrap();
        assert_eq!(reread, series);

        let mut second = Vec::new();
        reread.write_csv(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_to_frame() {
        let df = sample().to_frame().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn test_write_parquet() {
        let series = sample();
        let mut buf = Vec::new();
        series.write_parquet(&mut buf).unwrap();

        let df = ParquetReader::new(std::io::Cursor::new(buf)).finish().unwrap();
        assert!(df.equals_missing(&series.to_frame().unwrap()));
    }
}
