//! Per-stock insight computation.

use chrono::NaiveDate;
use seeker_core::{
    InsightConfig, InsightMetric, InsightRecord, MetricKind, RefinedSeries, Result, Stock,
    page::DATE_FORMAT,
    period::find_period_desc,
    record::{CODE, IDENTITY_COLUMNS, INDUSTRY, IPO, NAME, SEASON},
};
use tracing::{debug, instrument, warn};

use crate::ladder::ConfidenceLadder;

/// Threshold between the 万 and 亿 display units.
const YI: f64 = 1e8;
/// One 万.
const WAN: f64 = 1e4;

/// Formats a market value as `x.x亿` or `x.x万`. Missing or zero is no value.
#[must_use]
pub fn format_market_value(value: Option<f64>) -> Option<String> {
    let value = value.filter(|v| *v != 0.0)?;
    Some(if value >= YI {
        format!("{:.1}亿", value / YI)
    } else {
        format!("{:.1}万", value / WAN)
    })
}

/// Rounds to `precision` decimal places.
#[must_use]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10_f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Computes [`InsightRecord`]s from refined series.
#[derive(Debug, Clone)]
pub struct InsightEngine {
    config: InsightConfig,
    ladder: ConfidenceLadder,
}

impl InsightEngine {
    /// Creates an engine.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(config: InsightConfig) -> Result<Self> {
        config.validate()?;
        let ladder = ConfidenceLadder::new(config.window)?;
        Ok(Self { config, ladder })
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Scores a stock at the configured as-of period.
    pub fn insight_default(&self, stock: &Stock, series: &RefinedSeries) -> Result<InsightRecord> {
        self.insight(stock, series, self.config.as_of)
    }

    /// Scores a stock at `as_of`.
    ///
    /// When `as_of` is not on the series axis the record holds only the
    /// identity columns.
    #[instrument(skip(self, stock, series), fields(stock = %stock.code(), as_of = %as_of))]
    pub fn insight(
        &self,
        stock: &Stock,
        series: &RefinedSeries,
        as_of: NaiveDate,
    ) -> Result<InsightRecord> {
        let mut record = identity_record(stock, as_of)?;

        let Some(index) = find_period_desc(series.periods(), as_of) else {
            warn!("{} has no data on season {}", stock, as_of);
            return Ok(record);
        };

        for metric in &self.config.metrics {
            let Some(values) = series.get(&metric.series) else {
                debug!(metric = %metric.series, "Metric not in refined series");
                continue;
            };
            let insight = match metric.kind {
                MetricKind::MarketValue => market_value_insight(metric, values, index)?,
                MetricKind::Statistic => self.statistic_insight(metric, values, index)?,
            };
            record.merge(insight)?;
        }
        Ok(record)
    }

    fn statistic_insight(
        &self,
        metric: &InsightMetric,
        values: &[Option<f64>],
        index: usize,
    ) -> Result<InsightRecord> {
        let p = &metric.prefix;
        let n = self.ladder.window();
        let latest_column = format!("{p}_latest");
        let at_season_column = format!("{p}_at_season");
        let mean_column = format!("{n}seasons_{p}_mean");
        let lower_column = format!("{n}seasons_{p}_lower");
        let upper_column = format!("{n}seasons_{p}_upper");
        let percentile_column = format!("{n}seasons_{p}_percentile");

        let mut insight = InsightRecord::new();
        if metric.report_latest {
            insight.add_columns([latest_column.as_str()])?;
        }
        insight.add_columns([
            at_season_column.as_str(),
            mean_column.as_str(),
            lower_column.as_str(),
            upper_column.as_str(),
            percentile_column.as_str(),
        ])?;

        let Some(value) = values[index] else {
            debug!(metric = %p, "No value at season");
            return Ok(insight);
        };

        let precision = metric.precision;
        insight.set(&at_season_column, round_to(value, precision))?;
        if metric.report_latest {
            insight.set_opt(&latest_column, values[0].map(|v| round_to(v, precision)))?;
        }

        let window: Vec<f64> = values
            .iter()
            .skip(index + 1)
            .take(n)
            .filter_map(|v| *v)
            .collect();
        let Some(score) = self.ladder.score(value, &window) else {
            debug!(metric = %p, available = window.len(), "Not enough data for {} seasons", n);
            return Ok(insight);
        };

        insight
            .set(&mean_column, round_to(score.mean, precision))?
            .set(&lower_column, round_to(score.interval.lower, precision))?
            .set(&upper_column, round_to(score.interval.upper, precision))?
            .set(&percentile_column, round_to(score.percentile, 1))?;
        Ok(insight)
    }
}

/// A record holding only the identity columns of `stock` at `as_of`.
pub fn identity_record(stock: &Stock, as_of: NaiveDate) -> Result<InsightRecord> {
    let mut record = InsightRecord::new();
    record
        .add_columns(IDENTITY_COLUMNS)?
        .set(CODE, stock.code().as_str())?
        .set(NAME, stock.name())?
        .set(INDUSTRY, stock.industry())?
        .set(SEASON, as_of.format(DATE_FORMAT).to_string())?
        .set_opt(
            IPO,
            stock.ipo_date().map(|d| d.format(DATE_FORMAT).to_string()),
        )?;
    Ok(record)
}

fn market_value_insight(
    metric: &InsightMetric,
    values: &[Option<f64>],
    index: usize,
) -> Result<InsightRecord> {
    let latest_column = format!("{}_latest", metric.prefix);
    let at_season_column = format!("{}_at_season", metric.prefix);

    let mut insight = InsightRecord::new();
    if metric.report_latest {
        insight.add_columns([latest_column.as_str()])?;
    }
    insight.add_columns([at_season_column.as_str()])?;

    let Some(at_season) = format_market_value(values[index]) else {
        debug!("No market value at season");
        return Ok(insight);
    };
    insight.set(&at_season_column, at_season)?;
    if metric.report_latest {
        insight.set_opt(&latest_column, format_market_value(values[0]))?;
    }
    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_core::{
        InsightValue, labels,
        period::canonical_periods,
        series::{MV, PB_MV, PE_MV, growth_name},
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stock() -> Stock {
        Stock::new("000977", "浪潮信息")
            .with_industry("计算机")
            .with_ipo_date(date(2000, 6, 8))
    }

    /// Fourteen quarters, latest 2024-06-30.
    fn series() -> RefinedSeries {
        let periods = canonical_periods(date(2024, 7, 1), 14).unwrap();
        let a = (11.0_f64 / 3.0).sqrt();
        // Index 1 is the as-of period, 2..14 the trailing window.
        let stat_row = |at: f64| -> Vec<Option<f64>> {
            let mut row = vec![Some(9.0), Some(at)];
            row.extend((0..12).map(|i| Some(if i % 2 == 0 { 10.0 + a } else { 10.0 - a })));
            row
        };

        let mut series = RefinedSeries::new(periods).unwrap();
        let mut mv = vec![Some(5.0e7), Some(1.5e9)];
        mv.extend(vec![None; 12]);
        series.insert(MV, mv).unwrap();
        series
            .insert(growth_name(labels::REVENUE), stat_row(11.33))
            .unwrap();
        series.insert(PE_MV, stat_row(10.5)).unwrap();
        let mut pb = stat_row(8.0);
        pb[5] = None;
        series.insert(PB_MV, pb).unwrap();
        series
    }

    fn engine() -> InsightEngine {
        InsightEngine::new(InsightConfig::default().with_as_of(date(2024, 3, 31))).unwrap()
    }

    #[test]
    fn test_format_market_value() {
        assert_eq!(format_market_value(Some(1.5e9)).as_deref(), Some("15.0亿"));
        assert_eq!(format_market_value(Some(1e8)).as_deref(), Some("1.0亿"));
        assert_eq!(format_market_value(Some(5.0e7)).as_deref(), Some("5000.0万"));
        assert_eq!(format_market_value(Some(0.0)), None);
        assert_eq!(format_market_value(None), None);
    }

    #[test]
    fn test_absent_season_yields_identity_only() {
        let record = engine()
            .insight(&stock(), &series(), date(2019, 12, 31))
            .unwrap();

        assert_eq!(record.columns(), IDENTITY_COLUMNS.as_slice());
        assert_eq!(
            record.get(SEASON),
            Some(&InsightValue::Text("2019-12-31".to_string()))
        );
        assert_eq!(
            record.get(IPO),
            Some(&InsightValue::Text("2000-06-08".to_string()))
        );
    }

    #[test]
    fn test_column_order_follows_metric_priority() {
        let record = engine().insight_default(&stock(), &series()).unwrap();
        let columns: Vec<&str> = record.columns().iter().map(String::as_str).collect();

        assert_eq!(
            columns,
            [
                "Code",
                "Name",
                "Industry",
                "IPO",
                "Season",
                "MarketValue_latest",
                "MarketValue_at_season",
                "revenue_growth_at_season",
                "12seasons_revenue_growth_mean",
                "12seasons_revenue_growth_lower",
                "12seasons_revenue_growth_upper",
                "12seasons_revenue_growth_percentile",
                "PE_latest",
                "PE_at_season",
                "12seasons_PE_mean",
                "12seasons_PE_lower",
                "12seasons_PE_upper",
                "12seasons_PE_percentile",
                "PB_latest",
                "PB_at_season",
                "12seasons_PB_mean",
                "12seasons_PB_lower",
                "12seasons_PB_upper",
                "12seasons_PB_percentile",
            ]
        );
    }

    #[test]
    fn test_statistics() {
        let record = engine().insight_default(&stock(), &series()).unwrap();

        assert_eq!(
            record.get("MarketValue_at_season"),
            Some(&InsightValue::Text("15.0亿".to_string()))
        );
        assert_eq!(
            record.get("MarketValue_latest"),
            Some(&InsightValue::Text("5000.0万".to_string()))
        );

        assert_eq!(record.number("revenue_growth_at_season"), Some(11.33));
        assert_eq!(record.number("12seasons_revenue_growth_mean"), Some(10.0));
        assert_eq!(record.number("12seasons_revenue_growth_upper"), Some(11.27));
        assert_eq!(record.number("12seasons_revenue_growth_lower"), Some(8.73));
        assert_eq!(record.number("12seasons_revenue_growth_percentile"), Some(97.5));

        assert_eq!(record.number("PE_latest"), Some(9.0));
        assert_eq!(record.number("PE_at_season"), Some(10.5));
        assert_eq!(record.number("12seasons_PE_percentile"), Some(50.0));
    }

    #[test]
    fn test_short_window_keeps_point_value_only() {
        let record = engine().insight_default(&stock(), &series()).unwrap();

        assert_eq!(record.number("PB_at_season"), Some(8.0));
        assert!(record.has_column("12seasons_PB_mean"));
        assert_eq!(record.get("12seasons_PB_mean"), None);
        assert_eq!(record.get("12seasons_PB_percentile"), None);
    }

    #[test]
    fn test_missing_value_at_season_registers_columns() {
        let periods = canonical_periods(date(2024, 7, 1), 2).unwrap();
        let mut series = RefinedSeries::new(periods).unwrap();
        series.insert(MV, vec![Some(1e9), None]).unwrap();

        let record = engine().insight_default(&stock(), &series).unwrap();
        assert!(record.has_column("MarketValue_at_season"));
        assert_eq!(record.get("MarketValue_latest"), None);
        assert!(!record.has_column("PE_at_season"));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(11.2708, 2), 11.27);
        assert_eq!(round_to(97.49999999999999, 1), 97.5);
        assert_eq!(round_to(-2.25, 0), -2.0);
    }
}
