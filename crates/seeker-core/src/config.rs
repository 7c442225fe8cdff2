//! Explicit configuration values for each pipeline component.
//!
//! Every component receives its configuration through its constructor; there
//! is no process-wide state. All configs deserialize from JSON with missing
//! fields taking their defaults.

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::{Result, SeekerError};
use crate::labels;
use crate::period::last_season_end;
use crate::series::{MV, PB_MV, PE_MV, growth_name};

/// Upper bound on fetch workers.
pub const MAX_WORKERS_LIMIT: usize = 100;

/// Parses any configuration value from JSON.
pub fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| SeekerError::Parse(e.to_string()))
}

/// Configuration of the fetch orchestrator and page fetchers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on concurrent workers, within `1..=100`.
    pub max_workers: usize,
    /// Bounded wait for each worker to exit once the queue is drained.
    pub shutdown_timeout: Duration,
    /// Download pages even when they already exist in the store.
    pub force_refetch: bool,
    /// Minimum interval between two HTTP requests of one fetcher.
    pub rate_limit: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            shutdown_timeout: Duration::from_secs(10),
            force_refetch: false,
            rate_limit: Duration::from_millis(200),
        }
    }
}

impl FetchConfig {
    /// Sets the worker bound.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the force-refetch override.
    #[must_use]
    pub const fn with_force_refetch(mut self, force: bool) -> Self {
        self.force_refetch = force;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WORKERS_LIMIT).contains(&self.max_workers) {
            return Err(SeekerError::InvalidParameter(format!(
                "max_workers must be within 1..={MAX_WORKERS_LIMIT}, got {}",
                self.max_workers
            )));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(SeekerError::InvalidParameter(
                "shutdown_timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the metrics refiner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Number of quarters on the canonical period axis.
    pub seasons: usize,
    /// Date the canonical axis is computed from.
    pub reference_date: NaiveDate,
    /// Recompute even when a refined artifact already exists.
    pub force: bool,
    /// Floor applied to non-positive valuation denominators.
    pub denominator_floor: f64,
    /// Ceiling applied to valuation ratios.
    pub ratio_ceiling: f64,
    /// Primary metrics that receive a growth row.
    pub growth_metrics: Vec<String>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            seasons: 12 * 4,
            reference_date: Utc::now().date_naive(),
            force: false,
            denominator_floor: 0.01,
            ratio_ceiling: 2000.0,
            growth_metrics: labels::GROWTH_TRACKED
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl RefineConfig {
    /// Sets the reference date.
    #[must_use]
    pub const fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    /// Sets the number of quarters.
    #[must_use]
    pub const fn with_seasons(mut self, seasons: usize) -> Self {
        self.seasons = seasons;
        self
    }

    /// Sets the force override.
    #[must_use]
    pub const fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.seasons == 0 {
            return Err(SeekerError::InvalidParameter(
                "seasons must be positive".to_string(),
            ));
        }
        if !(self.denominator_floor > 0.0) {
            return Err(SeekerError::InvalidParameter(
                "denominator_floor must be positive".to_string(),
            ));
        }
        if !(self.ratio_ceiling > 0.0) {
            return Err(SeekerError::InvalidParameter(
                "ratio_ceiling must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// How an insight metric is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Display-formatted value only, no statistics.
    MarketValue,
    /// Point value plus trailing-window confidence statistics.
    Statistic,
}

/// One metric reported in an insight record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsightMetric {
    /// Row name in the refined series.
    pub series: String,
    /// Column prefix in the insight record.
    pub prefix: String,
    /// Reporting mode.
    pub kind: MetricKind,
    /// Decimal places for the point value, mean and bounds.
    pub precision: u32,
    /// Whether to also report the latest value on the axis.
    pub report_latest: bool,
}

impl InsightMetric {
    /// A market-value metric.
    #[must_use]
    pub fn market_value(series: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            prefix: "MarketValue".to_string(),
            kind: MetricKind::MarketValue,
            precision: 1,
            report_latest: true,
        }
    }

    /// A statistic metric.
    #[must_use]
    pub fn statistic(series: impl Into<String>, prefix: impl Into<String>, precision: u32) -> Self {
        Self {
            series: series.into(),
            prefix: prefix.into(),
            kind: MetricKind::Statistic,
            precision,
            report_latest: false,
        }
    }

    /// Also report the latest value on the axis.
    #[must_use]
    pub const fn with_latest(mut self) -> Self {
        self.report_latest = true;
        self
    }
}

/// Configuration of the insight engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// The period to score.
    pub as_of: NaiveDate,
    /// Size of the trailing window, as-of period excluded.
    pub window: usize,
    /// Metrics in output priority order.
    pub metrics: Vec<InsightMetric>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            as_of: last_season_end(Utc::now().date_naive()),
            window: 12,
            metrics: vec![
                InsightMetric::market_value(MV),
                InsightMetric::statistic(growth_name(labels::REVENUE), "revenue_growth", 2),
                InsightMetric::statistic(PE_MV, "PE", 1).with_latest(),
                InsightMetric::statistic(PB_MV, "PB", 1).with_latest(),
            ],
        }
    }
}

impl InsightConfig {
    /// Sets the as-of period.
    #[must_use]
    pub const fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    /// Checks value ranges and column uniqueness.
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(SeekerError::InvalidParameter(
                "window must hold at least two periods".to_string(),
            ));
        }
        let mut prefixes = HashSet::new();
        for metric in &self.metrics {
            if !prefixes.insert(metric.prefix.as_str()) {
                return Err(SeekerError::DuplicateColumn(metric.prefix.clone()));
            }
        }
        Ok(())
    }
}
