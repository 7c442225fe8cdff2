//! Refinement of raw pages into a per-stock series.

use chrono::NaiveDate;
use seeker_core::{
    ArtifactStore, PageKind, RawPageTable, RefineConfig, RefinedSeries, Result, SeekerError, Stock,
    StockCode,
    labels::{self, STATEMENT_UNIT},
    period::{annualization_factor, canonical_periods},
    series::{MV, PB_MV, PE, PE_MV, growth_name},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::derive::{capped_ratio, seasonal_average, yoy_growth};

/// Builds and caches [`RefinedSeries`] from the raw pages in a store.
#[derive(Debug, Clone)]
pub struct MetricsRefiner {
    store: Arc<dyn ArtifactStore>,
    config: RefineConfig,
}

impl MetricsRefiner {
    /// Creates a refiner reading from and writing to `store`.
    pub fn new(store: Arc<dyn ArtifactStore>, config: RefineConfig) -> Self {
        Self { store, config }
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// The canonical period axis for the configured reference date.
    pub fn periods(&self) -> Result<Vec<NaiveDate>> {
        canonical_periods(self.config.reference_date, self.config.seasons)
    }

    /// Refines a stock on the canonical period axis.
    pub fn refine_default(&self, stock: &Stock) -> Result<RefinedSeries> {
        let periods = self.periods()?;
        self.refine(stock, &periods)
    }

    /// Returns the refined series of a stock over `periods` (latest first).
    ///
    /// A stored artifact on the same period axis is returned as is unless
    /// `force` is set; otherwise the series is computed from the raw pages
    /// and stored, replacing any artifact on another axis.
    ///
    /// # Errors
    /// Returns [`SeekerError::MissingPage`] if any raw page is absent.
    #[instrument(skip(self, stock, periods), fields(stock = %stock.code(), periods = periods.len()))]
    pub fn refine(&self, stock: &Stock, periods: &[NaiveDate]) -> Result<RefinedSeries> {
        self.config.validate()?;
        let code = stock.code();

        if !self.config.force && self.store.has_refined(code)? {
            match self.store.get_refined(code)? {
                Some(series) if series.periods() == periods => {
                    debug!("Reusing stored refined series");
                    return Ok(series);
                }
                Some(series) => debug!(
                    stored_latest = ?series.periods().first(),
                    "Stored refined series is on another period axis"
                ),
                None => {}
            }
        }

        info!("Refining {}", stock);
        let statements = PageKind::STATEMENTS
            .into_iter()
            .map(|page| self.load(code, page))
            .collect::<Result<Vec<_>>>()?;
        let prices = self.load(code, PageKind::PriceHistory)?;

        let series = self.compute(&statements, &prices, periods)?;
        self.store.put_refined(code, &series)?;
        debug!(rows = series.len(), "Stored refined series");
        Ok(series)
    }

    fn load(&self, code: &StockCode, page: PageKind) -> Result<RawPageTable> {
        self.store
            .load_table(code, page)?
            .ok_or_else(|| SeekerError::MissingPage {
                stock: code.to_string(),
                page: page.to_string(),
            })
    }

    /// Computes the refined series from parsed pages without touching the store.
    pub fn compute(
        &self,
        statements: &[RawPageTable],
        prices: &RawPageTable,
        periods: &[NaiveDate],
    ) -> Result<RefinedSeries> {
        let mut series = RefinedSeries::new(periods.to_vec())?;
        let aligned = align(statements, periods);
        let row = |metric: &str| -> Vec<Option<f64>> {
            aligned
                .get(metric)
                .cloned()
                .unwrap_or_else(|| vec![None; periods.len()])
        };

        for metric in &self.config.growth_metrics {
            let values = row(metric);
            series.insert(growth_name(metric), yoy_growth(&values))?;
            series.insert(metric.clone(), values)?;
        }

        let avg_close: Vec<Option<f64>> = periods
            .iter()
            .map(|&p| seasonal_average(prices, labels::CLOSE_PRICE, p))
            .collect();
        let avg_mv: Vec<Option<f64>> = periods
            .iter()
            .map(|&p| seasonal_average(prices, labels::MARKET_VALUE, p))
            .collect();

        let eps = row(labels::EPS);
        let net_profit = row(labels::NET_PROFIT);
        let net_assets = row(labels::NET_ASSETS);
        let (floor, ceiling) = (self.config.denominator_floor, self.config.ratio_ceiling);

        let mut pe = Vec::with_capacity(periods.len());
        let mut pe_mv = Vec::with_capacity(periods.len());
        let mut pb_mv = Vec::with_capacity(periods.len());
        for (i, &period) in periods.iter().enumerate() {
            let factor = annualization_factor(period);
            pe.push(capped_ratio(
                avg_close[i],
                eps[i].map(|e| e * factor),
                floor,
                ceiling,
            ));
            pe_mv.push(capped_ratio(
                avg_mv[i],
                net_profit[i].map(|p| p * factor * STATEMENT_UNIT),
                floor,
                ceiling,
            ));
            pb_mv.push(capped_ratio(
                avg_mv[i],
                net_assets[i].map(|a| a * STATEMENT_UNIT),
                floor,
                ceiling,
            ));
        }

        series.insert(PE, pe)?;
        series.insert(PE_MV, pe_mv)?;
        series.insert(PB_MV, pb_mv)?;
        series.insert(MV, avg_mv)?;
        Ok(series)
    }
}

/// Projects statement pages onto the period axis: `{metric -> value per period}`.
///
/// Metrics absent for a period are missing.
fn align(statements: &[RawPageTable], periods: &[NaiveDate]) -> BTreeMap<String, Vec<Option<f64>>> {
    let mut aligned: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for table in statements {
        for (i, &period) in periods.iter().enumerate() {
            let Some(row) = table.row(period) else {
                continue;
            };
            for (metric, value) in row {
                aligned
                    .entry(metric.clone())
                    .or_insert_with(|| vec![None; periods.len()])[i] = *value;
            }
        }
    }
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use seeker_store::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn periods() -> Vec<NaiveDate> {
        vec![
            date(2024, 3, 31),
            date(2023, 12, 31),
            date(2023, 9, 30),
            date(2023, 6, 30),
            date(2023, 3, 31),
        ]
    }

    const MAIN_METRICS: &str = "\
报告日期,2024-03-31,2023-12-31,2023-09-30,2023-06-30,2023-03-31
主营业务收入(万元),100,90,--,85,80
基本每股收益(元),0.5,1.2,0.9,0.6,-0.2
净利润(万元),1000,4000,3000,2000,-10
股东权益不含少数股东权益(万元),60000,59000,58000,57000,56000
经营活动产生的现金流量净额(万元),300,,,,200
";

    const PRICES: &str = "\
日期,股票代码,名称,收盘价,总市值
2024-03-31,'000977,浪潮信息,16,1600000000
2024-03-30,'000977,浪潮信息,0,0
2024-03-29,'000977,浪潮信息,10,1000000000
2023-03-31,'000977,浪潮信息,5,500000000
";

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let code = StockCode::new("000977");
        for page in PageKind::STATEMENTS {
            let text = if page == PageKind::MainMetrics {
                MAIN_METRICS
            } else {
                "报告日期,2024-03-31\n"
            };
            store.put_page(&code, page, text).unwrap();
        }
        store.put_page(&code, PageKind::PriceHistory, PRICES).unwrap();
        store
    }

    fn refiner(store: Arc<InMemoryStore>, force: bool) -> MetricsRefiner {
        MetricsRefiner::new(
            store,
            RefineConfig::default()
                .with_reference_date(date(2024, 4, 15))
                .with_seasons(5)
                .with_force(force),
        )
    }

    fn stock() -> Stock {
        Stock::new("000977", "浪潮信息")
    }

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap();
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_canonical_axis() {
        let refiner = refiner(seeded_store(), false);
        assert_eq!(refiner.periods().unwrap(), periods());
    }

    #[test]
    fn test_refine_primaries_and_growth() {
        let series = refiner(seeded_store(), false)
            .refine(&stock(), &periods())
            .unwrap();
        let q1 = date(2024, 3, 31);

        assert_eq!(series.periods(), periods().as_slice());
        approx(series.value(labels::REVENUE, q1), 100.0);
        approx(series.value(&growth_name(labels::REVENUE), q1), 25.0);
        // "--" is not numeric
        assert_eq!(series.value(labels::REVENUE, date(2023, 9, 30)), None);
        approx(series.value(&growth_name(labels::OPERATING_CASHFLOW), q1), 50.0);
        // Only the first period has a value four quarters back.
        assert_eq!(
            series.value(&growth_name(labels::REVENUE), date(2023, 12, 31)),
            None
        );
    }

    #[test]
    fn test_refine_valuation_ratios() {
        let series = refiner(seeded_store(), false)
            .refine(&stock(), &periods())
            .unwrap();
        let q1 = date(2024, 3, 31);

        // closes 10, 10 (filled), 16 -> 12; EPS 0.5 * 4
        approx(series.value(PE, q1), 6.0);
        approx(series.value(MV, q1), 1.2e9);
        // 1.2e9 / (1000 * 4 * 1e4)
        approx(series.value(PE_MV, q1), 30.0);
        // 1.2e9 / (60000 * 1e4)
        approx(series.value(PB_MV, q1), 2.0);

        // Loss-making Q1 2023: denominators are floored to 0.01.
        let q1_2023 = date(2023, 3, 31);
        approx(series.value(PE, q1_2023), 500.0);
        approx(series.value(PE_MV, q1_2023), 2000.0);

        // No trading days in the window.
        assert_eq!(series.value(MV, date(2023, 12, 31)), None);
        assert_eq!(series.value(PE, date(2023, 12, 31)), None);
    }

    #[test]
    fn test_missing_page_is_fatal() {
        let store = Arc::new(InMemoryStore::new());
        let code = StockCode::new("000977");
        store.put_page(&code, PageKind::MainMetrics, MAIN_METRICS).unwrap();

        let err = refiner(store.clone(), false)
            .refine(&stock(), &periods())
            .unwrap_err();
        assert!(matches!(err, SeekerError::MissingPage { .. }));
        assert!(!store.has_refined(&code).unwrap());
    }

    #[test]
    fn test_stored_series_is_reused_unless_forced() {
        let store = seeded_store();
        let code = StockCode::new("000977");
        let mut sentinel = RefinedSeries::new(periods()).unwrap();
        sentinel.insert("sentinel", vec![Some(1.0); 5]).unwrap();
        store.put_refined(&code, &sentinel).unwrap();

        let cached = refiner(store.clone(), false)
            .refine(&stock(), &periods())
            .unwrap();
        assert_eq!(cached, sentinel);

        let forced = refiner(store.clone(), true)
            .refine(&stock(), &periods())
            .unwrap();
        assert_ne!(forced, sentinel);
        assert_eq!(store.get_refined(&code).unwrap(), Some(forced));
    }

    #[test]
    fn test_stored_series_on_another_axis_is_recomputed() {
        let store = seeded_store();
        let code = StockCode::new("000977");
        let mut stale = RefinedSeries::new(vec![date(2023, 12, 31), date(2023, 9, 30)]).unwrap();
        stale.insert("stale", vec![Some(1.0), Some(2.0)]).unwrap();
        store.put_refined(&code, &stale).unwrap();

        let series = refiner(store.clone(), false)
            .refine(&stock(), &periods())
            .unwrap();
        assert_eq!(series.periods(), periods().as_slice());
        assert_eq!(series.get("stale"), None);
        approx(series.value(&growth_name(labels::REVENUE), date(2024, 3, 31)), 25.0);
        assert_eq!(store.get_refined(&code).unwrap(), Some(series));
    }

    #[test]
    fn test_refine_is_idempotent() {
        let store = seeded_store();
        let refiner = refiner(store.clone(), false);

        let first = refiner.refine(&stock(), &periods()).unwrap();
        let second = refiner.refine(&stock(), &periods()).unwrap();
        assert_eq!(first, second);

        let recomputed = MetricsRefiner::new(store, refiner.config().clone().with_force(true))
            .refine(&stock(), &periods())
            .unwrap();
        assert_eq!(first, recomputed);
    }
}
