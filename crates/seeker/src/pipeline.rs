//! Fetch, refine and score a list of stocks.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use seeker_core::{
    ArtifactStore, FetchConfig, Fetcher, InsightConfig, InsightRecord, RefineConfig, Result,
    SeekerError, Stock,
};
use seeker_fetch::{FetchOrchestrator, FetchReport};
use seeker_insight::{InsightEngine, identity_record};
use seeker_refine::MetricsRefiner;

/// What a pipeline run produced.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    /// Fetch report, when a fetcher is configured.
    pub fetch: Option<FetchReport>,
    /// One insight record per input stock, in input order.
    pub records: Vec<InsightRecord>,
}

/// Composes fetching, refinement and insight over one artifact store.
///
/// # Example
///
/// ```rust,ignore
/// use seeker::{InMemoryStore, Pipeline, RefineConfig, Stock};
/// use std::sync::Arc;
///
/// let pipeline = Pipeline::new(Arc::new(InMemoryStore::new()))
///     .refine_config(RefineConfig::default().with_force(true))
///     .with_netease();
/// let output = pipeline.run(&[Stock::new("000977", "浪潮信息")]).await?;
/// ```
pub struct Pipeline {
    store: Arc<dyn ArtifactStore>,
    fetcher: Option<Arc<dyn Fetcher>>,
    fetch_config: FetchConfig,
    refine_config: RefineConfig,
    insight_config: InsightConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("store", &self.store)
            .field("fetcher", &self.fetcher.as_ref().map(|f| f.name()))
            .field("fetch_config", &self.fetch_config)
            .field("refine_config", &self.refine_config)
            .field("insight_config", &self.insight_config)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline over `store`, without a fetcher and with default configs.
    #[must_use]
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            fetcher: None,
            fetch_config: FetchConfig::default(),
            refine_config: RefineConfig::default(),
            insight_config: InsightConfig::default(),
        }
    }

    /// Set the fetcher run before refinement.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        debug!(fetcher = fetcher.name(), "Registering fetcher");
        self.fetcher = Some(fetcher);
        self
    }

    /// Add the Netease fetcher writing into this pipeline's store.
    ///
    /// The fetcher takes the current fetch and refine configs, so set those first.
    #[cfg(feature = "netease")]
    #[must_use]
    pub fn with_netease(self) -> Self {
        let seasons = u32::try_from(self.refine_config.seasons).unwrap_or(u32::MAX);
        let catalog = seeker_netease::NeteaseSeasonal::new(self.refine_config.reference_date, seasons);
        let fetcher = Arc::new(seeker_netease::PageFetcher::new(
            catalog,
            Arc::clone(&self.store),
            &self.fetch_config,
        ));
        self.with_fetcher(fetcher)
    }

    /// Set the fetch configuration.
    #[must_use]
    pub fn fetch_config(mut self, config: FetchConfig) -> Self {
        self.fetch_config = config;
        self
    }

    /// Set the refine configuration.
    #[must_use]
    pub fn refine_config(mut self, config: RefineConfig) -> Self {
        self.refine_config = config;
        self
    }

    /// Set the insight configuration.
    #[must_use]
    pub fn insight_config(mut self, config: InsightConfig) -> Self {
        self.insight_config = config;
        self
    }

    /// The artifact store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Fetches every stock, then refines and scores each one.
    ///
    /// A stock whose refinement fails gets an identity-only record.
    ///
    /// # Errors
    /// Returns an error for invalid configuration or a fatal worker failure.
    pub async fn run(&self, stocks: &[Stock]) -> Result<RunOutput> {
        let fetch = match &self.fetcher {
            Some(fetcher) => {
                let orchestrator =
                    FetchOrchestrator::new(Arc::clone(fetcher), self.fetch_config.clone());
                Some(orchestrator.fetch(stocks.iter().cloned()).await?)
            }
            None => {
                debug!("No fetcher configured, using stored pages");
                None
            }
        };

        let refiner = MetricsRefiner::new(Arc::clone(&self.store), self.refine_config.clone());
        let periods = refiner.periods()?;
        let engine = InsightEngine::new(self.insight_config.clone())?;
        let as_of = self.insight_config.as_of;

        let mut records = Vec::with_capacity(stocks.len());
        for stock in stocks {
            let record = match refiner.refine(stock, &periods) {
                Ok(series) => engine.insight(stock, &series, as_of),
                Err(e) => {
                    warn!(stock = %stock.code(), error = %e, "Refinement failed");
                    identity_record(stock, as_of)
                }
            };
            records.push(record?);
        }

        info!("Produced {} insight records", records.len());
        Ok(RunOutput { fetch, records })
    }

    /// Writes the stored refined series of each stock to
    /// `{dir}/{code}.refined.parquet`, skipping stocks without one.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    /// Returns an error if the directory or a file cannot be written.
    pub fn export_refined(&self, stocks: &[Stock], dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| SeekerError::Store(format!("create {}: {e}", dir.display())))?;

        let mut written = 0;
        for stock in stocks {
            let Some(series) = self.store.get_refined(stock.code())? else {
                debug!(stock = %stock.code(), "No refined series to export");
                continue;
            };
            let path = dir.join(format!("{}.refined.parquet", stock.code()));
            let file = File::create(&path)
                .map_err(|e| SeekerError::Store(format!("create {}: {e}", path.display())))?;
            series.write_parquet(file)?;
            written += 1;
        }

        info!("Exported {} refined series to {}", written, dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use seeker_core::{FetchSummary, PageKind, PageSource, record::IDENTITY_COLUMNS};
    use seeker_store::InMemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MAIN_METRICS: &str = "\
报告日期,2024-03-31,2023-12-31,2023-09-30,2023-06-30,2023-03-31
主营业务收入(万元),100,90,95,85,80
基本每股收益(元),0.5,1.2,0.9,0.6,0.1
净利润(万元),1000,4000,3000,2000,500
股东权益不含少数股东权益(万元),60000,59000,58000,57000,56000
";

    const PRICES: &str = "\
日期,收盘价,总市值
2024-03-29,10,1000000000
2024-03-31,16,1600000000
";

    /// Writes a fixed set of pages for every stock it is asked about.
    #[derive(Debug)]
    struct SeedingFetcher {
        store: Arc<InMemoryStore>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetcher for SeedingFetcher {
        fn name(&self) -> &str {
            "seeding"
        }

        fn list_sources(&self, _stock: &Stock) -> Vec<PageSource> {
            PageKind::ALL
                .into_iter()
                .map(|page| PageSource::new(page, format!("memory://{page}")))
                .collect()
        }

        async fn fetch(&self, stock: &Stock) -> Result<FetchSummary> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for page in PageKind::ALL {
                let text = match page {
                    PageKind::MainMetrics => MAIN_METRICS,
                    PageKind::PriceHistory => PRICES,
                    _ => "报告日期,2024-03-31\n",
                };
                self.store.put_page(stock.code(), page, text)?;
            }
            Ok(FetchSummary {
                fetched: PageKind::ALL.len(),
                skipped: 0,
            })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pipeline(store: Arc<InMemoryStore>) -> Pipeline {
        Pipeline::new(store)
            .refine_config(
                RefineConfig::default()
                    .with_reference_date(date(2024, 4, 15))
                    .with_seasons(5),
            )
            .insight_config(InsightConfig::default().with_as_of(date(2024, 3, 31)))
    }

    #[tokio::test]
    async fn test_run_fetches_then_scores() {
        let store = Arc::new(InMemoryStore::new());
        let fetcher = Arc::new(SeedingFetcher {
            store: store.clone(),
            calls: AtomicUsize::new(0),
        });

        let output = pipeline(store)
            .with_fetcher(fetcher.clone())
            .run(&[Stock::new("000977", "浪潮信息"), Stock::new("600519", "贵州茅台")])
            .await
            .unwrap();

        let report = output.fetch.unwrap();
        assert_eq!(report.succeeded, 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);

        assert_eq!(output.records.len(), 2);
        let record = &output.records[0];
        assert_eq!(record.get("MarketValue_at_season").unwrap().to_string(), "12.0亿");
        assert_eq!(record.number("revenue_growth_at_season"), Some(25.0));
        assert_eq!(record.number("PE_at_season"), Some(30.0));
        assert_eq!(record.number("PB_at_season"), Some(2.0));
        // Five quarters cannot fill a twelve-quarter window.
        assert!(record.get("12seasons_PE_mean").is_none());
    }

    #[tokio::test]
    async fn test_rerun_reuses_refined_artifact_without_fetching() {
        let store = Arc::new(InMemoryStore::new());
        let fetcher = Arc::new(SeedingFetcher {
            store: store.clone(),
            calls: AtomicUsize::new(0),
        });
        let stocks = [Stock::new("000977", "浪潮信息")];

        let first = pipeline(store.clone())
            .with_fetcher(fetcher.clone())
            .run(&stocks)
            .await
            .unwrap();
        let artifact = store.get_refined(stocks[0].code()).unwrap().unwrap();

        let second = pipeline(store.clone()).run(&stocks).await.unwrap();

        assert!(second.fetch.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.records, second.records);
        assert_eq!(store.get_refined(stocks[0].code()).unwrap(), Some(artifact));
    }

    #[tokio::test]
    async fn test_export_refined_writes_parquet_per_stock() {
        let store = Arc::new(InMemoryStore::new());
        let fetcher = Arc::new(SeedingFetcher {
            store: store.clone(),
            calls: AtomicUsize::new(0),
        });
        let seeded = Stock::new("000977", "浪潮信息");
        let pipeline = pipeline(store).with_fetcher(fetcher);
        pipeline.run(std::slice::from_ref(&seeded)).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("refined");
        let written = pipeline
            .export_refined(&[seeded, Stock::new("600519", "贵州茅台")], &out)
            .unwrap();

        assert_eq!(written, 1);
        let exported = out.join("000977.refined.parquet");
        assert!(std::fs::metadata(&exported).unwrap().len() > 0);
        assert!(!out.join("600519.refined.parquet").exists());
    }

    #[tokio::test]
    async fn test_refinement_failure_yields_identity_record() {
        let store = Arc::new(InMemoryStore::new());
        let output = pipeline(store)
            .run(&[Stock::new("000977", "浪潮信息")])
            .await
            .unwrap();

        assert!(output.fetch.is_none());
        assert_eq!(output.records[0].columns(), IDENTITY_COLUMNS.as_slice());
    }

    #[tokio::test]
    async fn test_invalid_insight_config_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut config = InsightConfig::default();
        config.window = 1;

        let result = pipeline(store).insight_config(config).run(&[]).await;
        assert!(result.is_err());
    }
}
