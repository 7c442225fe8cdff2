//! Page download and persistence.

use async_trait::async_trait;
use seeker_core::{
    ArtifactStore, FetchConfig, FetchSummary, Fetcher, PageSource, Result, SeekerError,
    SourceCatalog, Stock,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

/// Page bodies are served in GBK.
const PAGE_CHARSET: &str = "gbk";

/// Rate limiter spacing out requests from one fetcher.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now()
                .checked_sub(min_interval)
                .unwrap_or_else(Instant::now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Downloads the pages listed by a [`SourceCatalog`] into an [`ArtifactStore`].
///
/// A page that fails to download is logged and skipped; the remaining pages
/// of the stock are still attempted and the stock's fetch then reports an
/// error naming every failed page.
#[derive(Debug)]
pub struct PageFetcher<C> {
    catalog: C,
    store: Arc<dyn ArtifactStore>,
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    force_refetch: bool,
}

impl<C: SourceCatalog> PageFetcher<C> {
    /// Creates a fetcher with a default HTTP client (30 second timeout).
    pub fn new(catalog: C, store: Arc<dyn ArtifactStore>, config: &FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self::with_client(catalog, store, config, client)
    }

    /// Creates a fetcher with a custom HTTP client.
    pub fn with_client(
        catalog: C,
        store: Arc<dyn ArtifactStore>,
        config: &FetchConfig,
        client: reqwest::Client,
    ) -> Self {
        Self {
            catalog,
            store,
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.rate_limit))),
            force_refetch: config.force_refetch,
        }
    }

    /// The catalog this fetcher downloads from.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    async fn download(&self, url: &str) -> Result<String> {
        self.rate_limiter.lock().await.wait().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SeekerError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SeekerError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                url
            )));
        }

        response
            .text_with_charset(PAGE_CHARSET)
            .await
            .map_err(|e| SeekerError::Network(e.to_string()))
    }

    /// Fetches one page unless it is already stored. Returns true if downloaded.
    async fn fetch_page(&self, stock: &Stock, source: &PageSource) -> Result<bool> {
        let code = stock.code();
        if !self.force_refetch && self.store.has_page(code, source.page)? {
            debug!(page = %source.page, "Page exists, skip fetching");
            return Ok(false);
        }

        debug!(page = %source.page, url = %source.url, "Fetching page");
        let body = self.download(&source.url).await?;
        self.store.put_page(code, source.page, &body)?;
        Ok(true)
    }
}

#[async_trait]
impl<C: SourceCatalog> Fetcher for PageFetcher<C> {
    fn name(&self) -> &str {
        self.catalog.name()
    }

    fn list_sources(&self, stock: &Stock) -> Vec<PageSource> {
        self.catalog.list_sources(stock)
    }

    #[instrument(skip(self, stock), fields(provider = %self.catalog.name(), stock = %stock.code()))]
    async fn fetch(&self, stock: &Stock) -> Result<FetchSummary> {
        info!("Fetching {}", stock);
        let mut summary = FetchSummary::default();
        let mut failed = Vec::new();

        for source in self.catalog.list_sources(stock) {
            match self.fetch_page(stock, &source).await {
                Ok(true) => summary.fetched += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(page = %source.page, error = %e, "Failed to fetch page");
                    failed.push(source.page.to_string());
                }
            }
        }

        if failed.is_empty() {
            debug!(
                fetched = summary.fetched,
                skipped = summary.skipped,
                "Fetched all pages"
            );
            Ok(summary)
        } else {
            Err(SeekerError::Network(format!(
                "{} failed to fetch {} page(s): {}",
                stock.code(),
                failed.len(),
                failed.join(", ")
            )))
        }
    }
}
