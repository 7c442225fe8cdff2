//! In-memory store implementation.

use seeker_core::{ArtifactStore, PageKind, RefinedSeries, Result, SeekerError, StockCode};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, instrument};

/// Key for raw page entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageKey {
    code: StockCode,
    page: PageKind,
}

/// Simple in-memory store for testing and development.
///
/// Data is stored in `RwLock`-protected `HashMap`s and is lost when the store
/// is dropped. Values are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pages: RwLock<HashMap<PageKey, String>>,
    refined: RwLock<HashMap<StockCode, RefinedSeries>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of raw pages held.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.read().map(|p| p.len()).unwrap_or_default()
    }
}

fn poisoned<T>(e: PoisonError<T>) -> SeekerError {
    SeekerError::Store(e.to_string())
}

impl ArtifactStore for InMemoryStore {
    fn has_page(&self, code: &StockCode, page: PageKind) -> Result<bool> {
        let key = PageKey {
            code: code.clone(),
            page,
        };
        Ok(self.pages.read().map_err(poisoned)?.contains_key(&key))
    }

    #[instrument(skip(self), fields(stock = %code, page = %page))]
    fn get_page(&self, code: &StockCode, page: PageKind) -> Result<Option<String>> {
        let key = PageKey {
            code: code.clone(),
            page,
        };
        let pages = self.pages.read().map_err(poisoned)?;
        match pages.get(&key) {
            Some(text) => {
                debug!("Store hit for raw page");
                Ok(Some(text.clone()))
            }
            None => {
                debug!("Store miss for raw page");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, text), fields(stock = %code, page = %page))]
    fn put_page(&self, code: &StockCode, page: PageKind, text: &str) -> Result<()> {
        let key = PageKey {
            code: code.clone(),
            page,
        };
        self.pages
            .write()
            .map_err(poisoned)?
            .insert(key, text.to_string());
        debug!("Stored {} bytes", text.len());
        Ok(())
    }

    fn has_refined(&self, code: &StockCode) -> Result<bool> {
        Ok(self.refined.read().map_err(poisoned)?.contains_key(code))
    }

    #[instrument(skip(self), fields(stock = %code))]
    fn get_refined(&self, code: &StockCode) -> Result<Option<RefinedSeries>> {
        Ok(self.refined.read().map_err(poisoned)?.get(code).cloned())
    }

    #[instrument(skip(self, series), fields(stock = %code))]
    fn put_refined(&self, code: &StockCode, series: &RefinedSeries) -> Result<()> {
        self.refined
            .write()
            .map_err(poisoned)?
            .insert(code.clone(), series.clone());
        debug!("Stored refined series with {} rows", series.len());
        Ok(())
    }

    #[instrument(skip(self))]
    fn clear(&self) -> Result<()> {
        self.pages.write().map_err(poisoned)?.clear();
        self.refined.write().map_err(poisoned)?.clear();
        debug!("Cleared all store entries");
        Ok(())
    }
}
