//! Fetcher capability traits.
//!
//! - [`SourceCatalog`] - Which pages exist for a stock and where to get them
//! - [`Fetcher`] - Retrieves and persists every raw page of a stock
//!
//! Provider-specific behaviour is selected by composing a fetcher with a
//! catalog rather than by specialising a base type.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{error::Result, page::PageKind, types::Stock};

/// Location of one raw page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    /// The logical page.
    pub page: PageKind,
    /// Where to download it from.
    pub url: String,
}

impl PageSource {
    /// Creates a page source.
    #[must_use]
    pub fn new(page: PageKind, url: impl Into<String>) -> Self {
        Self {
            page,
            url: url.into(),
        }
    }
}

/// Outcome of a successful fetch of one stock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    /// Pages downloaded and written to the store.
    pub fetched: usize,
    /// Pages already present in the store and left untouched.
    pub skipped: usize,
}

/// Lists the raw pages a provider publishes for a stock.
pub trait SourceCatalog: Send + Sync + Debug {
    /// Returns the name of the provider (e.g., "Netease").
    fn name(&self) -> &str;

    /// Returns every page to fetch for `stock`.
    fn list_sources(&self, stock: &Stock) -> Vec<PageSource>;
}

/// Retrieves all raw pages for a stock and persists them.
///
/// Implementations may fail per page; a failure is reported for the whole
/// stock once every page has been attempted.
#[async_trait]
pub trait Fetcher: Send + Sync + Debug {
    /// Returns the name of this fetcher.
    fn name(&self) -> &str;

    /// Returns every page this fetcher would retrieve for `stock`.
    fn list_sources(&self, stock: &Stock) -> Vec<PageSource>;

    /// Fetches and persists the pages of one stock.
    async fn fetch(&self, stock: &Stock) -> Result<FetchSummary>;
}
