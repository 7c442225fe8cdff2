//! Artifact store trait.
//!
//! This module defines the [`ArtifactStore`] trait, the persistence and
//! caching boundary of the pipeline: raw pages written by fetchers and refined
//! series written by the refiner. Presence of an artifact is the cache-hit
//! signal.

use std::fmt::Debug;

use crate::{
    error::Result,
    page::{PageKind, RawPageTable},
    series::RefinedSeries,
    types::StockCode,
};

/// Storage for raw pages and refined series.
///
/// Implementations must be safe to share between fetch workers.
pub trait ArtifactStore: Send + Sync + Debug {
    /// Returns true if the raw page exists.
    fn has_page(&self, code: &StockCode, page: PageKind) -> Result<bool>;

    /// Retrieves raw page text.
    ///
    /// Returns `Ok(Some(text))` if stored, `Ok(None)` if not.
    fn get_page(&self, code: &StockCode, page: PageKind) -> Result<Option<String>>;

    /// Stores raw page text, replacing any previous version.
    fn put_page(&self, code: &StockCode, page: PageKind, text: &str) -> Result<()>;

    /// Returns true if a refined series exists for the stock.
    fn has_refined(&self, code: &StockCode) -> Result<bool>;

    /// Retrieves a refined series.
    ///
    /// Returns `Ok(Some(series))` if stored, `Ok(None)` if not.
    fn get_refined(&self, code: &StockCode) -> Result<Option<RefinedSeries>>;

    /// Stores a refined series, replacing any previous version.
    fn put_refined(&self, code: &StockCode, series: &RefinedSeries) -> Result<()>;

    /// Removes everything.
    fn clear(&self) -> Result<()>;

    /// Retrieves and parses a raw page.
    fn load_table(&self, code: &StockCode, page: PageKind) -> Result<Option<RawPageTable>> {
        self.get_page(code, page)?
            .map(|text| RawPageTable::parse(page, &text))
            .transpose()
    }
}
