#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the seeker fundamentals pipeline.
//!
//! This crate provides the foundational abstractions shared by every stage:
//!
//! - [`Fetcher`](fetcher::Fetcher) - Retrieves and persists a stock's raw pages
//! - [`SourceCatalog`](fetcher::SourceCatalog) - Lists a provider's pages for a stock
//! - [`ArtifactStore`](store::ArtifactStore) - Raw page and refined series storage
//! - [`RawPageTable`](page::RawPageTable) - A parsed raw page
//! - [`RefinedSeries`](series::RefinedSeries) - Aligned metric rows for one stock
//! - [`InsightRecord`](record::InsightRecord) - One stock's flat insight output

/// Explicit configuration values.
pub mod config;
/// Error types for pipeline operations.
pub mod error;
/// Fetcher capability traits.
pub mod fetcher;
/// Qualified names of tracked provider metrics.
pub mod labels;
/// Raw page kinds and parsing.
pub mod page;
/// Reporting-period calendar arithmetic.
pub mod period;
/// Insight records.
pub mod record;
/// Refined per-stock series.
pub mod series;
/// Artifact store trait.
pub mod store;
/// Core identity types (StockCode, Stock).
pub mod types;
/// Stock list and portfolio loading.
pub mod universe;

// Re-export commonly used items at crate root
pub use config::{FetchConfig, InsightConfig, InsightMetric, MetricKind, RefineConfig};
pub use error::{Result, SeekerError};
pub use fetcher::{FetchSummary, Fetcher, PageSource, SourceCatalog};
pub use page::{PageKind, RawPageTable};
pub use record::{InsightRecord, InsightValue};
pub use series::RefinedSeries;
pub use store::ArtifactStore;
pub use types::{Stock, StockCode};
