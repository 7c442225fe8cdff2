#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Netease page fetcher.
//!
//! # Example
//!
//! ```no_run
//! use seeker_core::{FetchConfig, Fetcher, Stock};
//! use seeker_netease::{NeteaseSeasonal, PageFetcher};
//! use seeker_store::FsStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FsStore::new("data/raw")?);
//!     let fetcher = PageFetcher::new(NeteaseSeasonal::default(), store, &FetchConfig::default());
//!
//!     let summary = fetcher.fetch(&Stock::new("000977", "浪潮信息")).await?;
//!     println!("fetched {} pages, {} cached", summary.fetched, summary.skipped);
//!     Ok(())
//! }
//! ```

/// Netease page catalog.
pub mod catalog;
/// Page download and persistence.
pub mod fetcher;

pub use catalog::NeteaseSeasonal;
pub use fetcher::PageFetcher;
