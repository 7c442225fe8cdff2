#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Statistical insight over refined series.
//!
//! - [`InsightEngine`] - Scores one stock at an as-of period
//! - [`ConfidenceLadder`] - Student-t intervals and percentile assignment
//! - [`insight_header`] / [`write_csv`] - Lays out many records as a table

/// Per-stock insight computation.
pub mod engine;
/// Student-t confidence ladder.
pub mod ladder;
/// Tabular layout of many insight records.
pub mod output;

pub use engine::{InsightEngine, format_market_value, identity_record};
pub use ladder::{ConfidenceLadder, Score};
pub use output::{insight_header, write_csv};
