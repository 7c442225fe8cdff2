#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Metrics refinement.

/// Derived metric formulas.
pub mod derive;
/// Refinement of raw pages into a per-stock series.
pub mod refiner;

pub use refiner::MetricsRefiner;
