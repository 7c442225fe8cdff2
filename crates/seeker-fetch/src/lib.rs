#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Bounded fetch worker pool.

/// Bounded worker pool over fetch jobs.
pub mod orchestrator;

pub use orchestrator::{FetchOrchestrator, FetchReport};
