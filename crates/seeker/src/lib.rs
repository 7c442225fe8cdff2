#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Quarterly fundamentals pipeline.
//!
//! This crate re-exports the core types and every stage of the pipeline, and
//! provides a [`Pipeline`] composing them per stock:
//! fetch → refine → insight.
//!
//! # Features
//!
//! - `netease` - Netease page fetcher
//! - `sqlite` - SQLite artifact store

// Core types and traits
pub use seeker_core::*;

// Stores
#[cfg(feature = "sqlite")]
pub use seeker_store::SqliteStore;
pub use seeker_store::{FsStore, InMemoryStore};

// Stages
pub use seeker_fetch::{FetchOrchestrator, FetchReport};
pub use seeker_insight::{InsightEngine, insight_header, write_csv};
pub use seeker_refine::MetricsRefiner;

// Providers
#[cfg(feature = "netease")]
pub use seeker_netease::{NeteaseSeasonal, PageFetcher};

mod pipeline;
pub use pipeline::{Pipeline, RunOutput};
