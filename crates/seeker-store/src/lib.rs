#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/seeker/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Artifact store implementations for the seeker pipeline.
//!
//! This crate provides implementations of the [`ArtifactStore`] trait from `seeker-core`:
//!
//! - [`FsStore`] - A directory of CSV files (default)
//! - [`InMemoryStore`] - Simple in-memory store for testing
//! - [`SqliteStore`] - Single-file SQLite store (requires `sqlite` feature)

/// File-system store implementation.
pub mod fs;
/// In-memory store implementation.
pub mod memory;

/// SQLite-based store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use seeker_core::ArtifactStore;

// Re-export implementations
pub use fs::FsStore;
pub use memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
