//! Error types for pipeline operations.
//!
//! This module defines [`SeekerError`] which covers all error cases that can occur
//! when fetching raw pages, refining them into series, or computing insights.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during pipeline operations.
#[derive(Error, Debug)]
pub enum SeekerError {
    /// Network-related errors (connection failures, timeouts, HTTP status, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Error parsing a raw page, a refined artifact or a configuration value.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading from or writing to the artifact store.
    #[error("Store error: {0}")]
    Store(String),

    /// A raw page required for refinement is absent from the store.
    #[error("Missing raw page {page} for stock {stock}")]
    MissingPage {
        /// Code of the stock being refined.
        stock: String,
        /// Identifier of the missing page.
        page: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A column was registered twice in an insight record.
    #[error("Duplicate insight column: {0}")]
    DuplicateColumn(String),

    /// A value was set for a column that was never registered.
    #[error("Unknown insight column: {0}")]
    UnknownColumn(String),

    /// A fetch worker did not terminate within the shutdown timeout.
    #[error("Fetch worker {worker} did not terminate within {timeout:?}")]
    WorkerStalled {
        /// Index of the stalled worker.
        worker: usize,
        /// The bounded wait that elapsed.
        timeout: Duration,
    },

    /// A fetch worker died outside of a job.
    #[error("Fetch worker {worker} panicked: {message}")]
    WorkerPanicked {
        /// Index of the worker.
        worker: usize,
        /// Panic or join error description.
        message: String,
    },

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl SeekerError {
    /// Returns true for orchestrator-level defects that must abort a run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::WorkerStalled { .. } | Self::WorkerPanicked { .. }
        )
    }
}

/// Result type alias using [`SeekerError`].
pub type Result<T> = std::result::Result<T, SeekerError>;
