//! Bounded worker pool over fetch jobs.

use futures::FutureExt;
use seeker_core::{FetchConfig, FetchSummary, Fetcher, Result, SeekerError, Stock, StockCode};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Result of one fetch run.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Jobs handed to the fetcher.
    pub attempted: usize,
    /// Jobs whose fetch succeeded.
    pub succeeded: usize,
    /// Jobs whose fetch failed, with the reason.
    pub failed: Vec<(StockCode, String)>,
    /// Pages downloaded across all jobs.
    pub pages_fetched: usize,
    /// Pages found in the store across all jobs.
    pub pages_skipped: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl FetchReport {
    /// Returns true if every job succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: JobOutcome) {
        self.attempted += 1;
        match outcome.result {
            Ok(summary) => {
                self.succeeded += 1;
                self.pages_fetched += summary.fetched;
                self.pages_skipped += summary.skipped;
            }
            Err(reason) => self.failed.push((outcome.code, reason)),
        }
    }
}

/// What a worker reports back for one job.
#[derive(Debug)]
struct JobOutcome {
    code: StockCode,
    result: std::result::Result<FetchSummary, String>,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Stock>>>;

/// Drives a [`Fetcher`] over many stocks with a bounded pool of workers.
///
/// The job queue is the only state shared between workers. Its capacity
/// equals `max_workers`, so the caller waits while the queue is full. Closing
/// the queue is the "no more jobs" signal; a worker exits once the queue is
/// closed and empty.
#[derive(Debug, Clone)]
pub struct FetchOrchestrator {
    fetcher: Arc<dyn Fetcher>,
    config: FetchConfig,
}

impl FetchOrchestrator {
    /// Creates an orchestrator.
    pub fn new(fetcher: Arc<dyn Fetcher>, config: FetchConfig) -> Self {
        Self { fetcher, config }
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches every stock exactly once and waits for all workers to exit.
    ///
    /// Jobs are pulled from `jobs` only as queue slots free up.
    ///
    /// Fetch failures are isolated per job and collected in the report.
    ///
    /// # Errors
    /// Returns [`SeekerError::InvalidParameter`] for an invalid configuration,
    /// and [`SeekerError::WorkerStalled`] or [`SeekerError::WorkerPanicked`]
    /// if a worker fails to terminate cleanly.
    #[instrument(skip(self, jobs), fields(fetcher = %self.fetcher.name()))]
    pub async fn fetch<I>(&self, jobs: I) -> Result<FetchReport>
    where
        I: IntoIterator<Item = Stock>,
        I::IntoIter: ExactSizeIterator,
    {
        self.config.validate()?;
        let start = Instant::now();

        let jobs = jobs.into_iter();
        let total = jobs.len();
        if total == 0 {
            debug!("No jobs to fetch");
            return Ok(FetchReport::default());
        }

        let worker_count = total.min(self.config.max_workers);
        info!("Fetching {} stocks with {} workers", total, worker_count);

        let (job_tx, job_rx) = mpsc::channel::<Stock>(self.config.max_workers);
        let job_rx: JobQueue = Arc::new(Mutex::new(job_rx));
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<JobOutcome>();

        let handles: Vec<JoinHandle<()>> = (0..worker_count)
            .map(|id| {
                let fetcher = Arc::clone(&self.fetcher);
                let jobs = Arc::clone(&job_rx);
                let outcomes = outcome_tx.clone();
                tokio::spawn(worker(id, fetcher, jobs, outcomes))
            })
            .collect();
        drop(outcome_tx);

        for job in jobs {
            job_tx
                .send(job)
                .await
                .map_err(|e| SeekerError::Other(format!("Job queue closed early: {}", e)))?;
        }
        drop(job_tx);

        let mut report = FetchReport::default();
        while report.attempted < total {
            match outcome_rx.recv().await {
                Some(outcome) => report.record(outcome),
                None => {
                    error!(
                        attempted = report.attempted,
                        total, "All workers exited before the queue drained"
                    );
                    break;
                }
            }
        }

        join_workers(handles, self.config.shutdown_timeout).await?;

        report.elapsed = start.elapsed();
        info!(
            succeeded = report.succeeded,
            failed = report.failed.len(),
            pages_fetched = report.pages_fetched,
            pages_skipped = report.pages_skipped,
            "Fetch completed in {:?}",
            report.elapsed
        );
        Ok(report)
    }
}

/// Consumes jobs until the queue is closed and empty.
async fn worker(
    id: usize,
    fetcher: Arc<dyn Fetcher>,
    jobs: JobQueue,
    outcomes: mpsc::UnboundedSender<JobOutcome>,
) {
    debug!(worker = id, "Fetch worker started");

    loop {
        let next = jobs.lock().await.recv().await;
        let Some(stock) = next else {
            break;
        };

        debug!(worker = id, stock = %stock.code(), "Processing");
        let result = match AssertUnwindSafe(fetcher.fetch(&stock))
            .catch_unwind()
            .await
        {
            Ok(Ok(summary)) => Ok(summary),
            Ok(Err(e)) => {
                warn!(worker = id, stock = %stock.code(), error = %e, "Fetch failed");
                Err(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(worker = id, stock = %stock.code(), "Fetch panicked: {}", message);
                Err(format!("panicked: {message}"))
            }
        };

        let outcome = JobOutcome {
            code: stock.code().clone(),
            result,
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }

    debug!(worker = id, "Fetch worker shutdown");
}

/// Waits up to `limit` for each worker to exit.
async fn join_workers(handles: Vec<JoinHandle<()>>, limit: Duration) -> Result<()> {
    for (id, mut handle) in handles.into_iter().enumerate() {
        match timeout(limit, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(worker = id, "Fetch worker terminated abnormally: {}", e);
                return Err(SeekerError::WorkerPanicked {
                    worker: id,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                handle.abort();
                error!(worker = id, "Fetch worker did not exit within {:?}", limit);
                return Err(SeekerError::WorkerStalled {
                    worker: id,
                    timeout: limit,
                });
            }
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
