//! Student-t confidence ladder.
//!
//! A trailing window of `n` values gives a mean and a sample standard
//! deviation `s`. For each confidence level `c` the interval is
//! `mean ± t(c, n - 1) · s / √n`. Levels are walked from the widest to the
//! narrowest and the first one whose interval the value falls strictly
//! outside of decides the percentile.

use seeker_core::{Result, SeekerError};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

/// Confidence levels, widest first.
pub const CONFIDENCE_LEVELS: [f64; 5] = [0.99, 0.98, 0.95, 0.90, 0.80];

/// Level whose interval is reported alongside the percentile.
pub const REPORTED_CONFIDENCE: f64 = 0.95;

/// Percentile of a value inside every interval.
pub const UNREMARKABLE_PERCENTILE: f64 = 50.0;

/// Two-sided Student-t critical value for `confidence` with `df` degrees of freedom.
pub fn t_critical(confidence: f64, df: usize) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| SeekerError::InvalidParameter(format!("Student-t with df={df}: {e}")))?;
    Ok(dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// A closed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound.
    pub lower: f64,
    /// Upper bound.
    pub upper: f64,
}

/// Mean, spread and percentile of a value against its trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Window mean.
    pub mean: f64,
    /// Reported interval.
    pub interval: Interval,
    /// Percentile in history.
    pub percentile: f64,
}

/// Window mean and sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Bessel-corrected standard deviation.
    pub std_dev: f64,
    /// Window size.
    pub size: usize,
}

impl WindowStats {
    /// Computes the statistics of a window of at least two values.
    #[must_use]
    pub fn new(window: &[f64]) -> Self {
        Self {
            mean: window.iter().mean(),
            std_dev: window.iter().std_dev(),
            size: window.len(),
        }
    }

    fn standard_error(&self) -> f64 {
        self.std_dev / (self.size as f64).sqrt()
    }
}

/// Critical values for every confidence level at a fixed window size.
#[derive(Debug, Clone)]
pub struct ConfidenceLadder {
    window: usize,
    levels: Vec<(f64, f64)>,
}

impl ConfidenceLadder {
    /// Builds the ladder for windows of `window` values.
    pub fn new(window: usize) -> Result<Self> {
        if window < 2 {
            return Err(SeekerError::InvalidParameter(format!(
                "Confidence window needs at least two values, got {window}"
            )));
        }
        let levels = CONFIDENCE_LEVELS
            .iter()
            .map(|&c| t_critical(c, window - 1).map(|t| (c, t)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { window, levels })
    }

    /// Window size the ladder was built for.
    #[must_use]
    pub const fn window(&self) -> usize {
        self.window
    }

    /// The interval at one of the ladder's confidence levels.
    #[must_use]
    pub fn interval(&self, confidence: f64, stats: &WindowStats) -> Option<Interval> {
        let (_, t) = self.levels.iter().find(|(c, _)| *c == confidence)?;
        let half = t * stats.standard_error();
        Some(Interval {
            lower: stats.mean - half,
            upper: stats.mean + half,
        })
    }

    /// Scores `value` against `window`.
    ///
    /// Returns `None` unless the window holds exactly the ladder's size.
    #[must_use]
    pub fn score(&self, value: f64, window: &[f64]) -> Option<Score> {
        if window.len() != self.window {
            return None;
        }
        let stats = WindowStats::new(window);

        let mut percentile = UNREMARKABLE_PERCENTILE;
        for &(confidence, _) in &self.levels {
            let interval = self.interval(confidence, &stats)?;
            let tail = (1.0 - confidence) / 2.0;
            if value > interval.upper {
                percentile = 100.0 * (1.0 - tail);
                break;
            }
            if value < interval.lower {
                percentile = 100.0 * tail;
                break;
            }
        }

        Some(Score {
            mean: stats.mean,
            interval: self.interval(REPORTED_CONFIDENCE, &stats)?,
            percentile,
        })
    }
}
