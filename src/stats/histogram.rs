//! Epoch duty-time histogram using HdrHistogram
//!
//! Records how long each epoch spent issuing reads (before the pacing sleep), in
//! microseconds. The mean duty ratio hides the tail; the histogram shows how
//! often epochs ran close to, or past, their deadline.
//!
//! # Example
//!
//! ```
//! use iopace::stats::histogram::DutyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = DutyHistogram::new();
//! hist.record(Duration::from_micros(150));
//! hist.record(Duration::from_millis(3));
//!
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(99.0).unwrap() >= Duration::from_micros(2990));
//! ```

use hdrhistogram::Histogram;
use std::time::Duration;

/// Largest trackable duty time: one hour, in microseconds
const MAX_DUTY_US: u64 = 3_600_000_000;

/// Histogram of per-epoch duty times
///
/// Tracks 1us to 1 hour with 3 significant digits.
#[derive(Debug, Clone)]
pub struct DutyHistogram {
    histogram: Histogram<u64>,
}

impl DutyHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_DUTY_US, 3)
            .expect("Failed to create histogram with valid bounds");

        Self { histogram }
    }

    /// Record one epoch's duty time, clamped to the trackable range
    #[inline]
    pub fn record(&mut self, duty_time: Duration) {
        let micros = duty_time.as_micros().min(MAX_DUTY_US as u128) as u64;
        let _ = self.histogram.record(micros.max(1));
    }

    /// Duty time at a percentile (0.0 - 100.0), or None when empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_micros(self.histogram.value_at_percentile(percentile)))
    }

    /// Longest recorded duty time, or None when empty
    pub fn max(&self) -> Option<Duration> {
        if self.histogram.len() == 0 {
            return None;
        }
        Some(Duration::from_micros(self.histogram.max()))
    }

    /// Number of recorded epochs
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    /// True when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Fold another worker's histogram into this one
    pub fn merge(&mut self, other: &DutyHistogram) {
        // Identical bounds on both sides, so the add cannot overflow the range
        let _ = self.histogram.add(&other.histogram);
    }
}

impl Default for DutyHistogram {
    fn default() -> Self {
        Self::new()
    }
}
