//! Statistics collection
//!
//! Each worker owns one [`WorkerStats`] and is the only writer. The coordinator
//! reads it once, after the worker's thread has been joined, so plain integers
//! are enough; nothing here is atomic.
//!
//! # Example
//!
//! ```
//! use iopace::stats::{EpochRecord, WorkerStats};
//! use std::time::Duration;
//!
//! let width = Duration::from_millis(10);
//! let mut stats = WorkerStats::new(0);
//!
//! for _ in 0..8 {
//!     stats.record_issue();
//! }
//! stats.record_epoch(
//!     &EpochRecord { sequence: 1, issued: 8, missed: 2, duty_time: Duration::from_millis(11) },
//!     width,
//! );
//!
//! assert_eq!(stats.issued(), 8);
//! assert_eq!(stats.missed(), 2);
//! assert!(stats.mean_duty() > 1.0);
//! ```

pub mod aggregator;
pub mod histogram;

pub use aggregator::{RunReport, StatisticsAggregator};
use histogram::DutyHistogram;
use serde::Serialize;
use std::time::Duration;

/// Outcome of a single epoch
///
/// Produced once per epoch, folded into [`WorkerStats`] and then dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochRecord {
    /// 1-based epoch number within the worker
    pub sequence: u64,
    /// Reads issued during the epoch
    pub issued: u64,
    /// Target reads not issued before the deadline
    pub missed: u64,
    /// Time spent issuing, before the pacing sleep
    pub duty_time: Duration,
}

impl EpochRecord {
    /// Duty time as a fraction of the epoch width
    #[inline]
    pub fn duty_ratio(&self, epoch_width: Duration) -> f64 {
        let width = epoch_width.as_micros() as f64;
        if width > 0.0 {
            self.duty_time.as_micros() as f64 / width
        } else {
            0.0
        }
    }
}

/// Cumulative statistics for one worker
#[derive(Debug, Clone)]
pub struct WorkerStats {
    worker_id: usize,
    issued: u64,
    missed: u64,
    duty_sum: f64,
    epochs: u64,
    duty_times: DutyHistogram,
    run_duration: Duration,
}

impl WorkerStats {
    /// Create empty statistics for a worker
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            issued: 0,
            missed: 0,
            duty_sum: 0.0,
            epochs: 0,
            duty_times: DutyHistogram::new(),
            run_duration: Duration::ZERO,
        }
    }

    /// Count one issued read
    #[inline(always)]
    pub fn record_issue(&mut self) {
        self.issued += 1;
    }

    /// Fold a finished epoch into the running aggregates
    ///
    /// Issued reads are counted as they happen through [`record_issue`](Self::record_issue);
    /// this adds the epoch's misses and duty ratio.
    pub fn record_epoch(&mut self, record: &EpochRecord, epoch_width: Duration) {
        self.missed += record.missed;
        self.duty_sum += record.duty_ratio(epoch_width);
        self.epochs += 1;
        self.duty_times.record(record.duty_time);
    }

    /// Record the worker's total wall-clock runtime
    pub fn set_run_duration(&mut self, duration: Duration) {
        self.run_duration = duration;
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn missed(&self) -> u64 {
        self.missed
    }

    pub fn epochs(&self) -> u64 {
        self.epochs
    }

    pub fn run_duration(&self) -> Duration {
        self.run_duration
    }

    pub fn duty_times(&self) -> &DutyHistogram {
        &self.duty_times
    }

    /// Mean duty ratio over all epochs (0 when no epoch ran)
    pub fn mean_duty(&self) -> f64 {
        if self.epochs == 0 {
            0.0
        } else {
            self.duty_sum / self.epochs as f64
        }
    }

    /// Serializable snapshot for reports
    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            worker_id: self.worker_id,
            issued: self.issued,
            missed: self.missed,
            epochs: self.epochs,
            mean_duty: self.mean_duty(),
            duty_p50_us: micros(self.duty_times.percentile(50.0)),
            duty_p99_us: micros(self.duty_times.percentile(99.0)),
            duty_max_us: micros(self.duty_times.max()),
            run_duration_secs: self.run_duration.as_secs_f64(),
        }
    }
}

pub(crate) fn micros(value: Option<Duration>) -> u64 {
    value.map(|d| d.as_micros() as u64).unwrap_or(0)
}

/// Per-worker numbers as they appear in the JSON report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub issued: u64,
    pub missed: u64,
    pub epochs: u64,
    pub mean_duty: f64,
    pub duty_p50_us: u64,
    pub duty_p99_us: u64,
    pub duty_max_us: u64,
    pub run_duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(sequence: u64, issued: u64, missed: u64, duty_ms: u64) -> EpochRecord {
        EpochRecord {
            sequence,
            issued,
            missed,
            duty_time: Duration::from_millis(duty_ms),
        }
    }

    #[test]
    fn test_new_stats_are_empty() {
        let stats = WorkerStats::new(3);
        assert_eq!(stats.worker_id(), 3);
        assert_eq!(stats.issued(), 0);
        assert_eq!(stats.missed(), 0);
        assert_eq!(stats.epochs(), 0);
        assert_eq!(stats.mean_duty(), 0.0);
    }

    #[test]
    fn test_duty_ratio() {
        let width = Duration::from_millis(100);
        assert_eq!(record(1, 0, 0, 25).duty_ratio(width), 0.25);
        assert_eq!(record(1, 0, 0, 150).duty_ratio(width), 1.5);
        assert_eq!(record(1, 0, 0, 10).duty_ratio(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_mean_duty_over_epochs() {
        let width = Duration::from_millis(100);
        let mut stats = WorkerStats::new(0);
        stats.record_epoch(&record(1, 10, 0, 20), width);
        stats.record_epoch(&record(2, 10, 0, 40), width);
        stats.record_epoch(&record(3, 10, 0, 60), width);

        assert_eq!(stats.epochs(), 3);
        assert!((stats.mean_duty() - 0.4).abs() < 1e-9);
        assert_eq!(stats.duty_times().len(), 3);
    }

    #[test]
    fn test_misses_accumulate() {
        let width = Duration::from_millis(10);
        let mut stats = WorkerStats::new(0);
        stats.record_epoch(&record(1, 6, 4, 11), width);
        stats.record_epoch(&record(2, 10, 0, 5), width);
        stats.record_epoch(&record(3, 7, 3, 12), width);
        assert_eq!(stats.missed(), 7);
    }

    #[test]
    fn test_summary() {
        let width = Duration::from_millis(10);
        let mut stats = WorkerStats::new(2);
        for _ in 0..5 {
            stats.record_issue();
        }
        stats.record_epoch(&record(1, 5, 0, 2), width);
        stats.set_run_duration(Duration::from_millis(10));

        let summary = stats.summary();
        assert_eq!(summary.worker_id, 2);
        assert_eq!(summary.issued, 5);
        assert_eq!(summary.epochs, 1);
        assert!((summary.mean_duty - 0.2).abs() < 1e-9);
        assert!(summary.duty_max_us >= 1990 && summary.duty_max_us <= 2010);
        assert!((summary.run_duration_secs - 0.01).abs() < 1e-9);
    }
}
