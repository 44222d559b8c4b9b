//! Run-level aggregation
//!
//! Folds the statistics of every joined worker into a [`RunReport`]. Workers
//! that failed during setup contribute nothing but their id; there are no
//! partial results.
//!
//! # Example
//!
//! ```
//! use iopace::config::{CompletionMode, RunParams};
//! use iopace::stats::{aggregator::StatisticsAggregator, WorkerStats};
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! let config = RunParams {
//!     device: PathBuf::from("/dev/nvme0n1"),
//!     io_size_kib: 4,
//!     target_iops: 1000,
//!     epoch_width_us: 320_000,
//!     completion: CompletionMode::Interrupt,
//!     runtime_secs: 2,
//!     workers: 2,
//!     label: "INT".to_string(),
//!     direct: true,
//!     stagger_ms: 50,
//! }
//! .into_run_config()
//! .unwrap();
//!
//! let mut aggregator = StatisticsAggregator::new();
//! aggregator.add_worker(WorkerStats::new(0));
//! aggregator.add_failure(1);
//!
//! let report = aggregator.finish(&config, Duration::from_secs(2));
//! assert_eq!(report.workers.len(), 1);
//! assert_eq!(report.failed_workers, vec![1]);
//! ```

use super::histogram::DutyHistogram;
use super::{micros, WorkerStats, WorkerSummary};
use crate::config::{CompletionMode, RunConfig};
use crate::util::time::{calculate_iops, calculate_throughput};
use serde::Serialize;
use std::time::Duration;

/// Collects worker results as they are joined
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    workers: Vec<WorkerStats>,
    failed: Vec<usize>,
}

impl StatisticsAggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the statistics of a worker that completed
    pub fn add_worker(&mut self, stats: WorkerStats) {
        self.workers.push(stats);
    }

    /// Record a worker that produced no statistics
    pub fn add_failure(&mut self, worker_id: usize) {
        self.failed.push(worker_id);
    }

    /// Number of workers that completed
    pub fn completed(&self) -> usize {
        self.workers.len()
    }

    /// Build the final report
    ///
    /// `elapsed` is the coordinator's wall-clock time from first launch to last
    /// join; achieved IOPS and throughput are computed against it.
    pub fn finish(mut self, config: &RunConfig, elapsed: Duration) -> RunReport {
        self.workers.sort_by_key(|w| w.worker_id());
        self.failed.sort_unstable();

        let total_issued: u64 = self.workers.iter().map(|w| w.issued()).sum();
        let total_missed: u64 = self.workers.iter().map(|w| w.missed()).sum();

        let mean_duty = if self.workers.is_empty() {
            0.0
        } else {
            self.workers.iter().map(|w| w.mean_duty()).sum::<f64>() / self.workers.len() as f64
        };

        let mut duty_times = DutyHistogram::new();
        for worker in &self.workers {
            duty_times.merge(worker.duty_times());
        }

        RunReport {
            label: config.label.clone(),
            device: config.device.display().to_string(),
            completion: config.completion,
            io_size: config.io_size,
            epoch_width_us: config.epoch_width_us,
            ios_per_epoch: config.ios_per_epoch,
            configured_runtime_secs: config.total_runtime.as_secs_f64(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            host: host_name(),
            elapsed_secs: elapsed.as_secs_f64(),
            total_issued,
            total_missed,
            achieved_iops: calculate_iops(total_issued, elapsed),
            throughput_bytes_per_sec: calculate_throughput(
                total_issued.saturating_mul(config.io_size as u64),
                elapsed,
            ),
            mean_duty,
            duty_p50_us: micros(duty_times.percentile(50.0)),
            duty_p99_us: micros(duty_times.percentile(99.0)),
            duty_max_us: micros(duty_times.max()),
            workers: self.workers.iter().map(WorkerStats::summary).collect(),
            failed_workers: self.failed,
        }
    }
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Final results of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub label: String,
    pub device: String,
    pub completion: CompletionMode,
    pub io_size: usize,
    pub epoch_width_us: u64,
    pub ios_per_epoch: u64,
    pub configured_runtime_secs: f64,
    pub timestamp: String,
    pub host: String,
    pub elapsed_secs: f64,
    pub total_issued: u64,
    pub total_missed: u64,
    pub achieved_iops: f64,
    pub throughput_bytes_per_sec: f64,
    pub mean_duty: f64,
    pub duty_p50_us: u64,
    pub duty_p99_us: u64,
    pub duty_max_us: u64,
    pub workers: Vec<WorkerSummary>,
    pub failed_workers: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_params;
    use crate::stats::EpochRecord;

    fn worker(id: usize, epochs: u64, target: u64, missed_per_epoch: u64) -> WorkerStats {
        let width = Duration::from_millis(100);
        let mut stats = WorkerStats::new(id);
        for sequence in 1..=epochs {
            let issued = target - missed_per_epoch;
            for _ in 0..issued {
                stats.record_issue();
            }
            stats.record_epoch(
                &EpochRecord {
                    sequence,
                    issued,
                    missed: missed_per_epoch,
                    duty_time: Duration::from_millis(50),
                },
                width,
            );
        }
        stats
    }

    #[test]
    fn test_totals_and_rates() {
        let config = test_params().into_run_config().unwrap();
        let mut aggregator = StatisticsAggregator::new();
        aggregator.add_worker(worker(1, 4, 320, 0));
        aggregator.add_worker(worker(0, 4, 320, 20));

        let report = aggregator.finish(&config, Duration::from_secs(2));
        assert_eq!(report.total_issued, 4 * 320 + 4 * 300);
        assert_eq!(report.total_missed, 80);
        assert_eq!(report.achieved_iops, (4 * 320 + 4 * 300) as f64 / 2.0);
        assert_eq!(
            report.throughput_bytes_per_sec,
            ((4 * 320 + 4 * 300) * 4096) as f64 / 2.0
        );
        assert!((report.mean_duty - 0.5).abs() < 1e-9);
        assert!(report.duty_p50_us >= 49_990 && report.duty_p50_us <= 50_050);
        // Sorted by worker id
        assert_eq!(report.workers[0].worker_id, 0);
        assert_eq!(report.workers[1].worker_id, 1);
        assert!(report.failed_workers.is_empty());
    }

    #[test]
    fn test_failed_workers_only() {
        let config = test_params().into_run_config().unwrap();
        let mut aggregator = StatisticsAggregator::new();
        aggregator.add_failure(2);
        aggregator.add_failure(0);
        assert_eq!(aggregator.completed(), 0);

        let report = aggregator.finish(&config, Duration::from_secs(1));
        assert_eq!(report.failed_workers, vec![0, 2]);
        assert_eq!(report.total_issued, 0);
        assert_eq!(report.mean_duty, 0.0);
        assert_eq!(report.duty_max_us, 0);
    }
}
