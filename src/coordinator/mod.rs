//! Coordinator module
//!
//! Launches one worker thread per configured worker, staggered by a short delay
//! so the workers' epochs do not start in lockstep, then waits for every one of
//! them and folds their statistics into a [`RunReport`].
//!
//! A worker that fails during setup (device open, buffer allocation) logs the
//! failure itself and is recorded as failed; its siblings keep running. Failing
//! to create a thread at all ends the run at once: workers already launched are
//! neither joined nor cancelled, and exit with the process.

use crate::config::RunConfig;
use crate::error::PaceError;
use crate::stats::{RunReport, StatisticsAggregator, WorkerStats};
use crate::util::fast_time::FastInstant;
use crate::worker::Worker;
use std::io;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

type WorkerHandle = JoinHandle<crate::Result<WorkerStats>>;

/// Start a worker on its own named thread
fn spawn_worker(worker: Worker) -> io::Result<WorkerHandle> {
    thread::Builder::new()
        .name(format!("iopace-worker-{}", worker.id()))
        .spawn(move || worker.run())
}

/// Runs a set of workers against one device
pub struct Coordinator {
    config: RunConfig,
}

impl Coordinator {
    /// Create a coordinator for a validated configuration
    pub fn new(config: RunConfig) -> Result<Self, PaceError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration every worker receives a copy of
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every worker with the default engine and distribution
    pub fn run(&self) -> Result<RunReport, PaceError> {
        self.run_with(Worker::new)
    }

    /// Run every worker, building each one with `make_worker`
    ///
    /// `make_worker` receives the worker id and that worker's own copy of the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PaceError::Spawn`] as soon as a worker thread cannot be
    /// created, without waiting for the workers already launched.
    pub fn run_with<F>(&self, make_worker: F) -> Result<RunReport, PaceError>
    where
        F: Fn(usize, RunConfig) -> Worker,
    {
        self.launch(make_worker, spawn_worker)
    }

    fn launch<F, S>(&self, make_worker: F, mut spawn: S) -> Result<RunReport, PaceError>
    where
        F: Fn(usize, RunConfig) -> Worker,
        S: FnMut(Worker) -> io::Result<WorkerHandle>,
    {
        let num_workers = self.config.num_workers;
        info!(
            label = %self.config.label,
            device = %self.config.device.display(),
            workers = num_workers,
            ios_per_epoch = self.config.ios_per_epoch,
            epoch_width_us = self.config.epoch_width_us,
            completion = %self.config.completion,
            "starting run"
        );

        let start = FastInstant::now();
        let mut handles: Vec<(usize, WorkerHandle)> = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            if id > 0 && !self.config.stagger.is_zero() {
                thread::sleep(self.config.stagger);
            }

            let worker = make_worker(id, self.config.clone());
            match spawn(worker) {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    error!(
                        worker = id,
                        running = handles.len(),
                        error = %source,
                        "failed to spawn worker, aborting run"
                    );
                    return Err(PaceError::Spawn {
                        worker_id: id,
                        source,
                    });
                }
            }
        }

        let mut aggregator = StatisticsAggregator::new();
        for (id, handle) in handles {
            match handle.join() {
                Ok(Ok(stats)) => aggregator.add_worker(stats),
                Ok(Err(e)) => {
                    // Already logged by the worker when it happened
                    debug!(worker = id, error = %format!("{:#}", e), "worker failed");
                    aggregator.add_failure(id);
                }
                Err(_) => {
                    error!(worker = id, "worker thread panicked");
                    aggregator.add_failure(id);
                }
            }
        }

        let elapsed = start.elapsed();
        info!(
            completed = aggregator.completed(),
            elapsed_secs = elapsed.as_secs_f64(),
            "all workers joined"
        );

        Ok(aggregator.finish(&self.config, elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompletionMode, MAX_WORKERS, SECTOR_SIZE};
    use crate::distribution::uniform::UniformDistribution;
    use crate::engine::mock::MockEngine;
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    fn device_image(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("device.img");
        std::fs::write(&path, vec![0u8; 2048 * SECTOR_SIZE]).unwrap();
        path
    }

    fn config(device: &Path, num_workers: usize) -> RunConfig {
        RunConfig {
            device: device.to_path_buf(),
            io_size: 4096,
            ios_per_epoch: 20,
            epoch_width_us: 10_000,
            completion: CompletionMode::Interrupt,
            total_runtime: Duration::from_millis(50),
            label: "TEST".to_string(),
            direct: false,
            num_workers,
            stagger: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_rejects_too_many_workers() {
        let dir = TempDir::new().unwrap();
        let device = device_image(&dir);
        let result = Coordinator::new(config(&device, MAX_WORKERS + 1));
        assert!(matches!(result, Err(PaceError::Configuration(_))));
    }

    #[test]
    fn test_runs_and_joins_every_worker() {
        let dir = TempDir::new().unwrap();
        let device = device_image(&dir);
        let engine = MockEngine::new();

        let coordinator = Coordinator::new(config(&device, 4)).unwrap();
        let report = coordinator
            .run_with(|id, config| {
                Worker::with_parts(
                    id,
                    config,
                    Box::new(engine.clone()),
                    Box::new(UniformDistribution::with_seed(id as u64)),
                )
            })
            .unwrap();

        assert_eq!(report.workers.len(), 4);
        assert!(report.failed_workers.is_empty());
        let ids: Vec<usize> = report.workers.iter().map(|w| w.worker_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);

        assert_eq!(report.total_missed, 0);
        assert_eq!(report.total_issued, engine.submitted_count() as u64);
        for worker in &report.workers {
            assert_eq!(worker.issued, 20 * worker.epochs);
        }
        // Three stagger delays plus at least one full run
        assert!(report.elapsed_secs >= 0.065, "elapsed = {}", report.elapsed_secs);
    }

    #[test]
    fn test_failed_worker_does_not_stop_siblings() {
        let dir = TempDir::new().unwrap();
        let device = device_image(&dir);
        let missing = dir.path().join("missing.img");
        let engine = MockEngine::new();

        let coordinator = Coordinator::new(config(&device, 3)).unwrap();
        let report = coordinator
            .run_with(|id, mut config| {
                if id == 1 {
                    config.device = missing.clone();
                }
                Worker::with_parts(
                    id,
                    config,
                    Box::new(engine.clone()),
                    Box::new(UniformDistribution::with_seed(7)),
                )
            })
            .unwrap();

        assert_eq!(report.failed_workers, vec![1]);
        assert_eq!(report.workers.len(), 2);
        assert!(report.workers.iter().all(|w| w.issued > 0));
    }

    #[test]
    fn test_spawn_failure_returns_without_joining() {
        let dir = TempDir::new().unwrap();
        let device = device_image(&dir);
        let engine = MockEngine::new();

        let mut config = config(&device, 4);
        config.total_runtime = Duration::from_secs(2);
        let coordinator = Coordinator::new(config).unwrap();

        let started = FastInstant::now();
        let result = coordinator.launch(
            |id, config| {
                Worker::with_parts(
                    id,
                    config,
                    Box::new(engine.clone()),
                    Box::new(UniformDistribution::with_seed(id as u64)),
                )
            },
            |worker| {
                if worker.id() == 2 {
                    Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit reached"))
                } else {
                    spawn_worker(worker)
                }
            },
        );

        match result {
            Err(PaceError::Spawn { worker_id, .. }) => assert_eq!(worker_id, 2),
            other => panic!("unexpected result: {:?}", other.map(|r| r.workers.len())),
        }
        // Workers 0 and 1 are still pacing for their full two seconds
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "elapsed = {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_default_run_against_image() {
        let dir = TempDir::new().unwrap();
        let device = device_image(&dir);

        let coordinator = Coordinator::new(config(&device, 2)).unwrap();
        assert_eq!(coordinator.config().num_workers, 2);

        let report = coordinator.run().unwrap();
        assert_eq!(report.workers.len(), 2);
        assert!(report.total_issued > 0);
        assert_eq!(report.label, "TEST");
    }
}
