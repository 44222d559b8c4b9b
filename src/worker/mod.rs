//! Worker thread implementation (epoch pacer)
//!
//! A worker opens its own device handle, allocates one aligned buffer and then
//! runs epochs until the configured runtime has elapsed. Within each epoch it
//! issues reads until it reaches the per-epoch target or the epoch deadline
//! passes, counts the shortfall as missed, and sleeps off whatever is left of
//! the epoch so the next one starts on schedule.
//!
//! ```text
//! |<------------------ epoch width ------------------>|
//! |  issue reads (duty time)   |   sleep (slack)      |
//! ```
//!
//! An epoch that overruns its width skips the sleep. Overruns are never made up
//! for in later epochs.
//!
//! # Example
//!
//! ```no_run
//! use iopace::config::{CompletionMode, RunParams};
//! use iopace::worker::Worker;
//! use std::path::PathBuf;
//!
//! let config = RunParams {
//!     device: PathBuf::from("/dev/nvme0n1"),
//!     io_size_kib: 4,
//!     target_iops: 1000,
//!     epoch_width_us: 320_000,
//!     completion: CompletionMode::Polled,
//!     runtime_secs: 10,
//!     workers: 1,
//!     label: "HP".to_string(),
//!     direct: true,
//!     stagger_ms: 50,
//! }
//! .into_run_config()?;
//!
//! let stats = Worker::new(0, config).run()?;
//! println!("issued {} missed {}", stats.issued(), stats.missed());
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::{RunConfig, SECTOR_SIZE};
use crate::distribution::{uniform::UniformDistribution, SectorDistribution};
use crate::engine::{sync::SyncEngine, ReadEngine, ReadOp};
use crate::stats::{EpochRecord, WorkerStats};
use crate::target::DeviceHandle;
use crate::util::buffer::AlignedBuffer;
use crate::util::fast_time::FastInstant;
use crate::Result;
use std::time::Duration;
use tracing::{debug, error, trace};

/// Epoch-paced read worker
///
/// Owns everything it touches: its configuration copy, engine, offset
/// distribution, and (once running) the device handle and buffer. Nothing is
/// shared with sibling workers.
pub struct Worker {
    /// Worker ID (for identification in logs and reports)
    id: usize,

    /// Owned configuration
    config: RunConfig,

    /// Engine issuing the reads
    engine: Box<dyn ReadEngine>,

    /// Sector offset generator, seeded once per worker
    distribution: Box<dyn SectorDistribution>,
}

impl Worker {
    /// Create a worker with the sync engine and an entropy-seeded distribution
    pub fn new(id: usize, config: RunConfig) -> Self {
        Self::with_parts(
            id,
            config,
            Box::new(SyncEngine::new()),
            Box::new(UniformDistribution::new()),
        )
    }

    /// Create a worker with an explicit engine and distribution
    pub fn with_parts(
        id: usize,
        config: RunConfig,
        engine: Box<dyn ReadEngine>,
        distribution: Box<dyn SectorDistribution>,
    ) -> Self {
        Self {
            id,
            config,
            engine,
            distribution,
        }
    }

    /// Worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Open the device, run every epoch, and return the statistics
    ///
    /// The device handle and buffer are dropped on every exit path, including
    /// when setup fails halfway.
    ///
    /// # Errors
    ///
    /// Returns an error (wrapping [`PaceError::DeviceOpen`](crate::PaceError::DeviceOpen))
    /// if the device cannot be opened, or if the buffer cannot be allocated.
    /// Individual read failures never end the run.
    pub fn run(mut self) -> Result<WorkerStats> {
        let device = match DeviceHandle::open(&self.config.device, self.config.direct) {
            Ok(device) => device,
            Err(e) => {
                error!(worker = self.id, error = %e, "device open failed");
                return Err(e.into());
            }
        };

        let mut buffer = match AlignedBuffer::new(self.config.io_size, SECTOR_SIZE) {
            Ok(buffer) => buffer,
            Err(e) => {
                error!(worker = self.id, error = %e, "buffer allocation failed");
                return Err(e.context("Failed to allocate IO buffer"));
            }
        };

        debug!(
            worker = self.id,
            device = %device.path().display(),
            extent_sectors = device.extent_sectors(),
            engine = self.engine.name(),
            completion = %self.config.completion,
            "worker ready"
        );

        Ok(self.pace(&device, &mut buffer))
    }

    /// Main epoch loop
    fn pace(&mut self, device: &DeviceHandle, buffer: &mut AlignedBuffer) -> WorkerStats {
        let target = self.config.ios_per_epoch;
        let epoch_width = self.config.epoch_width();
        let epoch_width_us = self.config.epoch_width_us;
        let total_runtime = self.config.total_runtime.as_secs_f64();
        let completion = self.config.completion;
        let fd = device.fd();

        // Offsets are drawn from [0, extent - 1)
        let sector_bound = device.extent_sectors() - 1;

        let mut stats = WorkerStats::new(self.id);
        let start = FastInstant::now();
        let mut sequence = 0u64;

        loop {
            sequence += 1;
            let epoch_start = FastInstant::now();
            let mut issued = 0u64;

            while issued < target {
                let sector = self.distribution.next_sector(sector_bound);
                let op = ReadOp {
                    fd,
                    offset: sector * SECTOR_SIZE as u64,
                    completion,
                };

                // Only issuance is counted; the read's outcome is not checked
                if let Err(e) = self.engine.read_at(op, buffer.as_mut_slice()) {
                    trace!(worker = self.id, offset = op.offset, error = %e, "read failed");
                }

                issued += 1;
                stats.record_issue();

                if issued == target {
                    break;
                }
                if epoch_start.elapsed_micros() > epoch_width_us {
                    break;
                }
            }

            let duty_time = Duration::from_micros(epoch_start.elapsed_micros());
            let record = EpochRecord {
                sequence,
                issued,
                missed: target - issued,
                duty_time,
            };

            if duty_time < epoch_width {
                std::thread::sleep(epoch_width - duty_time);
            }

            stats.record_epoch(&record, epoch_width);

            debug!(
                worker = self.id,
                epoch = record.sequence,
                issued = record.issued,
                missed = record.missed,
                elapsed_us = duty_time.as_micros() as u64,
                width_us = epoch_width_us,
                duty = record.duty_ratio(epoch_width),
                "epoch done"
            );

            if start.elapsed().as_secs_f64() >= total_runtime {
                break;
            }
        }

        stats.set_run_duration(start.elapsed());
        stats
    }
}
