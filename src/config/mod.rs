//! Configuration module
//!
//! Handles CLI argument parsing, TOML run files, derivation of the per-epoch
//! target and validation. Every worker receives its own owned copy of the
//! resulting [`RunConfig`].

pub mod cli;
pub mod toml;

use crate::error::PaceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Sector size used for buffer alignment and offset units
pub const SECTOR_SIZE: usize = 512;

/// Upper bound on concurrently running workers
pub const MAX_WORKERS: usize = 16;

/// Default delay between worker launches
pub const DEFAULT_STAGGER_MS: u64 = 50;

/// Device directory prepended to the device basename given on the CLI
pub const DEVICE_DIR: &str = "/dev/";

/// How a read waits for its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Standard blocking read, completion signalled by interrupt
    #[default]
    Interrupt,
    /// High-priority read; the kernel polls the device queue for completion
    Polled,
}

impl CompletionMode {
    /// Map the numeric CLI flag (`0` interrupt, `1` polled)
    pub fn from_flag(flag: u8) -> Result<Self, PaceError> {
        match flag {
            0 => Ok(CompletionMode::Interrupt),
            1 => Ok(CompletionMode::Polled),
            other => Err(PaceError::config(format!(
                "completion mode must be 0 (interrupt) or 1 (polled), got {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionMode::Interrupt => write!(f, "interrupt"),
            CompletionMode::Polled => write!(f, "polled"),
        }
    }
}

/// Operations to issue per epoch for a nominal IOPS target
///
/// The epoch width is truncated to whole milliseconds before scaling, and the
/// product is truncated again, so small epochs can undershoot the nominal rate.
pub fn ios_per_epoch(target_iops: u64, epoch_width_us: u64) -> u64 {
    target_iops.saturating_mul(epoch_width_us / 1000) / 1000
}

/// Raw run parameters as given by the user (CLI or TOML run file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Full path to the device
    pub device: PathBuf,
    /// Per-read size in KiB
    pub io_size_kib: u64,
    /// Nominal operations per second for each worker
    pub target_iops: u64,
    /// Epoch width in microseconds
    pub epoch_width_us: u64,
    /// Completion mode
    #[serde(default)]
    pub completion: CompletionMode,
    /// Total run duration in seconds
    pub runtime_secs: u64,
    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Label printed at the start of every report line
    pub label: String,
    /// Open the device with O_DIRECT
    #[serde(default = "default_direct")]
    pub direct: bool,
    /// Delay between worker launches in milliseconds
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

fn default_workers() -> usize {
    1
}

fn default_direct() -> bool {
    true
}

fn default_stagger_ms() -> u64 {
    DEFAULT_STAGGER_MS
}

impl RunParams {
    /// Derive and validate the run configuration
    pub fn into_run_config(self) -> Result<RunConfig, PaceError> {
        let config = RunConfig {
            device: self.device,
            io_size: self.io_size_kib.saturating_mul(1024) as usize,
            ios_per_epoch: ios_per_epoch(self.target_iops, self.epoch_width_us),
            epoch_width_us: self.epoch_width_us,
            completion: self.completion,
            total_runtime: Duration::from_secs(self.runtime_secs),
            label: self.label,
            direct: self.direct,
            num_workers: self.workers,
            stagger: Duration::from_millis(self.stagger_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Immutable run configuration
///
/// The coordinator clones one value per worker; nothing in it is mutated after
/// validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Device to read from
    pub device: PathBuf,
    /// Bytes per read (multiple of [`SECTOR_SIZE`])
    pub io_size: usize,
    /// Reads each worker tries to issue per epoch
    pub ios_per_epoch: u64,
    /// Epoch width in microseconds
    pub epoch_width_us: u64,
    /// Completion mode for every read
    pub completion: CompletionMode,
    /// Wall-clock time each worker keeps running
    pub total_runtime: Duration,
    /// Human-readable run label
    pub label: String,
    /// Open with O_DIRECT
    pub direct: bool,
    /// Number of workers the coordinator launches
    pub num_workers: usize,
    /// Delay between worker launches
    pub stagger: Duration,
}

impl RunConfig {
    /// Check every invariant the pacer and coordinator rely on
    pub fn validate(&self) -> Result<(), PaceError> {
        if self.epoch_width_us == 0 {
            return Err(PaceError::config("epoch width must be greater than 0"));
        }
        if self.io_size == 0 || self.io_size % SECTOR_SIZE != 0 {
            return Err(PaceError::config(format!(
                "io size must be a non-zero multiple of {} bytes, got {}",
                SECTOR_SIZE, self.io_size
            )));
        }
        if self.num_workers == 0 || self.num_workers > MAX_WORKERS {
            return Err(PaceError::config(format!(
                "number of workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.num_workers
            )));
        }
        if self.device.as_os_str().is_empty() {
            return Err(PaceError::config("device path is empty"));
        }
        Ok(())
    }

    /// Epoch width as a duration
    #[inline]
    pub fn epoch_width(&self) -> Duration {
        Duration::from_micros(self.epoch_width_us)
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> RunParams {
    RunParams {
        device: PathBuf::from("/dev/nvme0n1"),
        io_size_kib: 4,
        target_iops: 1000,
        epoch_width_us: 320_000,
        completion: CompletionMode::Interrupt,
        runtime_secs: 2,
        workers: 1,
        label: "INT".to_string(),
        direct: true,
        stagger_ms: DEFAULT_STAGGER_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ios_per_epoch_reference_point() {
        assert_eq!(ios_per_epoch(1000, 320_000), 320);
    }

    #[test]
    fn test_ios_per_epoch_truncates_twice() {
        // 1999us truncates to 1ms, then 999 * 1 / 1000 truncates to 0
        assert_eq!(ios_per_epoch(999, 1999), 0);
        assert_eq!(ios_per_epoch(1500, 1999), 1);
        assert_eq!(ios_per_epoch(100_000, 500), 0);
    }

    #[test]
    fn test_ios_per_epoch_matches_formula() {
        for iops in [0u64, 1, 7, 1000, 12_345, 1_000_000] {
            for width in [1u64, 999, 1000, 1001, 250_000, 320_000, 1_000_000] {
                let expected = iops * (width / 1000) / 1000;
                assert_eq!(ios_per_epoch(iops, width), expected);
            }
        }
    }

    #[test]
    fn test_completion_mode_from_flag() {
        assert_eq!(CompletionMode::from_flag(0).unwrap(), CompletionMode::Interrupt);
        assert_eq!(CompletionMode::from_flag(1).unwrap(), CompletionMode::Polled);
        assert!(CompletionMode::from_flag(2).is_err());
    }

    #[test]
    fn test_into_run_config() {
        let config = test_params().into_run_config().unwrap();
        assert_eq!(config.io_size, 4096);
        assert_eq!(config.ios_per_epoch, 320);
        assert_eq!(config.epoch_width(), Duration::from_millis(320));
        assert_eq!(config.total_runtime, Duration::from_secs(2));
        assert_eq!(config.stagger, Duration::from_millis(50));
    }

    #[test]
    fn test_rejects_zero_epoch_width() {
        let mut params = test_params();
        params.epoch_width_us = 0;
        assert!(params.into_run_config().unwrap_err().is_usage());
    }

    #[test]
    fn test_rejects_too_many_workers() {
        let mut params = test_params();
        params.workers = MAX_WORKERS + 1;
        assert!(params.into_run_config().is_err());

        let mut params = test_params();
        params.workers = MAX_WORKERS;
        assert!(params.into_run_config().is_ok());
    }

    #[test]
    fn test_rejects_zero_workers_and_io_size() {
        let mut params = test_params();
        params.workers = 0;
        assert!(params.into_run_config().is_err());

        let mut params = test_params();
        params.io_size_kib = 0;
        assert!(params.into_run_config().is_err());
    }
}
