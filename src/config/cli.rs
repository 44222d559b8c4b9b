//! CLI argument parsing using clap
//!
//! The positional form mirrors the classic invocation:
//!
//! ```text
//! iopace <device> <io-size-KiB> <target-iops> <epoch-width-us> <completion-mode:0|1> <runtime-sec> <workers> <label>
//! ```
//!
//! Alternatively `--config run.toml` supplies the same fields from a file.

use super::{toml, CompletionMode, RunParams, DEVICE_DIR};
use crate::error::PaceError;
use clap::Parser;
use std::path::PathBuf;

/// iopace - epoch-paced random read load generator
#[derive(Parser, Debug)]
#[command(name = "iopace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Device basename under /dev (e.g., nvme0n1)
    #[arg(value_name = "DEVICE")]
    pub device: Option<String>,

    /// Read size in KiB
    #[arg(value_name = "IO_SIZE_KIB")]
    pub io_size_kib: Option<u64>,

    /// Target IOPS per worker
    #[arg(value_name = "TARGET_IOPS")]
    pub target_iops: Option<u64>,

    /// Epoch width in microseconds
    #[arg(value_name = "EPOCH_WIDTH_US")]
    pub epoch_width_us: Option<u64>,

    /// Completion mode: 1 = polled (RWF_HIPRI), 0 = interrupt
    #[arg(value_name = "COMPLETION_MODE")]
    pub completion_mode: Option<u8>,

    /// Total runtime in seconds
    #[arg(value_name = "RUNTIME_SEC")]
    pub runtime_secs: Option<u64>,

    /// Number of worker threads (max 16)
    #[arg(value_name = "WORKERS")]
    pub workers: Option<usize>,

    /// Label printed on every result line
    #[arg(value_name = "LABEL")]
    pub label: Option<String>,

    /// TOML run file used instead of the positional arguments
    #[arg(long, value_name = "FILE", env = "IOPACE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the run report as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Open the device without O_DIRECT
    #[arg(long)]
    pub no_direct: bool,

    /// Log one line per epoch
    #[arg(long)]
    pub debug: bool,
}

/// Build the device path from its basename
pub fn device_path(basename: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", DEVICE_DIR, basename))
}

impl Cli {
    /// Parse CLI arguments without exiting on error
    pub fn parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    fn has_positionals(&self) -> bool {
        self.device.is_some()
            || self.io_size_kib.is_some()
            || self.target_iops.is_some()
            || self.epoch_width_us.is_some()
            || self.completion_mode.is_some()
            || self.runtime_secs.is_some()
            || self.workers.is_some()
            || self.label.is_some()
    }

    /// Resolve the run parameters from either the run file or the positionals
    pub fn to_params(&self) -> Result<RunParams, PaceError> {
        let mut params = match &self.config {
            Some(path) => {
                if self.has_positionals() {
                    return Err(PaceError::config(
                        "positional arguments cannot be combined with --config",
                    ));
                }
                toml::parse_run_file(path)?
            }
            None => self.positional_params()?,
        };

        if self.no_direct {
            params.direct = false;
        }

        Ok(params)
    }

    fn positional_params(&self) -> Result<RunParams, PaceError> {
        match (
            &self.device,
            self.io_size_kib,
            self.target_iops,
            self.epoch_width_us,
            self.completion_mode,
            self.runtime_secs,
            self.workers,
            &self.label,
        ) {
            (
                Some(device),
                Some(io_size_kib),
                Some(target_iops),
                Some(epoch_width_us),
                Some(mode),
                Some(runtime_secs),
                Some(workers),
                Some(label),
            ) => Ok(RunParams {
                device: device_path(device),
                io_size_kib,
                target_iops,
                epoch_width_us,
                completion: CompletionMode::from_flag(mode)?,
                runtime_secs,
                workers,
                label: label.clone(),
                direct: true,
                stagger_ms: super::DEFAULT_STAGGER_MS,
            }),
            _ => Err(PaceError::config("expected 8 positional arguments")),
        }
    }
}
