//! TOML run file parsing
//!
//! A run file carries the same fields as the positional CLI form:
//!
//! ```toml
//! device = "/dev/nvme0n1"
//! io_size_kib = 4
//! target_iops = 1000
//! epoch_width_us = 320000
//! completion = "polled"
//! runtime_secs = 60
//! workers = 4
//! label = "HP"
//! stagger_ms = 50   # optional
//! direct = true     # optional
//! ```

use super::RunParams;
use crate::error::PaceError;
use std::fs;
use std::path::Path;

/// Parse a TOML run file
pub fn parse_run_file(path: &Path) -> Result<RunParams, PaceError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        PaceError::config(format!("failed to read run file {}: {}", path.display(), e))
    })?;

    parse_run_string(&contents).map_err(|e| match e {
        PaceError::Configuration(msg) => {
            PaceError::config(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse run parameters from a TOML string
pub fn parse_run_string(contents: &str) -> Result<RunParams, PaceError> {
    ::toml::from_str(contents)
        .map_err(|e| PaceError::config(format!("invalid run file: {}", e)))
}
