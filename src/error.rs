//! Error taxonomy
//!
//! Only three failure classes are ever surfaced. Per-read IO errors are not part
//! of the taxonomy: a read that fails still counts as issued.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run or a worker
#[derive(Debug, Error)]
pub enum PaceError {
    /// Bad or missing arguments, invalid run file, or out-of-range values
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The device could not be opened for direct random access, or its size
    /// could not be determined
    #[error("failed to open device {path}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be created
    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}

impl PaceError {
    /// Shorthand for a configuration error with a formatted message
    pub fn config(msg: impl Into<String>) -> Self {
        PaceError::Configuration(msg.into())
    }

    /// True for errors that should print usage instead of a failure message
    pub fn is_usage(&self) -> bool {
        matches!(self, PaceError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_open_message_names_path() {
        let err = PaceError::DeviceOpen {
            path: PathBuf::from("/dev/nvme9n1"),
            source: std::io::Error::from_raw_os_error(libc::ENOENT),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/nvme9n1"));
        assert!(!err.is_usage());
    }

    #[test]
    fn test_configuration_is_usage() {
        let err = PaceError::config("expected 8 arguments");
        assert!(err.is_usage());
        assert_eq!(err.to_string(), "configuration error: expected 8 arguments");
    }
}
