//! iopace - Epoch-paced random read load generator
//!
//! iopace drives a block device with fixed-size random-offset reads at a target
//! rate. Each worker thread paces itself in fixed time windows (epochs): it tries
//! to issue a fixed number of reads per epoch, counts what it could not issue
//! before the epoch deadline, and sleeps off the slack so the next epoch starts
//! on schedule.
//!
//! # Architecture
//!
//! - **Engines**: blocking reads with interrupt or polled (`RWF_HIPRI`) completion
//! - **Targets**: block devices opened with O_DIRECT, sized once at open time
//! - **Worker**: the epoch pacer, one per thread
//! - **Coordinator**: derives the per-epoch target, staggers worker launch, joins all
//! - **Output**: fixed-width text lines and an optional JSON report

pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod output;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::RunConfig;
pub use engine::ReadEngine;
pub use error::PaceError;
pub use worker::Worker;

/// Result type used throughout iopace
pub type Result<T> = anyhow::Result<T>;
