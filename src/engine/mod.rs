//! Read engine abstraction
//!
//! A read engine issues one positioned read against an open device and blocks
//! until it completes. The completion mode decides how the kernel waits for the
//! device: a normal interrupt-driven read, or a high-priority read that polls
//! the device queue (`RWF_HIPRI`).
//!
//! # Engine Types
//!
//! - **Sync**: `preadv2` with or without `RWF_HIPRI` (the real engine)
//! - **Mock**: records offsets and simulates latency, for tests
//!
//! # Example
//!
//! ```no_run
//! use iopace::config::CompletionMode;
//! use iopace::engine::{ReadEngine, ReadOp};
//! use iopace::engine::sync::SyncEngine;
//!
//! let mut engine = SyncEngine::new();
//! let mut buffer = vec![0u8; 4096];
//! let op = ReadOp {
//!     fd: 3,
//!     offset: 0,
//!     completion: CompletionMode::Polled,
//! };
//! let bytes = engine.read_at(op, &mut buffer)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::config::CompletionMode;
use crate::Result;
use std::os::unix::io::RawFd;

/// Engine trait for issuing reads
///
/// Engines must be `Send` so a worker can move its engine onto its own thread.
/// Each worker owns exactly one engine; engines are never shared.
pub trait ReadEngine: Send {
    /// Issue one read of `buffer.len()` bytes at `op.offset` and wait for it
    ///
    /// Returns the number of bytes read. Short reads are returned as-is and
    /// never retried.
    fn read_at(&mut self, op: ReadOp, buffer: &mut [u8]) -> Result<usize>;

    /// Short engine name for logging
    fn name(&self) -> &'static str;
}

/// A single positioned read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOp {
    /// Device file descriptor
    pub fd: RawFd,
    /// Byte offset (sector aligned)
    pub offset: u64,
    /// How to wait for completion
    pub completion: CompletionMode,
}

pub mod mock;
pub mod sync;
