//! Mock read engine for testing
//!
//! Simulates reads without touching the device. Clones share their state, so a
//! test can hand one clone to a worker and inspect the other afterwards.
//!
//! # Example
//!
//! ```
//! use iopace::config::CompletionMode;
//! use iopace::engine::{ReadEngine, ReadOp};
//! use iopace::engine::mock::MockEngine;
//!
//! let mut engine = MockEngine::new();
//! let probe = engine.clone();
//! let mut buffer = vec![0u8; 4096];
//!
//! let op = ReadOp { fd: 3, offset: 8192, completion: CompletionMode::Interrupt };
//! engine.read_at(op, &mut buffer).unwrap();
//!
//! assert_eq!(probe.submitted_count(), 1);
//! assert_eq!(probe.submitted_operations()[0].offset, 8192);
//! ```

use super::{ReadEngine, ReadOp};
use crate::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock read engine
#[derive(Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Simulated per-read latency, spent sleeping
    latency: Duration,
    /// Whether reads should fail
    should_fail: bool,
    /// Every read seen so far
    submitted: Vec<ReadOp>,
}

impl MockEngine {
    /// Create a mock engine that completes every read instantly
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock engine with a fixed per-read latency
    pub fn with_latency(latency: Duration) -> Self {
        let engine = Self::new();
        engine.set_latency(latency);
        engine
    }

    /// Set the simulated per-read latency
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Make every subsequent read fail
    pub fn set_should_fail(&self, should_fail: bool) {
        self.lock().should_fail = should_fail;
    }

    /// All reads submitted so far
    pub fn submitted_operations(&self) -> Vec<ReadOp> {
        self.lock().submitted.clone()
    }

    /// Number of reads submitted so far
    pub fn submitted_count(&self) -> usize {
        self.lock().submitted.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means a test thread panicked; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ReadEngine for MockEngine {
    fn read_at(&mut self, op: ReadOp, buffer: &mut [u8]) -> Result<usize> {
        let (latency, should_fail) = {
            let mut state = self.lock();
            state.submitted.push(op);
            (state.latency, state.should_fail)
        };

        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        if should_fail {
            anyhow::bail!("mock read failed: offset={}", op.offset);
        }

        Ok(buffer.len())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
