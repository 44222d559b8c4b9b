//! Monotonic timestamps via direct clock_gettime calls
//!
//! The pacer reads the clock after every read, so the timestamp is a plain
//! nanosecond count from CLOCK_MONOTONIC rather than a `std::time::Instant`.

use std::time::Duration;

/// Nanosecond timestamp from CLOCK_MONOTONIC
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FastInstant {
    nanos: u64,
}

impl FastInstant {
    /// Current time
    #[inline(always)]
    pub fn now() -> Self {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        // SAFETY: ts is a valid, writable timespec.
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts);
        }

        Self {
            nanos: (ts.tv_sec as u64) * 1_000_000_000 + (ts.tv_nsec as u64),
        }
    }

    /// Time between `earlier` and this instant (zero if `earlier` is later)
    #[inline(always)]
    pub fn duration_since(&self, earlier: FastInstant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }

    /// Time since this instant
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        Self::now().duration_since(*self)
    }

    /// Whole microseconds since this instant
    #[inline(always)]
    pub fn elapsed_micros(&self) -> u64 {
        Self::now().nanos.saturating_sub(self.nanos) / 1_000
    }
}
