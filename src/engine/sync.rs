//! Synchronous read engine
//!
//! Issues a single `preadv2` per operation. In polled mode the read carries
//! `RWF_HIPRI`, which asks the block layer to poll the device's completion
//! queue instead of sleeping until the interrupt arrives. On platforms without
//! `preadv2` the engine falls back to `pread` and the flag is dropped.
//!
//! The engine does not retry short reads: a load generator only cares that the
//! request reached the device. Failures carry the bare OS error; the caller
//! knows the offset and mode.

use super::{ReadEngine, ReadOp};
use crate::config::CompletionMode;
use crate::Result;

/// Synchronous read engine using preadv2
pub struct SyncEngine {
    _private: (),
}

impl SyncEngine {
    /// Create a new synchronous read engine
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// `preadv2` flags for a completion mode
    #[cfg(target_os = "linux")]
    #[inline(always)]
    fn rw_flags(completion: CompletionMode) -> libc::c_int {
        match completion {
            CompletionMode::Polled => libc::RWF_HIPRI,
            CompletionMode::Interrupt => 0,
        }
    }

    #[cfg(target_os = "linux")]
    #[inline(always)]
    fn do_read(&self, op: ReadOp, buffer: &mut [u8]) -> Result<usize> {
        let iov = libc::iovec {
            iov_base: buffer.as_mut_ptr() as *mut libc::c_void,
            iov_len: buffer.len(),
        };

        // SAFETY: iov points at `buffer`, which outlives the call.
        let result = unsafe {
            libc::preadv2(
                op.fd,
                &iov,
                1,
                op.offset as libc::off_t,
                Self::rw_flags(op.completion),
            )
        };

        if result < 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        Ok(result as usize)
    }

    #[cfg(not(target_os = "linux"))]
    #[inline(always)]
    fn do_read(&self, op: ReadOp, buffer: &mut [u8]) -> Result<usize> {
        // SAFETY: the pointer and length come from a live mutable slice.
        let result = unsafe {
            libc::pread(
                op.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
                op.offset as libc::off_t,
            )
        };

        if result < 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        Ok(result as usize)
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadEngine for SyncEngine {
    #[inline]
    fn read_at(&mut self, op: ReadOp, buffer: &mut [u8]) -> Result<usize> {
        self.do_read(op, buffer)
    }

    fn name(&self) -> &'static str {
        "sync"
    }
}
