//! Shared utilities: aligned buffers, monotonic time, report formatting

pub mod buffer;
pub mod fast_time;
pub mod time;
