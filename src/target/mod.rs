//! IO targets
//!
//! A target is the device a worker reads from. Each worker opens its own
//! handle, so no descriptor is ever shared between threads.

pub mod block;

pub use block::DeviceHandle;
