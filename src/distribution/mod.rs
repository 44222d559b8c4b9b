//! Offset distributions
//!
//! Distributions pick sector numbers, not byte offsets. The worker converts a
//! sector to a byte offset with `sector * SECTOR_SIZE`, which keeps every read
//! aligned for O_DIRECT.
//!
//! # Example
//!
//! ```
//! use iopace::distribution::{SectorDistribution, uniform::UniformDistribution};
//!
//! let mut dist = UniformDistribution::with_seed(7);
//! let extent = 2048;
//! let sector = dist.next_sector(extent - 1); // [0, extent - 1)
//! assert!(sector < extent - 1);
//! ```

/// Sector number generator
///
/// Each worker owns its own instance; nothing is shared across threads.
pub trait SectorDistribution: Send {
    /// Next sector number in `[0, bound)`
    ///
    /// Returns 0 when `bound` is 0.
    fn next_sector(&mut self, bound: u64) -> u64;
}

pub mod uniform;
