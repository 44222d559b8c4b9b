//! Block device handle
//!
//! Opens a device read-only for direct random access and records its
//! addressable extent once, in 512-byte sectors.
//!
//! # Features
//!
//! - Opens with O_DIRECT (page cache bypass) unless told otherwise
//! - Detects device size via ioctl (BLKGETSIZE64)
//! - Falls back to the file length for regular files (device images)
//! - Closes the descriptor when dropped
//!
//! # Example
//!
//! ```no_run
//! use iopace::target::block::DeviceHandle;
//! use std::path::Path;
//!
//! // Note: Requires permission to read the device
//! let device = DeviceHandle::open(Path::new("/dev/nvme0n1"), true)?;
//! println!("{} sectors", device.extent_sectors());
//! # Ok::<(), iopace::PaceError>(())
//! ```

use crate::config::SECTOR_SIZE;
use crate::error::PaceError;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

// ioctl request code for getting block device size
const BLKGETSIZE64: libc::c_ulong = 0x80081272;

/// Open device handle
///
/// Owned by exactly one worker. The extent never changes after open.
#[derive(Debug)]
pub struct DeviceHandle {
    path: PathBuf,
    file: File,
    size_bytes: u64,
}

impl DeviceHandle {
    /// Open a device (or device image) for random reads
    ///
    /// # Errors
    ///
    /// Returns [`PaceError::DeviceOpen`] if the open fails, the size cannot be
    /// determined, or the device is smaller than two sectors.
    pub fn open(path: &Path, direct: bool) -> Result<Self, PaceError> {
        let open_error = |source: io::Error| PaceError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        };

        let mut options = OpenOptions::new();
        options.read(true);
        if direct {
            options.custom_flags(libc::O_DIRECT);
        }

        let file = options.open(path).map_err(open_error)?;
        let metadata = file.metadata().map_err(open_error)?;

        let size_bytes = if metadata.file_type().is_block_device() {
            block_device_size(&file).map_err(open_error)?
        } else {
            metadata.len()
        };

        if size_bytes / (SECTOR_SIZE as u64) < 2 {
            return Err(open_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("device too small: {} bytes", size_bytes),
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size_bytes,
        })
    }

    /// Raw descriptor for issuing reads
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    /// Device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Addressable extent in sectors
    #[inline]
    pub fn extent_sectors(&self) -> u64 {
        self.size_bytes / SECTOR_SIZE as u64
    }
}

/// Query a block device's size with BLKGETSIZE64
fn block_device_size(file: &File) -> io::Result<u64> {
    let mut size: u64 = 0;
    // SAFETY: BLKGETSIZE64 writes a single u64 through the pointer.
    let result = unsafe { libc::ioctl(file.as_raw_fd(), BLKGETSIZE64 as _, &mut size) };
    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(size)
}
