//! Aligned IO buffers
//!
//! O_DIRECT reads need a buffer whose address and length are multiples of the
//! device's logical sector size. Each worker allocates exactly one of these and
//! reuses it for every read.

use crate::Result;
use anyhow::Context;
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Memory-aligned buffer suitable for O_DIRECT reads
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Allocate a zeroed buffer of `size` bytes aligned to `alignment`
    ///
    /// # Errors
    ///
    /// Fails if `size` is zero, `alignment` is not a power of two, or the
    /// allocation fails.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        anyhow::ensure!(alignment.is_power_of_two(), "alignment must be a power of 2, got {}", alignment);
        anyhow::ensure!(size > 0, "buffer size must be greater than 0");

        let layout = Layout::from_size_align(size, alignment)
            .with_context(|| format!("invalid buffer layout: size={}, alignment={}", size, alignment))?;

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            anyhow::bail!("failed to allocate {} byte aligned buffer", size);
        }

        Ok(AlignedBuffer { ptr, size, layout })
    }

    /// Get the buffer as a slice
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for size bytes for the lifetime of self.
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    /// Get the buffer as a mutable slice
    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for size bytes and uniquely borrowed through self.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    /// Size of the buffer in bytes
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the buffer
    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Whether the start address honours the alignment
    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.layout.align() == 0
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with this exact layout.
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_aligned_buffer() {
        let buffer = AlignedBuffer::new(4096, 512).unwrap();
        assert_eq!(buffer.size(), 4096);
        assert_eq!(buffer.alignment(), 512);
        assert!(buffer.is_aligned());
    }

    #[test]
    fn test_large_buffer_zeroed() {
        let buffer = AlignedBuffer::new(128 * 1024, 512).unwrap();
        assert!(buffer.is_aligned());
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mutable_access() {
        let mut buffer = AlignedBuffer::new(512, 512).unwrap();
        buffer.as_mut_slice()[511] = 0xAB;
        assert_eq!(buffer.as_slice()[511], 0xAB);
    }

    #[test]
    fn test_invalid_alignment() {
        assert!(AlignedBuffer::new(4096, 513).is_err());
    }

    #[test]
    fn test_zero_size() {
        assert!(AlignedBuffer::new(0, 512).is_err());
    }
}
