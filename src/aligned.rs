//! SIMD-aligned storage for complex scalars
//!
//! Every [`crate::ComplexVector`] owns exactly one [`AlignedBuffer`]. The buffer is
//! allocated zeroed on a [`SIMD_ALIGNMENT`] boundary so the batched inner-product
//! kernels always start on a full cache line, and released exactly once on drop.

use std::alloc::{self, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use num_complex::Complex32;

use crate::{KernelError, Result};

/// Alignment (bytes) of every complex buffer: one cache line, covers AVX-512 loads.
pub const SIMD_ALIGNMENT: usize = 64;

/// Owned, zero-initialized, 64-byte aligned `[Complex32]`
pub struct AlignedBuffer {
    ptr: NonNull<Complex32>,
    len: usize,
}

// SAFETY: the buffer uniquely owns its allocation; access follows &/&mut rules
// through Deref/DerefMut exactly like Vec<Complex32>.
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `len` zeroed complex scalars.
    ///
    /// # Errors
    ///
    /// - [`KernelError::BadSize`] if `len == 0` or the byte size overflows a layout
    /// - [`KernelError::OutOfMemory`] if the allocator returns null
    pub fn zeroed(len: usize) -> Result<Self> {
        let layout = Self::layout(len)?;
        // SAFETY: layout has non-zero size (len > 0 and Complex32 is 8 bytes)
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<Complex32>()).ok_or(KernelError::OutOfMemory {
            bytes: layout.size(),
        })?;
        Ok(Self { ptr, len })
    }

    /// Allocate an aligned copy of `data`.
    pub fn from_slice(data: &[Complex32]) -> Result<Self> {
        let mut buffer = Self::zeroed(data.len())?;
        buffer.copy_from_slice(data);
        Ok(buffer)
    }

    /// Fallible clone (propagates allocation failure instead of aborting)
    pub fn try_clone(&self) -> Result<Self> {
        Self::from_slice(self)
    }

    fn layout(len: usize) -> Result<Layout> {
        if len == 0 {
            return Err(KernelError::BadSize(len));
        }
        Layout::array::<Complex32>(len)
            .and_then(|layout| layout.align_to(SIMD_ALIGNMENT))
            .map_err(|_| KernelError::BadSize(len))
    }
}

impl Deref for AlignedBuffer {
    type Target = [Complex32];

    fn deref(&self) -> &[Complex32] {
        // SAFETY: ptr is valid for len initialized elements for the buffer's lifetime
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuffer {
    fn deref_mut(&mut self) -> &mut [Complex32] {
        // SAFETY: unique borrow of the owning buffer
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // The layout was valid at construction, so recomputing it cannot fail.
        if let Ok(layout) = Self::layout(self.len) {
            // SAFETY: ptr was allocated by alloc_zeroed with this exact layout
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}

impl Clone for AlignedBuffer {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(buffer) => buffer,
            // Same policy as Vec: infallible clone aborts on OOM
            Err(_) => match Self::layout(self.len) {
                Ok(layout) => alloc::handle_alloc_error(layout),
                Err(_) => unreachable!("layout was valid when the buffer was built"),
            },
        }
    }
}

impl PartialEq for AlignedBuffer {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
