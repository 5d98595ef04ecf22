//! Backend implementations for different SIMD instruction sets
//!
//! This module contains the inner-product strategies selected at runtime by
//! [`crate::select_best_available_backend`]. All backends implement the same
//! trait so vectors can switch strategy without changing results beyond
//! floating-point reassociation.
//!
//! # Safety
//!
//! All `unsafe` code is isolated within backend implementations. The public API
//! remains safe.
//!
//! # Backends
//!
//! - `scalar`: Portable baseline implementation (no SIMD)
//! - `sse2`: x86_64 baseline SIMD (4 complex per group)
//! - `avx2`: x86_64 256-bit SIMD (8 complex per group)
//! - `neon`: aarch64 SIMD with de-interleaving loads (4 complex per group)
//!
//! # Complex arithmetic
//!
//! Every batched kernel splits operands into real lanes `a, c` and imaginary
//! lanes `b, d` and computes `re = ac - bd`, `im = ad + bc`, negating `d`
//! when the second operand is conjugated. The remainder that does not fill a
//! whole group goes through the scalar loop.

use num_complex::Complex32;

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod sse2;

#[cfg(target_arch = "x86_64")]
pub mod avx2;

#[cfg(target_arch = "aarch64")]
pub mod neon;

/// Backend trait defining common complex-slice operations
///
/// # Safety
///
/// Implementations may use unsafe SIMD intrinsics. Callers must ensure:
/// - Slices `a` and `b` have the same length
/// - Result slice has sufficient capacity
/// - The CPU supports the instruction set of the implementation
pub trait ComplexBackend {
    /// Inner product: `Σ a[i] * b[i]`, or `Σ a[i] * conj(b[i])` when `conjugate`
    ///
    /// # Safety
    ///
    /// - `a` and `b` must have the same length
    unsafe fn inner_product(a: &[Complex32], b: &[Complex32], conjugate: bool) -> Complex32;

    /// Element-wise addition: a[i] + b[i]
    ///
    /// # Safety
    ///
    /// - `a` and `b` must have the same length
    /// - `result` must have length >= `a.len()`
    unsafe fn add(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]);

    /// Element-wise subtraction: a[i] - b[i]
    ///
    /// # Safety
    ///
    /// - `a` and `b` must have the same length
    /// - `result` must have length >= `a.len()`
    unsafe fn sub(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]);
}

/// View complex scalars as interleaved `[re, im, re, im, ...]` lanes.
#[inline]
pub(crate) fn as_lanes(a: &[Complex32]) -> &[f32] {
    // SAFETY: Complex32 is #[repr(C)] { re: f32, im: f32 }
    unsafe { std::slice::from_raw_parts(a.as_ptr().cast::<f32>(), a.len() * 2) }
}

/// Mutable interleaved view, see [`as_lanes`].
#[inline]
pub(crate) fn as_lanes_mut(a: &mut [Complex32]) -> &mut [f32] {
    // SAFETY: Complex32 is #[repr(C)] { re: f32, im: f32 }
    unsafe { std::slice::from_raw_parts_mut(a.as_mut_ptr().cast::<f32>(), a.len() * 2) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_view_interleaves() {
        let data = [Complex32::new(1.0, 2.0), Complex32::new(3.0, 4.0)];
        assert_eq!(as_lanes(&data), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_lane_view_mut_writes_through() {
        let mut data = [Complex32::new(0.0, 0.0); 2];
        as_lanes_mut(&mut data)[3] = 7.0;
        assert_eq!(data[1], Complex32::new(0.0, 7.0));
    }
}
