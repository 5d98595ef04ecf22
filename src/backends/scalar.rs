//! Scalar (non-SIMD) backend implementation
//!
//! This is the portable baseline implementation that works on all platforms.
//! It also finishes the remainder of every batched kernel, so its accumulation
//! order defines the reference results the SIMD backends are compared against.

use num_complex::Complex32;

use super::ComplexBackend;

/// Scalar backend (portable, no SIMD)
pub struct ScalarBackend;

/// Accumulate `Σ a[i] * b[i]` (or `* conj(b[i])`) into running real/imaginary sums.
#[inline]
pub(crate) fn accumulate(
    a: &[Complex32],
    b: &[Complex32],
    conjugate: bool,
    mut re: f32,
    mut im: f32,
) -> (f32, f32) {
    for (x, y) in a.iter().zip(b) {
        let d = if conjugate { -y.im } else { y.im };
        re += x.re * y.re - x.im * d;
        im += x.re * d + x.im * y.re;
    }
    (re, im)
}

impl ComplexBackend for ScalarBackend {
    // SAFETY: This function is safe because:
    // 1. All slice accesses are bounds-checked by Rust iterators
    // 2. No raw pointer arithmetic is performed
    // 3. Marked unsafe only to match ComplexBackend trait interface
    unsafe fn inner_product(a: &[Complex32], b: &[Complex32], conjugate: bool) -> Complex32 {
        let (re, im) = accumulate(a, b, conjugate, 0.0, 0.0);
        Complex32::new(re, im)
    }

    // SAFETY: bounds-checked indexing only; unsafe to match the trait
    unsafe fn add(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        for i in 0..a.len() {
            result[i] = a[i] + b[i];
        }
    }

    // SAFETY: bounds-checked indexing only; unsafe to match the trait
    unsafe fn sub(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        for i in 0..a.len() {
            result[i] = a[i] - b[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f32, im: f32) -> Complex32 {
        Complex32::new(re, im)
    }

    #[test]
    fn test_scalar_inner_product_real() {
        let a = [c(1.0, 0.0), c(2.0, 0.0), c(3.0, 0.0)];
        let b = [c(4.0, 0.0), c(5.0, 0.0), c(6.0, 0.0)];
        let result = unsafe { ScalarBackend::inner_product(&a, &b, false) };
        assert_eq!(result, c(32.0, 0.0));
    }

    #[test]
    fn test_scalar_inner_product_conjugated() {
        // (1+i)(2-2i) = 4 per element
        let a = [c(1.0, 1.0); 3];
        let b = [c(2.0, 2.0); 3];
        let result = unsafe { ScalarBackend::inner_product(&a, &b, true) };
        assert_eq!(result, c(12.0, 0.0));
    }

    #[test]
    fn test_scalar_inner_product_bilinear() {
        // (1+i)(2+2i) = 4i per element
        let a = [c(1.0, 1.0); 3];
        let b = [c(2.0, 2.0); 3];
        let result = unsafe { ScalarBackend::inner_product(&a, &b, false) };
        assert_eq!(result, c(0.0, 12.0));
    }

    #[test]
    fn test_scalar_add_sub() {
        let a = [c(1.0, 2.0), c(3.0, -4.0)];
        let b = [c(0.5, 0.5), c(1.0, 1.0)];
        let mut sum = [c(0.0, 0.0); 2];
        let mut diff = [c(0.0, 0.0); 2];

        unsafe {
            ScalarBackend::add(&a, &b, &mut sum);
            ScalarBackend::sub(&a, &b, &mut diff);
        }

        assert_eq!(sum, [c(1.5, 2.5), c(4.0, -3.0)]);
        assert_eq!(diff, [c(0.5, 1.5), c(2.0, -5.0)]);
    }

    #[test]
    fn test_accumulate_continues_running_sums() {
        let a = [c(1.0, 0.0)];
        let b = [c(2.0, 0.0)];
        assert_eq!(accumulate(&a, &b, true, 10.0, -1.0), (12.0, -1.0));
    }
}
