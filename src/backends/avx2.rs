//! AVX2 backend implementation (x86_64 256-bit SIMD)
//!
//! Each group holds 8 complex scalars. `vshufps` shuffles within 128-bit
//! halves, so the de-interleaved registers hold lanes in the order
//! `[0, 1, 4, 5 | 2, 3, 6, 7]`; both operands are permuted identically and the
//! final reduction is order-insensitive, so no cross-lane fix-up is needed.
//!
//! Multiplies and adds are kept separate (no FMA) so each group performs exactly
//! four real multiplies and two add/subtracts, like the other backends.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use num_complex::Complex32;

use super::scalar::accumulate;
use super::{as_lanes, as_lanes_mut, ComplexBackend};

const REAL_LANES: i32 = 0b10_00_10_00;
const IMAG_LANES: i32 = 0b11_01_11_01;
const GROUP: usize = 8;

/// AVX2 backend (256-bit SIMD for x86_64)
pub struct Avx2Backend;

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn horizontal_sum(v: __m256) -> f32 {
    let low = _mm256_castps256_ps128(v);
    let high = _mm256_extractf128_ps(v, 1);
    let sum4 = _mm_add_ps(low, high);
    let mut lanes = [0.0f32; 4];
    _mm_storeu_ps(lanes.as_mut_ptr(), sum4);
    lanes[0] + lanes[1] + lanes[2] + lanes[3]
}

impl ComplexBackend for Avx2Backend {
    #[target_feature(enable = "avx2")]
    unsafe fn inner_product(a: &[Complex32], b: &[Complex32], conjugate: bool) -> Complex32 {
        let len = a.len();
        let a_ptr = as_lanes(a).as_ptr();
        let b_ptr = as_lanes(b).as_ptr();
        let sign = _mm256_set1_ps(if conjugate { -1.0 } else { 1.0 });

        let mut re_acc = _mm256_setzero_ps();
        let mut im_acc = _mm256_setzero_ps();
        let mut i = 0;

        while i + GROUP <= len {
            let a_lo = _mm256_loadu_ps(a_ptr.add(2 * i));
            let a_hi = _mm256_loadu_ps(a_ptr.add(2 * i + 8));
            let b_lo = _mm256_loadu_ps(b_ptr.add(2 * i));
            let b_hi = _mm256_loadu_ps(b_ptr.add(2 * i + 8));

            let ar = _mm256_shuffle_ps::<REAL_LANES>(a_lo, a_hi);
            let ai = _mm256_shuffle_ps::<IMAG_LANES>(a_lo, a_hi);
            let br = _mm256_shuffle_ps::<REAL_LANES>(b_lo, b_hi);
            let bi = _mm256_mul_ps(_mm256_shuffle_ps::<IMAG_LANES>(b_lo, b_hi), sign);

            let re = _mm256_sub_ps(_mm256_mul_ps(ar, br), _mm256_mul_ps(ai, bi));
            let im = _mm256_add_ps(_mm256_mul_ps(ar, bi), _mm256_mul_ps(ai, br));
            re_acc = _mm256_add_ps(re_acc, re);
            im_acc = _mm256_add_ps(im_acc, im);

            i += GROUP;
        }

        let (re, im) = accumulate(
            &a[i..],
            &b[i..],
            conjugate,
            horizontal_sum(re_acc),
            horizontal_sum(im_acc),
        );
        Complex32::new(re, im)
    }

    #[target_feature(enable = "avx2")]
    unsafe fn add(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 8 <= len {
            let va = _mm256_loadu_ps(a.as_ptr().add(i));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_add_ps(va, vb));
            i += 8;
        }

        for j in i..len {
            out[j] = a[j] + b[j];
        }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn sub(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 8 <= len {
            let va = _mm256_loadu_ps(a.as_ptr().add(i));
            let vb = _mm256_loadu_ps(b.as_ptr().add(i));
            _mm256_storeu_ps(out.as_mut_ptr().add(i), _mm256_sub_ps(va, vb));
            i += 8;
        }

        for j in i..len {
            out[j] = a[j] - b[j];
        }
    }
}
