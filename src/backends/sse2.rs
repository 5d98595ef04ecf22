//! SSE2 backend implementation (x86_64 baseline SIMD)
//!
//! SSE2 is available on all x86_64 CPUs. Each group holds 4 complex scalars:
//! two 128-bit loads per operand are de-interleaved with `shufps` into one
//! register of real parts and one of imaginary parts.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use num_complex::Complex32;

use super::scalar::accumulate;
use super::{as_lanes, as_lanes_mut, ComplexBackend};

/// Lanes 0 and 2 of both registers: `[r0, r1, r2, r3]`
const REAL_LANES: i32 = 0b10_00_10_00;
/// Lanes 1 and 3 of both registers: `[i0, i1, i2, i3]`
const IMAG_LANES: i32 = 0b11_01_11_01;
/// Complex scalars per batched group
const GROUP: usize = 4;

/// SSE2 backend (128-bit SIMD for x86_64)
pub struct Sse2Backend;

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn horizontal_sum(v: __m128) -> f32 {
    let mut lanes = [0.0f32; 4];
    _mm_storeu_ps(lanes.as_mut_ptr(), v);
    lanes[0] + lanes[1] + lanes[2] + lanes[3]
}

impl ComplexBackend for Sse2Backend {
    #[target_feature(enable = "sse2")]
    unsafe fn inner_product(a: &[Complex32], b: &[Complex32], conjugate: bool) -> Complex32 {
        let len = a.len();
        let a_ptr = as_lanes(a).as_ptr();
        let b_ptr = as_lanes(b).as_ptr();
        let sign = _mm_set1_ps(if conjugate { -1.0 } else { 1.0 });

        let mut re_acc = _mm_setzero_ps();
        let mut im_acc = _mm_setzero_ps();
        let mut i = 0;

        while i + GROUP <= len {
            let a_lo = _mm_loadu_ps(a_ptr.add(2 * i));
            let a_hi = _mm_loadu_ps(a_ptr.add(2 * i + 4));
            let b_lo = _mm_loadu_ps(b_ptr.add(2 * i));
            let b_hi = _mm_loadu_ps(b_ptr.add(2 * i + 4));

            let ar = _mm_shuffle_ps::<REAL_LANES>(a_lo, a_hi);
            let ai = _mm_shuffle_ps::<IMAG_LANES>(a_lo, a_hi);
            let br = _mm_shuffle_ps::<REAL_LANES>(b_lo, b_hi);
            let bi = _mm_mul_ps(_mm_shuffle_ps::<IMAG_LANES>(b_lo, b_hi), sign);

            // re = ac - bd, im = ad + bc
            let re = _mm_sub_ps(_mm_mul_ps(ar, br), _mm_mul_ps(ai, bi));
            let im = _mm_add_ps(_mm_mul_ps(ar, bi), _mm_mul_ps(ai, br));
            re_acc = _mm_add_ps(re_acc, re);
            im_acc = _mm_add_ps(im_acc, im);

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

    #[target_feature(enable = "sse2")]
    unsafe fn add(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 4 <= len {
            let va = _mm_loadu_ps(a.as_ptr().add(i));
            let vb = _mm_loadu_ps(b.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_add_ps(va, vb));
            i += 4;
        }

        for j in i..len {
            out[j] = a[j] + b[j];
        }
    }

    #[target_feature(enable = "sse2")]
    unsafe fn sub(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 4 <= len {
            let va = _mm_loadu_ps(a.as_ptr().add(i));
            let vb = _mm_loadu_ps(b.as_ptr().add(i));
            _mm_storeu_ps(out.as_mut_ptr().add(i), _mm_sub_ps(va, vb));
            i += 4;
        }

        for j in i..len {
            out[j] = a[j] - b[j];
        }
    }
}
