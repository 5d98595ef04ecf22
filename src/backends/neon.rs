//! NEON backend implementation (aarch64 SIMD)
//!
//! `vld2q_f32` de-interleaves 4 complex scalars into a register of real parts
//! and a register of imaginary parts in one load, so no shuffles are needed.

#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::*;

use num_complex::Complex32;

use super::scalar::accumulate;
use super::{as_lanes, as_lanes_mut, ComplexBackend};

const GROUP: usize = 4;

/// NEON backend (128-bit SIMD for aarch64)
pub struct NeonBackend;

impl ComplexBackend for NeonBackend {
    #[target_feature(enable = "neon")]
    unsafe fn inner_product(a: &[Complex32], b: &[Complex32], conjugate: bool) -> Complex32 {
        let len = a.len();
        let a_ptr = as_lanes(a).as_ptr();
        let b_ptr = as_lanes(b).as_ptr();

        let mut re_acc = vdupq_n_f32(0.0);
        let mut im_acc = vdupq_n_f32(0.0);
        let mut i = 0;

        while i + GROUP <= len {
            let va = vld2q_f32(a_ptr.add(2 * i));
            let vb = vld2q_f32(b_ptr.add(2 * i));
            let (ar, ai) = (va.0, va.1);
            let br = vb.0;
            let bi = if conjugate { vnegq_f32(vb.1) } else { vb.1 };

            let re = vsubq_f32(vmulq_f32(ar, br), vmulq_f32(ai, bi));
            let im = vaddq_f32(vmulq_f32(ar, bi), vmulq_f32(ai, br));
            re_acc = vaddq_f32(re_acc, re);
            im_acc = vaddq_f32(im_acc, im);

            i += GROUP;
        }

        let (re, im) = accumulate(
            &a[i..],
            &b[i..],
            conjugate,
            vaddvq_f32(re_acc),
            vaddvq_f32(im_acc),
        );
        Complex32::new(re, im)
    }

    #[target_feature(enable = "neon")]
    unsafe fn add(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 4 <= len {
            let va = vld1q_f32(a.as_ptr().add(i));
            let vb = vld1q_f32(b.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), vaddq_f32(va, vb));
            i += 4;
        }

        for j in i..len {
            out[j] = a[j] + b[j];
        }
    }

    #[target_feature(enable = "neon")]
    unsafe fn sub(a: &[Complex32], b: &[Complex32], result: &mut [Complex32]) {
        let (a, b, out) = (as_lanes(a), as_lanes(b), as_lanes_mut(result));
        let len = a.len();
        let mut i = 0;

        while i + 4 <= len {
            let va = vld1q_f32(a.as_ptr().add(i));
            let vb = vld1q_f32(b.as_ptr().add(i));
            vst1q_f32(out.as_mut_ptr().add(i), vsubq_f32(va, vb));
            i += 4;
        }

        for j in i..len {
            out[j] = a[j] - b[j];
        }
    }
}
