//! cxkernel: Dense Complex Linear-Algebra Kernel
//!
//! **cxkernel** provides the hot core of a complex-valued linear algebra library:
//!
//! 1. **ComplexVector** - SIMD-aligned, zero-initialized storage of `Complex32`
//! 2. **Inner products** - Hermitian inner product with runtime-dispatched SIMD
//!    (SSE2/AVX2 on x86_64, NEON on aarch64) and a scalar fallback
//! 3. **Matrix** - column-major collection of `ComplexVector`s with a reference
//!    triple-loop multiply
//! 4. **Strassen** - divide-and-conquer multiplication with a fork-join fan-out
//!    over a bounded worker pool
//!
//! # Design Principles
//!
//! - **Runtime dispatch**: the inner-product strategy is chosen by runtime CPU feature detection
//! - **Call-scoped parallelism**: every Strassen call owns its task batch and result slots
//! - **Errors, not aborts**: shape and allocation failures surface as [`KernelError`]
//!
//! # Quick Start
//!
//! ```rust
//! use cxkernel::{fast_multiply, Matrix};
//! use num_complex::Complex32;
//!
//! let a = Matrix::from_real_rows("A", &[&[1.0, 2.0], &[0.0, 1.0]]).unwrap();
//! let b = Matrix::from_real_rows("B", &[&[2.0, 1.0], &[1.0, 2.0]]).unwrap();
//!
//! let c = fast_multiply(&a, &b).unwrap();
//! assert_eq!(c.get(0, 0), Some(Complex32::new(4.0, 0.0)));
//! assert_eq!(c.get(1, 1), Some(Complex32::new(2.0, 0.0)));
//! ```

pub mod aligned;
pub mod backends;
pub mod error;
pub mod matrix;
pub mod projection;
pub mod strassen;
pub mod submatrix;
pub mod vector;

pub use error::{KernelError, Result};
pub use matrix::Matrix;
pub use num_complex::Complex32;
pub use projection::{angle_between, scalar_projection, vector_projection, AngleUnit};
pub use strassen::{
    fast_multiply, CancellationToken, Step, StrassenConfig, StrassenEngine, SubproductPairing,
};
pub use vector::ComplexVector;

/// Inner-product execution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Scalar fallback (no SIMD)
    Scalar,
    /// SSE2 (x86_64 baseline, 2 complex lanes per register)
    SSE2,
    /// AVX2 (256-bit, 4 complex lanes per register)
    AVX2,
    /// ARM NEON (de-interleaving loads, 4 complex lanes)
    NEON,
    /// Auto-select best available
    Auto,
}

impl Backend {
    /// Select the best available backend for the current platform
    ///
    /// This is a convenience wrapper around `select_best_available_backend()`
    pub fn select_best() -> Self {
        select_best_available_backend()
    }

    /// Whether this backend can run on the current CPU
    pub fn is_supported(self) -> bool {
        match self {
            Backend::Scalar | Backend::Auto => true,
            #[cfg(target_arch = "x86_64")]
            Backend::SSE2 => is_x86_feature_detected!("sse2"),
            #[cfg(target_arch = "x86_64")]
            Backend::AVX2 => is_x86_feature_detected!("avx2"),
            #[cfg(target_arch = "aarch64")]
            Backend::NEON => std::arch::is_aarch64_feature_detected!("neon"),
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// Resolve `Auto` to a concrete backend, leave everything else untouched
    pub fn resolve(self) -> Self {
        match self {
            Backend::Auto => select_best_available_backend(),
            other => other,
        }
    }
}

/// Detect best SIMD backend for x86_64 platforms
#[cfg(target_arch = "x86_64")]
fn detect_x86_backend() -> Backend {
    if is_x86_feature_detected!("avx2") {
        return Backend::AVX2;
    }
    if is_x86_feature_detected!("sse2") {
        return Backend::SSE2;
    }
    Backend::Scalar
}

/// Detect best SIMD backend for ARM platforms
#[cfg(target_arch = "aarch64")]
fn detect_arm_backend() -> Backend {
    if std::arch::is_aarch64_feature_detected!("neon") {
        Backend::NEON
    } else {
        Backend::Scalar
    }
}

/// Select the best available backend for the current platform
///
/// Performs runtime CPU feature detection. Priority:
///
/// **x86_64**: AVX2, then SSE2, then Scalar
///
/// **aarch64**: NEON, then Scalar
///
/// **Other platforms**: Scalar
///
/// # Examples
///
/// ```
/// use cxkernel::{select_best_available_backend, Backend};
///
/// let backend = select_best_available_backend();
/// assert_ne!(backend, Backend::Auto);
/// ```
pub fn select_best_available_backend() -> Backend {
    #[cfg(target_arch = "x86_64")]
    {
        detect_x86_backend()
    }

    #[cfg(target_arch = "aarch64")]
    {
        detect_arm_backend()
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        Backend::Scalar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_enum() {
        assert_eq!(Backend::Scalar, Backend::Scalar);
        assert_ne!(Backend::Scalar, Backend::AVX2);
    }

    #[test]
    fn test_select_best_available_backend() {
        let backend = select_best_available_backend();

        // x86_64 always has SSE2
        #[cfg(target_arch = "x86_64")]
        {
            assert!(matches!(backend, Backend::SSE2 | Backend::AVX2));
        }

        #[cfg(not(target_arch = "x86_64"))]
        {
            assert!(matches!(backend, Backend::Scalar | Backend::NEON));
        }
    }

    #[test]
    fn test_backend_selection_is_deterministic() {
        let backend1 = select_best_available_backend();
        let backend2 = select_best_available_backend();
        assert_eq!(backend1, backend2);
    }

    #[test]
    fn test_selected_backend_is_supported() {
        assert!(select_best_available_backend().is_supported());
        assert!(Backend::Scalar.is_supported());
    }

    #[test]
    fn test_resolve_auto() {
        assert_eq!(Backend::Auto.resolve(), select_best_available_backend());
        assert_eq!(Backend::Scalar.resolve(), Backend::Scalar);
    }
}
