//! End-to-end tests for the public kernel surface
//!
//! Covers:
//! - Inner products across backends, including the Hermitian scenario
//! - Projections built on top of the inner product
//! - Standard and Strassen multiplication, including the 2x2 scenario
//! - Concurrent top-level `fast_multiply` calls on independent operands
//! - Cancellation and deadlines

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cxkernel::{
    angle_between, fast_multiply, scalar_projection, select_best_available_backend,
    vector_projection, AngleUnit, Backend, CancellationToken, Complex32, ComplexVector,
    KernelError, Matrix, Step, StrassenConfig, StrassenEngine, SubproductPairing,
};
use proptest::prelude::*;

// ============================================================================
// PROPERTY TEST CONFIGURATION
// ============================================================================

const PROPTEST_CASES: u32 = 32;

fn matrix_from(n: usize, values: &[(f32, f32)]) -> Matrix {
    let mut m = Matrix::new("M", n, n).unwrap();
    for (idx, &(re, im)) in values.iter().enumerate() {
        m.update(Complex32::new(re, im), idx / n, idx % n);
    }
    m
}

fn max_modulus(m: &Matrix) -> f32 {
    let zero = Matrix::new("Z", m.rows(), m.cols()).unwrap();
    m.max_abs_diff(&zero).unwrap()
}

fn sample(n: usize, seed: f32) -> Matrix {
    let values: Vec<(f32, f32)> = (0..n * n)
        .map(|i| {
            let x = i as f32 + seed;
            ((x * 0.13).sin(), (x * 0.29).cos())
        })
        .collect();
    matrix_from(n, &values)
}

// ============================================================================
// INNER PRODUCT
// ============================================================================

#[test]
fn integration_hermitian_inner_product_scenario() {
    let u = ComplexVector::from_slice("u", &[Complex32::new(1.0, 1.0); 3]).unwrap();
    let v = ComplexVector::from_slice("v", &[Complex32::new(2.0, 2.0); 3]).unwrap();

    let result = u.inner_product(&v).unwrap();
    assert_eq!(result.re, 12.0);
    assert_eq!(result.im, 0.0);
}

#[test]
fn integration_inner_product_every_supported_backend() {
    let u_data: Vec<Complex32> = (0..53)
        .map(|i| Complex32::new(i as f32 * 0.1, -(i as f32) * 0.02))
        .collect();
    let v_data: Vec<Complex32> = (0..53)
        .map(|i| Complex32::new(1.0 - i as f32 * 0.01, i as f32 * 0.03))
        .collect();
    let v = ComplexVector::from_slice("v", &v_data).unwrap();

    let reference = ComplexVector::from_slice_with_backend("u", &u_data, Backend::Scalar)
        .unwrap()
        .inner_product(&v)
        .unwrap();

    for backend in [Backend::SSE2, Backend::AVX2, Backend::NEON, Backend::Auto] {
        match ComplexVector::from_slice_with_backend("u", &u_data, backend) {
            Ok(u) => {
                let result = u.inner_product(&v).unwrap();
                assert!(
                    (result - reference).norm() < 1e-3,
                    "{backend:?}: {result} vs {reference}"
                );
            }
            Err(err) => assert_eq!(err, KernelError::UnsupportedBackend(backend)),
        }
    }

    assert!(select_best_available_backend().is_supported());
}

#[test]
fn integration_vector_errors() {
    assert_eq!(ComplexVector::new("v", 0).unwrap_err(), KernelError::BadSize(0));

    let u = ComplexVector::new("u", 3).unwrap();
    let v = ComplexVector::new("v", 4).unwrap();
    assert_eq!(
        u.inner_product(&v).unwrap_err(),
        KernelError::SizeMismatch {
            expected: 3,
            actual: 4
        }
    );
}

// ============================================================================
// PROJECTIONS
// ============================================================================

#[test]
fn integration_projections() {
    let u = ComplexVector::from_real("u", &[3.0, 4.0, 0.0]).unwrap();
    let v = ComplexVector::from_real("v", &[0.0, 2.0, 0.0]).unwrap();

    assert!((scalar_projection(&u, &v).unwrap() - 4.0).abs() < 1e-6);

    let w = vector_projection(&u, &v).unwrap();
    assert_eq!(w.as_slice()[1], Complex32::new(4.0, 0.0));

    let deg = angle_between(&u, &v, AngleUnit::Degrees).unwrap();
    let expected = (4.0f32 / 5.0).acos().to_degrees();
    assert!((deg - expected).abs() < 1e-3);

    let zero = ComplexVector::new("z", 3).unwrap();
    assert_eq!(scalar_projection(&u, &zero).unwrap_err(), KernelError::EmptyVector);
}

// ============================================================================
// MULTIPLICATION
// ============================================================================

#[test]
fn integration_two_by_two_scenario() {
    let a = Matrix::from_real_rows("A", &[&[1.0, 2.0], &[0.0, 1.0]]).unwrap();
    let b = Matrix::from_real_rows("B", &[&[2.0, 1.0], &[1.0, 2.0]]).unwrap();
    let expected = Matrix::from_real_rows("C", &[&[4.0, 5.0], &[1.0, 2.0]]).unwrap();

    assert_eq!(a.standard_multiply(&b).unwrap(), expected);
    assert_eq!(fast_multiply(&a, &b).unwrap(), expected);
}

#[test]
fn integration_one_by_one_is_scalar_product() {
    let x = Complex32::new(1.5, -2.0);
    let y = Complex32::new(-0.5, 3.0);
    let a = Matrix::from_rows("A", &[&[x]]).unwrap();
    let b = Matrix::from_rows("B", &[&[y]]).unwrap();
    assert_eq!(fast_multiply(&a, &b).unwrap().get(0, 0), Some(x * y));
}

#[test]
fn integration_dimension_mismatch_everywhere() {
    let a = Matrix::new("A", 2, 3).unwrap();
    let b = Matrix::new("B", 4, 2).unwrap();
    let expected = KernelError::DimensionMismatch {
        left: (2, 3),
        right: (4, 2),
    };

    assert_eq!(a.standard_multiply(&b).unwrap_err(), expected);
    assert_eq!(fast_multiply(&a, &b).unwrap_err(), expected);
}

#[test]
fn integration_power_of_two_short_circuit_is_observable() {
    let engine = StrassenEngine::sequential(StrassenConfig::default());
    let a = sample(16, 0.0);
    let b = sample(16, 1.0);

    // Power-of-two operands never split
    assert_eq!(engine.plan(&a, &b), Step::Standard);
    assert_eq!(engine.multiply(&a, &b).unwrap(), a.standard_multiply(&b).unwrap());
}

#[test]
fn integration_legacy_pairing_flagged() {
    let legacy = StrassenEngine::new(
        StrassenConfig::new()
            .with_workers(2)
            .with_pairing(SubproductPairing::Legacy),
    )
    .unwrap();
    let a = sample(12, 0.0);
    let b = sample(12, 5.0);

    let standard = a.standard_multiply(&b).unwrap();
    let diff = legacy.multiply(&a, &b).unwrap().max_abs_diff(&standard).unwrap();
    assert!(diff > 1e-2, "legacy pairing unexpectedly matched: diff={diff}");
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn integration_concurrent_fast_multiply_callers() {
    let pairs: Vec<(Matrix, Matrix)> = (0..2)
        .map(|k| (sample(24, k as f32 * 11.0), sample(24, k as f32 * 17.0 + 3.0)))
        .collect();
    let expected: Vec<Matrix> = pairs
        .iter()
        .map(|(a, b)| a.standard_multiply(b).unwrap())
        .collect();

    let results: Vec<Matrix> = thread::scope(|s| {
        let handles: Vec<_> = pairs
            .iter()
            .map(|(a, b)| s.spawn(move || fast_multiply(a, b).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (got, want) in results.iter().zip(&expected) {
        let diff = got.max_abs_diff(want).unwrap();
        assert!(diff <= 1e-4 * (1.0 + max_modulus(want)), "diff={diff}");
    }
}

#[test]
fn integration_shared_engine_across_threads() {
    let engine = Arc::new(StrassenEngine::new(StrassenConfig::new().with_workers(3)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|k| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let a = sample(12, k as f32);
                let b = sample(12, k as f32 + 0.5);
                let fast = engine.multiply(&a, &b).unwrap();
                let standard = a.standard_multiply(&b).unwrap();
                fast.max_abs_diff(&standard).unwrap() <= 1e-4 * (1.0 + max_modulus(&standard))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

// ============================================================================
// CANCELLATION
// ============================================================================

#[test]
fn integration_cancellation_and_deadline() {
    let engine = StrassenEngine::new(StrassenConfig::new().with_workers(2)).unwrap();
    let a = sample(24, 0.0);

    let token = CancellationToken::new();
    token.cancel();
    assert_eq!(
        engine.multiply_with_cancellation(&a, &a, &token).unwrap_err(),
        KernelError::Cancelled
    );

    let expired = StrassenEngine::new(
        StrassenConfig::new()
            .with_workers(2)
            .with_timeout(Duration::ZERO),
    )
    .unwrap();
    assert_eq!(expired.multiply(&a, &a).unwrap_err(), KernelError::DeadlineExceeded);

    // A fresh token on the same engine is unaffected
    assert!(engine.multiply_with_cancellation(&a, &a, &CancellationToken::new()).is_ok());
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    /// fast_multiply equals standard_multiply for even sides that split down to the threshold
    #[test]
    fn integration_fast_equals_standard(
        (n, a, b) in prop::sample::select(vec![6usize, 10, 12, 24]).prop_flat_map(|n| (
            Just(n),
            prop::collection::vec((-1.0f32..1.0, -1.0f32..1.0), n * n),
            prop::collection::vec((-1.0f32..1.0, -1.0f32..1.0), n * n),
        ))
    ) {
        let a = matrix_from(n, &a);
        let b = matrix_from(n, &b);

        let standard = a.standard_multiply(&b).unwrap();
        let fast = fast_multiply(&a, &b).unwrap();
        let diff = fast.max_abs_diff(&standard).unwrap();
        prop_assert!(diff <= 1e-4 * (1.0 + max_modulus(&standard)), "n={} diff={}", n, diff);
    }

    /// (A - B) + B reproduces A
    #[test]
    fn integration_matrix_sub_add_round_trip(
        (n, a, b) in (1usize..9).prop_flat_map(|n| (
            Just(n),
            prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), n * n),
            prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), n * n),
        ))
    ) {
        let a = matrix_from(n, &a);
        let b = matrix_from(n, &b);
        let back = a.sub(&b).unwrap().add(&b).unwrap();
        prop_assert!(back.max_abs_diff(&a).unwrap() < 1e-3);
    }
}
