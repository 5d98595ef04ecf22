//! Projections and angles built on the inner product
//!
//! All three operations reject mismatched lengths with
//! [`KernelError::SizeMismatch`] and zero-norm operands with
//! [`KernelError::EmptyVector`].

use num_complex::Complex32;

use crate::{ComplexVector, KernelError, Result};

/// Unit for [`angle_between`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    /// Radians in `[0, π]`
    #[default]
    Radians,
    /// Degrees in `[0, 180]`
    Degrees,
}

fn check_lengths(u: &ComplexVector, v: &ComplexVector) -> Result<()> {
    if u.len() != v.len() {
        return Err(KernelError::SizeMismatch {
            expected: u.len(),
            actual: v.len(),
        });
    }
    Ok(())
}

fn nonzero_norm(v: &ComplexVector) -> Result<f32> {
    let norm = v.l2_norm();
    if norm == 0.0 {
        return Err(KernelError::EmptyVector);
    }
    Ok(norm)
}

/// Signed length of the projection of `u` onto `v`: `Re⟨u, v⟩ / ‖v‖`
///
/// # Examples
///
/// ```
/// use cxkernel::{scalar_projection, ComplexVector};
///
/// let u = ComplexVector::from_real("u", &[3.0, 4.0]).unwrap();
/// let v = ComplexVector::from_real("v", &[1.0, 0.0]).unwrap();
/// assert_eq!(scalar_projection(&u, &v).unwrap(), 3.0);
/// ```
pub fn scalar_projection(u: &ComplexVector, v: &ComplexVector) -> Result<f32> {
    check_lengths(u, v)?;
    let norm = nonzero_norm(v)?;
    Ok(u.inner_product(v)?.re / norm)
}

/// Projection of `u` onto the direction of `v`
pub fn vector_projection(u: &ComplexVector, v: &ComplexVector) -> Result<ComplexVector> {
    check_lengths(u, v)?;
    let norm = nonzero_norm(v)?;
    let factor = u.inner_product(v)?.re / norm;

    let mut w = v.scale(Complex32::new(factor / norm, 0.0))?;
    w.rename("W");
    Ok(w)
}

/// Angle between `u` and `v`
///
/// The normalized cosine is clamped to `[-1, 1]` so rounding never yields `NaN`.
///
/// # Examples
///
/// ```
/// use cxkernel::{angle_between, AngleUnit, ComplexVector};
///
/// let u = ComplexVector::from_real("u", &[1.0, 0.0]).unwrap();
/// let v = ComplexVector::from_real("v", &[0.0, 2.0]).unwrap();
/// let deg = angle_between(&u, &v, AngleUnit::Degrees).unwrap();
/// assert!((deg - 90.0).abs() < 1e-4);
/// ```
pub fn angle_between(u: &ComplexVector, v: &ComplexVector, unit: AngleUnit) -> Result<f32> {
    check_lengths(u, v)?;
    let denom = nonzero_norm(u)? * nonzero_norm(v)?;

    let cosine = (u.inner_product(v)?.re / denom).clamp(-1.0, 1.0);
    let radians = cosine.acos();

    Ok(match unit {
        AngleUnit::Radians => radians,
        AngleUnit::Degrees => radians.to_degrees(),
    })
}
