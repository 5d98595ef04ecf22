//! Complex vector with SIMD-aligned storage and multi-backend inner products

use std::borrow::Cow;
use std::fmt;

use num_complex::Complex32;

#[cfg(target_arch = "x86_64")]
use crate::backends::avx2::Avx2Backend;
#[cfg(target_arch = "aarch64")]
use crate::backends::neon::NeonBackend;
use crate::backends::scalar::ScalarBackend;
#[cfg(target_arch = "x86_64")]
use crate::backends::sse2::Sse2Backend;
use crate::backends::ComplexBackend;

use crate::aligned::AlignedBuffer;
use crate::{Backend, KernelError, Result};

/// Fixed-length vector of `Complex32` backed by a 64-byte aligned buffer
///
/// The vector always holds at least one element. The inner-product backend is
/// chosen once at construction.
///
/// # Examples
///
/// ```
/// use cxkernel::ComplexVector;
/// use num_complex::Complex32;
///
/// let mut v = ComplexVector::new("v", 3).unwrap();
/// v.update(Complex32::new(1.0, -1.0), 2);
/// assert_eq!(v.get(2), Some(Complex32::new(1.0, -1.0)));
/// assert_eq!(v.get(0), Some(Complex32::new(0.0, 0.0)));
/// ```
#[derive(Clone)]
pub struct ComplexVector {
    name: Cow<'static, str>,
    items: AlignedBuffer,
    backend: Backend,
}

impl ComplexVector {
    /// Create a zero-filled vector using the auto-selected backend
    ///
    /// # Errors
    ///
    /// - [`KernelError::BadSize`] if `len == 0`
    /// - [`KernelError::OutOfMemory`] if the aligned allocation fails
    pub fn new(name: impl Into<Cow<'static, str>>, len: usize) -> Result<Self> {
        Self::with_backend(name, len, Backend::Auto)
    }

    /// Create a zero-filled vector with a specific backend (for testing or benchmarking)
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::UnsupportedBackend`] if the CPU cannot run `backend`,
    /// plus the errors of [`ComplexVector::new`].
    pub fn with_backend(
        name: impl Into<Cow<'static, str>>,
        len: usize,
        backend: Backend,
    ) -> Result<Self> {
        let backend = backend.resolve();
        if !backend.is_supported() {
            return Err(KernelError::UnsupportedBackend(backend));
        }

        Ok(Self {
            name: name.into(),
            items: AlignedBuffer::zeroed(len)?,
            backend,
        })
    }

    /// Create a vector holding a copy of `data`
    ///
    /// # Examples
    ///
    /// ```
    /// use cxkernel::ComplexVector;
    /// use num_complex::Complex32;
    ///
    /// let v = ComplexVector::from_slice("v", &[Complex32::new(1.0, 2.0)]).unwrap();
    /// assert_eq!(v.len(), 1);
    /// ```
    pub fn from_slice(name: impl Into<Cow<'static, str>>, data: &[Complex32]) -> Result<Self> {
        Self::from_slice_with_backend(name, data, Backend::Auto)
    }

    /// Create a vector holding a copy of `data` with a specific backend
    pub fn from_slice_with_backend(
        name: impl Into<Cow<'static, str>>,
        data: &[Complex32],
        backend: Backend,
    ) -> Result<Self> {
        let mut v = Self::with_backend(name, data.len(), backend)?;
        v.items.copy_from_slice(data);
        Ok(v)
    }

    /// Create a vector of purely real entries
    pub fn from_real(name: impl Into<Cow<'static, str>>, data: &[f32]) -> Result<Self> {
        let mut v = Self::new(name, data.len())?;
        for (slot, &re) in v.items.iter_mut().zip(data) {
            *slot = Complex32::new(re, 0.0);
        }
        Ok(v)
    }

    /// Release the vector's storage
    ///
    /// Consumes the vector, so releasing twice is rejected at compile time.
    pub fn destroy(self) {
        drop(self);
    }

    /// Diagnostic label
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the diagnostic label
    pub fn rename(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }

    /// Number of elements (always > 0)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false`: construction rejects empty vectors
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Backend used for inner products and element-wise arithmetic
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Underlying elements
    pub fn as_slice(&self) -> &[Complex32] {
        &self.items
    }

    /// Underlying elements, mutable
    pub fn as_mut_slice(&mut self) -> &mut [Complex32] {
        &mut self.items
    }

    /// Element at `index`, or `None` when out of range
    pub fn get(&self, index: usize) -> Option<Complex32> {
        self.items.get(index).copied()
    }

    /// Write `value` at `index`
    ///
    /// Hot-path update. Debug builds report the offending index; release
    /// builds still panic through the slice bounds check rather than corrupt memory.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn update(&mut self, value: Complex32, index: usize) {
        debug_assert!(
            index < self.len(),
            "update index {index} out of range for vector '{}' of length {}",
            self.name,
            self.len()
        );
        self.items[index] = value;
    }

    /// Write `value` at `index` without a bounds check
    ///
    /// # Safety
    ///
    /// `index` must be `< self.len()`.
    #[inline]
    pub unsafe fn update_unchecked(&mut self, value: Complex32, index: usize) {
        debug_assert!(index < self.len());
        *self.items.get_unchecked_mut(index) = value;
    }

    /// Bounds-checked write
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::IndexOutOfRange`] if `index >= self.len()`.
    pub fn try_update(&mut self, value: Complex32, index: usize) -> Result<()> {
        let len = self.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(KernelError::IndexOutOfRange { index, len })?;
        *slot = value;
        Ok(())
    }

    /// `true` if every element has a zero imaginary part
    pub fn is_real(&self) -> bool {
        self.items.iter().all(|z| z.im == 0.0)
    }

    /// Element-wise `self + other`, or `self - other` when `subtract`
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::SizeMismatch`] if lengths differ.
    pub fn combine(&self, other: &Self, subtract: bool) -> Result<Self> {
        if self.len() != other.len() {
            return Err(KernelError::SizeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }

        let mut result = Self::with_backend(self.name.clone(), self.len(), self.backend)?;
        let (a, b, out) = (self.as_slice(), other.as_slice(), &mut *result.items);

        // Dispatch to appropriate backend
        unsafe {
            match (self.backend, subtract) {
                #[cfg(target_arch = "x86_64")]
                (Backend::AVX2, false) => Avx2Backend::add(a, b, out),
                #[cfg(target_arch = "x86_64")]
                (Backend::AVX2, true) => Avx2Backend::sub(a, b, out),
                #[cfg(target_arch = "x86_64")]
                (Backend::SSE2, false) => Sse2Backend::add(a, b, out),
                #[cfg(target_arch = "x86_64")]
                (Backend::SSE2, true) => Sse2Backend::sub(a, b, out),
                #[cfg(target_arch = "aarch64")]
                (Backend::NEON, false) => NeonBackend::add(a, b, out),
                #[cfg(target_arch = "aarch64")]
                (Backend::NEON, true) => NeonBackend::sub(a, b, out),
                (_, false) => ScalarBackend::add(a, b, out),
                (_, true) => ScalarBackend::sub(a, b, out),
            }
        }

        Ok(result)
    }

    /// Element-wise addition
    ///
    /// # Examples
    ///
    /// ```
    /// use cxkernel::ComplexVector;
    ///
    /// let a = ComplexVector::from_real("a", &[1.0, 2.0]).unwrap();
    /// let b = ComplexVector::from_real("b", &[3.0, 4.0]).unwrap();
    /// let c = a.add(&b).unwrap();
    /// assert_eq!(c.get(1).unwrap().re, 6.0);
    /// ```
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, false)
    }

    /// Element-wise subtraction
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.combine(other, true)
    }

    /// Multiply every element by `factor`
    pub fn scale(&self, factor: Complex32) -> Result<Self> {
        let mut result = Self::with_backend(self.name.clone(), self.len(), self.backend)?;
        for (out, z) in result.items.iter_mut().zip(self.items.iter()) {
            *out = factor * z;
        }
        Ok(result)
    }

    /// Sum of moduli
    pub fn l1_norm(&self) -> f32 {
        self.items.iter().map(|z| z.norm()).sum()
    }

    /// Euclidean norm `sqrt(Σ |z|²)`
    pub fn l2_norm(&self) -> f32 {
        self.items.iter().map(|z| z.norm_sqr()).sum::<f32>().sqrt()
    }

    /// Inner product `⟨self, other⟩`
    ///
    /// Computes `Σ self[i] * conj(other[i])` when `other` has any imaginary part,
    /// and the bilinear `Σ self[i] * other[i]` when `other` is purely real.
    ///
    /// # Examples
    ///
    /// ```
    /// use cxkernel::ComplexVector;
    /// use num_complex::Complex32;
    ///
    /// let u = ComplexVector::from_slice("u", &[Complex32::new(1.0, 1.0); 3]).unwrap();
    /// let v = ComplexVector::from_slice("v", &[Complex32::new(2.0, 2.0); 3]).unwrap();
    /// assert_eq!(u.inner_product(&v).unwrap(), Complex32::new(12.0, 0.0));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::SizeMismatch`] if vectors have different lengths.
    pub fn inner_product(&self, other: &Self) -> Result<Complex32> {
        if self.len() != other.len() {
            return Err(KernelError::SizeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }

        let conjugate = !other.is_real();
        let (a, b) = (self.as_slice(), other.as_slice());

        let result = unsafe {
            match self.backend {
                #[cfg(target_arch = "x86_64")]
                Backend::AVX2 => Avx2Backend::inner_product(a, b, conjugate),
                #[cfg(target_arch = "x86_64")]
                Backend::SSE2 => Sse2Backend::inner_product(a, b, conjugate),
                #[cfg(target_arch = "aarch64")]
                Backend::NEON => NeonBackend::inner_product(a, b, conjugate),
                _ => ScalarBackend::inner_product(a, b, conjugate),
            }
        };

        Ok(result)
    }

    /// `true` if `|⟨self, other⟩| <= tolerance * ‖self‖ ‖other‖`
    ///
    /// A zero vector is orthogonal to everything.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::SizeMismatch`] if vectors have different lengths.
    pub fn is_orthogonal_to(&self, other: &Self, tolerance: f32) -> Result<bool> {
        let dot = self.inner_product(other)?;
        Ok(dot.norm() <= tolerance * self.l2_norm() * other.l2_norm())
    }

    /// `true` if `|⟨self, other⟩| >= (1 - tolerance) * ‖self‖ ‖other‖`
    ///
    /// This is the equality case of Cauchy-Schwarz, so it holds exactly when
    /// one vector is a complex multiple of the other. Zero vectors are
    /// collinear with everything.
    ///
    /// # Example
    ///
    /// ```
    /// use cxkernel::ComplexVector;
    /// use num_complex::Complex32;
    ///
    /// let u = ComplexVector::from_real("u", &[1.0, 2.0]).unwrap();
    /// let v = u.scale(Complex32::new(0.0, -3.0)).unwrap();
    /// assert!(u.is_collinear_with(&v, 1e-5).unwrap());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::SizeMismatch`] if vectors have different lengths.
    pub fn is_collinear_with(&self, other: &Self, tolerance: f32) -> Result<bool> {
        let dot = self.inner_product(other)?;
        Ok(dot.norm() >= (1.0 - tolerance) * self.l2_norm() * other.l2_norm())
    }

    /// `true` if `self[i] == -other[i]` for every element
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::SizeMismatch`] if vectors have different lengths.
    pub fn is_opposite_of(&self, other: &Self) -> Result<bool> {
        if self.len() != other.len() {
            return Err(KernelError::SizeMismatch {
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok(self.items.iter().zip(other.items.iter()).all(|(a, b)| *a == -b))
    }
}

impl PartialEq for ComplexVector {
    /// Element-wise equality; name and backend are not compared
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl fmt::Debug for ComplexVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplexVector")
            .field("name", &self.name)
            .field("backend", &self.backend)
            .field("items", &self.items)
            .finish()
    }
}
