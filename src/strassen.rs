//! Strassen matrix multiplication
//!
//! Each recursive step splits square, even-sized operands into quadrants,
//! forms seven sub-products and recombines them. The seven sub-products of a
//! step are one fork-join batch: the task descriptors and their result slots
//! live in that call's stack frame, and the batch runs on the engine's worker
//! pool. Two concurrent calls never share a result slot.
//!
//! # Examples
//!
//! ```
//! use cxkernel::{Matrix, StrassenConfig, StrassenEngine};
//! use std::time::Duration;
//!
//! let engine = StrassenEngine::new(
//!     StrassenConfig::new()
//!         .with_workers(2)
//!         .with_timeout(Duration::from_secs(30))
//!         .build(),
//! )
//! .unwrap();
//!
//! let a = Matrix::identity(6).unwrap();
//! let b = Matrix::identity(6).unwrap();
//! assert_eq!(engine.multiply(&a, &b).unwrap(), a);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::submatrix::{extract, splice};
use crate::{KernelError, Matrix, Result};

/// Operands with any dimension below this are multiplied directly
pub const DEFAULT_THRESHOLD: usize = 4;

/// Worker pool size used by [`StrassenConfig::default`]
pub const DEFAULT_WORKERS: usize = 8;

/// Operand pairing for the sixth and seventh sub-products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubproductPairing {
    /// `P6 = (A12 - A22)(B21 + B22)`, `P7 = (A11 - A21)(B11 + B12)`
    #[default]
    Canonical,
    /// `P6 = (A12 - A22) B21`, `P7 = (A12 - A22)(B11 + B22)`
    ///
    /// Reproduces historical results. It does not equal the true product
    /// once a step actually recurses.
    Legacy,
}

/// Strassen engine configuration
///
/// # Examples
///
/// ```
/// use cxkernel::{StrassenConfig, SubproductPairing};
///
/// let config = StrassenConfig::new()
///     .with_threshold(8)
///     .with_workers(0)
///     .with_pairing(SubproductPairing::Legacy)
///     .build();
/// assert_eq!(config.threshold, 8);
/// assert_eq!(config.workers, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrassenConfig {
    /// Any operand dimension below this stops the recursion
    pub threshold: usize,
    /// Worker pool size (0 = host core count)
    pub workers: usize,
    /// Sub-product pairing
    pub pairing: SubproductPairing,
    /// Wall-clock budget per top-level call
    pub timeout: Option<Duration>,
}

impl Default for StrassenConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            workers: DEFAULT_WORKERS,
            pairing: SubproductPairing::Canonical,
            timeout: None,
        }
    }
}

impl StrassenConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base-case threshold
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the worker pool size (0 = host core count)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the sub-product pairing
    pub fn with_pairing(mut self, pairing: SubproductPairing) -> Self {
        self.pairing = pairing;
        self
    }

    /// Abort calls that run longer than `timeout`
    ///
    /// # Examples
    ///
    /// ```
    /// use cxkernel::StrassenConfig;
    /// use std::time::Duration;
    ///
    /// let config = StrassenConfig::new().with_timeout(Duration::from_millis(250));
    /// assert_eq!(config.timeout, Some(Duration::from_millis(250)));
    /// ```
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Finalize configuration (no-op, for builder pattern consistency)
    pub fn build(self) -> Self {
        self
    }

    /// Worker count with `0` resolved to the host core count
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        }
    }
}

/// Cooperative stop flag shared between a caller and running multiplications
///
/// Clones share the same flag.
///
/// ```
/// use cxkernel::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed at the next recursive step
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Base-case decision for one pair of operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Multiply with [`Matrix::standard_multiply`]
    Standard,
    /// Split into quadrants and recurse
    Recurse,
}

/// Per-call state visible to every recursive step of that call
struct CallContext<'a> {
    token: &'a CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext<'_> {
    fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(KernelError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(KernelError::DeadlineExceeded);
        }
        Ok(())
    }
}

/// Strassen multiplier owning a reusable worker pool
pub struct StrassenEngine {
    config: StrassenConfig,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for StrassenEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrassenEngine")
            .field("config", &self.config)
            .field("workers", &self.workers())
            .finish()
    }
}

#[cfg(feature = "parallel")]
fn build_pool(workers: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("strassen-worker-{i}"))
        .build()
        .map_err(|e| KernelError::ThreadPool(e.to_string()))
}

impl StrassenEngine {
    /// Create an engine, building a worker pool when the `parallel` feature is on
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::ThreadPool`] if the pool cannot be built.
    pub fn new(config: StrassenConfig) -> Result<Self> {
        #[cfg(feature = "parallel")]
        {
            let workers = config.effective_workers();
            let pool = build_pool(workers)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(workers, "built strassen worker pool");
            Ok(Self {
                config,
                pool: Some(pool),
            })
        }

        #[cfg(not(feature = "parallel"))]
        {
            Ok(Self::sequential(config))
        }
    }

    /// Create an engine that runs every sub-product on the calling thread
    pub fn sequential(config: StrassenConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &StrassenConfig {
        &self.config
    }

    /// Number of threads that run sub-products (1 when sequential)
    pub fn workers(&self) -> usize {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.current_num_threads();
        }
        1
    }

    /// Decide whether `a × b` is multiplied directly or split
    ///
    /// Operands that are a power of two in both dimensions of `a`, or that
    /// have any dimension below the threshold, go straight to the standard
    /// product. Of the rest, only square operands with an even side are split;
    /// everything else also uses the standard product.
    ///
    /// # Examples
    ///
    /// ```
    /// use cxkernel::{Matrix, Step, StrassenConfig, StrassenEngine};
    ///
    /// let engine = StrassenEngine::sequential(StrassenConfig::default());
    /// let eight = Matrix::new("A", 8, 8).unwrap();
    /// let six = Matrix::new("B", 6, 6).unwrap();
    /// assert_eq!(engine.plan(&eight, &eight), Step::Standard);
    /// assert_eq!(engine.plan(&six, &six), Step::Recurse);
    /// ```
    pub fn plan(&self, a: &Matrix, b: &Matrix) -> Step {
        let dims = [a.rows(), a.cols(), b.rows(), b.cols()];
        let power_of_two = a.rows().is_power_of_two() && a.cols().is_power_of_two();
        let below_threshold = dims.iter().any(|&d| d < self.config.threshold);
        if power_of_two || below_threshold {
            return Step::Standard;
        }

        let n = a.rows();
        if n % 2 == 0 && dims.iter().all(|&d| d == n) {
            Step::Recurse
        } else {
            Step::Standard
        }
    }

    /// Multiply `a × b`
    ///
    /// # Errors
    ///
    /// - [`KernelError::DimensionMismatch`] if `a.cols() != b.rows()`, before any allocation
    /// - [`KernelError::DeadlineExceeded`] if the configured timeout elapses
    /// - [`KernelError::OutOfMemory`] if an intermediate allocation fails
    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        self.multiply_with_cancellation(a, b, &CancellationToken::new())
    }

    /// Multiply `a × b`, stopping early once `token` is cancelled
    ///
    /// The token and the deadline are checked at every recursive step; on
    /// either, all intermediates are dropped and no partial result is returned.
    #[cfg_attr(feature = "tracing", instrument(skip(self, a, b, token), fields(dims = %format!("{}x{} @ {}x{}", a.rows(), a.cols(), b.rows(), b.cols()), pairing = ?self.config.pairing)))]
    pub fn multiply_with_cancellation(
        &self,
        a: &Matrix,
        b: &Matrix,
        token: &CancellationToken,
    ) -> Result<Matrix> {
        if a.cols() != b.rows() {
            return Err(KernelError::DimensionMismatch {
                left: a.shape(),
                right: b.shape(),
            });
        }

        let ctx = CallContext {
            token,
            // A timeout past the representable range means no deadline
            deadline: self
                .config
                .timeout
                .and_then(|t| Instant::now().checked_add(t)),
        };

        let result = self.in_pool(|| self.step(a, b, &ctx));

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::debug!(%err, "strassen multiply aborted");
        }

        result
    }

    fn in_pool<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        #[cfg(feature = "parallel")]
        if let Some(pool) = &self.pool {
            return pool.install(op);
        }
        op()
    }

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all, fields(n = a.rows())))]
    fn step(&self, a: &Matrix, b: &Matrix, ctx: &CallContext<'_>) -> Result<Matrix> {
        ctx.check()?;

        if self.plan(a, b) == Step::Standard {
            #[cfg(feature = "tracing")]
            tracing::trace!(rows = a.rows(), cols = b.cols(), "base case");
            return a.standard_multiply(b);
        }

        let n = a.rows();
        let half = n / 2;
        let (lo, hi) = (0..half, half..n);

        let a11 = extract(a, lo.clone(), lo.clone())?;
        let a12 = extract(a, lo.clone(), hi.clone())?;
        let a21 = extract(a, hi.clone(), lo.clone())?;
        let a22 = extract(a, hi.clone(), hi.clone())?;
        let b11 = extract(b, lo.clone(), lo.clone())?;
        let b12 = extract(b, lo.clone(), hi.clone())?;
        let b21 = extract(b, hi.clone(), lo.clone())?;
        let b22 = extract(b, hi.clone(), hi.clone())?;

        let s1 = b12.sub(&b22)?;
        let s2 = a11.add(&a12)?;
        let s3 = a21.add(&a22)?;
        let s4 = b21.sub(&b11)?;
        let s5 = a11.add(&a22)?;
        let s6 = b11.add(&b22)?;
        let s7 = a12.sub(&a22)?;

        let s8;
        let s9;
        let s10;
        let tasks: [(&Matrix, &Matrix); 7] = match self.config.pairing {
            SubproductPairing::Canonical => {
                s8 = b21.add(&b22)?;
                s9 = a11.sub(&a21)?;
                s10 = b11.add(&b12)?;
                [
                    (&a11, &s1),
                    (&s2, &b22),
                    (&s3, &b11),
                    (&a22, &s4),
                    (&s5, &s6),
                    (&s7, &s8),
                    (&s9, &s10),
                ]
            }
            SubproductPairing::Legacy => [
                (&a11, &s1),
                (&s2, &b22),
                (&s3, &b11),
                (&a22, &s4),
                (&s5, &s6),
                (&s7, &b21),
                (&s7, &s6),
            ],
        };

        let p = self.subproducts(&tasks, ctx)?;

        let c11 = p[4].add(&p[3])?.sub(&p[1])?.add(&p[5])?;
        let c12 = p[0].add(&p[1])?;
        let c21 = p[2].add(&p[3])?;
        let c22 = p[4].add(&p[0])?.sub(&p[2].add(&p[6])?)?;

        let mut result = Matrix::with_backend("C", n, n, a.backend())?;
        splice(&mut result, &c11, lo.clone(), lo.clone());
        splice(&mut result, &c12, lo.clone(), hi.clone());
        splice(&mut result, &c21, hi.clone(), lo);
        splice(&mut result, &c22, hi.clone(), hi);

        Ok(result)
    }

    /// Runs one batch of seven sub-products and joins on all of them
    fn subproducts(
        &self,
        tasks: &[(&Matrix, &Matrix)],
        ctx: &CallContext<'_>,
    ) -> Result<Vec<Matrix>> {
        #[cfg(feature = "parallel")]
        if self.pool.is_some() {
            return tasks
                .par_iter()
                .map(|&(x, y)| self.step(x, y, ctx))
                .collect();
        }

        tasks.iter().map(|&(x, y)| self.step(x, y, ctx)).collect()
    }
}

static DEFAULT_ENGINE: OnceLock<StrassenEngine> = OnceLock::new();

fn default_engine() -> &'static StrassenEngine {
    DEFAULT_ENGINE.get_or_init(|| {
        StrassenEngine::new(StrassenConfig::default()).unwrap_or_else(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(err = %_err, "worker pool unavailable, multiplying sequentially");
            StrassenEngine::sequential(StrassenConfig::default())
        })
    })
}

/// Multiply `a × b` with the default Strassen engine
///
/// Safe to call from several threads at once; every call owns its own
/// sub-product batches.
///
/// The default engine uses [`SubproductPairing::Canonical`], so the result
/// equals [`Matrix::standard_multiply`] up to rounding. The historical
/// `(S7, B21), (S7, S6)` pairing is not the default; build a
/// [`StrassenEngine`] with [`SubproductPairing::Legacy`] to reproduce it.
///
/// # Errors
///
/// Returns [`KernelError::DimensionMismatch`] if `a.cols() != b.rows()`.
pub fn fast_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    default_engine().multiply(a, b)
}
