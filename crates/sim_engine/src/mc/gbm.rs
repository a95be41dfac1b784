//! Geometric Brownian Motion path simulation.
//!
//! Prices follow
//!
//! ```text
//! dS = μ S dt + σ S dW
//! ```
//!
//! discretised in log-space, which is exact for GBM:
//!
//! ```text
//! S(t+dt) = S(t) × exp((μ - 0.5σ²)dt + σ√dt × Z)
//! ```
//!
//! Every price stays strictly positive and finite. For extreme volatility the
//! factor `exp(..)` can underflow to zero or overflow to infinity in `f64`;
//! such steps saturate at `f64::MIN_POSITIVE` or `f64::MAX` (see
//! [`PriceMatrix`]).
//!
//! # Grid
//!
//! A simulation over horizon `T` with step `dt` produces
//! `n_steps = floor(T / dt)` observations per path. Column 0 is the initial
//! spot and columns `1..n_steps` are diffusion steps, so the last column sits
//! at `(n_steps - 1) × dt`.
//!
//! # Random Draw Order
//!
//! Time steps are strictly sequential. At each step the `n_paths` shocks are
//! drawn from the caller's source in path order, then the paths are advanced
//! (optionally in parallel). The draw order never depends on the thread
//! count.

use tracing::debug;

use super::cancel::CancellationToken;
use super::error::SimError;
use super::matrix::PriceMatrix;
use crate::rng::SimRng;

/// Maximum number of simulated paths.
pub const MAX_PATHS: usize = 10_000_000;

/// Maximum number of observations per path.
pub const MAX_STEPS: usize = 1_000_000;

/// Maximum number of matrix entries (`n_paths × n_steps`), 2 GiB of `f64`.
pub const MAX_MATRIX_CELLS: usize = 1 << 28;

/// Parameters of a GBM simulation.
///
/// Defaults match the dashboard's initial inputs.
///
/// # Examples
///
/// ```rust
/// use sim_engine::mc::GbmParams;
///
/// let params = GbmParams::new(100.0, 0.05, 0.2, 1.0, 0.01);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.n_steps(), 100);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GbmParams {
    /// Initial price (S₀).
    pub spot: f64,
    /// Drift (μ), annualised.
    pub drift: f64,
    /// Volatility (σ), annualised.
    pub volatility: f64,
    /// Time horizon (T) in years.
    pub horizon: f64,
    /// Time step (dt) in years.
    pub dt: f64,
}

impl GbmParams {
    /// Creates new GBM parameters.
    #[inline]
    pub fn new(spot: f64, drift: f64, volatility: f64, horizon: f64, dt: f64) -> Self {
        Self {
            spot,
            drift,
            volatility,
            horizon,
            dt,
        }
    }

    /// Number of observations per path, `floor(horizon / dt)`.
    ///
    /// Computed in floating point, so e.g. `0.3 / 0.1` yields 2.
    #[inline]
    pub fn n_steps(&self) -> usize {
        (self.horizon / self.dt).floor() as usize
    }

    /// Log-space drift per step, `(μ - 0.5σ²)dt`.
    #[inline]
    pub fn drift_dt(&self) -> f64 {
        (self.drift - 0.5 * self.volatility * self.volatility) * self.dt
    }

    /// Diffusion scale per step, `σ√dt`.
    #[inline]
    pub fn vol_sqrt_dt(&self) -> f64 {
        self.volatility * self.dt.sqrt()
    }

    /// Validates the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if:
    /// - `spot` is not positive and finite
    /// - `drift` is not finite
    /// - `volatility` is negative or not finite
    /// - `horizon` or `dt` is not positive and finite
    /// - `dt` exceeds `horizon`
    /// - `floor(horizon / dt)` exceeds [`MAX_STEPS`]
    /// - the per-step terms `(μ - 0.5σ²)dt` or `σ√dt` are not finite
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.spot > 0.0 && self.spot.is_finite()) {
            return Err(SimError::invalid(
                "spot",
                format!("must be positive and finite, got {}", self.spot),
            ));
        }
        if !self.drift.is_finite() {
            return Err(SimError::invalid(
                "drift",
                format!("must be finite, got {}", self.drift),
            ));
        }
        if !(self.volatility >= 0.0 && self.volatility.is_finite()) {
            return Err(SimError::invalid(
                "volatility",
                format!("must be non-negative and finite, got {}", self.volatility),
            ));
        }
        if !(self.horizon > 0.0 && self.horizon.is_finite()) {
            return Err(SimError::invalid(
                "horizon",
                format!("must be positive and finite, got {}", self.horizon),
            ));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::invalid(
                "dt",
                format!("must be positive and finite, got {}", self.dt),
            ));
        }
        if self.dt > self.horizon {
            return Err(SimError::invalid(
                "dt",
                format!("{} exceeds the horizon {}", self.dt, self.horizon),
            ));
        }
        let n_steps = self.n_steps();
        if n_steps > MAX_STEPS {
            return Err(SimError::invalid(
                "dt",
                format!(
                    "horizon / dt gives {} steps, maximum is {}",
                    n_steps, MAX_STEPS
                ),
            ));
        }
        if !(self.drift_dt().is_finite() && self.vol_sqrt_dt().is_finite()) {
            return Err(SimError::invalid(
                "volatility",
                format!(
                    "per-step increment overflows for volatility {} and dt {}",
                    self.volatility, self.dt
                ),
            ));
        }
        Ok(())
    }
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            spot: 100.0,
            drift: 0.05,
            volatility: 0.2,
            horizon: 1.0,
            dt: 0.01,
        }
    }
}

/// Strategy for advancing paths within a time step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathParallelism {
    /// Advance paths on the calling thread.
    Sequential,
    /// Always advance paths on the rayon global pool.
    Parallel,
    /// Go parallel once there are at least `min_paths_per_thread` paths per
    /// rayon thread.
    Auto {
        /// Minimum paths per thread before parallelisation kicks in.
        min_paths_per_thread: usize,
    },
}

impl Default for PathParallelism {
    fn default() -> Self {
        Self::Auto {
            min_paths_per_thread: 256,
        }
    }
}

impl PathParallelism {
    /// Determines if parallelisation should be used for the given path count.
    #[inline]
    pub fn should_parallelise(&self, n_paths: usize) -> bool {
        match *self {
            Self::Sequential => false,
            Self::Parallel => true,
            Self::Auto {
                min_paths_per_thread,
            } => n_paths >= min_paths_per_thread * rayon::current_num_threads(),
        }
    }
}

/// Validated GBM ensemble simulation.
///
/// # Examples
///
/// ```rust
/// use sim_engine::mc::{GbmParams, GbmSimulator};
/// use sim_engine::rng::SimRng;
///
/// let simulator = GbmSimulator::new(GbmParams::default(), 1000).unwrap();
/// let mut rng = SimRng::from_seed(42);
///
/// let matrix = simulator.simulate(&mut rng).unwrap();
/// assert_eq!(matrix.shape(), (1000, 100));
/// assert!(matrix.as_slice().iter().all(|&p| p > 0.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GbmSimulator {
    params: GbmParams,
    n_paths: usize,
    parallelism: PathParallelism,
}

impl GbmSimulator {
    /// Creates a simulator for `n_paths` independent paths.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidParameter`] if the parameters are invalid
    /// (see [`GbmParams::validate`]), `n_paths` is 0 or above
    /// [`MAX_PATHS`], or the matrix would exceed [`MAX_MATRIX_CELLS`].
    pub fn new(params: GbmParams, n_paths: usize) -> Result<Self, SimError> {
        params.validate()?;

        if n_paths == 0 || n_paths > MAX_PATHS {
            return Err(SimError::invalid(
                "n_paths",
                format!("must be in range [1, {}], got {}", MAX_PATHS, n_paths),
            ));
        }
        let cells = n_paths.saturating_mul(params.n_steps());
        if cells > MAX_MATRIX_CELLS {
            return Err(SimError::invalid(
                "n_paths",
                format!(
                    "{} paths × {} steps exceed {} matrix entries",
                    n_paths,
                    params.n_steps(),
                    MAX_MATRIX_CELLS
                ),
            ));
        }

        Ok(Self {
            params,
            n_paths,
            parallelism: PathParallelism::default(),
        })
    }

    /// Sets how paths are advanced within a step. Output is unaffected.
    #[inline]
    pub fn with_parallelism(mut self, parallelism: PathParallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Returns the simulation parameters.
    #[inline]
    pub fn params(&self) -> GbmParams {
        self.params
    }

    /// Returns the number of paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Returns the number of observations per path.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.params.n_steps()
    }

    /// Simulates the path ensemble.
    pub fn simulate(&self, rng: &mut SimRng) -> Result<PriceMatrix, SimError> {
        self.run(rng, None)
    }

    /// Simulates the path ensemble, aborting with [`SimError::Cancelled`]
    /// once `cancel` fires. The token is checked before every time step.
    pub fn simulate_with_cancel(
        &self,
        rng: &mut SimRng,
        cancel: &CancellationToken,
    ) -> Result<PriceMatrix, SimError> {
        self.run(rng, Some(cancel))
    }

    fn run(
        &self,
        rng: &mut SimRng,
        cancel: Option<&CancellationToken>,
    ) -> Result<PriceMatrix, SimError> {
        let n_steps = self.n_steps();
        let parallel = self.parallelism.should_parallelise(self.n_paths);

        debug!(
            n_paths = self.n_paths,
            n_steps,
            parallel,
            seed = rng.seed(),
            "Starting GBM simulation"
        );

        let mut matrix = PriceMatrix::filled(self.n_paths, n_steps, self.params.spot);

        // Precompute drift and volatility terms (outside the time loop)
        let drift_dt = self.params.drift_dt();
        let vol_sqrt_dt = self.params.vol_sqrt_dt();

        let mut shocks = vec![0.0; self.n_paths];
        for step in 1..n_steps {
            if let Some(token) = cancel {
                token.check()?;
            }
            rng.fill_normal(&mut shocks);
            matrix.advance(step, &shocks, drift_dt, vol_sqrt_dt, parallel);
        }

        debug!("Finished GBM simulation");
        Ok(matrix)
    }
}

/// Simulates `n_paths` GBM paths.
///
/// Convenience wrapper around [`GbmSimulator`].
///
/// # Errors
///
/// See [`GbmSimulator::new`].
pub fn simulate_gbm(
    rng: &mut SimRng,
    params: GbmParams,
    n_paths: usize,
) -> Result<PriceMatrix, SimError> {
    GbmSimulator::new(params, n_paths)?.simulate(rng)
}
