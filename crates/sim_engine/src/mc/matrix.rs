//! Simulated price paths.
//!
//! # Memory Layout
//!
//! Paths are stored row-major in one contiguous buffer:
//! `data[path_idx * n_steps + step_idx]`, where `step_idx = 0` holds the
//! initial spot price.
//!
//! Every entry lies in `[f64::MIN_POSITIVE, f64::MAX]`. Steps whose
//! increment would underflow to zero or overflow to infinity saturate at the
//! nearest bound.

use rayon::prelude::*;

#[cfg(feature = "serde")]
use super::error::SimError;

/// Ensemble of simulated price paths (`n_paths` rows × `n_steps` columns).
///
/// Produced by [`GbmSimulator`](super::GbmSimulator); read-only once
/// returned.
///
/// # Examples
///
/// ```rust
/// use sim_engine::mc::{simulate_gbm, GbmParams};
/// use sim_engine::rng::SimRng;
///
/// let mut rng = SimRng::from_seed(1);
/// let matrix = simulate_gbm(&mut rng, GbmParams::default(), 3).unwrap();
///
/// for path in matrix.paths() {
///     assert_eq!(path[0], 100.0);
///     assert_eq!(path.len(), matrix.n_steps());
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPriceMatrix"))]
pub struct PriceMatrix {
    /// Row-major price buffer (n_paths × n_steps).
    data: Vec<f64>,
    /// Number of paths (rows).
    n_paths: usize,
    /// Number of observations per path (columns).
    n_steps: usize,
}

impl PriceMatrix {
    /// Creates a matrix whose every entry equals `spot`.
    pub(crate) fn filled(n_paths: usize, n_steps: usize, spot: f64) -> Self {
        debug_assert!(n_steps >= 1);
        Self {
            data: vec![spot; n_paths * n_steps],
            n_paths,
            n_steps,
        }
    }

    /// Returns the number of paths.
    #[inline]
    pub fn n_paths(&self) -> usize {
        self.n_paths
    }

    /// Returns the number of observations per path.
    #[inline]
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Returns `(n_paths, n_steps)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.n_paths, self.n_steps)
    }

    /// Returns the price of `path` at `step`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, path: usize, step: usize) -> Option<f64> {
        if path < self.n_paths && step < self.n_steps {
            Some(self.data[path * self.n_steps + step])
        } else {
            None
        }
    }

    /// Returns one path as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `path >= n_paths`.
    #[inline]
    pub fn path(&self, path: usize) -> &[f64] {
        let offset = path * self.n_steps;
        &self.data[offset..offset + self.n_steps]
    }

    /// Iterates over the paths in order.
    pub fn paths(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.n_steps)
    }

    /// Returns the prices of all paths at `step`.
    ///
    /// # Panics
    ///
    /// Panics if `step >= n_steps`.
    pub fn column(&self, step: usize) -> Vec<f64> {
        assert!(step < self.n_steps, "step {} out of range", step);
        self.paths().map(|path| path[step]).collect()
    }

    /// Returns the last observation of every path.
    pub fn terminal_prices(&self) -> Vec<f64> {
        self.column(self.n_steps - 1)
    }

    /// Returns the row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copies the matrix into one `Vec` per path.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.paths().map(<[f64]>::to_vec).collect()
    }

    /// Advances every path from `step - 1` to `step`:
    ///
    /// ```text
    /// S[i][step] = S[i][step-1] × exp(drift_dt + vol_sqrt_dt × Z[i])
    /// ```
    ///
    /// The result is clamped to `[f64::MIN_POSITIVE, f64::MAX]`, so a path
    /// never collapses to zero or becomes infinite.
    ///
    /// Each row only reads its own previous value and its own shock, so the
    /// parallel and sequential branches produce identical bits.
    pub(crate) fn advance(
        &mut self,
        step: usize,
        shocks: &[f64],
        drift_dt: f64,
        vol_sqrt_dt: f64,
        parallel: bool,
    ) {
        debug_assert!(step >= 1 && step < self.n_steps);
        debug_assert_eq!(shocks.len(), self.n_paths);

        let update = |(row, &z): (&mut [f64], &f64)| {
            row[step] = (row[step - 1] * (drift_dt + vol_sqrt_dt * z).exp())
                .clamp(f64::MIN_POSITIVE, f64::MAX);
        };

        if parallel {
            self.data
                .par_chunks_mut(self.n_steps)
                .zip(shocks.par_iter())
                .for_each(update);
        } else {
            self.data
                .chunks_mut(self.n_steps)
                .zip(shocks.iter())
                .for_each(update);
        }
    }
}

/// Unchecked wire form of [`PriceMatrix`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPriceMatrix {
    data: Vec<f64>,
    n_paths: usize,
    n_steps: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPriceMatrix> for PriceMatrix {
    type Error = SimError;

    fn try_from(raw: RawPriceMatrix) -> Result<Self, SimError> {
        if raw.n_steps == 0 {
            return Err(SimError::invalid("n_steps", "must be at least 1, got 0"));
        }
        if raw.n_paths.checked_mul(raw.n_steps) != Some(raw.data.len()) {
            return Err(SimError::invalid(
                "data",
                format!(
                    "{} entries do not fill {} paths × {} steps",
                    raw.data.len(),
                    raw.n_paths,
                    raw.n_steps
                ),
            ));
        }
        if let Some(price) = raw.data.iter().find(|p| !(**p > 0.0 && p.is_finite())) {
            return Err(SimError::invalid(
                "data",
                format!("prices must be positive and finite, got {}", price),
            ));
        }

        Ok(Self {
            data: raw.data,
            n_paths: raw.n_paths,
            n_steps: raw.n_steps,
        })
    }
}
