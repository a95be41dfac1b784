//! Monte Carlo simulation kernels.
//!
//! # Architecture
//!
//! ```text
//! mc
//! ├── PiEstimator       (rejection sampling, fork-join over worker streams)
//! ├── GbmSimulator      (log-space GBM, sequential in time)
//! │   └── PriceMatrix   (row-major path storage)
//! ├── CancellationToken (cooperative abort between partitions/steps)
//! └── SimError          (parameter validation, pool and cancel failures)
//! ```
//!
//! Both kernels take the caller's [`SimRng`](crate::rng::SimRng) by mutable
//! reference and keep no state between calls.
//!
//! # Examples
//!
//! ## π Estimation
//!
//! ```rust
//! use sim_engine::mc::PiEstimator;
//! use sim_engine::rng::SimRng;
//!
//! let mut rng = SimRng::from_seed(42);
//! let estimate = PiEstimator::new(1_000_003, 4)
//!     .unwrap()
//!     .estimate(&mut rng)
//!     .unwrap();
//!
//! // Floor division drops the 3 remainder samples
//! assert_eq!(estimate.samples_used, 1_000_000);
//! println!("pi ≈ {:.5}", estimate.value);
//! ```
//!
//! ## Stock Price Paths
//!
//! ```rust
//! use sim_engine::mc::{GbmParams, GbmSimulator};
//! use sim_engine::rng::SimRng;
//!
//! let params = GbmParams {
//!     spot: 100.0,
//!     drift: 0.05,
//!     volatility: 0.2,
//!     horizon: 1.0,
//!     dt: 1.0 / 252.0,
//! };
//! let simulator = GbmSimulator::new(params, 1_000).unwrap();
//! let matrix = simulator.simulate(&mut SimRng::from_seed(7)).unwrap();
//!
//! assert_eq!(matrix.n_paths(), 1_000);
//! let terminal = matrix.terminal_prices();
//! println!("mean terminal price: {:.2}", terminal.iter().sum::<f64>() / 1_000.0);
//! ```

pub mod cancel;
pub mod error;
pub mod gbm;
pub mod matrix;
pub mod pi;

// Re-exports for convenient access
pub use cancel::CancellationToken;
pub use error::SimError;
pub use gbm::{
    simulate_gbm, GbmParams, GbmSimulator, PathParallelism, MAX_MATRIX_CELLS, MAX_PATHS,
    MAX_STEPS,
};
pub use matrix::PriceMatrix;
pub use pi::{count_inside, estimate_pi, PiEstimate, PiEstimator, CANCEL_CHECK_INTERVAL, MAX_WORKERS};
