//! # Simulation Engine (Kernel Layer)
//!
//! Stateless Monte Carlo kernels behind the `mcsim` command line tool:
//!
//! - [`mc::PiEstimator`]: rejection-sampling estimate of π, partitioned across
//!   a fixed-size pool of independent workers
//! - [`mc::GbmSimulator`]: ensembles of geometric Brownian motion price paths
//!
//! Every simulation draws from an explicit [`rng::SimRng`] owned by the
//! caller. Nothing in this crate holds process-wide state, so two calls with
//! identically seeded sources and identical parameters return bit-identical
//! results.
//!
//! ## Usage Example
//!
//! ```rust
//! use sim_engine::mc::{estimate_pi, simulate_gbm, GbmParams};
//! use sim_engine::rng::SimRng;
//!
//! let mut rng = SimRng::from_seed(42);
//!
//! let pi = estimate_pi(&mut rng, 100_000, 4).unwrap();
//! assert!(pi > 3.0 && pi < 3.3);
//!
//! let matrix = simulate_gbm(&mut rng, GbmParams::default(), 10).unwrap();
//! assert_eq!(matrix.n_paths(), 10);
//! assert_eq!(matrix.n_steps(), 100);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: `Serialize`/`Deserialize` for [`mc::GbmParams`],
//!   [`mc::PiEstimate`] and [`mc::PriceMatrix`]

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

// Random number generation infrastructure
pub mod rng;

// Monte Carlo kernels
pub mod mc;

// Re-export commonly used items for convenience
pub use mc::{
    estimate_pi, simulate_gbm, CancellationToken, GbmParams, GbmSimulator, PiEstimate,
    PiEstimator, PriceMatrix, SimError,
};
pub use rng::SimRng;
