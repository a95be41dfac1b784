//! # Random Number Generation Infrastructure
//!
//! Random sources for the Monte Carlo kernels.
//!
//! ## Design Rationale
//!
//! - **Caller ownership**: every simulation borrows a [`SimRng`]; there is no
//!   global generator
//! - **Reproducibility**: all sources are seeded and remember their seed, even
//!   when the seed itself was drawn from entropy
//! - **Independent streams**: parallel workers never share a generator; each
//!   one receives a child stream from [`SimRng::fork`]
//!
//! ## Usage Example
//!
//! ```rust
//! use sim_engine::rng::SimRng;
//!
//! let mut rng = SimRng::from_seed(12345);
//!
//! // Uniform values in [0, 1)
//! let u = rng.gen_uniform();
//! assert!((0.0..1.0).contains(&u));
//!
//! // Standard normal variates (mean=0, std=1)
//! let z = rng.gen_normal();
//! assert!(z.is_finite());
//!
//! // Independent child streams for parallel workers
//! let workers = rng.fork_n(4);
//! assert_eq!(workers.len(), 4);
//! ```

mod prng;

pub use prng::SimRng;
