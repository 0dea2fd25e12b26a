//! # Engine Module
//!
//! The stateful machinery behind one traced batch.
//!
//! - **Configuration** ([`config`]) - Source placement, tracer policies and the raw scene
//!   description with its builders
//! - **Randomness** ([`random`]) - The injectable [`random::RandomSource`] seam and its
//!   seeded `StdRng` implementation
//! - **Particle Source** ([`source`]) - Upstream origins, jittered ram directions, species
//!   selection and thermal velocities
//! - **Accumulation** ([`accumulator`]) - Wafer impact tests and the tracer-owned hit grid
//! - **Pipeline** ([`pipeline`]) - Per-particle stage transitions from sampling to aggregation
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine and sampling error types

pub mod accumulator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod random;
pub mod source;
