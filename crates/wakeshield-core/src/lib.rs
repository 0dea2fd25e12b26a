//! # WakeShield Core Library
//!
//! Monte Carlo ray tracing of rarefied low-Earth-orbit gas around a spacecraft's leading
//! shield, used to estimate how many molecules still reach a wafer mounted in the wake.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Immutable scene models (`Shield`, `WaferPlane`,
//!   `WakeVolume`, `Scene`), the atmosphere model, the ray/surface geometry kernel and the
//!   pure particle–surface interaction physics (intersection, reflection, wake tests).
//!
//! - **[`engine`]: The Logic Core.** The stateful parts of a trace: the injectable random
//!   source, the particle source, the wafer hit-grid accumulator, the per-particle stage
//!   machine and the tracer configuration.
//!
//! - **[`workflows`]: The Public API.** `trace_batch` and the reusable `BatchTracer`, plus
//!   the flattened `ScenarioRecord` view consumed by persistence layers.

pub mod core;
pub mod engine;
pub mod workflows;
