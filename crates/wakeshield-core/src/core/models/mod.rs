//! Immutable scene description for one simulation run.
//!
//! A [`scene::Scene`] bundles a [`shield::Shield`], a [`wafer::WaferPlane`] and a
//! [`wake::WakeVolume`]. All of them are validated on construction and never mutated while a
//! batch is traced; the wafer's hit grid is a separate buffer owned by the tracer.

pub mod error;
pub mod scene;
pub mod shield;
pub mod wafer;
pub mod wake;

pub use error::ConfigError;
