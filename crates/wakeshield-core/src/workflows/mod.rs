//! # Workflows Module
//!
//! Top-level entry points of the library.
//!
//! - **Batch Tracing** ([`trace`]) - Samples, traces, bins and aggregates one batch of
//!   particles through a scene, either through the one-shot [`trace::trace_batch`] or a
//!   reusable [`trace::BatchTracer`] that keeps its hit grid between calls
//! - **Scenario Records** ([`record`]) - The flat, serializable view of a scene and its batch
//!   statistics that persistence layers write out, one row per traced scene

pub mod record;
pub mod trace;
