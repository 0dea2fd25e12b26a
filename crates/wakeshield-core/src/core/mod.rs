//! # Core Module
//!
//! Stateless building blocks of the wake-shield study.
//!
//! - **Geometry Kernel** ([`geometry`]) - Rays, plane/sphere/cone intersection, disk
//!   containment and cosine-weighted direction sampling, in single-ray and batched forms
//! - **Scene Models** ([`models`]) - Shield profiles, the wafer target, wake volumes and the
//!   scene that bundles them
//! - **Atmosphere** ([`atmosphere`]) - Multi-species thermal/drift flux model of the
//!   upstream gas
//! - **Interaction Physics** ([`interaction`]) - Per-profile shield intersection, specular
//!   and diffuse reflection, wake intrusion tests
//!
//! Nothing in this module owns mutable simulation state; the hit grid and random state
//! live in [`crate::engine`].

pub mod atmosphere;
pub mod geometry;
pub mod interaction;
pub mod models;
