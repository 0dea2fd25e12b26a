//! Physics of a single particle meeting the scene: where it strikes the shield, how it
//! leaves the surface, and whether the outgoing ray enters the protected wake.

pub mod intersect;
pub mod reflection;
pub mod wake;
