use crate::core::geometry::{PARALLEL_EPSILON, normalize_or_floor};
use crate::core::models::shield::Coating;
use nalgebra::{Rotation3, Unit, Vector3};

/// A surface law mapping an incoming unit direction to an outgoing one.
pub trait Reflector {
    /// `normal` is the outward unit normal at the impact point. `local` is a cosine-weighted
    /// direction in the surface frame (`+Z` along the normal), drawn by the caller so that
    /// reflection itself stays deterministic.
    fn reflect(
        &self,
        incoming: &Vector3<f64>,
        normal: &Vector3<f64>,
        local: &Vector3<f64>,
    ) -> Vector3<f64>;
}

impl Reflector for Coating {
    fn reflect(
        &self,
        incoming: &Vector3<f64>,
        normal: &Vector3<f64>,
        local: &Vector3<f64>,
    ) -> Vector3<f64> {
        match self {
            Coating::Specular => specular(incoming, normal),
            Coating::Diffuse => diffuse(normal, local),
        }
    }
}

/// Mirror reflection `v - 2 (v . n) n`.
#[inline]
pub fn specular(incoming: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    incoming - normal * (2.0 * incoming.dot(normal))
}

/// Rotates a local `+Z`-hemisphere sample onto the hemisphere around `normal`.
pub fn diffuse(normal: &Vector3<f64>, local: &Vector3<f64>) -> Vector3<f64> {
    let axis = Vector3::z().cross(normal);
    let sin = axis.norm();
    let out = if sin < PARALLEL_EPSILON {
        if normal.z < 0.0 { -local } else { *local }
    } else {
        let angle = sin.atan2(normal.z);
        Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle) * local
    };
    normalize_or_floor(&out).0
}

/// Angle in degrees between the reversed incoming direction and the outgoing one, so a
/// straight bounce-back is `0` and an undisturbed ray is `180`.
pub fn deflection_deg(incoming: &Vector3<f64>, outgoing: &Vector3<f64>) -> f64 {
    (-incoming.dot(outgoing)).clamp(-1.0, 1.0).acos().to_degrees()
}
