use nalgebra::{Point3, Unit, Vector3};
use std::f64::consts::PI;

/// Below this magnitude a ray is treated as parallel to a plane or cone.
pub const PARALLEL_EPSILON: f64 = 1e-8;
/// Floor applied to vector norms before normalization.
pub const NORM_FLOOR: f64 = 1e-12;

/// A half-line `origin + t * direction`, `t >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// The global downstream (ram-facing to wake) direction, `-Z`.
#[inline]
pub fn downstream_axis() -> Unit<Vector3<f64>> {
    Unit::new_unchecked(Vector3::new(0.0, 0.0, -1.0))
}

/// Returns the unit vector along `v` and the norm used, floored at [`NORM_FLOOR`].
#[inline]
pub fn normalize_or_floor(v: &Vector3<f64>) -> (Vector3<f64>, f64) {
    let norm = v.norm().max(NORM_FLOOR);
    (v / norm, norm)
}

/// Maps two uniform draws in `[0, 1)` to a direction in the `+Z` hemisphere whose polar
/// density is proportional to `cos(theta)`.
#[inline]
pub fn cosine_weighted_direction(u1: f64, u2: f64) -> Vector3<f64> {
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    Vector3::new(r * phi.cos(), r * phi.sin(), (1.0 - u1).max(0.0).sqrt())
}

pub fn cosine_weighted_directions(u1: &[f64], u2: &[f64]) -> Vec<Vector3<f64>> {
    u1.iter()
        .zip(u2)
        .map(|(&a, &b)| cosine_weighted_direction(a, b))
        .collect()
}

/// Parametric distance to the plane `z = plane_z`, or `None` when the ray is parallel to
/// the plane or the plane lies behind the origin.
#[inline]
pub fn plane_intersection_t(origin: &Point3<f64>, dir: &Vector3<f64>, plane_z: f64) -> Option<f64> {
    if dir.z.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (plane_z - origin.z) / dir.z;
    if t < 0.0 { None } else { Some(t) }
}

#[inline]
pub fn plane_intersection(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    plane_z: f64,
) -> Option<Point3<f64>> {
    plane_intersection_t(origin, dir, plane_z).map(|t| origin + dir * t)
}

/// Nearer non-negative root of a unit-direction ray against the sphere centred at
/// `(0, 0, sphere_r)` with radius `|sphere_r|`.
///
/// A negative `sphere_r` places the centre below the origin, which is how convex caps whose
/// apex sits at the origin are described.
pub fn sphere_intersection_t(origin: &Point3<f64>, dir: &Vector3<f64>, sphere_r: f64) -> Option<f64> {
    let center = Point3::new(0.0, 0.0, sphere_r);
    let oc = origin - center;
    let b = dir.dot(&oc);
    let c = oc.norm_squared() - sphere_r * sphere_r;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    if t < 0.0 { None } else { Some(t) }
}

#[inline]
pub fn sphere_intersection(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    sphere_r: f64,
) -> Option<Point3<f64>> {
    sphere_intersection_t(origin, dir, sphere_r).map(|t| origin + dir * t)
}

/// XY containment in a disk, boundary inclusive. The z components are ignored.
#[inline]
pub fn disk_contains(point: &Point3<f64>, center: &Point3<f64>, radius: f64) -> bool {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    dx * dx + dy * dy <= radius * radius
}

/// Whether `point` lies inside the nappe of the cone that opens along `axis`.
///
/// `axis` must be a unit vector pointing from the apex into the open side; the apex itself
/// is not considered inside.
#[inline]
pub fn cone_contains(
    point: &Point3<f64>,
    apex: &Point3<f64>,
    axis: &Unit<Vector3<f64>>,
    cos2: f64,
) -> bool {
    let axis: &Vector3<f64> = axis.as_ref();
    let v = point - apex;
    let h = v.dot(axis);
    h > 0.0 && h * h >= cos2 * v.norm_squared()
}

/// Whether a unit-direction ray enters (or starts inside) the infinite cone opening along
/// `axis` from `apex`, with `cos2 = cos^2(half_angle)`.
///
/// Roots of the implicit form `(v.a)^2 - cos2 |v|^2 = 0` on the mirrored nappe
/// (`v.a < 0`) are rejected, so only the downstream sheet counts.
pub fn infinite_cone_intersects(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    apex: &Point3<f64>,
    axis: &Unit<Vector3<f64>>,
    cos2: f64,
) -> bool {
    if cone_contains(origin, apex, axis, cos2) {
        return true;
    }

    let axis: &Vector3<f64> = axis.as_ref();
    let co = origin - apex;
    let dv = dir.dot(axis);
    let cv = co.dot(axis);

    let a = dv * dv - cos2 * dir.norm_squared();
    let b = 2.0 * (dv * cv - cos2 * dir.dot(&co));
    let c = cv * cv - cos2 * co.norm_squared();

    // Rays leaving the apex enter only if they point into the open side.
    if co.norm_squared() < PARALLEL_EPSILON * PARALLEL_EPSILON {
        return dv > 0.0 && dv * dv >= cos2 * dir.norm_squared();
    }

    let on_open_nappe = |t: f64| t >= 0.0 && cv + t * dv >= -PARALLEL_EPSILON;

    if a.abs() < PARALLEL_EPSILON {
        if b.abs() < PARALLEL_EPSILON {
            return false;
        }
        return on_open_nappe(-c / b);
    }

    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        // Grazing or on-axis rays produce a double root that rounds slightly negative.
        if disc < -PARALLEL_EPSILON * b.abs().max(1.0) {
            return false;
        }
        disc = 0.0;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);
    on_open_nappe(t1) || on_open_nappe(t2)
}

pub fn plane_intersection_batch(
    origins: &[Point3<f64>],
    dirs: &[Vector3<f64>],
    plane_z: f64,
) -> Vec<Option<Point3<f64>>> {
    origins
        .iter()
        .zip(dirs)
        .map(|(o, d)| plane_intersection(o, d, plane_z))
        .collect()
}

pub fn sphere_intersection_batch(
    origins: &[Point3<f64>],
    dirs: &[Vector3<f64>],
    sphere_r: f64,
) -> Vec<Option<Point3<f64>>> {
    origins
        .iter()
        .zip(dirs)
        .map(|(o, d)| sphere_intersection(o, d, sphere_r))
        .collect()
}

/// Missing points (`None`) are never inside.
pub fn disk_contains_batch(
    points: &[Option<Point3<f64>>],
    center: &Point3<f64>,
    radius: f64,
) -> Vec<bool> {
    points
        .iter()
        .map(|p| p.is_some_and(|p| disk_contains(&p, center, radius)))
        .collect()
}

pub fn infinite_cone_intersects_batch(
    origins: &[Point3<f64>],
    dirs: &[Vector3<f64>],
    apex: &Point3<f64>,
    axis: &Unit<Vector3<f64>>,
    cos2: f64,
) -> Vec<bool> {
    origins
        .iter()
        .zip(dirs)
        .map(|(o, d)| infinite_cone_intersects(o, d, apex, axis, cos2))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn cos2_of(half_angle_deg: f64) -> f64 {
        half_angle_deg.to_radians().cos().powi(2)
    }

    #[test]
    fn cosine_weighted_direction_is_unit_and_in_upper_hemisphere() {
        for &(u1, u2) in &[(0.0, 0.0), (0.25, 0.5), (0.999, 0.1), (0.5, 0.75)] {
            let v = cosine_weighted_direction(u1, u2);
            assert!(f64_approx_equal(v.norm(), 1.0));
            assert!(v.z >= 0.0);
        }
    }

    #[test]
    fn cosine_weighted_direction_with_zero_radius_draw_points_along_pole() {
        let v = cosine_weighted_direction(0.0, 0.3);
        assert!(f64_approx_equal(v.z, 1.0));
    }

    #[test]
    fn cosine_weighted_directions_maps_each_pair() {
        let dirs = cosine_weighted_directions(&[0.1, 0.2, 0.3], &[0.4, 0.5, 0.6]);
        assert_eq!(dirs.len(), 3);
        assert_eq!(dirs[1], cosine_weighted_direction(0.2, 0.5));
    }

    #[test]
    fn plane_intersection_hits_plane_below_origin() {
        let hit = plane_intersection(
            &Point3::new(0.5, 0.0, 1.0),
            &Vector3::new(0.0, 0.0, -1.0),
            -1.0,
        )
        .unwrap();
        assert!(f64_approx_equal(hit.z, -1.0));
        assert!(f64_approx_equal(hit.x, 0.5));
    }

    #[test]
    fn plane_intersection_rejects_parallel_and_backward_rays() {
        let origin = Point3::new(0.0, 0.0, 1.0);
        assert!(plane_intersection(&origin, &Vector3::new(1.0, 0.0, 1e-9), 0.0).is_none());
        assert!(plane_intersection(&origin, &Vector3::new(0.0, 0.0, 1.0), 0.0).is_none());
    }

    #[test]
    fn sphere_intersection_returns_nearer_root_for_downward_sphere() {
        let t = sphere_intersection_t(
            &Point3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.0, 0.0, -1.0),
            -2.0,
        )
        .unwrap();
        assert!(f64_approx_equal(t, 1.0));
    }

    #[test]
    fn sphere_intersection_misses_when_ray_passes_beside_sphere() {
        let hit = sphere_intersection(
            &Point3::new(5.0, 0.0, 1.0),
            &Vector3::new(0.0, 0.0, -1.0),
            -2.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn sphere_intersection_rejects_sphere_entirely_behind_origin() {
        let hit = sphere_intersection(
            &Point3::new(0.0, 0.0, 1.0),
            &Vector3::new(0.0, 0.0, 1.0),
            -2.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn disk_contains_is_boundary_inclusive() {
        let center = Point3::new(0.1, -0.2, -1.0);
        assert!(disk_contains(&Point3::new(0.4, -0.2, -1.0), &center, 0.3 + 1e-12));
        assert!(disk_contains(&Point3::new(0.1, 0.1, 5.0), &center, 0.3 + 1e-12));
        assert!(!disk_contains(&Point3::new(0.41, -0.2, -1.0), &center, 0.3));
    }

    #[test]
    fn disk_contains_matches_euclidean_distance_on_grid_of_points() {
        let center = Point3::new(0.0, 0.0, 0.0);
        for i in -10..=10 {
            for j in -10..=10 {
                let p = Point3::new(i as f64 * 0.05, j as f64 * 0.05, 0.0);
                let dist = (p.x * p.x + p.y * p.y).sqrt();
                assert_eq!(disk_contains(&p, &center, 0.3), dist <= 0.3);
            }
        }
    }

    #[test]
    fn cone_contains_every_on_axis_downstream_point() {
        let apex = Point3::origin();
        let axis = downstream_axis();
        for &d in &[1e-6, 0.1, 1.0, 10.0, 1e4] {
            assert!(cone_contains(&Point3::new(0.0, 0.0, -d), &apex, &axis, cos2_of(5.0)));
        }
    }

    #[test]
    fn cone_excludes_points_displaced_beyond_half_angle() {
        let apex = Point3::origin();
        let axis = downstream_axis();
        let half_angle = 20.0f64;
        for &d in &[0.5, 1.0, 3.0] {
            let r = d * half_angle.to_radians().tan();
            let outside = Point3::new(r * 1.01, 0.0, -d);
            let inside = Point3::new(r * 0.99, 0.0, -d);
            assert!(!cone_contains(&outside, &apex, &axis, cos2_of(half_angle)));
            assert!(cone_contains(&inside, &apex, &axis, cos2_of(half_angle)));
        }
    }

    #[test]
    fn cone_excludes_upstream_mirror_nappe() {
        let apex = Point3::origin();
        let axis = downstream_axis();
        assert!(!cone_contains(&Point3::new(0.0, 0.0, 1.0), &apex, &axis, cos2_of(30.0)));
    }

    #[test]
    fn infinite_cone_detects_ray_entering_from_upstream() {
        let hit = infinite_cone_intersects(
            &Point3::new(0.2, 0.0, 1.0),
            &Vector3::new(0.0, 0.0, -1.0),
            &Point3::origin(),
            &downstream_axis(),
            cos2_of(30.0),
        );
        assert!(hit);
    }

    #[test]
    fn infinite_cone_ignores_ray_travelling_upstream_from_outside() {
        let hit = infinite_cone_intersects(
            &Point3::new(0.0, 0.0, 0.5),
            &Vector3::new(0.0, 0.0, 1.0),
            &Point3::origin(),
            &downstream_axis(),
            cos2_of(30.0),
        );
        assert!(!hit);
    }

    #[test]
    fn infinite_cone_ignores_ray_that_only_crosses_mirror_nappe() {
        let dir = Vector3::new(1.0, 0.0, 0.0);
        let hit = infinite_cone_intersects(
            &Point3::new(-5.0, 0.0, 1.0),
            &dir,
            &Point3::origin(),
            &downstream_axis(),
            cos2_of(30.0),
        );
        assert!(!hit);
    }

    #[test]
    fn infinite_cone_reports_origin_already_inside() {
        let hit = infinite_cone_intersects(
            &Point3::new(0.0, 0.0, -2.0),
            &Vector3::new(0.0, 0.0, 1.0),
            &Point3::origin(),
            &downstream_axis(),
            cos2_of(10.0),
        );
        assert!(hit);
    }

    #[test]
    fn infinite_cone_rays_from_apex_enter_only_along_open_side() {
        let apex = Point3::origin();
        let axis = downstream_axis();
        let cos2 = cos2_of(30.0);
        let down = Vector3::new(0.0, 0.0, -1.0);
        assert!(infinite_cone_intersects(&apex, &down, &apex, &axis, cos2));
        assert!(!infinite_cone_intersects(&apex, &-down, &apex, &axis, cos2));
        let sideways = Vector3::new(1.0, 0.0, -0.1).normalize();
        assert!(!infinite_cone_intersects(&apex, &sideways, &apex, &axis, cos2));
    }

    #[test]
    fn batched_variants_propagate_misses_as_none_and_false() {
        let origins = vec![Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 1.0)];
        let dirs = vec![Vector3::new(0.0, 0.0, -1.0), Vector3::new(0.0, 0.0, 1.0)];

        let points = plane_intersection_batch(&origins, &dirs, -1.0);
        assert!(points[0].is_some());
        assert!(points[1].is_none());

        let inside = disk_contains_batch(&points, &Point3::new(0.0, 0.0, -1.0), 0.3);
        assert_eq!(inside, vec![true, false]);

        let spheres = sphere_intersection_batch(&origins, &dirs, -1.0);
        assert!(spheres[0].is_some());
        assert!(spheres[1].is_none());

        let cones = infinite_cone_intersects_batch(
            &origins,
            &dirs,
            &Point3::origin(),
            &downstream_axis(),
            cos2_of(15.0),
        );
        assert_eq!(cones, vec![true, false]);
    }

    #[test]
    fn normalize_or_floor_guards_zero_vectors() {
        let (unit, norm) = normalize_or_floor(&Vector3::zeros());
        assert!(f64_approx_equal(norm, NORM_FLOOR));
        assert_eq!(unit, Vector3::zeros());

        let (unit, norm) = normalize_or_floor(&Vector3::new(3.0, 0.0, 4.0));
        assert!(f64_approx_equal(norm, 5.0));
        assert!(f64_approx_equal(unit.norm(), 1.0));
    }

    #[test]
    fn ray_at_reproduces_parametric_point() {
        let ray = Ray::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(ray.at(2.0), Point3::new(1.0, 2.0, 1.0));
    }
}
