use crate::core::geometry::{PARALLEL_EPSILON, downstream_axis, infinite_cone_intersects};
use crate::core::models::wake::{WakeCone, WakePyramid, WakeVolume};
use nalgebra::{Point3, Vector3};

/// Whether the forward ray `origin + t * dir`, `t >= 0`, enters the wake volume.
pub fn intrudes(wake: &WakeVolume, origin: &Point3<f64>, dir: &Vector3<f64>) -> bool {
    match wake {
        WakeVolume::Cone(cone) => cone_intrudes(cone, origin, dir),
        WakeVolume::Pyramid(pyramid) => pyramid_intrudes(pyramid, origin, dir),
    }
}

pub fn intrudes_batch(wake: &WakeVolume, origins: &[Point3<f64>], dirs: &[Vector3<f64>]) -> Vec<bool> {
    origins
        .iter()
        .zip(dirs)
        .map(|(o, d)| intrudes(wake, o, d))
        .collect()
}

/// The cone is treated as infinite along its axis; its stored length is not a bound.
pub fn cone_intrudes(cone: &WakeCone, origin: &Point3<f64>, dir: &Vector3<f64>) -> bool {
    infinite_cone_intersects(
        origin,
        dir,
        &Point3::origin(),
        &downstream_axis(),
        cone.cos2(),
    )
}

/// Cyrus-Beck clipping of the forward ray against the six bounding half-spaces.
pub fn pyramid_intrudes(pyramid: &WakePyramid, origin: &Point3<f64>, dir: &Vector3<f64>) -> bool {
    let s = pyramid.slope();
    let b = pyramid.half_base();
    let half_spaces = [
        (Vector3::new(1.0, 0.0, -s), b),
        (Vector3::new(-1.0, 0.0, -s), b),
        (Vector3::new(0.0, 1.0, -s), b),
        (Vector3::new(0.0, -1.0, -s), b),
        (Vector3::new(0.0, 0.0, 1.0), 0.0),
        (Vector3::new(0.0, 0.0, -1.0), pyramid.length()),
    ];

    let mut t_enter = 0.0f64;
    let mut t_exit = f64::INFINITY;
    for (normal, offset) in half_spaces {
        let slack = offset - normal.dot(&origin.coords);
        let rate = normal.dot(dir);
        if rate.abs() < PARALLEL_EPSILON {
            if slack < 0.0 {
                return false;
            }
            continue;
        }
        let t = slack / rate;
        if rate > 0.0 {
            t_exit = t_exit.min(t);
        } else {
            t_enter = t_enter.max(t);
        }
        if t_enter > t_exit {
            return false;
        }
    }
    t_enter <= t_exit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cone() -> WakeVolume {
        WakeVolume::Cone(WakeCone::new(30.0, 10.0).unwrap())
    }

    fn pyramid() -> WakeVolume {
        WakeVolume::Pyramid(WakePyramid::new(1.0, 10.0).unwrap())
    }

    #[test]
    fn downstream_ray_from_apex_enters_both_wakes() {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let dir = Vector3::new(0.0, 0.0, -1.0);
        assert!(intrudes(&cone(), &origin, &dir));
        assert!(intrudes(&pyramid(), &origin, &dir));
    }

    #[test]
    fn upstream_ray_above_apex_misses_both_wakes() {
        let dir = Vector3::new(0.0, 0.0, 1.0);
        assert!(!intrudes(&cone(), &Point3::new(0.0, 0.0, 0.1), &dir));
        assert!(!intrudes(&pyramid(), &Point3::new(0.0, 0.0, 0.1), &dir));
        assert!(!intrudes(&cone(), &Point3::new(2.0, 0.0, 0.0), &dir));
    }

    #[test]
    fn lateral_ray_outside_cone_crosses_into_it() {
        let origin = Point3::new(5.0, 0.0, -2.0);
        let toward_axis = Vector3::new(-1.0, 0.0, 0.0);
        let away = Vector3::new(1.0, 0.0, 0.0);
        assert!(intrudes(&cone(), &origin, &toward_axis));
        assert!(!intrudes(&cone(), &origin, &away));
    }

    #[test]
    fn pyramid_clipping_respects_length_and_side_planes() {
        let wake = pyramid();
        let below = Point3::new(0.0, 0.0, -11.0);
        assert!(!intrudes(&wake, &below, &Vector3::new(0.0, 0.0, -1.0)));
        assert!(intrudes(&wake, &below, &Vector3::new(0.0, 0.0, 1.0)));

        let beside = Point3::new(3.0, 0.0, -1.0);
        assert!(intrudes(&wake, &beside, &Vector3::new(-1.0, 0.0, 0.0)));
        assert!(!intrudes(&wake, &beside, &Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn intrusion_batch_matches_single_ray_results() {
        let origins = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 1.0)];
        let dirs = vec![Vector3::new(0.0, 0.0, -1.0), Vector3::new(1.0, 0.0, 0.0)];
        assert_eq!(intrudes_batch(&cone(), &origins, &dirs), vec![true, false]);
    }
}
