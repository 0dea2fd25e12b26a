use crate::core::geometry::{PARALLEL_EPSILON, plane_intersection_t, sphere_intersection_t};
use crate::core::models::shield::{Shield, ShieldProfile};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

const PYRAMID_TOLERANCE: f64 = 1e-9;
const CUPOLA_TOLERANCE: f64 = 1e-8;

/// Result of testing one ray against the shield surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShieldHit {
    Miss,
    Hit {
        point: Point3<f64>,
        /// Outward unit normal at `point`.
        normal: Vector3<f64>,
        /// `origin + t * dir == point`.
        t: f64,
    },
}

impl ShieldHit {
    pub fn is_hit(&self) -> bool {
        matches!(self, ShieldHit::Hit { .. })
    }
}

/// The half-space `normal . p <= offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HalfSpace {
    normal: Vector3<f64>,
    offset: f64,
}

impl HalfSpace {
    fn through(normal: Vector3<f64>, point: &Point3<f64>) -> Self {
        Self {
            normal,
            offset: normal.dot(&point.coords),
        }
    }

    #[inline]
    fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }
}

/// A convex solid bounded by planes, of which only some are reflecting surfaces.
#[derive(Debug, Clone, PartialEq)]
struct Polyhedron {
    planes: Vec<HalfSpace>,
    /// Number of leading entries in `planes` that can be struck.
    surfaces: usize,
    tolerance: f64,
}

impl Polyhedron {
    fn intersect(&self, origin: &Point3<f64>, dir: &Vector3<f64>) -> ShieldHit {
        let mut best = ShieldHit::Miss;
        let mut best_t = f64::INFINITY;

        for (i, face) in self.planes[..self.surfaces].iter().enumerate() {
            let denom = face.normal.dot(dir);
            if denom > -PARALLEL_EPSILON {
                continue;
            }
            let t = -face.signed_distance(origin) / denom;
            if t <= 0.0 || t >= best_t {
                continue;
            }
            let p = origin + dir * t;
            let inside = self
                .planes
                .iter()
                .enumerate()
                .all(|(j, other)| j == i || other.signed_distance(&p) <= self.tolerance);
            if inside {
                best_t = t;
                best = ShieldHit::Hit {
                    point: p,
                    normal: face.normal,
                    t,
                };
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Surface {
    Disk {
        radius: f64,
    },
    SphericalCap {
        sphere_radius: f64,
        rim_radius: f64,
        sagitta: f64,
    },
    Faceted(Polyhedron),
}

/// Ray tester for one shield, with the profile's plane set or sphere prepared once.
#[derive(Debug, Clone, PartialEq)]
pub struct ShieldIntersector {
    surface: Surface,
}

impl ShieldIntersector {
    pub fn new(shield: &Shield) -> Self {
        let surface = match *shield.profile() {
            ShieldProfile::Flat { radius } => Surface::Disk { radius },
            ShieldProfile::Cap { rim_radius, .. } => {
                let sphere_radius = shield
                    .profile()
                    .cap_sphere_radius()
                    .unwrap_or(rim_radius);
                let rim = rim_radius.min(sphere_radius);
                let sagitta =
                    sphere_radius - (sphere_radius * sphere_radius - rim * rim).max(0.0).sqrt();
                Surface::SphericalCap {
                    sphere_radius,
                    rim_radius,
                    sagitta,
                }
            }
            ShieldProfile::Pyramid { half_base, .. } => {
                let height = shield.profile().pyramid_height().unwrap_or(half_base);
                Surface::Faceted(pyramid_planes(half_base, height))
            }
            ShieldProfile::Cupola {
                edge_length,
                include_base,
                include_top,
            } => Surface::Faceted(cupola_planes(edge_length, include_base, include_top)),
        };
        Self { surface }
    }

    /// `dir` must be a unit vector.
    pub fn intersect(&self, origin: &Point3<f64>, dir: &Vector3<f64>) -> ShieldHit {
        match &self.surface {
            Surface::Disk { radius } => match plane_intersection_t(origin, dir, 0.0) {
                Some(t) if t > 0.0 => {
                    let p = origin + dir * t;
                    if p.x * p.x + p.y * p.y <= radius * radius {
                        ShieldHit::Hit {
                            point: p,
                            normal: Vector3::z(),
                            t,
                        }
                    } else {
                        ShieldHit::Miss
                    }
                }
                _ => ShieldHit::Miss,
            },
            Surface::SphericalCap {
                sphere_radius,
                rim_radius,
                sagitta,
            } => match sphere_intersection_t(origin, dir, -sphere_radius) {
                Some(t) => {
                    let p = origin + dir * t;
                    let r2 = p.x * p.x + p.y * p.y;
                    if r2 > rim_radius * rim_radius || p.z < -sagitta - PARALLEL_EPSILON {
                        return ShieldHit::Miss;
                    }
                    let center = Point3::new(0.0, 0.0, -sphere_radius);
                    ShieldHit::Hit {
                        point: p,
                        normal: (p - center) / *sphere_radius,
                        t,
                    }
                }
                None => ShieldHit::Miss,
            },
            Surface::Faceted(polyhedron) => polyhedron.intersect(origin, dir),
        }
    }

    pub fn intersect_batch(&self, origins: &[Point3<f64>], dirs: &[Vector3<f64>]) -> Vec<ShieldHit> {
        origins
            .iter()
            .zip(dirs)
            .map(|(o, d)| self.intersect(o, d))
            .collect()
    }
}

/// Single-shot intersection; prefer a cached [`ShieldIntersector`] for many rays.
pub fn intersect(shield: &Shield, origin: &Point3<f64>, dir: &Vector3<f64>) -> ShieldHit {
    ShieldIntersector::new(shield).intersect(origin, dir)
}

pub fn intersect_batch(
    shield: &Shield,
    origins: &[Point3<f64>],
    dirs: &[Vector3<f64>],
) -> Vec<ShieldHit> {
    ShieldIntersector::new(shield).intersect_batch(origins, dirs)
}

/// Four lateral faces through the apex plus the base as a bounding plane only.
fn pyramid_planes(half_base: f64, height: f64) -> Polyhedron {
    let s = half_base / height;
    let apex = Point3::origin();
    let mut planes: Vec<HalfSpace> = [
        Vector3::new(1.0, 0.0, s),
        Vector3::new(-1.0, 0.0, s),
        Vector3::new(0.0, 1.0, s),
        Vector3::new(0.0, -1.0, s),
    ]
    .into_iter()
    .map(|n| HalfSpace::through(n.normalize(), &apex))
    .collect();
    planes.push(HalfSpace {
        normal: -Vector3::z(),
        offset: height,
    });
    Polyhedron {
        planes,
        surfaces: 4,
        tolerance: PYRAMID_TOLERANCE,
    }
}

/// Johnson J5 pentagonal cupola with edge `a`: pentagon roof at `z = 0`, decagon floor below.
///
/// The roof and floor are only present when included. Without the roof the lateral faces
/// extend past `z = 0` and meet above the pentagon.
fn cupola_planes(a: f64, include_base: bool, include_top: bool) -> Polyhedron {
    let r_pentagon = a / (2.0 * (PI / 5.0).sin());
    let r_decagon = a / (2.0 * (PI / 10.0).sin());
    let z_bottom = -a * ((5.0 - 5.0f64.sqrt()) / 10.0).sqrt();
    let offset = PI / 10.0;

    let pentagon: Vec<Point3<f64>> = (0..5)
        .map(|i| {
            let phi = PI / 2.0 + 2.0 * PI * i as f64 / 5.0;
            Point3::new(r_pentagon * phi.cos(), r_pentagon * phi.sin(), 0.0)
        })
        .collect();
    let decagon: Vec<Point3<f64>> = (0..10)
        .map(|k| {
            let phi = PI / 2.0 + 2.0 * PI * (k / 2) as f64 / 5.0;
            let phi = if k % 2 == 0 { phi - offset } else { phi + offset };
            Point3::new(r_decagon * phi.cos(), r_decagon * phi.sin(), z_bottom)
        })
        .collect();

    let centroid = Point3::new(0.0, 0.0, z_bottom / 2.0);
    let outward = |a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>| {
        let mut n = (b - a).cross(&(c - a)).normalize();
        if n.dot(&(a - centroid)) < 0.0 {
            n = -n;
        }
        HalfSpace::through(n, a)
    };

    let mut planes = Vec::with_capacity(12);
    for i in 0..5 {
        let next = (i + 1) % 5;
        planes.push(outward(
            &pentagon[i],
            &pentagon[next],
            &decagon[(2 * i + 2) % 10],
        ));
        planes.push(outward(&pentagon[i], &decagon[2 * i], &decagon[2 * i + 1]));
    }
    if include_top {
        planes.push(HalfSpace {
            normal: Vector3::z(),
            offset: 0.0,
        });
    }
    if include_base {
        planes.push(HalfSpace {
            normal: -Vector3::z(),
            offset: -z_bottom,
        });
    }
    let surfaces = planes.len();
    Polyhedron {
        planes,
        surfaces,
        tolerance: CUPOLA_TOLERANCE,
    }
}
