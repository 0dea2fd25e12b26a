use super::error::{ConfigError, require_positive};
use super::shield::{ProfileKind, Shield};
use super::wafer::WaferPlane;
use crate::core::geometry::{cone_contains, downstream_axis};
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

/// Wake lengths are this multiple of the shield's primary dimension when built automatically.
pub const WAKE_LENGTH_FACTOR: f64 = 10.0;

/// Axisymmetric wake cone with its apex at the shield apex, opening along `-Z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeCone {
    half_angle_deg: f64,
    length: f64,
    cos2: f64,
}

impl WakeCone {
    pub fn new(half_angle_deg: f64, length: f64) -> Result<Self, ConfigError> {
        if !(half_angle_deg.is_finite() && half_angle_deg > 0.0 && half_angle_deg < 90.0) {
            return Err(ConfigError::invalid(
                "wake.half_angle_deg",
                format!("expected an angle in (0, 90) degrees, got {}", half_angle_deg),
            ));
        }
        let length = require_positive("wake.length", length)?;
        let cos = half_angle_deg.to_radians().cos();
        Ok(Self {
            half_angle_deg,
            length,
            cos2: cos * cos,
        })
    }

    pub fn half_angle_deg(&self) -> f64 {
        self.half_angle_deg
    }

    /// Stored for reporting. Intrusion tests treat the cone as infinite.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// `cos^2(half_angle)`, cached at construction.
    pub fn cos2(&self) -> f64 {
        self.cos2
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        cone_contains(point, &Point3::origin(), &downstream_axis(), self.cos2)
    }

    /// Radius of the cone's cross-section at `depth` meters downstream of the apex.
    pub fn radius_at(&self, depth: f64) -> f64 {
        depth.max(0.0) * self.half_angle_deg.to_radians().tan()
    }
}

/// Square-section wake bounded by `|x| + s(-z) <= b`, `|y| + s(-z) <= b` and
/// `-length <= z <= 0`, with `s = half_base / length`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakePyramid {
    half_base: f64,
    length: f64,
}

impl WakePyramid {
    pub fn new(half_base: f64, length: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            half_base: require_positive("wake.half_base", half_base)?,
            length: require_positive("wake.length", length)?,
        })
    }

    pub fn half_base(&self) -> f64 {
        self.half_base
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn slope(&self) -> f64 {
        self.half_base / self.length
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        let depth = -point.z;
        if !(0.0..=self.length).contains(&depth) {
            return false;
        }
        let limit = self.half_base - self.slope() * depth;
        point.x.abs() <= limit && point.y.abs() <= limit
    }
}

/// Name of a wake family, used by configuration front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WakeKind {
    Cone,
    Pyramid,
}

impl WakeKind {
    pub const NAMES: [&'static str; 2] = ["cone", "pyramid"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WakeKind::Cone => "cone",
            WakeKind::Pyramid => "pyramid",
        }
    }
}

impl FromStr for WakeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cone" => Ok(WakeKind::Cone),
            "pyramid" => Ok(WakeKind::Pyramid),
            _ => Err(ConfigError::UnknownWake {
                value: s.to_string(),
                valid: WakeKind::NAMES.join(", "),
            }),
        }
    }
}

impl fmt::Display for WakeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The region downstream of the shield that should stay free of particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeVolume {
    Cone(WakeCone),
    Pyramid(WakePyramid),
}

impl WakeVolume {
    /// Builds the conventional wake for a shield and wafer pair.
    ///
    /// Pyramid shields get a pyramid wake whose half-base equals the shield's. Every other
    /// profile gets a cone that just reaches the shield rim as seen from the wafer depth.
    /// Both are ten primary dimensions long. A cone needs a non-zero wafer depth.
    pub fn for_scene(shield: &Shield, wafer: &WaferPlane) -> Result<Self, ConfigError> {
        let primary_dim = shield.primary_dim();
        let length = primary_dim * WAKE_LENGTH_FACTOR;
        match shield.kind() {
            ProfileKind::Pyramid => Ok(WakeVolume::Pyramid(WakePyramid::new(
                primary_dim,
                length,
            )?)),
            _ => {
                let depth = wafer.z_offset().abs();
                if depth < f64::EPSILON {
                    return Err(ConfigError::invalid(
                        "wafer.z_offset",
                        "a cone wake needs the wafer below the shield apex, got 0",
                    ));
                }
                let half_angle_deg = (primary_dim / depth).atan().to_degrees();
                Ok(WakeVolume::Cone(WakeCone::new(half_angle_deg, length)?))
            }
        }
    }

    pub fn kind(&self) -> WakeKind {
        match self {
            WakeVolume::Cone(_) => WakeKind::Cone,
            WakeVolume::Pyramid(_) => WakeKind::Pyramid,
        }
    }

    /// Record label for the wake family.
    pub fn kind_name(&self) -> &'static str {
        match self {
            WakeVolume::Cone(_) => "WakeCone",
            WakeVolume::Pyramid(_) => "PyramidWake",
        }
    }

    pub fn length(&self) -> f64 {
        match self {
            WakeVolume::Cone(cone) => cone.length(),
            WakeVolume::Pyramid(pyramid) => pyramid.length(),
        }
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        match self {
            WakeVolume::Cone(cone) => cone.contains(point),
            WakeVolume::Pyramid(pyramid) => pyramid.contains(point),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::shield::{Coating, ShieldProfile};
    use nalgebra::Vector2;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn wafer_at(z_offset: f64) -> WaferPlane {
        WaferPlane::new(0.3, z_offset, Vector2::zeros(), (50, 50)).unwrap()
    }

    #[test]
    fn cone_caches_cos_squared_of_half_angle() {
        let cone = WakeCone::new(60.0, 5.0).unwrap();
        assert!(f64_approx_equal(cone.cos2(), 0.25));
    }

    #[test]
    fn cone_contains_on_axis_points_and_rejects_points_beyond_its_radius() {
        let cone = WakeCone::new(30.0, 10.0).unwrap();
        let depth = 2.0;
        let radius = cone.radius_at(depth);
        assert!(cone.contains(&Point3::new(0.0, 0.0, -depth)));
        assert!(cone.contains(&Point3::new(radius * 0.99, 0.0, -depth)));
        assert!(!cone.contains(&Point3::new(radius * 1.01, 0.0, -depth)));
        assert!(!cone.contains(&Point3::new(0.0, 0.0, depth)));
    }

    #[test]
    fn cone_rejects_degenerate_half_angles() {
        assert!(WakeCone::new(0.0, 1.0).is_err());
        assert!(WakeCone::new(90.0, 1.0).is_err());
    }

    #[test]
    fn pyramid_contains_respects_slope_and_length() {
        let wake = WakePyramid::new(2.0, 20.0).unwrap();
        assert!(wake.contains(&Point3::new(1.5, -1.5, -1.0)));
        assert!(!wake.contains(&Point3::new(1.95, 0.0, -1.0)));
        assert!(!wake.contains(&Point3::new(0.0, 0.0, -20.5)));
        assert!(!wake.contains(&Point3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn wake_kind_parses_names_and_reports_unknown_values() {
        assert_eq!("Cone".parse::<WakeKind>().unwrap(), WakeKind::Cone);
        assert_eq!("pyramid".parse::<WakeKind>().unwrap(), WakeKind::Pyramid);
        let err = "sphere".parse::<WakeKind>().unwrap_err();
        assert!(err.to_string().contains("cone, pyramid"));
    }

    #[test]
    fn for_scene_builds_pyramid_wake_for_pyramid_shield() {
        let shield = Shield::new(
            ShieldProfile::Pyramid {
                half_base: 2.0,
                aspect: 1.0,
            },
            0.002,
            Coating::Specular,
        )
        .unwrap();
        let wake = WakeVolume::for_scene(&shield, &wafer_at(-1.2)).unwrap();
        assert_eq!(wake.kind(), WakeKind::Pyramid);
        assert_eq!(wake.kind_name(), "PyramidWake");
        assert!(f64_approx_equal(wake.length(), 20.0));
    }

    #[test]
    fn for_scene_builds_cone_reaching_shield_rim_at_wafer_depth() {
        let shield = Shield::new(ShieldProfile::Flat { radius: 1.0 }, 0.002, Coating::Diffuse)
            .unwrap();
        let wake = WakeVolume::for_scene(&shield, &wafer_at(-1.0)).unwrap();
        match wake {
            WakeVolume::Cone(cone) => {
                assert!(f64_approx_equal(cone.half_angle_deg(), 45.0));
                assert!(f64_approx_equal(cone.radius_at(1.0), 1.0));
                assert!(f64_approx_equal(cone.length(), 10.0));
            }
            other => panic!("expected a cone wake, got {:?}", other),
        }
        assert_eq!(wake.kind_name(), "WakeCone");
    }

    #[test]
    fn for_scene_rejects_cone_wake_for_wafer_at_apex_plane() {
        let shield = Shield::new(ShieldProfile::Flat { radius: 1.0 }, 0.002, Coating::Specular)
            .unwrap();
        let err = WakeVolume::for_scene(&shield, &wafer_at(0.0)).unwrap_err();
        match err {
            ConfigError::InvalidParameter { name, .. } => assert_eq!(name, "wafer.z_offset"),
            other => panic!("expected an invalid wafer offset, got {:?}", other),
        }
    }
}
