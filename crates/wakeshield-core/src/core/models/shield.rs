use super::error::{ConfigError, require_positive};
use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Aluminium, in kg/m^3.
pub const DEFAULT_DENSITY_KG_M3: f64 = 2700.0;

/// Cap rims wider than the implied sphere are clamped to this fraction of the rim radius.
pub const CAP_CLAMP_FACTOR: f64 = 0.99;

/// Pyramid aspect ratios below this floor are raised to it before computing the height.
pub const MIN_PYRAMID_ASPECT: f64 = 0.3;

/// Surface finish of the shield, which selects the reflection law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Coating {
    /// Mirror reflection about the surface normal.
    Specular,
    /// Lambertian re-emission into the normal's hemisphere.
    Diffuse,
}

impl Coating {
    pub const NAMES: [&'static str; 2] = ["specular", "diffuse"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Coating::Specular => "specular",
            Coating::Diffuse => "diffuse",
        }
    }
}

impl FromStr for Coating {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "specular" => Ok(Coating::Specular),
            "diffuse" => Ok(Coating::Diffuse),
            _ => Err(ConfigError::UnknownCoating {
                value: s.to_string(),
                valid: Coating::NAMES.join(", "),
            }),
        }
    }
}

impl fmt::Display for Coating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a shield profile family, without its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Flat,
    Cap,
    Pyramid,
    Cupola,
}

static PROFILE_NAMES: Map<&'static str, ProfileKind> = phf_map! {
    "flat" => ProfileKind::Flat,
    "disk" => ProfileKind::Flat,
    "cap" => ProfileKind::Cap,
    "spherical-cap" => ProfileKind::Cap,
    "pyramid" => ProfileKind::Pyramid,
    "cupola" => ProfileKind::Cupola,
    "j5" => ProfileKind::Cupola,
};

impl ProfileKind {
    pub const ALL: [ProfileKind; 4] = [
        ProfileKind::Flat,
        ProfileKind::Cap,
        ProfileKind::Pyramid,
        ProfileKind::Cupola,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Flat => "flat",
            ProfileKind::Cap => "cap",
            ProfileKind::Pyramid => "pyramid",
            ProfileKind::Cupola => "cupola",
        }
    }

    fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for ProfileKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PROFILE_NAMES
            .get(s.trim().to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| ConfigError::UnknownProfile {
                value: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The solid-geometry family of the shield together with the dimensions that family uses.
///
/// Each variant carries only its own parameters, so no code path can read a curvature on a
/// pyramid or an aspect ratio on a cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShieldProfile {
    /// Flat disk in the `z = 0` plane.
    Flat { radius: f64 },
    /// Convex spherical cap with its apex at the origin.
    Cap {
        /// Radius of the circular rim, in meters.
        rim_radius: f64,
        /// Inverse of the implied sphere radius, in 1/m.
        curvature: f64,
    },
    /// Square pyramid with its apex at the origin and base below it.
    Pyramid {
        half_base: f64,
        /// Height divided by half-base.
        aspect: f64,
    },
    /// Johnson J5 pentagonal cupola with its pentagon roof at `z = 0`.
    Cupola {
        edge_length: f64,
        include_base: bool,
        include_top: bool,
    },
}

impl ShieldProfile {
    /// Builds a profile from the flattened `(primary_dim, shape_param)` view, validating only
    /// the fields the chosen family actually uses.
    pub fn from_parts(
        kind: ProfileKind,
        primary_dim: f64,
        shape_param: f64,
        include_base: bool,
        include_top: bool,
    ) -> Result<Self, ConfigError> {
        let primary_dim = require_positive("primary_dim", primary_dim)?;
        match kind {
            ProfileKind::Flat => Ok(ShieldProfile::Flat {
                radius: primary_dim,
            }),
            ProfileKind::Cap => Ok(ShieldProfile::Cap {
                rim_radius: primary_dim,
                curvature: require_positive("shape_param", shape_param)?,
            }),
            ProfileKind::Pyramid => {
                if !shape_param.is_finite() {
                    return Err(ConfigError::invalid(
                        "shape_param",
                        format!("pyramid aspect ratio must be finite, got {}", shape_param),
                    ));
                }
                Ok(ShieldProfile::Pyramid {
                    half_base: primary_dim,
                    aspect: shape_param,
                })
            }
            ProfileKind::Cupola => Ok(ShieldProfile::Cupola {
                edge_length: primary_dim,
                include_base,
                include_top,
            }),
        }
    }

    pub fn kind(&self) -> ProfileKind {
        match self {
            ShieldProfile::Flat { .. } => ProfileKind::Flat,
            ShieldProfile::Cap { .. } => ProfileKind::Cap,
            ShieldProfile::Pyramid { .. } => ProfileKind::Pyramid,
            ShieldProfile::Cupola { .. } => ProfileKind::Cupola,
        }
    }

    /// Rim radius (flat, cap), half-base (pyramid) or edge length (cupola).
    pub fn primary_dim(&self) -> f64 {
        match *self {
            ShieldProfile::Flat { radius } => radius,
            ShieldProfile::Cap { rim_radius, .. } => rim_radius,
            ShieldProfile::Pyramid { half_base, .. } => half_base,
            ShieldProfile::Cupola { edge_length, .. } => edge_length,
        }
    }

    /// Curvature (cap), aspect ratio (pyramid), or the record placeholder used for profiles
    /// without a shape parameter: `0.0` for flat and `1.0` for cupola.
    pub fn shape_param(&self) -> f64 {
        match *self {
            ShieldProfile::Flat { .. } => 0.0,
            ShieldProfile::Cap { curvature, .. } => curvature,
            ShieldProfile::Pyramid { aspect, .. } => aspect,
            ShieldProfile::Cupola { .. } => 1.0,
        }
    }

    /// Radius of the sphere a cap is cut from.
    ///
    /// When the rim would be wider than `1 / curvature` the radius is clamped to
    /// `0.99 * rim_radius`. This is a heuristic surrogate, not a physically exact cap.
    /// Returns `None` for the other profiles.
    pub fn cap_sphere_radius(&self) -> Option<f64> {
        match *self {
            ShieldProfile::Cap {
                rim_radius,
                curvature,
            } => {
                let radius = 1.0 / curvature;
                if rim_radius > radius {
                    debug!(
                        rim_radius,
                        sphere_radius = radius,
                        "Cap rim exceeds sphere radius; clamping."
                    );
                    Some(rim_radius * CAP_CLAMP_FACTOR)
                } else {
                    Some(radius)
                }
            }
            _ => None,
        }
    }

    /// Pyramid height, `half_base * max(aspect, 0.3)`. Returns `None` for the other profiles.
    pub fn pyramid_height(&self) -> Option<f64> {
        match *self {
            ShieldProfile::Pyramid { half_base, aspect } => {
                Some(half_base * aspect.max(MIN_PYRAMID_ASPECT))
            }
            _ => None,
        }
    }

    /// Wetted surface area in m^2.
    pub fn area(&self) -> f64 {
        match *self {
            ShieldProfile::Flat { radius } => PI * radius * radius,
            ShieldProfile::Cap { rim_radius, .. } => {
                let r = self.cap_sphere_radius().unwrap_or(rim_radius);
                let rim = rim_radius.min(r);
                let sagitta = r - (r * r - rim * rim).max(0.0).sqrt();
                2.0 * PI * r * sagitta
            }
            ShieldProfile::Pyramid { half_base, .. } => {
                let h = self.pyramid_height().unwrap_or(half_base);
                4.0 * half_base * (half_base * half_base + h * h).sqrt()
            }
            ShieldProfile::Cupola {
                edge_length,
                include_base,
                include_top,
            } => {
                let a2 = edge_length * edge_length;
                let sqrt5 = 5.0f64.sqrt();
                let mut area = 5.0 * a2 + 5.0 * (3.0f64.sqrt() / 4.0) * a2;
                if include_top {
                    area += 0.25 * (5.0 * (5.0 + 2.0 * sqrt5)).sqrt() * a2;
                }
                if include_base {
                    area += 2.5 * (5.0 + 2.0 * sqrt5).sqrt() * a2;
                }
                area
            }
        }
    }
}

/// The leading shield. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Shield {
    profile: ShieldProfile,
    thickness: f64,
    coating: Coating,
}

impl Shield {
    pub fn new(
        profile: ShieldProfile,
        thickness: f64,
        coating: Coating,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            profile,
            thickness: require_positive("thickness", thickness)?,
            coating,
        })
    }

    pub fn profile(&self) -> &ShieldProfile {
        &self.profile
    }

    pub fn kind(&self) -> ProfileKind {
        self.profile.kind()
    }

    pub fn primary_dim(&self) -> f64 {
        self.profile.primary_dim()
    }

    pub fn shape_param(&self) -> f64 {
        self.profile.shape_param()
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn coating(&self) -> Coating {
        self.coating
    }

    pub fn area(&self) -> f64 {
        self.profile.area()
    }

    /// Mass in kg for a wall of uniform `density` (kg/m^3).
    pub fn mass(&self, density: f64) -> f64 {
        self.area() * self.thickness * density
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn flat(radius: f64, thickness: f64) -> Shield {
        Shield::new(ShieldProfile::Flat { radius }, thickness, Coating::Specular).unwrap()
    }

    #[test]
    fn profile_kind_parses_known_names_case_insensitively() {
        assert_eq!("flat".parse::<ProfileKind>().unwrap(), ProfileKind::Flat);
        assert_eq!(" CAP ".parse::<ProfileKind>().unwrap(), ProfileKind::Cap);
        assert_eq!("Pyramid".parse::<ProfileKind>().unwrap(), ProfileKind::Pyramid);
        assert_eq!("j5".parse::<ProfileKind>().unwrap(), ProfileKind::Cupola);
    }

    #[test]
    fn unknown_profile_error_names_value_and_valid_profiles() {
        let err = "torus".parse::<ProfileKind>().unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownProfile {
                value: "torus".to_string(),
                valid: "flat, cap, pyramid, cupola".to_string(),
            }
        );
        let message = err.to_string();
        assert!(message.contains("torus"));
        assert!(message.contains("cupola"));
    }

    #[test]
    fn coating_parses_and_rejects_unknown_values() {
        assert_eq!("diffuse".parse::<Coating>().unwrap(), Coating::Diffuse);
        assert!(matches!(
            "matte".parse::<Coating>(),
            Err(ConfigError::UnknownCoating { .. })
        ));
    }

    #[test]
    fn flat_area_is_pi_r_squared() {
        let shield = flat(1.5, 0.002);
        assert!(f64_approx_equal(shield.area(), PI * 1.5 * 1.5));
    }

    #[test]
    fn mass_scales_linearly_with_thickness_and_density() {
        let thin = flat(1.0, 0.001);
        let thick = flat(1.0, 0.003);
        assert!(f64_approx_equal(thick.mass(2700.0), 3.0 * thin.mass(2700.0)));
        assert!(f64_approx_equal(thin.mass(5400.0), 2.0 * thin.mass(2700.0)));
        assert!(f64_approx_equal(
            thin.mass(DEFAULT_DENSITY_KG_M3),
            PI * 0.001 * DEFAULT_DENSITY_KG_M3
        ));
    }

    #[test]
    fn cap_area_matches_spherical_cap_formula() {
        let profile = ShieldProfile::Cap {
            rim_radius: 1.0,
            curvature: 0.5,
        };
        let r = 2.0f64;
        let sagitta = r - (r * r - 1.0).sqrt();
        assert!(f64_approx_equal(profile.area(), 2.0 * PI * r * sagitta));
    }

    #[test]
    fn cap_sphere_radius_is_clamped_when_rim_exceeds_it() {
        let profile = ShieldProfile::Cap {
            rim_radius: 2.0,
            curvature: 2.0,
        };
        assert!(f64_approx_equal(profile.cap_sphere_radius().unwrap(), 1.98));
        assert!(profile.area().is_finite());
    }

    #[test]
    fn cap_sphere_radius_is_exact_when_rim_fits_inside_it() {
        let profile = ShieldProfile::Cap {
            rim_radius: 0.5,
            curvature: 2.0,
        };
        assert!(f64_approx_equal(profile.cap_sphere_radius().unwrap(), 0.5));
    }

    #[test]
    fn pyramid_height_uses_minimum_aspect_floor() {
        let profile = ShieldProfile::Pyramid {
            half_base: 2.0,
            aspect: 0.1,
        };
        assert!(f64_approx_equal(profile.pyramid_height().unwrap(), 0.6));
        let expected = 4.0 * 2.0 * (4.0f64 + 0.36).sqrt();
        assert!(f64_approx_equal(profile.area(), expected));
    }

    #[test]
    fn cupola_area_grows_when_base_and_top_are_included() {
        let open = ShieldProfile::Cupola {
            edge_length: 1.0,
            include_base: false,
            include_top: false,
        };
        let closed = ShieldProfile::Cupola {
            edge_length: 1.0,
            include_base: true,
            include_top: true,
        };
        assert!(f64_approx_equal(open.area(), 5.0 + 5.0 * 3.0f64.sqrt() / 4.0));
        assert!(closed.area() > open.area());
    }

    #[test]
    fn from_parts_ignores_shape_param_for_flat_and_cupola() {
        let flat = ShieldProfile::from_parts(ProfileKind::Flat, 1.0, f64::NAN, false, false);
        assert_eq!(flat.unwrap(), ShieldProfile::Flat { radius: 1.0 });
        let cupola = ShieldProfile::from_parts(ProfileKind::Cupola, 2.0, -5.0, true, false);
        assert_eq!(cupola.unwrap().shape_param(), 1.0);
    }

    #[test]
    fn from_parts_rejects_non_positive_cap_curvature() {
        let result = ShieldProfile::from_parts(ProfileKind::Cap, 1.0, 0.0, false, false);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "shape_param",
                ..
            })
        ));
    }

    #[test]
    fn shield_rejects_non_positive_thickness() {
        let result = Shield::new(ShieldProfile::Flat { radius: 1.0 }, 0.0, Coating::Diffuse);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "thickness",
                ..
            })
        ));
    }
}
