use crate::core::models::error::{ConfigError, require_positive};
use crate::core::models::scene::Scene;
use crate::core::models::shield::{
    Coating, DEFAULT_DENSITY_KG_M3, ProfileKind, Shield, ShieldProfile,
};
use crate::core::models::wafer::{DEFAULT_GRID_SHAPE, WaferPlane};
use crate::core::models::wake::{WakeCone, WakePyramid, WakeVolume};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_SOURCE_HEIGHT: f64 = 1.0;
pub const DEFAULT_SOURCE_RADIUS_FACTOR: f64 = 1.2;
pub const DEFAULT_ATTITUDE_JITTER_DEG: f64 = 0.3;

/// Placement of the upstream injection disc and the spacecraft's pointing noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceConfig {
    /// Height of the injection disc above the shield apex, in meters.
    pub source_height: f64,
    /// Injection disc radius as a multiple of the shield's primary dimension.
    pub radius_factor: f64,
    /// One-sigma pitch and yaw jitter around the ram direction, in degrees.
    pub attitude_jitter_deg: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_height: DEFAULT_SOURCE_HEIGHT,
            radius_factor: DEFAULT_SOURCE_RADIUS_FACTOR,
            attitude_jitter_deg: DEFAULT_ATTITUDE_JITTER_DEG,
        }
    }
}

impl SourceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("source.source_height", self.source_height)?;
        require_positive("source.radius_factor", self.radius_factor)?;
        if !(self.attitude_jitter_deg.is_finite() && self.attitude_jitter_deg >= 0.0) {
            return Err(ConfigError::invalid(
                "source.attitude_jitter_deg",
                format!(
                    "expected a non-negative finite angle, got {}",
                    self.attitude_jitter_deg
                ),
            ));
        }
        Ok(())
    }
}

/// How the batch's mean deflection angle treats particles that miss the shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeflectionAveraging {
    /// Every particle contributes; misses count as 180 degrees.
    #[default]
    AllParticles,
    /// Only shield hits contribute; 180 degrees when nothing hits.
    HitsOnly,
}

impl FromStr for DeflectionAveraging {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all-particles" | "all" => Ok(Self::AllParticles),
            "hits-only" | "hits" => Ok(Self::HitsOnly),
            other => Err(ConfigError::invalid(
                "deflection_averaging",
                format!("'{}' is not one of: all-particles, hits-only", other),
            )),
        }
    }
}

/// Weight added to a hit-grid cell per wafer impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinningPolicy {
    /// One count per impact.
    #[default]
    Unweighted,
    /// Each impact adds the cosine of its incidence angle.
    CosineWeighted,
}

impl FromStr for BinningPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unweighted" => Ok(Self::Unweighted),
            "cosine-weighted" | "cosine" => Ok(Self::CosineWeighted),
            other => Err(ConfigError::invalid(
                "binning",
                format!("'{}' is not one of: unweighted, cosine-weighted", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracerConfig {
    pub source: SourceConfig,
    pub deflection_averaging: DeflectionAveraging,
    pub binning: BinningPolicy,
    /// Shield wall density used for the reported mass, in kg/m^3.
    pub material_density: f64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            deflection_averaging: DeflectionAveraging::default(),
            binning: BinningPolicy::default(),
            material_density: DEFAULT_DENSITY_KG_M3,
        }
    }
}

#[derive(Default)]
pub struct TracerConfigBuilder {
    source: Option<SourceConfig>,
    deflection_averaging: Option<DeflectionAveraging>,
    binning: Option<BinningPolicy>,
    material_density: Option<f64>,
}

impl TracerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: SourceConfig) -> Self {
        self.source = Some(source);
        self
    }
    pub fn deflection_averaging(mut self, averaging: DeflectionAveraging) -> Self {
        self.deflection_averaging = Some(averaging);
        self
    }
    pub fn binning(mut self, policy: BinningPolicy) -> Self {
        self.binning = Some(policy);
        self
    }
    pub fn material_density(mut self, density: f64) -> Self {
        self.material_density = Some(density);
        self
    }

    pub fn build(self) -> Result<TracerConfig, ConfigError> {
        let source = self.source.ok_or(ConfigError::MissingParameter("source"))?;
        source.validate()?;
        let material_density = self
            .material_density
            .ok_or(ConfigError::MissingParameter("material_density"))?;
        Ok(TracerConfig {
            source,
            deflection_averaging: self
                .deflection_averaging
                .ok_or(ConfigError::MissingParameter("deflection_averaging"))?,
            binning: self
                .binning
                .ok_or(ConfigError::MissingParameter("binning"))?,
            material_density: require_positive("material_density", material_density)?,
        })
    }
}

/// Which wake volume a scene uses.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WakeSelection {
    /// Derived from the shield and wafer, see [`WakeVolume::for_scene`].
    #[default]
    Auto,
    Cone { half_angle_deg: f64, length: f64 },
    Pyramid { half_base: f64, length: f64 },
}

/// Unvalidated scene description as it arrives from a configuration front end.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub profile: String,
    pub primary_dim: f64,
    /// Curvature for caps, aspect ratio for pyramids; ignored by other profiles.
    pub shape_param: Option<f64>,
    pub thickness: f64,
    pub coating: String,
    pub include_base: bool,
    pub include_top: bool,
    pub wafer_radius: f64,
    pub z_offset: f64,
    pub xy_offset: (f64, f64),
    pub grid_shape: (usize, usize),
    pub wake: WakeSelection,
}

impl SceneConfig {
    pub fn to_scene(&self) -> Result<Scene, ConfigError> {
        let kind: ProfileKind = self.profile.parse()?;
        let coating: Coating = self.coating.parse()?;
        let shape_param = match kind {
            ProfileKind::Cap | ProfileKind::Pyramid => self
                .shape_param
                .ok_or(ConfigError::MissingParameter("shape_param"))?,
            ProfileKind::Flat => 0.0,
            ProfileKind::Cupola => 1.0,
        };
        let profile = ShieldProfile::from_parts(
            kind,
            self.primary_dim,
            shape_param,
            self.include_base,
            self.include_top,
        )?;
        let shield = Shield::new(profile, self.thickness, coating)?;
        let wafer = WaferPlane::new(
            self.wafer_radius,
            self.z_offset,
            Vector2::new(self.xy_offset.0, self.xy_offset.1),
            self.grid_shape,
        )?;
        let wake = match self.wake {
            WakeSelection::Auto => WakeVolume::for_scene(&shield, &wafer)?,
            WakeSelection::Cone {
                half_angle_deg,
                length,
            } => WakeVolume::Cone(WakeCone::new(half_angle_deg, length)?),
            WakeSelection::Pyramid { half_base, length } => {
                WakeVolume::Pyramid(WakePyramid::new(half_base, length)?)
            }
        };
        Ok(Scene::new(shield, wafer, wake))
    }
}

#[derive(Default)]
pub struct SceneConfigBuilder {
    profile: Option<String>,
    primary_dim: Option<f64>,
    shape_param: Option<f64>,
    thickness: Option<f64>,
    coating: Option<String>,
    include_base: Option<bool>,
    include_top: Option<bool>,
    wafer_radius: Option<f64>,
    z_offset: Option<f64>,
    xy_offset: Option<(f64, f64)>,
    grid_shape: Option<(usize, usize)>,
    wake: Option<WakeSelection>,
}

impl SceneConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
    pub fn primary_dim(mut self, value: f64) -> Self {
        self.primary_dim = Some(value);
        self
    }
    pub fn shape_param(mut self, value: f64) -> Self {
        self.shape_param = Some(value);
        self
    }
    pub fn thickness(mut self, meters: f64) -> Self {
        self.thickness = Some(meters);
        self
    }
    pub fn coating(mut self, coating: impl Into<String>) -> Self {
        self.coating = Some(coating.into());
        self
    }
    pub fn include_base(mut self, include: bool) -> Self {
        self.include_base = Some(include);
        self
    }
    pub fn include_top(mut self, include: bool) -> Self {
        self.include_top = Some(include);
        self
    }
    pub fn wafer_radius(mut self, meters: f64) -> Self {
        self.wafer_radius = Some(meters);
        self
    }
    pub fn z_offset(mut self, meters: f64) -> Self {
        self.z_offset = Some(meters);
        self
    }
    pub fn xy_offset(mut self, x: f64, y: f64) -> Self {
        self.xy_offset = Some((x, y));
        self
    }
    pub fn grid_shape(mut self, rows: usize, cols: usize) -> Self {
        self.grid_shape = Some((rows, cols));
        self
    }
    pub fn wake(mut self, wake: WakeSelection) -> Self {
        self.wake = Some(wake);
        self
    }

    pub fn build(self) -> Result<SceneConfig, ConfigError> {
        Ok(SceneConfig {
            profile: self
                .profile
                .ok_or(ConfigError::MissingParameter("profile"))?,
            primary_dim: self
                .primary_dim
                .ok_or(ConfigError::MissingParameter("primary_dim"))?,
            shape_param: self.shape_param,
            thickness: self
                .thickness
                .ok_or(ConfigError::MissingParameter("thickness"))?,
            coating: self
                .coating
                .ok_or(ConfigError::MissingParameter("coating"))?,
            include_base: self.include_base.unwrap_or(false),
            include_top: self.include_top.unwrap_or(false),
            wafer_radius: self
                .wafer_radius
                .ok_or(ConfigError::MissingParameter("wafer_radius"))?,
            z_offset: self
                .z_offset
                .ok_or(ConfigError::MissingParameter("z_offset"))?,
            xy_offset: self.xy_offset.unwrap_or((0.0, 0.0)),
            grid_shape: self.grid_shape.unwrap_or(DEFAULT_GRID_SHAPE),
            wake: self.wake.unwrap_or_default(),
        })
    }
}
