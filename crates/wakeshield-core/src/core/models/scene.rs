use super::error::ConfigError;
use super::shield::Shield;
use super::wafer::WaferPlane;
use super::wake::WakeVolume;

/// One shield, one wafer and one wake volume, read-only while a batch is traced.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    shield: Shield,
    wafer: WaferPlane,
    wake: WakeVolume,
}

impl Scene {
    pub fn new(shield: Shield, wafer: WaferPlane, wake: WakeVolume) -> Self {
        Self {
            shield,
            wafer,
            wake,
        }
    }

    /// Builds a scene with the wake derived from the shield and wafer.
    pub fn with_default_wake(shield: Shield, wafer: WaferPlane) -> Result<Self, ConfigError> {
        let wake = WakeVolume::for_scene(&shield, &wafer)?;
        Ok(Self::new(shield, wafer, wake))
    }

    pub fn shield(&self) -> &Shield {
        &self.shield
    }

    pub fn wafer(&self) -> &WaferPlane {
        &self.wafer
    }

    pub fn wake(&self) -> &WakeVolume {
        &self.wake
    }

    /// Whether the wafer sits inside the protected wake.
    ///
    /// For a cone the whole wafer disk must fit within the cone's radius at the wafer depth.
    /// For a pyramid only the wafer centre is tested.
    pub fn wafer_inside_wake(&self) -> bool {
        match &self.wake {
            WakeVolume::Cone(cone) => {
                let depth = self.wafer.z_offset().abs();
                self.wafer.radius() <= cone.radius_at(depth)
            }
            WakeVolume::Pyramid(pyramid) => pyramid.contains(&self.wafer.center()),
        }
    }
}
