use super::config::SourceConfig;
use super::error::SamplingError;
use super::random::RandomSource;
use crate::core::atmosphere::AtmosphereModel;
use crate::core::models::scene::Scene;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Particles injected upstream of the shield for a single batch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleBatch {
    pub origins: Vec<Point3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    /// Index into the atmosphere's species table.
    pub species: Vec<usize>,
}

impl ParticleBatch {
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Ram direction `(0, 0, -1)` after a pitch about X and a yaw about Y, both in radians.
#[inline]
pub fn jittered_ram_direction(pitch: f64, yaw: f64) -> Vector3<f64> {
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();
    Vector3::new(-sy, sp * cy, -cp * cy).normalize()
}

/// Samples incident particles on a disc above the shield apex.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSource<'a> {
    atmosphere: &'a AtmosphereModel,
    config: SourceConfig,
}

impl<'a> ParticleSource<'a> {
    pub fn new(atmosphere: &'a AtmosphereModel, config: SourceConfig) -> Self {
        Self { atmosphere, config }
    }

    /// Radius of the injection disc for `scene`.
    pub fn disc_radius(&self, scene: &Scene) -> f64 {
        self.config.radius_factor * scene.shield().primary_dim()
    }

    /// Draws `n` particles.
    ///
    /// Random blocks are requested in a fixed order (azimuth, radius, pitch, yaw, species,
    /// then three thermal components per particle) so a seeded source always yields the same
    /// batch.
    pub fn sample<R: RandomSource + ?Sized>(
        &self,
        scene: &Scene,
        n: usize,
        rng: &mut R,
    ) -> Result<ParticleBatch, SamplingError> {
        let r_max = self.disc_radius(scene);
        let sigma = self.config.attitude_jitter_deg.to_radians();
        let species_table = &self.atmosphere.species;

        let theta = rng.uniform(0.0, 2.0 * PI, n);
        let radius_u = rng.uniform(0.0, 1.0, n);
        let pitch = rng.normal(0.0, sigma, n)?;
        let yaw = rng.normal(0.0, sigma, n)?;
        let species = rng.weighted_choice(species_table.len(), n, &self.atmosphere.weights())?;
        let thermal = rng.normal(0.0, 1.0, 3 * n)?;

        let thermal_scale: Vec<f64> = species_table.iter().map(|s| s.thermal_speed()).collect();

        let origins = theta
            .iter()
            .zip(&radius_u)
            .map(|(&t, &u)| {
                let r = r_max * u.sqrt();
                Point3::new(r * t.cos(), r * t.sin(), self.config.source_height)
            })
            .collect();

        let velocities = (0..n)
            .map(|i| {
                let drift = jittered_ram_direction(pitch[i], yaw[i]) * self.atmosphere.orbital_speed
                    + self.atmosphere.crosswind;
                let scale = thermal_scale[species[i]];
                let spread =
                    Vector3::new(thermal[3 * i], thermal[3 * i + 1], thermal[3 * i + 2]) * scale;
                drift + spread
            })
            .collect();

        Ok(ParticleBatch {
            origins,
            velocities,
            species,
        })
    }
}
