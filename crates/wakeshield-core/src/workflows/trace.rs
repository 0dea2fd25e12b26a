use crate::core::atmosphere::AtmosphereModel;
use crate::core::interaction::intersect::ShieldIntersector;
use crate::core::models::scene::Scene;
use crate::engine::accumulator::{HitGrid, WaferAccumulator};
use crate::engine::config::{BinningPolicy, DeflectionAveraging, TracerConfig};
use crate::engine::error::EngineError;
use crate::engine::pipeline::{MISS_DEFLECTION_DEG, ParticleOutcome, StageContext, run_stages};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::random::{RandomSource, sample_cosine_weighted};
use crate::engine::source::ParticleSource;
use nalgebra::DMatrix;
use std::f64::consts::PI;
use tracing::{debug, info, instrument, warn};

/// Aggregates of one traced batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatistics {
    pub mean_deflection_deg: f64,
    /// Fraction of launched particles that struck the wafer.
    pub hit_ratio: f64,
    /// Fraction of particles whose final ray entered the wake or struck the wafer.
    pub wake_intrusion_ratio: f64,
    /// Physical particle flux reaching the wafer, in particles / m^2 / s.
    pub wafer_flux_per_m2_per_s: f64,
    /// Copy of the hit grid after binning.
    pub hit_grid: DMatrix<f64>,
    pub batch_size: usize,
    pub shield_hits: usize,
    pub wafer_hits: usize,
    pub wake_hits: usize,
}

/// Traces batches through one scene, reusing the prepared shield surface and hit grid.
pub struct BatchTracer<'a> {
    scene: &'a Scene,
    config: TracerConfig,
    atmosphere: &'a AtmosphereModel,
    intersector: ShieldIntersector,
    grid: HitGrid,
}

impl<'a> BatchTracer<'a> {
    pub fn new(
        scene: &'a Scene,
        config: TracerConfig,
        atmosphere: &'a AtmosphereModel,
    ) -> Result<Self, EngineError> {
        config.source.validate()?;
        atmosphere.validate()?;
        Ok(Self {
            scene,
            config,
            atmosphere,
            intersector: ShieldIntersector::new(scene.shield()),
            grid: HitGrid::for_wafer(scene.wafer()),
        })
    }

    pub fn scene(&self) -> &Scene {
        self.scene
    }

    pub fn config(&self) -> &TracerConfig {
        &self.config
    }

    /// Hit grid of the most recent batch.
    pub fn grid(&self) -> &HitGrid {
        &self.grid
    }

    /// Traces `batch_size` particles. The hit grid is zeroed before any binning, so the
    /// returned statistics describe this batch alone.
    #[instrument(skip_all, name = "trace_batch", fields(batch_size = batch_size, profile = %self.scene.shield().kind()))]
    pub fn trace<R: RandomSource + ?Sized>(
        &mut self,
        batch_size: usize,
        rng: &mut R,
        reporter: &ProgressReporter,
    ) -> Result<BatchStatistics, EngineError> {
        if batch_size == 0 {
            return Err(EngineError::EmptyBatch);
        }
        self.grid.reset();

        reporter.report(Progress::PhaseStart { name: "Sampling" });
        let source = ParticleSource::new(self.atmosphere, self.config.source);
        let batch = source.sample(self.scene, batch_size, rng)?;
        let locals = sample_cosine_weighted(rng, batch_size);
        reporter.report(Progress::PhaseFinish);

        reporter.report(Progress::PhaseStart { name: "Tracing" });
        let ctx = StageContext {
            intersector: &self.intersector,
            coating: self.scene.shield().coating(),
            wake: self.scene.wake(),
            wafer: WaferAccumulator::new(self.scene.wafer()),
        };
        let outcomes = run_stages(&batch, &locals, &ctx, reporter);
        reporter.report(Progress::PhaseFinish);

        if outcomes.len() != batch_size {
            return Err(EngineError::Internal(format!(
                "expected {} particle outcomes, got {}",
                batch_size,
                outcomes.len()
            )));
        }

        reporter.report(Progress::PhaseStart { name: "Binning" });
        let cos_sum = bin_impacts(&mut self.grid, self.config.binning, &outcomes, &ctx.wafer);
        reporter.report(Progress::PhaseFinish);

        let stats = self.aggregate(&outcomes, cos_sum, source.disc_radius(self.scene));
        if stats.shield_hits == 0 {
            warn!("No particle struck the shield; check source placement against the profile.");
        }
        info!(
            mean_deflection_deg = stats.mean_deflection_deg,
            hit_ratio = stats.hit_ratio,
            wake_intrusion_ratio = stats.wake_intrusion_ratio,
            wafer_flux = stats.wafer_flux_per_m2_per_s,
            "Batch traced."
        );
        Ok(stats)
    }

    fn aggregate(
        &self,
        outcomes: &[ParticleOutcome],
        cos_sum: f64,
        source_radius: f64,
    ) -> BatchStatistics {
        let n = outcomes.len();
        let shield_hits = outcomes.iter().filter(|o| o.is_shield_hit()).count();
        let wafer_hits = outcomes
            .iter()
            .filter(|o| o.wafer_impact().is_some())
            .count();
        let wake_hits = outcomes
            .iter()
            .filter(|o| o.in_wake() || o.wafer_impact().is_some())
            .count();

        let mean_deflection_deg = match self.config.deflection_averaging {
            DeflectionAveraging::AllParticles => {
                outcomes.iter().map(|o| o.deflection_deg()).sum::<f64>() / n as f64
            }
            DeflectionAveraging::HitsOnly if shield_hits == 0 => MISS_DEFLECTION_DEG,
            DeflectionAveraging::HitsOnly => {
                outcomes
                    .iter()
                    .filter(|o| o.is_shield_hit())
                    .map(|o| o.deflection_deg())
                    .sum::<f64>()
                    / shield_hits as f64
            }
        };

        let per_sample_rate = self.atmosphere.directed_flux() * PI * source_radius * source_radius
            / n as f64;
        let wafer_flux_per_m2_per_s = per_sample_rate * cos_sum / self.scene.wafer().area();

        BatchStatistics {
            mean_deflection_deg,
            hit_ratio: wafer_hits as f64 / n as f64,
            wake_intrusion_ratio: wake_hits as f64 / n as f64,
            wafer_flux_per_m2_per_s,
            hit_grid: self.grid.snapshot(),
            batch_size: n,
            shield_hits,
            wafer_hits,
            wake_hits,
        }
    }
}

/// Serially adds every wafer impact to `grid` and returns the summed incidence cosines.
fn bin_impacts(
    grid: &mut HitGrid,
    binning: BinningPolicy,
    outcomes: &[ParticleOutcome],
    wafer: &WaferAccumulator<'_>,
) -> f64 {
    let mut cos_sum = 0.0;
    for impact in outcomes.iter().filter_map(|o| o.wafer_impact()) {
        let (row, col) = wafer.bin(&impact.point);
        let weight = match binning {
            BinningPolicy::Unweighted => 1.0,
            BinningPolicy::CosineWeighted => impact.cos_incidence,
        };
        grid.increment(row, col, weight);
        cos_sum += impact.cos_incidence;
    }
    debug!(grid_total = grid.total(), "Wafer impacts binned.");
    cos_sum
}

/// Traces a single batch through `scene` with a fresh hit grid.
pub fn trace_batch<R: RandomSource + ?Sized>(
    scene: &Scene,
    batch_size: usize,
    config: &TracerConfig,
    atmosphere: &AtmosphereModel,
    rng: &mut R,
    reporter: &ProgressReporter,
) -> Result<BatchStatistics, EngineError> {
    BatchTracer::new(scene, *config, atmosphere)?.trace(batch_size, rng, reporter)
}
