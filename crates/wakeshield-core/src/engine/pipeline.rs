use super::accumulator::{WaferAccumulator, WaferImpact};
use super::progress::{Progress, ProgressReporter};
use super::source::ParticleBatch;
use crate::core::geometry::{Ray, normalize_or_floor};
use crate::core::interaction::intersect::{ShieldHit, ShieldIntersector};
use crate::core::interaction::reflection::{Reflector, deflection_deg};
use crate::core::interaction::wake::intrudes;
use crate::core::models::shield::Coating;
use crate::core::models::wake::WakeVolume;
use nalgebra::{Point3, Vector3};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Deflection assigned to particles that never touch the shield.
pub const MISS_DEFLECTION_DEG: f64 = 180.0;

/// Name of each step a particle moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParticleStage {
    Sampled,
    ShieldTested,
    Missed,
    Reflected,
    WakeTested,
    WaferTested,
    Aggregated,
}

/// Final record of one particle's trip through the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleOutcome {
    Missed {
        in_wake: bool,
        wafer: Option<WaferImpact>,
    },
    Reflected {
        deflection_deg: f64,
        in_wake: bool,
        wafer: Option<WaferImpact>,
    },
}

impl ParticleOutcome {
    pub fn is_shield_hit(&self) -> bool {
        matches!(self, ParticleOutcome::Reflected { .. })
    }

    pub fn deflection_deg(&self) -> f64 {
        match self {
            ParticleOutcome::Missed { .. } => MISS_DEFLECTION_DEG,
            ParticleOutcome::Reflected { deflection_deg, .. } => *deflection_deg,
        }
    }

    pub fn in_wake(&self) -> bool {
        match self {
            ParticleOutcome::Missed { in_wake, .. } | ParticleOutcome::Reflected { in_wake, .. } => {
                *in_wake
            }
        }
    }

    pub fn wafer_impact(&self) -> Option<&WaferImpact> {
        match self {
            ParticleOutcome::Missed { wafer, .. } | ParticleOutcome::Reflected { wafer, .. } => {
                wafer.as_ref()
            }
        }
    }
}

/// Read-only collaborators shared by every particle in a batch.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub intersector: &'a ShieldIntersector,
    pub coating: Coating,
    pub wake: &'a WakeVolume,
    pub wafer: WaferAccumulator<'a>,
}

/// A particle between two stages. Each variant carries exactly what the next stage needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParticleState {
    /// Incoming ray with a unit direction.
    Sampled(Ray),
    ShieldTested { ray: Ray, hit: ShieldHit },
    /// The incoming ray continues past the shield.
    Missed(Ray),
    /// Outgoing ray leaving the impact point.
    Reflected { ray: Ray, deflection_deg: f64 },
    WakeTested {
        ray: Ray,
        deflection_deg: Option<f64>,
        in_wake: bool,
    },
    WaferTested {
        deflection_deg: Option<f64>,
        in_wake: bool,
        wafer: Option<WaferImpact>,
    },
    Aggregated(ParticleOutcome),
}

impl ParticleState {
    pub fn sampled(origin: Point3<f64>, velocity: &Vector3<f64>) -> Self {
        let (direction, _) = normalize_or_floor(velocity);
        ParticleState::Sampled(Ray::new(origin, direction))
    }

    pub fn stage(&self) -> ParticleStage {
        match self {
            ParticleState::Sampled(_) => ParticleStage::Sampled,
            ParticleState::ShieldTested { .. } => ParticleStage::ShieldTested,
            ParticleState::Missed(_) => ParticleStage::Missed,
            ParticleState::Reflected { .. } => ParticleStage::Reflected,
            ParticleState::WakeTested { .. } => ParticleStage::WakeTested,
            ParticleState::WaferTested { .. } => ParticleStage::WaferTested,
            ParticleState::Aggregated(_) => ParticleStage::Aggregated,
        }
    }

    /// Moves one stage forward. `local` is the particle's cosine-weighted surface sample,
    /// consumed only by a diffuse reflection. `Aggregated` is terminal.
    pub fn advance(self, ctx: &StageContext<'_>, local: &Vector3<f64>) -> Self {
        match self {
            ParticleState::Sampled(ray) => ParticleState::ShieldTested {
                ray,
                hit: ctx.intersector.intersect(&ray.origin, &ray.direction),
            },
            ParticleState::ShieldTested { ray, hit } => match hit {
                ShieldHit::Miss => ParticleState::Missed(ray),
                ShieldHit::Hit { point, normal, .. } => {
                    let outgoing = ctx.coating.reflect(&ray.direction, &normal, local);
                    let (outgoing, _) = normalize_or_floor(&outgoing);
                    ParticleState::Reflected {
                        ray: Ray::new(point, outgoing),
                        deflection_deg: deflection_deg(&ray.direction, &outgoing),
                    }
                }
            },
            ParticleState::Missed(ray) => ParticleState::WakeTested {
                ray,
                deflection_deg: None,
                in_wake: intrudes(ctx.wake, &ray.origin, &ray.direction),
            },
            ParticleState::Reflected {
                ray,
                deflection_deg,
            } => ParticleState::WakeTested {
                ray,
                deflection_deg: Some(deflection_deg),
                in_wake: intrudes(ctx.wake, &ray.origin, &ray.direction),
            },
            ParticleState::WakeTested {
                ray,
                deflection_deg,
                in_wake,
            } => ParticleState::WaferTested {
                deflection_deg,
                in_wake,
                wafer: ctx.wafer.test(&ray.origin, &ray.direction),
            },
            ParticleState::WaferTested {
                deflection_deg,
                in_wake,
                wafer,
            } => ParticleState::Aggregated(match deflection_deg {
                None => ParticleOutcome::Missed { in_wake, wafer },
                Some(deflection_deg) => ParticleOutcome::Reflected {
                    deflection_deg,
                    in_wake,
                    wafer,
                },
            }),
            aggregated @ ParticleState::Aggregated(_) => aggregated,
        }
    }

    pub fn outcome(&self) -> Option<ParticleOutcome> {
        match self {
            ParticleState::Aggregated(outcome) => Some(*outcome),
            _ => None,
        }
    }
}

/// Drives one particle from sampling to its outcome.
pub fn run_particle(
    origin: Point3<f64>,
    velocity: &Vector3<f64>,
    local: &Vector3<f64>,
    ctx: &StageContext<'_>,
) -> ParticleOutcome {
    let mut state = ParticleState::sampled(origin, velocity);
    loop {
        if let Some(outcome) = state.outcome() {
            return outcome;
        }
        state = state.advance(ctx, local);
    }
}

/// Runs every particle of `batch` through the stage machine, in parallel when the
/// `parallel` feature is enabled. Outcomes keep the batch's particle order.
#[instrument(skip_all, name = "particle_stages", fields(particles = batch.len()))]
pub fn run_stages(
    batch: &ParticleBatch,
    locals: &[Vector3<f64>],
    ctx: &StageContext<'_>,
    reporter: &ProgressReporter,
) -> Vec<ParticleOutcome> {
    reporter.report(Progress::TaskStart {
        total: batch.len() as u64,
    });

    let work: Vec<(&Point3<f64>, &Vector3<f64>, &Vector3<f64>)> = batch
        .origins
        .iter()
        .zip(&batch.velocities)
        .zip(locals)
        .map(|((o, v), l)| (o, v, l))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = work.iter();

    #[cfg(feature = "parallel")]
    let iterator = work.par_iter();

    let outcomes: Vec<ParticleOutcome> = iterator
        .map(|(origin, velocity, local)| {
            let outcome = run_particle(**origin, velocity, local, ctx);
            reporter.report(Progress::TaskIncrement { amount: 1 });
            outcome
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    debug!(
        shield_hits = outcomes.iter().filter(|o| o.is_shield_hit()).count(),
        wafer_hits = outcomes.iter().filter(|o| o.wafer_impact().is_some()).count(),
        "Particle stages complete."
    );
    outcomes
}
