use crate::cli::TraceArgs;
use crate::config::builder::build_config;
use crate::error::{CliError, Result};
use crate::output::RecordWriter;
use crate::utils::progress::CliProgressHandler;
use tracing::{info, warn};
use wakeshield::engine::progress::{Progress, ProgressReporter};
use wakeshield::engine::random::SeededRandom;
use wakeshield::workflows::record::ScenarioRecord;
use wakeshield::workflows::trace::{BatchStatistics, BatchTracer};

pub fn run(args: TraceArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args)?;
    let scene = app
        .scene
        .to_scene()
        .map_err(|e| CliError::Config(e.to_string()))?;
    info!(
        profile = %scene.shield().kind(),
        coating = %scene.shield().coating(),
        wake = scene.wake().kind_name(),
        "Scene assembled."
    );

    if !scene.wafer_inside_wake() {
        if app.force {
            warn!("Wafer extends beyond the wake volume; tracing anyway because --force was given.");
        } else {
            warn!("Wafer extends beyond the wake volume; skipping scene.");
            println!("Skipped: the wafer is not inside the wake. Use --force to trace it anyway.");
            return Ok(());
        }
    }

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let mut tracer = BatchTracer::new(&scene, app.tracer, &app.atmosphere)?;
    let mut writer = app
        .output
        .as_deref()
        .map(|path| RecordWriter::append(path, scene.wafer().grid_shape()))
        .transpose()?;

    for index in 0..app.batches {
        reporter.report(Progress::BatchStart {
            index,
            total: app.batches,
        });
        let mut rng = batch_rng(app.seed, index);
        let stats = tracer.trace(app.batch_size, &mut rng, &reporter)?;
        reporter.report(Progress::BatchFinish);

        println!("{}", format_statistics(index, app.batches, &stats));
        if let Some(writer) = writer.as_mut() {
            writer.write(&ScenarioRecord::from_scene(
                &scene,
                &stats,
                app.tracer.material_density,
            ))?;
        }
    }

    if let (Some(writer), Some(path)) = (writer, app.output.as_ref()) {
        let rows = writer.finish()?;
        println!("✓ {} record(s) appended to {}", rows, path.display());
    }
    Ok(())
}

/// Batch `index` uses `seed + index`, so a multi-batch run can be replayed batch by batch.
fn batch_rng(seed: Option<u64>, index: usize) -> SeededRandom {
    match seed {
        Some(seed) => SeededRandom::new(seed.wrapping_add(index as u64)),
        None => SeededRandom::from_entropy(),
    }
}

fn format_statistics(index: usize, total: usize, stats: &BatchStatistics) -> String {
    format!(
        "Batch {}/{}: {} particles, {} shield hits, {} wafer hits\n  \
         mean deflection     {:.3} deg\n  \
         wafer hit ratio     {:.6}\n  \
         wake intrusion      {:.6}\n  \
         wafer flux          {:.4e} m^-2 s^-1",
        index + 1,
        total,
        stats.batch_size,
        stats.shield_hits,
        stats.wafer_hits,
        stats.mean_deflection_deg,
        stats.hit_ratio,
        stats.wake_intrusion_ratio,
        stats.wafer_flux_per_m2_per_s,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use tempfile::tempdir;
    use wakeshield::engine::random::RandomSource;

    fn small_args() -> TraceArgs {
        TraceArgs {
            primary_dim: Some(0.5),
            z_offset: Some(-1.2),
            wafer_radius: Some(0.3),
            batch_size: Some(300),
            seed: Some(11),
            ..TraceArgs::default()
        }
    }

    #[test]
    fn multi_batch_run_appends_one_record_per_batch() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("records.csv");
        let args = TraceArgs {
            batches: Some(3),
            output: Some(output.clone()),
            ..small_args()
        };
        run(args, true).unwrap();

        let mut reader = csv::Reader::from_path(&output).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 14 + 50 * 50);
        assert_eq!(reader.records().count(), 3);
    }

    #[test]
    fn wafer_outside_wake_is_skipped_without_force() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("records.csv");
        let args = TraceArgs {
            wafer_radius: Some(1.0),
            output: Some(output.clone()),
            ..small_args()
        };
        run(args, true).unwrap();
        assert!(!output.exists());
    }

    #[test]
    fn force_traces_a_wafer_outside_the_wake() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("records.csv");
        let args = TraceArgs {
            wafer_radius: Some(1.0),
            output: Some(output.clone()),
            force: true,
            ..small_args()
        };
        run(args, true).unwrap();
        assert_eq!(csv::Reader::from_path(&output).unwrap().records().count(), 1);
    }

    #[test]
    fn unknown_profile_is_a_config_error_naming_the_valid_set() {
        let args = TraceArgs {
            profile: Some("sphere".to_string()),
            ..small_args()
        };
        let Err(CliError::Config(message)) = run(args, true) else {
            panic!("expected a configuration error");
        };
        assert!(message.contains("sphere"));
        assert!(message.contains("cupola"));
    }

    #[test]
    fn seeded_batches_advance_the_seed() {
        let mut first = batch_rng(Some(5), 0);
        let mut again = batch_rng(Some(5), 0);
        let mut second = batch_rng(Some(5), 1);
        let a = first.uniform(0.0, 1.0, 4);
        assert_eq!(a, again.uniform(0.0, 1.0, 4));
        assert_ne!(a, second.uniform(0.0, 1.0, 4));
    }

    #[test]
    fn statistics_summary_names_every_aggregate() {
        let stats = BatchStatistics {
            mean_deflection_deg: 91.25,
            hit_ratio: 0.0125,
            wake_intrusion_ratio: 0.5,
            wafer_flux_per_m2_per_s: 2.5e16,
            hit_grid: DMatrix::zeros(2, 2),
            batch_size: 800,
            shield_hits: 600,
            wafer_hits: 10,
            wake_hits: 400,
        };
        let text = format_statistics(1, 4, &stats);
        assert!(text.starts_with("Batch 2/4: 800 particles, 600 shield hits, 10 wafer hits"));
        assert!(text.contains("91.250 deg"));
        assert!(text.contains("0.012500"));
        assert!(text.contains("2.5000e16"));
    }
}
