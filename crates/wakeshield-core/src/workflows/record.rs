use super::trace::BatchStatistics;
use crate::core::models::scene::Scene;
use crate::engine::accumulator::row_major_counts;
use serde::Serialize;

/// Scalar columns, ahead of the grid cells.
pub const SCALAR_COLUMNS: [&str; 14] = [
    "profile",
    "primary_dim",
    "shape_param",
    "thickness",
    "coating_type",
    "z_offset",
    "xy_offset_x",
    "xy_offset_y",
    "mass",
    "mean_deflection_deg",
    "hit_ratio",
    "wafer_flux_m2s",
    "wake_intrusion_ratio",
    "wake_type",
];

/// One traced scene flattened to a single row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRecord {
    pub profile: String,
    pub primary_dim: f64,
    pub shape_param: f64,
    pub thickness: f64,
    pub coating_type: String,
    pub z_offset: f64,
    pub xy_offset_x: f64,
    pub xy_offset_y: f64,
    pub mass: f64,
    pub mean_deflection_deg: f64,
    pub hit_ratio: f64,
    pub wafer_flux_m2s: f64,
    pub wake_intrusion_ratio: f64,
    pub wake_type: String,
    /// Hit counts in row-major order.
    pub grid: Vec<u32>,
}

impl ScenarioRecord {
    /// Builds the record for `scene` and the statistics of a batch traced through it, using
    /// `density` (kg/m^3) for the shield mass.
    pub fn from_scene(scene: &Scene, stats: &BatchStatistics, density: f64) -> Self {
        let shield = scene.shield();
        let wafer = scene.wafer();
        Self {
            profile: shield.kind().as_str().to_string(),
            primary_dim: shield.primary_dim(),
            shape_param: shield.shape_param(),
            thickness: shield.thickness(),
            coating_type: shield.coating().as_str().to_string(),
            z_offset: wafer.z_offset(),
            xy_offset_x: wafer.xy_offset().x,
            xy_offset_y: wafer.xy_offset().y,
            mass: shield.mass(density),
            mean_deflection_deg: stats.mean_deflection_deg,
            hit_ratio: stats.hit_ratio,
            wafer_flux_m2s: stats.wafer_flux_per_m2_per_s,
            wake_intrusion_ratio: stats.wake_intrusion_ratio,
            wake_type: scene.wake().kind_name().to_string(),
            grid: row_major_counts(&stats.hit_grid),
        }
    }

    /// Column names for a `rows x cols` grid: the scalar columns, then `g0000`, `g0001`, ...
    pub fn header(rows: usize, cols: usize) -> Vec<String> {
        SCALAR_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain((0..rows * cols).map(|i| format!("g{:04}", i)))
            .collect()
    }

    /// Field values in [`ScenarioRecord::header`] order.
    pub fn fields(&self) -> Vec<String> {
        let mut out = vec![
            self.profile.clone(),
            self.primary_dim.to_string(),
            self.shape_param.to_string(),
            self.thickness.to_string(),
            self.coating_type.clone(),
            self.z_offset.to_string(),
            self.xy_offset_x.to_string(),
            self.xy_offset_y.to_string(),
            self.mass.to_string(),
            self.mean_deflection_deg.to_string(),
            self.hit_ratio.to_string(),
            self.wafer_flux_m2s.to_string(),
            self.wake_intrusion_ratio.to_string(),
            self.wake_type.clone(),
        ];
        out.extend(self.grid.iter().map(|c| c.to_string()));
        out
    }
}
