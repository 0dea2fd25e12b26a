use wakeshield::core::models::shield::DEFAULT_DENSITY_KG_M3;
use wakeshield::core::models::wafer::DEFAULT_GRID_SHAPE;
use wakeshield::engine::config::{
    DEFAULT_ATTITUDE_JITTER_DEG, DEFAULT_SOURCE_HEIGHT, DEFAULT_SOURCE_RADIUS_FACTOR,
};

/// Values used for anything neither the config file nor the command line sets.
pub struct DefaultsConfig {
    pub profile: String,
    pub primary_dim: f64,
    pub thickness: f64,
    pub coating: String,
    pub wafer_radius: f64,
    pub z_offset: f64,
    pub grid_shape: (usize, usize),
    pub source_height: f64,
    pub radius_factor: f64,
    pub attitude_jitter_deg: f64,
    pub batch_size: usize,
    pub batches: usize,
    pub material_density: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            profile: "flat".to_string(),
            primary_dim: 2.0,
            thickness: 0.002,
            coating: "specular".to_string(),
            wafer_radius: 0.30,
            z_offset: -1.2,
            grid_shape: DEFAULT_GRID_SHAPE,
            source_height: DEFAULT_SOURCE_HEIGHT,
            radius_factor: DEFAULT_SOURCE_RADIUS_FACTOR,
            attitude_jitter_deg: DEFAULT_ATTITUDE_JITTER_DEG,
            batch_size: 10_000,
            batches: 1,
            material_density: DEFAULT_DENSITY_KG_M3,
        }
    }
}
