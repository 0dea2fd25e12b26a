use std::path::PathBuf;
use wakeshield::core::atmosphere::AtmosphereModel;
use wakeshield::engine::config::{SceneConfig, TracerConfig};

pub struct AppConfig {
    pub scene: SceneConfig,
    pub tracer: TracerConfig,
    pub atmosphere: AtmosphereModel,
    pub batch_size: usize,
    pub batches: usize,
    /// Seed of the first batch; `None` draws every batch from OS entropy.
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub force: bool,
}
