use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileShieldConfig {
    pub profile: Option<String>,
    pub primary_dim: Option<f64>,
    pub shape_param: Option<f64>,
    pub thickness: Option<f64>,
    pub coating: Option<String>,
    pub include_base: Option<bool>,
    pub include_top: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileWaferConfig {
    pub radius: Option<f64>,
    pub z_offset: Option<f64>,
    pub xy_offset: Option<[f64; 2]>,
    pub grid_shape: Option<[usize; 2]>,
}

/// `kind` is `auto`, `cone` or `pyramid`. Explicit wakes need their dimensions.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileWakeConfig {
    pub kind: Option<String>,
    pub half_angle_deg: Option<f64>,
    pub half_base: Option<f64>,
    pub length: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSourceConfig {
    pub height: Option<f64>,
    pub radius_factor: Option<f64>,
    pub attitude_jitter_deg: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTracerConfig {
    pub batch_size: Option<usize>,
    pub batches: Option<usize>,
    pub seed: Option<u64>,
    pub deflection_averaging: Option<String>,
    pub binning: Option<String>,
    pub material_density: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAtmosphereConfig {
    /// Atmosphere TOML file, relative to the scene file when not absolute.
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub shield: Option<FileShieldConfig>,
    pub wafer: Option<FileWaferConfig>,
    pub wake: Option<FileWakeConfig>,
    pub source: Option<FileSourceConfig>,
    pub tracer: Option<FileTracerConfig>,
    pub atmosphere: Option<FileAtmosphereConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: FileConfig =
            toml::from_str(&content).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;

        if let Some(atmosphere_path) = config.atmosphere.as_mut().and_then(|a| a.path.as_mut()) {
            if atmosphere_path.is_relative() {
                if let Some(parent) = path.parent() {
                    *atmosphere_path = parent.join(&*atmosphere_path);
                }
            }
        }
        Ok(config)
    }
}
