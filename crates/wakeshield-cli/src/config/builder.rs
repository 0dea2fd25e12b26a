use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileWakeConfig};
use super::models::AppConfig;
use crate::cli::TraceArgs;
use crate::error::{CliError, Result};
use std::str::FromStr;
use tracing::debug;
use wakeshield::core::atmosphere::AtmosphereModel;
use wakeshield::core::models::wake::WakeKind;
use wakeshield::engine::config::{
    BinningPolicy, DeflectionAveraging, SceneConfigBuilder, SourceConfig, TracerConfigBuilder,
    WakeSelection,
};

pub fn build_config(args: &TraceArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let shield_file = file_config.shield.take().unwrap_or_default();
    let wafer_file = file_config.wafer.take().unwrap_or_default();
    let source_file = file_config.source.take().unwrap_or_default();
    let tracer_file = file_config.tracer.take().unwrap_or_default();
    let atmosphere_file = file_config.atmosphere.take().unwrap_or_default();

    let mut scene = SceneConfigBuilder::new()
        .profile(
            args.profile
                .clone()
                .or(shield_file.profile)
                .unwrap_or(defaults.profile),
        )
        .primary_dim(
            args.primary_dim
                .or(shield_file.primary_dim)
                .unwrap_or(defaults.primary_dim),
        )
        .thickness(
            args.thickness
                .or(shield_file.thickness)
                .unwrap_or(defaults.thickness),
        )
        .coating(
            args.coating
                .clone()
                .or(shield_file.coating)
                .unwrap_or(defaults.coating),
        )
        .include_base(args.include_base || shield_file.include_base.unwrap_or(false))
        .include_top(args.include_top || shield_file.include_top.unwrap_or(false))
        .wafer_radius(
            args.wafer_radius
                .or(wafer_file.radius)
                .unwrap_or(defaults.wafer_radius),
        )
        .z_offset(
            args.z_offset
                .or(wafer_file.z_offset)
                .unwrap_or(defaults.z_offset),
        )
        .wake(merge_wake(file_config.wake.take())?);

    if let Some(shape_param) = args.shape_param.or(shield_file.shape_param) {
        scene = scene.shape_param(shape_param);
    }
    if let Some([x, y]) = wafer_file.xy_offset {
        scene = scene.xy_offset(x, y);
    }
    let (rows, cols) = wafer_file
        .grid_shape
        .map(|[r, c]| (r, c))
        .unwrap_or(defaults.grid_shape);
    let scene = scene
        .grid_shape(rows, cols)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let source = SourceConfig {
        source_height: source_file.height.unwrap_or(defaults.source_height),
        radius_factor: source_file.radius_factor.unwrap_or(defaults.radius_factor),
        attitude_jitter_deg: source_file
            .attitude_jitter_deg
            .unwrap_or(defaults.attitude_jitter_deg),
    };

    let deflection_averaging = match tracer_file.deflection_averaging.as_deref() {
        Some(value) => parse_core::<DeflectionAveraging>(value)?,
        None => DeflectionAveraging::default(),
    };
    let binning = match tracer_file.binning.as_deref() {
        Some(value) => parse_core::<BinningPolicy>(value)?,
        None => BinningPolicy::default(),
    };

    let tracer = TracerConfigBuilder::new()
        .source(source)
        .deflection_averaging(deflection_averaging)
        .binning(binning)
        .material_density(
            tracer_file
                .material_density
                .unwrap_or(defaults.material_density),
        )
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let atmosphere = match atmosphere_file.path {
        Some(path) => {
            debug!("Loading atmosphere model from {:?}", path);
            AtmosphereModel::load(&path).map_err(|e| CliError::Core(e.into()))?
        }
        None => AtmosphereModel::default(),
    };

    let batch_size = args
        .batch_size
        .or(tracer_file.batch_size)
        .unwrap_or(defaults.batch_size);
    let batches = args
        .batches
        .or(tracer_file.batches)
        .unwrap_or(defaults.batches);
    if batches == 0 {
        return Err(CliError::Config(
            "At least one batch must be traced; got `batches = 0`.".to_string(),
        ));
    }

    Ok(AppConfig {
        scene,
        tracer,
        atmosphere,
        batch_size,
        batches,
        seed: args.seed.or(tracer_file.seed),
        output: args.output.clone(),
        force: args.force,
    })
}

fn merge_wake(file_val: Option<FileWakeConfig>) -> Result<WakeSelection> {
    let file_val = file_val.unwrap_or_default();
    let kind = match file_val.kind.as_deref() {
        None => return Ok(WakeSelection::Auto),
        Some(kind) if kind.trim().eq_ignore_ascii_case("auto") => {
            return Ok(WakeSelection::Auto);
        }
        Some(kind) => parse_core::<WakeKind>(kind)?,
    };
    let length = file_val
        .length
        .ok_or_else(|| CliError::Config("An explicit `wake` requires `length`".to_string()))?;
    match kind {
        WakeKind::Cone => Ok(WakeSelection::Cone {
            half_angle_deg: file_val.half_angle_deg.ok_or_else(|| {
                CliError::Config("A `cone` wake requires `half-angle-deg`".to_string())
            })?,
            length,
        }),
        WakeKind::Pyramid => Ok(WakeSelection::Pyramid {
            half_base: file_val.half_base.ok_or_else(|| {
                CliError::Config("A `pyramid` wake requires `half-base`".to_string())
            })?,
            length,
        }),
    }
}

fn parse_core<T>(value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| CliError::Config(e.to_string()))
}

fn parse_value<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", expected, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        let key = key.trim();
        let value = value_str.trim();

        match key {
            "shield.profile" => {
                config.shield.get_or_insert_with(Default::default).profile = Some(value.into());
            }
            "shield.primary-dim" => {
                config.shield.get_or_insert_with(Default::default).primary_dim =
                    Some(parse_value(key, value, "float")?);
            }
            "shield.shape-param" => {
                config.shield.get_or_insert_with(Default::default).shape_param =
                    Some(parse_value(key, value, "float")?);
            }
            "shield.thickness" => {
                config.shield.get_or_insert_with(Default::default).thickness =
                    Some(parse_value(key, value, "float")?);
            }
            "shield.coating" => {
                config.shield.get_or_insert_with(Default::default).coating = Some(value.into());
            }
            "shield.include-base" => {
                config.shield.get_or_insert_with(Default::default).include_base =
                    Some(parse_value(key, value, "boolean")?);
            }
            "shield.include-top" => {
                config.shield.get_or_insert_with(Default::default).include_top =
                    Some(parse_value(key, value, "boolean")?);
            }
            "wafer.radius" => {
                config.wafer.get_or_insert_with(Default::default).radius =
                    Some(parse_value(key, value, "float")?);
            }
            "wafer.z-offset" => {
                config.wafer.get_or_insert_with(Default::default).z_offset =
                    Some(parse_value(key, value, "float")?);
            }
            "wake.kind" => {
                config.wake.get_or_insert_with(Default::default).kind = Some(value.into());
            }
            "wake.half-angle-deg" => {
                config.wake.get_or_insert_with(Default::default).half_angle_deg =
                    Some(parse_value(key, value, "float")?);
            }
            "wake.half-base" => {
                config.wake.get_or_insert_with(Default::default).half_base =
                    Some(parse_value(key, value, "float")?);
            }
            "wake.length" => {
                config.wake.get_or_insert_with(Default::default).length =
                    Some(parse_value(key, value, "float")?);
            }
            "source.height" => {
                config.source.get_or_insert_with(Default::default).height =
                    Some(parse_value(key, value, "float")?);
            }
            "source.radius-factor" => {
                config.source.get_or_insert_with(Default::default).radius_factor =
                    Some(parse_value(key, value, "float")?);
            }
            "source.attitude-jitter-deg" => {
                config
                    .source
                    .get_or_insert_with(Default::default)
                    .attitude_jitter_deg = Some(parse_value(key, value, "float")?);
            }
            "tracer.batch-size" => {
                config.tracer.get_or_insert_with(Default::default).batch_size =
                    Some(parse_value(key, value, "integer")?);
            }
            "tracer.batches" => {
                config.tracer.get_or_insert_with(Default::default).batches =
                    Some(parse_value(key, value, "integer")?);
            }
            "tracer.seed" => {
                config.tracer.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value, "integer")?);
            }
            "tracer.deflection-averaging" => {
                config
                    .tracer
                    .get_or_insert_with(Default::default)
                    .deflection_averaging = Some(value.into());
            }
            "tracer.binning" => {
                config.tracer.get_or_insert_with(Default::default).binning = Some(value.into());
            }
            "tracer.material-density" => {
                config
                    .tracer
                    .get_or_insert_with(Default::default)
                    .material_density = Some(parse_value(key, value, "float")?);
            }
            "atmosphere.path" => {
                config.atmosphere.get_or_insert_with(Default::default).path = Some(value.into());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
