use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "SpaceForge Wake Shield Team",
    version,
    about = "WakeShield CLI - Monte Carlo estimation of the residual gas flux reaching a wafer in the wake of an orbital shield.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel tracing.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace one or more particle batches through a shield/wafer scene.
    Trace(TraceArgs),
}

/// Arguments for the `trace` subcommand.
#[derive(Args, Debug, Default)]
pub struct TraceArgs {
    /// Path to a scene configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Shield Overrides ---
    /// Shield profile: flat, cap, pyramid or cupola.
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Rim radius (flat, cap), half-base (pyramid) or edge length (cupola), in meters.
    #[arg(long, value_name = "FLOAT")]
    pub primary_dim: Option<f64>,

    /// Curvature in 1/m for caps, height over half-base for pyramids.
    #[arg(long, value_name = "FLOAT")]
    pub shape_param: Option<f64>,

    /// Shield wall thickness, in meters.
    #[arg(long, value_name = "FLOAT")]
    pub thickness: Option<f64>,

    /// Surface coating: specular or diffuse.
    #[arg(long, value_name = "NAME")]
    pub coating: Option<String>,

    /// Close the cupola with its decagon base face.
    #[arg(long)]
    pub include_base: bool,

    /// Close the cupola with its pentagon roof face.
    #[arg(long)]
    pub include_top: bool,

    // --- Wafer Overrides ---
    /// Wafer radius, in meters.
    #[arg(long, value_name = "FLOAT")]
    pub wafer_radius: Option<f64>,

    /// Height of the wafer plane; negative values lie downstream of the shield.
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true)]
    pub z_offset: Option<f64>,

    // --- Run Control ---
    /// Number of particles per batch.
    #[arg(short = 'n', long, value_name = "INT")]
    pub batch_size: Option<usize>,

    /// Seed for the first batch; each further batch uses the next seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Number of batches to trace.
    #[arg(short, long, value_name = "INT")]
    pub batches: Option<usize>,

    /// Append one scenario record per batch to this CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Trace the scene even when the wafer is not fully inside the wake.
    #[arg(long)]
    pub force: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S wafer.z-offset=-1.4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
