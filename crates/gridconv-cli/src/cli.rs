use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use gridconv::core::utils::box_size::Species;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "gridconv - converge the real-space integration grid (CUTOFF, REL_CUTOFF, NGRIDS) of CP2K calculations.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep CUTOFF, REL_CUTOFF and NGRIDS in turn until forces converge.
    Optimize(OptimizeArgs),
    /// Compute the simulation box that holds a set of species at a given density.
    #[command(name = "box")]
    BoxSize(BoxArgs),
}

/// Arguments for the `optimize` subcommand.
#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    // --- Core Arguments ---
    /// Path to the configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// CP2K input file used as the template for every run.
    #[arg(short, long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Structure (XYZ) whose cell and coordinates are written into the template.
    /// Without it the template must define both.
    #[arg(short, long, value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// Directory for the per-stage convergence tables.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    // --- Engine Overrides ---
    /// Command that launches CP2K, e.g. 'mpirun -np 4 cp2k.psmp'.
    #[arg(long = "engine-command", value_name = "COMMAND")]
    pub engine_command: Option<String>,

    /// Directory the engine runs in.
    #[arg(short = 'w', long, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,

    /// Project name used for the engine's input and output files.
    #[arg(short, long, value_name = "NAME")]
    pub project_name: Option<String>,

    /// Cap the number of SCF iterations per run.
    #[arg(long, value_name = "INT")]
    pub max_scf: Option<u32>,

    // --- Convergence Overrides ---
    /// Override the mean-force tolerance.
    #[arg(long, value_name = "FLOAT")]
    pub tolerance: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sweep.cutoff.stop=1200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `box` subcommand.
#[derive(Args, Debug, Clone)]
pub struct BoxArgs {
    /// Species as SYMBOL:MOLAR_MASS:COUNT, e.g. 'H2O:18.015:64'. Repeat for mixtures.
    #[arg(short, long = "species", required = true, value_name = "SPEC", value_parser = parser::parse_species)]
    pub species: Vec<Species>,

    /// Target density, in units consistent with the molar masses.
    #[arg(short, long, value_name = "FLOAT")]
    pub density: f64,
}
