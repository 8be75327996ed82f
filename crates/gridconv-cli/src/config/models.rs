use gridconv::core::models::structure::Cell;
use gridconv::engine::config::SweepConfig;
use gridconv::engine::cp2k::Cp2kEngineConfig;
use gridconv::engine::simulation::EngineSettings;
use std::path::PathBuf;

pub struct AppConfig {
    pub sweep: SweepConfig,
    pub engine: Cp2kEngineConfig,
    pub settings: EngineSettings,
    pub structure_path: Option<PathBuf>,
    /// Cell from the config file; replaces any cell read from the structure.
    pub cell: Option<Cell>,
    pub output_dir: PathBuf,
}
