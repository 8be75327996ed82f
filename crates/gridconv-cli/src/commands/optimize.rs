use crate::cli::OptimizeArgs;
use crate::config::builder::build_config;
use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use crate::report;
use crate::utils::progress::CliProgressHandler;
use gridconv::{
    core::io::{traits::StructureFile, xyz::XyzFile},
    core::models::structure::Structure,
    engine::cp2k::Cp2kEngine,
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::{info, warn};

fn load_structure(config: &AppConfig) -> Result<Option<Structure>> {
    let structure = match &config.structure_path {
        Some(path) => {
            info!("Loading structure from {:?}", path);
            let structure = XyzFile::read_from_path(path).map_err(|e| CliError::Structure {
                path: path.clone(),
                source: e,
            })?;
            Some(structure)
        }
        None => None,
    };
    Ok(match (structure, config.cell) {
        (Some(structure), Some(cell)) => Some(structure.with_cell(cell)),
        (structure, _) => structure,
    })
}

pub fn run(args: OptimizeArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;
    let structure = load_structure(&config)?;
    if structure.is_none() && config.cell.is_some() {
        warn!("`engine.cell` is ignored without a structure; the template's cell is used.");
    }

    let mut engine = Cp2kEngine::new(config.engine.clone())?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting grid optimization ({} stage(s), tolerance {})...",
        config.sweep.stages.len(),
        config.sweep.tolerance
    );
    info!("Invoking the staged optimization workflow...");

    let result = workflows::optimize::run(
        &config.sweep,
        structure.as_ref(),
        &mut engine,
        config.settings,
        &reporter,
    )?;

    println!("\n{}", report::render_summary(&result));
    let tables = report::write_tables(&config.output_dir, &result)?;
    for path in &tables {
        println!("Convergence table written to: {}", path.display());
    }

    if !result.all_converged() {
        warn!("At least one stage exhausted its candidates without converging.");
    }
    Ok(())
}
