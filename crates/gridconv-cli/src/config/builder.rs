use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileEngineConfig, FileStop, FileSweepConfig, StopMode};
use super::models::AppConfig;
use crate::cli::OptimizeArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use gridconv::core::models::parameter::{GridParameter, ParameterValue, ValueKind};
use gridconv::core::models::structure::Cell;
use gridconv::engine::config::{SweepConfigBuilder, SweepRange, SweepStop};
use gridconv::engine::cp2k::Cp2kEngineConfig;
use gridconv::engine::simulation::EngineSettings;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

pub fn build_config(args: &OptimizeArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let engine_file = file_config.engine.take().unwrap_or_default();
    let sweep_file = file_config.sweep.take().unwrap_or_default();
    let convergence_file = file_config.convergence.take().unwrap_or_default();

    let tolerance = args
        .tolerance
        .or(convergence_file.tolerance)
        .unwrap_or(defaults.tolerance);

    let mut builder = SweepConfigBuilder::new().tolerance(tolerance);
    for parameter in GridParameter::ALL {
        let (range, enabled) = merge_range(parameter, &sweep_file, &defaults);
        if enabled {
            builder = builder.stage(parameter, range);
        } else {
            debug!(%parameter, "Stage disabled; holding it at its start value.");
            let start = ParameterValue::from_f64(range.start, range.kind);
            builder = builder.baseline(parameter, start);
        }
    }
    let sweep = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let engine = merge_engine(args, &engine_file, &defaults)?;
    let cell = engine_file.cell.as_deref().map(parse_cell).transpose()?;
    // The force table is always requested; the extractor cannot work without it.
    let settings = EngineSettings {
        max_scf: args.max_scf.or(engine_file.max_scf),
        ..EngineSettings::default()
    };

    Ok(AppConfig {
        sweep,
        engine,
        settings,
        structure_path: args.structure.clone().or(engine_file.structure),
        cell,
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&defaults.output_dir)),
    })
}

fn merge_range(
    parameter: GridParameter,
    sweep_file: &FileSweepConfig,
    defaults: &DefaultsConfig,
) -> (SweepRange, bool) {
    let default = defaults.range(parameter);
    let file = sweep_file.range(parameter).cloned().unwrap_or_default();

    let stop = match file.stop {
        Some(FileStop::Mode(StopMode::Auto)) => SweepStop::Auto,
        Some(FileStop::Value(value)) => SweepStop::Value(value),
        None => SweepStop::Value(default.stop),
    };
    let range = SweepRange {
        start: file.start.unwrap_or(default.start),
        stop,
        sample_count: file.samples.unwrap_or(default.samples),
        kind: file.kind.unwrap_or(default.kind),
    };
    (range, file.enabled.unwrap_or(true))
}

fn merge_engine(
    args: &OptimizeArgs,
    file: &FileEngineConfig,
    defaults: &DefaultsConfig,
) -> Result<Cp2kEngineConfig> {
    let template_path = args
        .template
        .clone()
        .or_else(|| file.template.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No engine template given. Use --template or set `engine.template`.".to_string(),
            )
        })?;
    Ok(Cp2kEngineConfig {
        command: args
            .engine_command
            .clone()
            .or_else(|| file.command.clone())
            .unwrap_or_else(|| defaults.command.clone()),
        template_path,
        working_directory: args
            .working_directory
            .clone()
            .or_else(|| file.working_directory.clone())
            .unwrap_or_else(|| PathBuf::from(&defaults.working_directory)),
        project_name: args
            .project_name
            .clone()
            .or_else(|| file.project_name.clone())
            .unwrap_or_else(|| defaults.project_name.clone()),
    })
}

fn parse_cell(values: &[f64]) -> Result<Cell> {
    match *values {
        [a, b, c] => Ok(Cell::from_flat([a, 0.0, 0.0, 0.0, b, 0.0, 0.0, 0.0, c])),
        _ => {
            let flat: [f64; 9] = values.try_into().map_err(|_| {
                CliError::Config(format!(
                    "`engine.cell` needs 3 edge lengths or 9 vector components, got {} values",
                    values.len()
                ))
            })?;
            Ok(Cell::from_flat(flat))
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key.split('.').collect::<Vec<_>>().as_slice() {
            ["convergence", "tolerance"] => {
                config
                    .convergence
                    .get_or_insert_with(Default::default)
                    .tolerance = Some(parse_value(key, value_str, "float")?);
            }
            ["engine", field] => {
                let engine = config.engine.get_or_insert_with(Default::default);
                match *field {
                    "command" => engine.command = Some(value_str.to_string()),
                    "template" => engine.template = Some(PathBuf::from(value_str)),
                    "project-name" => engine.project_name = Some(value_str.to_string()),
                    "working-directory" => {
                        engine.working_directory = Some(PathBuf::from(value_str))
                    }
                    "structure" => engine.structure = Some(PathBuf::from(value_str)),
                    "max-scf" => engine.max_scf = Some(parse_value(key, value_str, "integer")?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            ["sweep", name, field] => {
                let parameter = GridParameter::from_name(name).ok_or_else(|| unsupported_key(key))?;
                let range = config
                    .sweep
                    .get_or_insert_with(Default::default)
                    .range_mut(parameter);
                match *field {
                    "start" => range.start = Some(parse_value(key, value_str, "float")?),
                    "stop" => {
                        range.stop = Some(FileStop::parse(value_str).ok_or_else(|| {
                            CliError::Config(format!(
                                "Invalid stop value for {}: {} (expected a number or 'auto')",
                                key, value_str
                            ))
                        })?)
                    }
                    "samples" => range.samples = Some(parse_value(key, value_str, "integer")?),
                    "kind" => {
                        range.kind = Some(match value_str {
                            "integer" => ValueKind::Integer,
                            "float" => ValueKind::Float,
                            _ => {
                                return Err(CliError::Config(format!(
                                    "Invalid kind for {}: {} (expected 'integer' or 'float')",
                                    key, value_str
                                )));
                            }
                        })
                    }
                    "enabled" => range.enabled = Some(parse_value(key, value_str, "boolean")?),
                    _ => return Err(unsupported_key(key)),
                }
            }
            _ => return Err(unsupported_key(key)),
        }
    }
    Ok(config)
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unsupported configuration key for --set: '{}'",
        key
    ))
}
