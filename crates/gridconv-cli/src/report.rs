use crate::error::{CliError, Result};
use gridconv::core::models::parameter::GridParameter;
use gridconv::engine::state::StageResult;
use gridconv::workflows::optimize::OptimizationResult;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct ConvergenceRow {
    candidate: f64,
    energy: f64,
    mean_force: f64,
}

pub fn table_path(output_dir: &Path, parameter: GridParameter) -> PathBuf {
    output_dir.join(format!("convergence_{}.csv", parameter.name().replace('-', "_")))
}

/// Writes `candidate,energy,mean_force` rows for one stage.
pub fn write_stage_table(output_dir: &Path, stage: &StageResult) -> Result<PathBuf> {
    let path = table_path(output_dir, stage.parameter);
    let report_error = |source: csv::Error| CliError::Report {
        path: path.clone(),
        source,
    };

    let mut writer = csv::Writer::from_path(&path).map_err(report_error)?;
    for point in stage.history.points() {
        writer
            .serialize(ConvergenceRow {
                candidate: point.candidate.as_f64(),
                energy: point.sample.energy,
                mean_force: point.sample.mean_force,
            })
            .map_err(report_error)?;
    }
    writer.flush()?;
    info!(path = ?path, rows = stage.history.len(), "Wrote convergence table.");
    Ok(path)
}

pub fn write_tables(output_dir: &Path, result: &OptimizationResult) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    result
        .stages
        .iter()
        .map(|stage| write_stage_table(output_dir, stage))
        .collect()
}

fn unit_suffix(parameter: GridParameter) -> String {
    parameter
        .unit()
        .map(|unit| format!(" {}", unit))
        .unwrap_or_default()
}

/// Human-readable summary of every stage and the final parameter set.
pub struct Summary<'a>(pub &'a OptimizationResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in &self.0.stages {
            write_stage(f, stage)?;
            writeln!(f)?;
        }
        writeln!(f, "Final grid parameters:")?;
        for (parameter, value) in &self.0.final_parameters {
            writeln!(
                f,
                "  {:<10} {}{}",
                parameter.keyword(),
                value,
                unit_suffix(*parameter)
            )?;
        }
        Ok(())
    }
}

fn write_stage(f: &mut fmt::Formatter<'_>, stage: &StageResult) -> fmt::Result {
    writeln!(f, "{} ({} runs)", stage.parameter.keyword(), stage.history.len())?;
    writeln!(f, "  {:>10}  {:>18}  {:>14}", "candidate", "energy", "mean force")?;
    for point in stage.history.points() {
        writeln!(
            f,
            "  {:>10}  {:>18.10}  {:>14.8}",
            point.candidate.to_string(),
            point.sample.energy,
            point.sample.mean_force
        )?;
    }
    writeln!(
        f,
        "  accepted: {}{}",
        stage.accepted_value,
        unit_suffix(stage.parameter)
    )?;
    if !stage.converged {
        writeln!(
            f,
            "  warning: no convergence within the sweep range; the largest value was kept"
        )?;
    }
    Ok(())
}

pub fn render_summary(result: &OptimizationResult) -> String {
    Summary(result).to_string()
}
