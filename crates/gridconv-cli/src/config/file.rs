use crate::error::{CliError, Result};
use gridconv::core::models::parameter::{GridParameter, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub engine: Option<FileEngineConfig>,
    pub convergence: Option<FileConvergenceConfig>,
    pub sweep: Option<FileSweepConfig>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEngineConfig {
    pub command: Option<String>,
    pub template: Option<PathBuf>,
    pub project_name: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub structure: Option<PathBuf>,
    /// Either three edge lengths of an orthorhombic cell or nine lattice vector components.
    pub cell: Option<Vec<f64>>,
    pub max_scf: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConvergenceConfig {
    pub tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSweepConfig {
    pub cutoff: Option<FileSweepRange>,
    pub rel_cutoff: Option<FileSweepRange>,
    pub ngrids: Option<FileSweepRange>,
}

impl FileSweepConfig {
    pub fn range(&self, parameter: GridParameter) -> Option<&FileSweepRange> {
        match parameter {
            GridParameter::Cutoff => self.cutoff.as_ref(),
            GridParameter::RelCutoff => self.rel_cutoff.as_ref(),
            GridParameter::Ngrids => self.ngrids.as_ref(),
        }
    }

    pub fn range_mut(&mut self, parameter: GridParameter) -> &mut FileSweepRange {
        match parameter {
            GridParameter::Cutoff => self.cutoff.get_or_insert_with(Default::default),
            GridParameter::RelCutoff => self.rel_cutoff.get_or_insert_with(Default::default),
            GridParameter::Ngrids => self.ngrids.get_or_insert_with(Default::default),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileSweepRange {
    pub start: Option<f64>,
    pub stop: Option<FileStop>,
    pub samples: Option<usize>,
    pub kind: Option<ValueKind>,
    /// Skip this stage entirely. Its baseline value is still applied.
    pub enabled: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum FileStop {
    Value(f64),
    Mode(StopMode),
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    Auto,
}

impl FileStop {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("auto") {
            return Some(Self::Mode(StopMode::Auto));
        }
        value.parse().ok().map(Self::Value)
    }
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
