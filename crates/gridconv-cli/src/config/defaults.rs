use gridconv::core::models::parameter::{GridParameter, ValueKind};

/// Sweep range used for a stage the config file does not describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefaultRange {
    pub start: f64,
    pub stop: f64,
    pub samples: usize,
    pub kind: ValueKind,
}

pub struct DefaultsConfig {
    pub tolerance: f64,
    pub command: String,
    pub project_name: String,
    pub working_directory: String,
    pub output_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.002,
            command: "cp2k.popt".to_string(),
            project_name: "optimization".to_string(),
            working_directory: "./".to_string(),
            output_dir: "./".to_string(),
        }
    }
}

impl DefaultsConfig {
    pub fn range(&self, parameter: GridParameter) -> DefaultRange {
        let (start, stop, samples) = match parameter {
            GridParameter::Cutoff => (100.0, 1500.0, 10),
            GridParameter::RelCutoff => (60.0, 120.0, 10),
            GridParameter::Ngrids => (5.0, 8.0, 4),
        };
        DefaultRange {
            start,
            stop,
            samples,
            kind: ValueKind::Integer,
        }
    }
}
