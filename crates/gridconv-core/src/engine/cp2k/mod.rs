//! Subprocess engine for CP2K-style codes.
//!
//! Each run renders the template with the request's `&MGRID` values, writes
//! `<project>.inp` into the working directory, runs `<command> -i <project>.inp -o <project>.out`
//! and reads the output back as an [`Artifact`].

pub mod input;

use self::input::Cp2kInput;
use super::config::ConfigError;
use super::error::EngineError;
use super::simulation::{SimulationEngine, SimulationRequest, SimulationResult};
use crate::core::io::artifact::Artifact;
use crate::core::models::parameter::ParameterValue;
use crate::core::models::structure::Structure;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info, instrument};

const GLOBAL: [&str; 1] = ["GLOBAL"];
const MGRID: [&str; 3] = ["FORCE_EVAL", "DFT", "MGRID"];
const SCF: [&str; 3] = ["FORCE_EVAL", "DFT", "SCF"];
const PRINT_FORCES: [&str; 3] = ["FORCE_EVAL", "PRINT", "FORCES"];
const CELL: [&str; 3] = ["FORCE_EVAL", "SUBSYS", "CELL"];
const COORD: [&str; 3] = ["FORCE_EVAL", "SUBSYS", "COORD"];

#[derive(Debug, Clone, PartialEq)]
pub struct Cp2kEngineConfig {
    /// Executable plus any leading arguments, e.g. `mpirun -np 4 cp2k.psmp`.
    pub command: String,
    pub template_path: PathBuf,
    pub working_directory: PathBuf,
    pub project_name: String,
}

pub struct Cp2kEngine {
    program: String,
    program_args: Vec<String>,
    working_directory: PathBuf,
    project_name: String,
    template: Cp2kInput,
}

fn format_value(value: ParameterValue) -> String {
    match value {
        ParameterValue::Integer(v) => v.to_string(),
        ParameterValue::Float(v) => format!("{:.6}", v),
    }
}

impl Cp2kEngine {
    /// Loads the template and validates the command.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingResource`] if the template cannot be read or the
    /// command is empty. Nothing is written to disk on failure.
    pub fn new(config: Cp2kEngineConfig) -> Result<Self, EngineError> {
        let mut parts = config.command.split_whitespace().map(str::to_owned);
        let program = parts.next().ok_or(ConfigError::MissingResource {
            what: "engine command",
            detail: "the command string is empty".to_string(),
        })?;
        let program_args = parts.collect();

        let text = fs::read_to_string(&config.template_path).map_err(|e| {
            ConfigError::MissingResource {
                what: "engine input template",
                detail: format!("{}: {}", config.template_path.display(), e),
            }
        })?;

        Ok(Self {
            program,
            program_args,
            working_directory: config.working_directory,
            project_name: config.project_name,
            template: Cp2kInput::parse(&text),
        })
    }

    pub fn input_path(&self) -> PathBuf {
        self.working_directory
            .join(format!("{}.inp", self.project_name))
    }

    pub fn output_path(&self) -> PathBuf {
        self.working_directory
            .join(format!("{}.out", self.project_name))
    }

    pub fn template(&self) -> &Cp2kInput {
        &self.template
    }

    /// Renders the input for one request without touching the stored template.
    pub fn render_request(&self, request: &SimulationRequest<'_>) -> String {
        let mut input = self.template.clone();
        input.set_keyword(&GLOBAL, "PROJECT", &self.project_name);
        for (parameter, value) in request.assignments() {
            input.set_keyword(&MGRID, parameter.keyword(), &format_value(value));
        }
        if request.settings.print_forces {
            input.set_section_parameter(&PRINT_FORCES, "ON");
        }
        if let Some(max_scf) = request.settings.max_scf {
            input.set_keyword(&SCF, "MAX_SCF", &max_scf.to_string());
        }
        input.render()
    }

    fn simulation_error(request: &SimulationRequest<'_>, message: String) -> EngineError {
        EngineError::Simulation {
            parameter: request.varying.0,
            value: request.varying.1,
            message,
        }
    }

    /// File names are passed relative to the working directory the engine runs in.
    fn execute(&self) -> std::io::Result<std::process::Output> {
        Command::new(&self.program)
            .args(&self.program_args)
            .arg("-i")
            .arg(format!("{}.inp", self.project_name))
            .arg("-o")
            .arg(format!("{}.out", self.project_name))
            .current_dir(&self.working_directory)
            .output()
    }
}

impl SimulationEngine for Cp2kEngine {
    fn prepare(&mut self, structure: Option<&Structure>) -> Result<(), EngineError> {
        fs::create_dir_all(&self.working_directory)?;
        let Some(structure) = structure else {
            debug!("No structure given; the template is expected to define the cell.");
            return Ok(());
        };
        if let Some(cell) = structure.cell() {
            for (key, v) in [("A", cell.a), ("B", cell.b), ("C", cell.c)] {
                let value = format!("{:.8} {:.8} {:.8}", v.x, v.y, v.z);
                self.template.set_keyword(&CELL, key, &value);
            }
        }
        let coords: Vec<String> = structure
            .atoms()
            .iter()
            .map(|atom| {
                format!(
                    "{} {:.8} {:.8} {:.8}",
                    atom.element, atom.position.x, atom.position.y, atom.position.z
                )
            })
            .collect();
        self.template.replace_body(&COORD, &coords);
        info!(
            atoms = structure.atom_count(),
            has_cell = structure.cell().is_some(),
            "Bound structure into the engine template."
        );
        Ok(())
    }

    #[instrument(skip_all, name = "cp2k_run", fields(parameter = %request.varying.0, value = %request.varying.1))]
    fn run(&mut self, request: &SimulationRequest<'_>) -> Result<SimulationResult, EngineError> {
        let input_path = self.input_path();
        let output_path = self.output_path();

        fs::write(&input_path, self.render_request(request))?;
        if output_path.exists() {
            fs::remove_file(&output_path)?;
        }

        debug!(program = %self.program, input = ?input_path, "Launching engine.");
        let output = self.execute().map_err(|e| {
            Self::simulation_error(
                request,
                format!("could not launch '{}': {}", self.program, e),
            )
        })?;

        if !output.status.success() {
            return Err(Self::simulation_error(
                request,
                format!(
                    "engine exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let artifact = Artifact::from_path(&output_path).map_err(|e| {
            Self::simulation_error(
                request,
                format!("no output at {}: {}", output_path.display(), e),
            )
        })?;
        Ok(SimulationResult { artifact })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::parameter::GridParameter;
    use crate::core::models::structure::{Atom, Cell};
    use crate::engine::config::{SweepConfigBuilder, SweepRange};
    use crate::engine::progress::ProgressReporter;
    use crate::engine::simulation::{EngineSettings, FixedParameters};
    use nalgebra::Point3;
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::tempdir;

    const TEMPLATE: &str = "\
&GLOBAL
  PROJECT template
&END GLOBAL
&FORCE_EVAL
  &DFT
    &MGRID
      CUTOFF 100
    &END MGRID
  &END DFT
  &SUBSYS
  &END SUBSYS
&END FORCE_EVAL
";

    fn engine_in(dir: &Path, command: &str) -> Cp2kEngine {
        let template_path = dir.join("template.inp");
        fs::write(&template_path, TEMPLATE).unwrap();
        Cp2kEngine::new(Cp2kEngineConfig {
            command: command.to_string(),
            template_path,
            working_directory: dir.to_path_buf(),
            project_name: "optimization".to_string(),
        })
        .unwrap()
    }

    fn fixed() -> FixedParameters {
        FixedParameters::new(BTreeMap::from([
            (GridParameter::RelCutoff, ParameterValue::Integer(60)),
            (GridParameter::Ngrids, ParameterValue::Integer(5)),
        ]))
    }

    #[test]
    fn missing_template_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let result = Cp2kEngine::new(Cp2kEngineConfig {
            command: "cp2k.popt".to_string(),
            template_path: dir.path().join("absent.inp"),
            working_directory: dir.path().to_path_buf(),
            project_name: "optimization".to_string(),
        });
        assert!(matches!(
            result,
            Err(EngineError::Configuration(ConfigError::MissingResource { .. }))
        ));
        assert!(!dir.path().join("optimization.inp").exists());
    }

    #[test]
    fn empty_command_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let template_path = dir.path().join("template.inp");
        fs::write(&template_path, TEMPLATE).unwrap();
        let result = Cp2kEngine::new(Cp2kEngineConfig {
            command: "   ".to_string(),
            template_path,
            working_directory: dir.path().to_path_buf(),
            project_name: "optimization".to_string(),
        });
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn rendered_request_sets_all_grid_keywords() {
        let dir = tempdir().unwrap();
        let engine = engine_in(dir.path(), "cp2k.popt");
        let request = SimulationRequest::new(
            None,
            &fixed(),
            GridParameter::Cutoff,
            ParameterValue::Integer(411),
            EngineSettings {
                print_forces: true,
                max_scf: Some(1),
            },
        );
        let rendered = Cp2kInput::parse(&engine.render_request(&request));

        assert_eq!(rendered.keyword_value(&MGRID, "CUTOFF").as_deref(), Some("411"));
        assert_eq!(rendered.keyword_value(&MGRID, "REL_CUTOFF").as_deref(), Some("60"));
        assert_eq!(rendered.keyword_value(&MGRID, "NGRIDS").as_deref(), Some("5"));
        assert_eq!(rendered.keyword_value(&SCF, "MAX_SCF").as_deref(), Some("1"));
        assert_eq!(
            rendered.keyword_value(&GLOBAL, "PROJECT").as_deref(),
            Some("optimization")
        );
        assert!(rendered.has_section(&PRINT_FORCES));
        assert_eq!(
            engine.template().keyword_value(&MGRID, "CUTOFF").as_deref(),
            Some("100")
        );
    }

    #[test]
    fn prepare_binds_cell_and_coordinates() {
        let dir = tempdir().unwrap();
        let mut engine = engine_in(dir.path(), "cp2k.popt");
        let structure = Structure::new(
            vec![
                Atom::new("Na", Point3::new(0.0, 0.0, 0.0)),
                Atom::new("Cl", Point3::new(2.82, 0.0, 0.0)),
            ],
            Some(Cell::cubic(5.64)),
        );
        engine.prepare(Some(&structure)).unwrap();

        let template = engine.template();
        assert_eq!(
            template.keyword_value(&CELL, "A").as_deref(),
            Some("5.64000000 0.00000000 0.00000000")
        );
        assert_eq!(
            template.keyword_value(&COORD, "Cl").as_deref(),
            Some("2.82000000 0.00000000 0.00000000")
        );
    }

    #[cfg(unix)]
    fn fake_engine_script(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("fake-cp2k.sh");
        fs::write(&script, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script.display().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn run_reads_the_output_written_by_the_engine() {
        let dir = tempdir().unwrap();
        let script = fake_engine_script(
            dir.path(),
            "grep -q 'CUTOFF 200' \"$2\" || exit 3\nprintf '1\\n ENERGY| Total FORCE_EVAL ( QS ) energy [a.u.]: -1.5\\n' > \"$4\"\n",
        );
        let mut engine = engine_in(dir.path(), &script);
        let request = SimulationRequest::new(
            None,
            &fixed(),
            GridParameter::Cutoff,
            ParameterValue::Integer(200),
            EngineSettings::default(),
        );
        let result = engine.run(&request).unwrap();
        assert_eq!(result.artifact.leading_atom_count(), Some(1));
        assert!(result.artifact.lines()[1].ends_with("-1.5"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_simulation_error() {
        let dir = tempdir().unwrap();
        let script = fake_engine_script(dir.path(), "echo 'segfault' >&2\nexit 1\n");
        let mut engine = engine_in(dir.path(), &script);
        let request = SimulationRequest::new(
            None,
            &fixed(),
            GridParameter::Cutoff,
            ParameterValue::Integer(200),
            EngineSettings::default(),
        );
        let err = engine.run(&request).unwrap_err();
        match err {
            EngineError::Simulation { message, value, .. } => {
                assert!(message.contains("segfault"));
                assert_eq!(value, ParameterValue::Integer(200));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stale_output_is_never_read_back() {
        let dir = tempdir().unwrap();
        let script = fake_engine_script(dir.path(), "exit 0\n");
        let mut engine = engine_in(dir.path(), &script);
        fs::write(engine.output_path(), "1\nstale\n").unwrap();
        let request = SimulationRequest::new(
            None,
            &fixed(),
            GridParameter::Cutoff,
            ParameterValue::Integer(200),
            EngineSettings::default(),
        );
        let err = engine.run(&request).unwrap_err();
        assert!(matches!(err, EngineError::Simulation { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn template_defined_system_runs_without_a_structure() {
        let dir = tempdir().unwrap();
        let script = fake_engine_script(
            dir.path(),
            "cat > \"$4\" <<'OUT'
 DBCSR| CPU Multiplication driver                                           XSMM
 ENERGY| Total FORCE_EVAL ( QS ) energy [a.u.]:             -34.200000000000
 # Atom   Kind   Element          X              Y              Z
      1      1      O           0.00000000     3.00000000     4.00000000
      2      1      H           0.00000000     0.00000000     1.00000000
 SUM OF ATOMIC FORCES           0.00000000     3.00000000     5.00000000     5.83095189
OUT
",
        );
        let mut engine = engine_in(dir.path(), &script);
        let config = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 200.0, 2))
            .build()
            .unwrap();

        let result = crate::workflows::optimize::run(
            &config,
            None,
            &mut engine,
            EngineSettings::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        let stage = result.stage(GridParameter::Cutoff).unwrap();
        assert_eq!(stage.history.len(), 2);
        for point in stage.history.points() {
            assert!((point.sample.mean_force - 3.0).abs() < 1e-12);
        }
    }
}
