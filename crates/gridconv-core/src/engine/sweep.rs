use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::simulation::{EngineSettings, FixedParameters, SimulationEngine, SimulationRequest};
use super::state::{StageResult, SweepState};
use crate::core::convergence::ConvergenceTracker;
use crate::core::io::artifact::Artifact;
use crate::core::models::observable::ConvergenceHistory;
use crate::core::models::parameter::ParameterSpec;
use crate::core::models::structure::Structure;
use crate::core::observables::{ExtractError, ObservableExtractor};
use tracing::{debug, info, instrument, warn};

/// Sweeps one parameter through its candidates until the stop rule fires or the list runs out.
///
/// Candidates are dispatched strictly in ascending order, one at a time. A stage runs once;
/// calling [`run`](Self::run) again is an error.
pub struct ParameterSweepStage<'a> {
    spec: &'a ParameterSpec,
    tracker: ConvergenceTracker,
    extractor: &'a ObservableExtractor,
    settings: EngineSettings,
    state: SweepState,
}

impl<'a> ParameterSweepStage<'a> {
    pub fn new(
        spec: &'a ParameterSpec,
        tracker: ConvergenceTracker,
        extractor: &'a ObservableExtractor,
        settings: EngineSettings,
    ) -> Self {
        Self {
            spec,
            tracker,
            extractor,
            settings,
            state: SweepState::NotStarted,
        }
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Runs every candidate in order until the stop rule fires.
    ///
    /// # Errors
    ///
    /// Fails on the first engine or extraction error, with no retry. Also fails with
    /// [`EngineError::Internal`] if the stage was already run.
    #[instrument(skip_all, name = "parameter_sweep", fields(parameter = %self.spec.parameter()))]
    pub fn run<E>(
        &mut self,
        structure: Option<&Structure>,
        fixed: &FixedParameters,
        engine: &mut E,
        reporter: &ProgressReporter,
    ) -> Result<StageResult, EngineError>
    where
        E: SimulationEngine + ?Sized,
    {
        if self.state != SweepState::NotStarted {
            return Err(EngineError::Internal(format!(
                "sweep for '{}' was already run (state {:?})",
                self.spec.parameter(),
                self.state
            )));
        }

        let parameter = self.spec.parameter();
        let candidates = self.spec.candidates();
        reporter.report(Progress::StageStart {
            parameter,
            total_candidates: candidates.len() as u64,
        });
        info!(
            candidates = candidates.len(),
            tolerance = self.tracker.tolerance(),
            "Starting sweep."
        );

        let mut history = ConvergenceHistory::new();
        for value in candidates {
            self.state = SweepState::Running;
            reporter.report(Progress::CandidateStart { value });

            let request =
                SimulationRequest::new(structure, fixed, parameter, value, self.settings);
            debug!(candidate = %value, overrides = ?request.overrides, "Dispatching run.");
            let result = engine.run(&request)?;

            let atom_count = resolve_atom_count(self.extractor, &result.artifact, structure)?;
            let sample = self.extractor.extract(&result.artifact, atom_count)?;
            info!(
                candidate = %value,
                energy = sample.energy,
                mean_force = sample.mean_force,
                "Recorded sample."
            );
            self.tracker.record(&mut history, value, sample);
            reporter.report(Progress::CandidateFinish {
                energy: sample.energy,
                mean_force: sample.mean_force,
            });

            if self.tracker.has_converged(&history) {
                self.state = SweepState::ConvergedEarly;
                break;
            }
        }

        let accepted = match self.state {
            SweepState::ConvergedEarly => history.second_to_last(),
            _ => {
                self.state = SweepState::Exhausted;
                history.last()
            }
        }
        .map(|point| point.candidate)
        .ok_or_else(|| {
            EngineError::Internal(format!("sweep for '{}' recorded no samples", parameter))
        })?;

        let converged = self.state == SweepState::ConvergedEarly;
        if converged {
            info!(accepted = %accepted, runs = history.len(), "Sweep converged.");
        } else {
            warn!(
                accepted = %accepted,
                "Sweep exhausted its candidates without converging; keeping the last value."
            );
        }
        reporter.report(Progress::StageFinish { converged });

        Ok(StageResult {
            parameter,
            accepted_value: accepted,
            history,
            converged,
        })
    }
}

/// Atom count used to average forces: the artifact's own header first, then the structure,
/// then the rows of the force table itself.
fn resolve_atom_count(
    extractor: &ObservableExtractor,
    artifact: &Artifact,
    structure: Option<&Structure>,
) -> Result<usize, ExtractError> {
    if let Some(count) = artifact
        .leading_atom_count()
        .or_else(|| structure.map(Structure::atom_count))
    {
        return Ok(count);
    }
    match extractor.force_row_count(artifact)? {
        0 => Err(ExtractError::MalformedArtifact {
            origin: artifact.origin().to_string(),
            reason: "no atom count in the header, no structure, and an empty force table"
                .to_string(),
        }),
        rows => Ok(rows),
    }
}
