use crate::core::convergence::ConvergenceTracker;
use crate::core::models::parameter::{GridParameter, ParameterValue};
use crate::core::models::structure::Structure;
use crate::core::observables::ObservableExtractor;
use crate::engine::config::{SweepConfig, validate_stage_order};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::{EngineSettings, FixedParameters, SimulationEngine};
use crate::engine::state::StageResult;
use crate::engine::sweep::ParameterSweepStage;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// One entry per configured stage, in stage order.
    pub stages: Vec<StageResult>,
    /// Parameter values every later run would use: baseline overlaid with accepted values.
    pub final_parameters: BTreeMap<GridParameter, ParameterValue>,
}

impl OptimizationResult {
    pub fn all_converged(&self) -> bool {
        self.stages.iter().all(|stage| stage.converged)
    }

    pub fn stage(&self, parameter: GridParameter) -> Option<&StageResult> {
        self.stages.iter().find(|stage| stage.parameter == parameter)
    }
}

/// Runs the configured stages in order, freezing each accepted value before the next stage.
pub struct StagedOptimizer<'a> {
    config: &'a SweepConfig,
    settings: EngineSettings,
}

impl<'a> StagedOptimizer<'a> {
    pub fn new(config: &'a SweepConfig, settings: EngineSettings) -> Self {
        Self { config, settings }
    }

    pub fn optimize<E>(
        &self,
        structure: Option<&Structure>,
        engine: &mut E,
        reporter: &ProgressReporter,
    ) -> Result<OptimizationResult, EngineError>
    where
        E: SimulationEngine + ?Sized,
    {
        run(self.config, structure, engine, self.settings, reporter)
    }
}

/// Validates the stage order, prepares the engine once, and runs every stage.
///
/// A stage that exhausts its candidates is not an error; its last candidate is accepted
/// and the result records `converged = false`.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] before any run if the stages are out of order,
/// otherwise the first error raised by the engine or the observable extraction.
#[instrument(skip_all, name = "staged_optimization")]
pub fn run<E>(
    config: &SweepConfig,
    structure: Option<&Structure>,
    engine: &mut E,
    settings: EngineSettings,
    reporter: &ProgressReporter,
) -> Result<OptimizationResult, EngineError>
where
    E: SimulationEngine + ?Sized,
{
    validate_stage_order(&config.stages)?;

    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    info!(
        stages = config.stages.len(),
        has_structure = structure.is_some(),
        "Preparing engine."
    );
    engine.prepare(structure)?;
    reporter.report(Progress::PhaseFinish);

    let extractor = ObservableExtractor::new(config.markers.clone());
    let mut fixed = FixedParameters::new(config.baseline.clone());
    let mut stages = Vec::with_capacity(config.stages.len());

    reporter.report(Progress::PhaseStart { name: "Sweeps" });
    for spec in &config.stages {
        let tracker = ConvergenceTracker::new(config.tolerance);
        let mut stage = ParameterSweepStage::new(spec, tracker, &extractor, settings);
        let result = stage.run(structure, &fixed, &mut *engine, reporter)?;

        fixed.freeze(result.parameter, result.accepted_value)?;
        if !result.converged {
            warn!(
                parameter = %result.parameter,
                accepted = %result.accepted_value,
                "Stage did not converge within its candidate range."
            );
        }
        stages.push(result);
    }
    reporter.report(Progress::PhaseFinish);

    let final_parameters = fixed.effective();
    info!(parameters = ?final_parameters, "Optimization finished.");

    Ok(OptimizationResult {
        stages,
        final_parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ConfigError, SweepConfigBuilder, SweepRange};
    use crate::engine::sweep::tests::ScriptedEngine;
    use std::sync::{Arc, Mutex};

    fn config() -> SweepConfig {
        SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 400.0, 4))
            .stage(GridParameter::RelCutoff, SweepRange::new(60.0, 120.0, 4))
            .stage(GridParameter::Ngrids, SweepRange::new(5.0, 8.0, 4))
            .build()
            .unwrap()
    }

    // Stage 1 converges on its third run, stage 2 on its second, stage 3 exhausts.
    fn script() -> Vec<(f64, f64)> {
        vec![
            (-10.0, 0.50),
            (-10.5, 0.60),
            (-10.6, 0.601),
            (-10.0, 0.50),
            (-10.1, 0.5001),
            (-10.0, 0.1),
            (-10.1, 0.2),
            (-10.2, 0.3),
            (-10.3, 0.4),
        ]
    }

    #[test]
    fn later_stages_run_with_earlier_accepted_values() {
        let config = config();
        let mut engine = ScriptedEngine::new(script());
        let result = run(
            &config,
            None,
            &mut engine,
            EngineSettings::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(engine.prepared, 1);
        assert_eq!(result.stages.len(), 3);
        assert_eq!(engine.requests.len(), 9);

        let cutoff = result.stage(GridParameter::Cutoff).unwrap();
        assert_eq!(cutoff.accepted_value, ParameterValue::Integer(200));
        let rel = result.stage(GridParameter::RelCutoff).unwrap();
        assert_eq!(rel.accepted_value, ParameterValue::Integer(60));

        // First cutoff run uses the baseline for the later parameters.
        assert_eq!(
            engine.requests[0],
            BTreeMap::from([
                (GridParameter::Cutoff, ParameterValue::Integer(100)),
                (GridParameter::RelCutoff, ParameterValue::Integer(60)),
                (GridParameter::Ngrids, ParameterValue::Integer(5)),
            ])
        );
        // Grid-count runs see both accepted cutoffs.
        for request in &engine.requests[5..] {
            assert_eq!(
                request.get(&GridParameter::Cutoff),
                Some(&ParameterValue::Integer(200))
            );
            assert_eq!(
                request.get(&GridParameter::RelCutoff),
                Some(&ParameterValue::Integer(60))
            );
        }
        assert_eq!(
            engine.requests[8].get(&GridParameter::Ngrids),
            Some(&ParameterValue::Integer(8))
        );
    }

    #[test]
    fn unconverged_stage_is_not_an_optimizer_failure() {
        let config = config();
        let mut engine = ScriptedEngine::new(script());
        let result = run(
            &config,
            None,
            &mut engine,
            EngineSettings::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        let ngrids = result.stage(GridParameter::Ngrids).unwrap();
        assert!(!ngrids.converged);
        assert_eq!(ngrids.accepted_value, ParameterValue::Integer(8));
        assert!(!result.all_converged());
        assert_eq!(
            result.final_parameters,
            BTreeMap::from([
                (GridParameter::Cutoff, ParameterValue::Integer(200)),
                (GridParameter::RelCutoff, ParameterValue::Integer(60)),
                (GridParameter::Ngrids, ParameterValue::Integer(8)),
            ])
        );
    }

    #[test]
    fn stage_failure_stops_the_optimization() {
        let config = config();
        let mut engine = ScriptedEngine::new(script()[..4].to_vec());
        let err = run(
            &config,
            None,
            &mut engine,
            EngineSettings::default(),
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
        assert_eq!(engine.requests.len(), 5);
    }

    #[test]
    fn reordered_stages_are_rejected_before_any_run() {
        let mut config = config();
        config.stages.swap(0, 1);
        let mut engine = ScriptedEngine::new(script());
        let err = StagedOptimizer::new(&config, EngineSettings::default())
            .optimize(None, &mut engine, &ProgressReporter::new())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigError::StageOrder { .. })
        ));
        assert_eq!(engine.prepared, 0);
        assert!(engine.requests.is_empty());
    }

    #[test]
    fn progress_events_follow_stage_order() {
        let config = config();
        let mut engine = ScriptedEngine::new(script());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = ProgressReporter::with_callback(Box::new(move |event: Progress| {
            if let Progress::StageStart { parameter, .. } = event {
                sink.lock().unwrap().push(parameter);
            }
        }));
        StagedOptimizer::new(&config, EngineSettings::default())
            .optimize(None, &mut engine, &reporter)
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), GridParameter::ALL.to_vec());
    }
}
