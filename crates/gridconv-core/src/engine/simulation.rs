use super::error::EngineError;
use crate::core::io::artifact::Artifact;
use crate::core::models::parameter::{GridParameter, ParameterValue};
use crate::core::models::structure::Structure;
use std::collections::BTreeMap;

/// Settings applied to every run regardless of which parameter is being swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ask the engine to print the per-atom force table.
    pub print_forces: bool,
    /// Cap on SCF iterations per run, if the engine should be told to stop early.
    pub max_scf: Option<u32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            print_forces: true,
            max_scf: None,
        }
    }
}

/// Parameter values held constant while a stage sweeps its own parameter.
///
/// Two layers are kept apart: the baseline (starting values for parameters not yet
/// swept) and the accepted values frozen by completed stages. Accepted values shadow the
/// baseline and can only be added, never replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedParameters {
    baseline: BTreeMap<GridParameter, ParameterValue>,
    accepted: BTreeMap<GridParameter, ParameterValue>,
}

impl FixedParameters {
    pub fn new(baseline: BTreeMap<GridParameter, ParameterValue>) -> Self {
        Self {
            baseline,
            accepted: BTreeMap::new(),
        }
    }

    pub fn baseline(&self) -> &BTreeMap<GridParameter, ParameterValue> {
        &self.baseline
    }

    pub fn accepted(&self) -> &BTreeMap<GridParameter, ParameterValue> {
        &self.accepted
    }

    pub fn get(&self, parameter: GridParameter) -> Option<ParameterValue> {
        self.accepted
            .get(&parameter)
            .or_else(|| self.baseline.get(&parameter))
            .copied()
    }

    /// Records a stage's accepted value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] if `parameter` was already frozen.
    pub fn freeze(
        &mut self,
        parameter: GridParameter,
        value: ParameterValue,
    ) -> Result<(), EngineError> {
        if let Some(existing) = self.accepted.get(&parameter) {
            return Err(EngineError::Internal(format!(
                "'{}' is already fixed at {}; refusing to overwrite with {}",
                parameter, existing, value
            )));
        }
        self.accepted.insert(parameter, value);
        Ok(())
    }

    /// Baseline overlaid with accepted values.
    pub fn effective(&self) -> BTreeMap<GridParameter, ParameterValue> {
        let mut merged = self.baseline.clone();
        merged.extend(self.accepted.iter().map(|(k, v)| (*k, *v)));
        merged
    }
}

/// Everything one run needs. Built fresh for each dispatch and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRequest<'a> {
    pub structure: Option<&'a Structure>,
    pub overrides: BTreeMap<GridParameter, ParameterValue>,
    pub varying: (GridParameter, ParameterValue),
    pub settings: EngineSettings,
}

impl<'a> SimulationRequest<'a> {
    pub fn new(
        structure: Option<&'a Structure>,
        fixed: &FixedParameters,
        parameter: GridParameter,
        value: ParameterValue,
        settings: EngineSettings,
    ) -> Self {
        let mut overrides = fixed.effective();
        overrides.remove(&parameter);
        Self {
            structure,
            overrides,
            varying: (parameter, value),
            settings,
        }
    }

    /// Every parameter binding of this run, the varying one included.
    pub fn assignments(&self) -> BTreeMap<GridParameter, ParameterValue> {
        let mut all = self.overrides.clone();
        all.insert(self.varying.0, self.varying.1);
        all
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub artifact: Artifact,
}

/// The external code that turns a request into an artifact.
///
/// Calls are blocking; `run` returns only once the artifact is complete.
pub trait SimulationEngine {
    /// One-time structural setup, called exactly once before the first run.
    fn prepare(&mut self, structure: Option<&Structure>) -> Result<(), EngineError> {
        let _ = structure;
        Ok(())
    }

    fn run(&mut self, request: &SimulationRequest<'_>) -> Result<SimulationResult, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> BTreeMap<GridParameter, ParameterValue> {
        BTreeMap::from([
            (GridParameter::RelCutoff, ParameterValue::Integer(60)),
            (GridParameter::Ngrids, ParameterValue::Integer(5)),
        ])
    }

    #[test]
    fn accepted_values_shadow_baseline() {
        let mut fixed = FixedParameters::new(baseline());
        fixed
            .freeze(GridParameter::RelCutoff, ParameterValue::Integer(80))
            .unwrap();
        assert_eq!(
            fixed.get(GridParameter::RelCutoff),
            Some(ParameterValue::Integer(80))
        );
        assert_eq!(
            fixed.get(GridParameter::Ngrids),
            Some(ParameterValue::Integer(5))
        );
        assert_eq!(fixed.get(GridParameter::Cutoff), None);
    }

    #[test]
    fn freeze_refuses_to_overwrite() {
        let mut fixed = FixedParameters::default();
        fixed
            .freeze(GridParameter::Cutoff, ParameterValue::Integer(411))
            .unwrap();
        let err = fixed
            .freeze(GridParameter::Cutoff, ParameterValue::Integer(566))
            .unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
        assert_eq!(
            fixed.accepted().get(&GridParameter::Cutoff),
            Some(&ParameterValue::Integer(411))
        );
    }

    #[test]
    fn request_excludes_varying_parameter_from_overrides() {
        let fixed = FixedParameters::new(baseline());
        let request = SimulationRequest::new(
            None,
            &fixed,
            GridParameter::RelCutoff,
            ParameterValue::Integer(100),
            EngineSettings::default(),
        );
        assert!(!request.overrides.contains_key(&GridParameter::RelCutoff));
        assert_eq!(
            request.assignments().get(&GridParameter::RelCutoff),
            Some(&ParameterValue::Integer(100))
        );
        assert_eq!(request.assignments().len(), 2);
    }
}
