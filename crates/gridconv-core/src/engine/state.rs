use crate::core::models::observable::ConvergenceHistory;
use crate::core::models::parameter::{GridParameter, ParameterValue};

/// Lifecycle of a single parameter sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    NotStarted,
    Running,
    ConvergedEarly,
    Exhausted,
}

/// Outcome of one stage. Produced once, when the stage's loop exits.
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub parameter: GridParameter,
    pub accepted_value: ParameterValue,
    pub history: ConvergenceHistory,
    pub converged: bool,
}

impl StageResult {
    pub fn tested_candidates(&self) -> Vec<ParameterValue> {
        self.history.candidates().collect()
    }
}
