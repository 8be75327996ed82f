use crate::core::models::observable::{ConvergenceHistory, ObservableSample};
use crate::core::models::parameter::ParameterValue;

/// Stop rule for a parameter sweep.
///
/// The rule looks only at the most recent first difference of each observable:
/// a sweep is converged when the energy moved at all (`ΔE != 0`) and the mean force
/// moved by less than the tolerance (`ΔF < tol`). `ΔF` is signed, so a force that drops
/// between candidates always satisfies the second half.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceTracker {
    tolerance: f64,
}

impl ConvergenceTracker {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Appends the newest sample. The history is never reordered.
    pub fn record(
        &self,
        history: &mut ConvergenceHistory,
        candidate: ParameterValue,
        sample: ObservableSample,
    ) {
        history.push(candidate, sample);
    }

    /// Most recent `(ΔE, ΔF)`, or `None` with fewer than two samples.
    pub fn latest_deltas(history: &ConvergenceHistory) -> Option<(f64, f64)> {
        let last = history.last()?;
        let previous = history.second_to_last()?;
        Some((
            last.sample.energy - previous.sample.energy,
            last.sample.mean_force - previous.sample.mean_force,
        ))
    }

    pub fn has_converged(&self, history: &ConvergenceHistory) -> bool {
        match Self::latest_deltas(history) {
            Some((energy_delta, force_delta)) => {
                energy_delta != 0.0 && force_delta < self.tolerance
            }
            None => false,
        }
    }
}
