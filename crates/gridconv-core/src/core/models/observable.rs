use super::parameter::ParameterValue;

/// Scalar observables extracted from one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservableSample {
    pub energy: f64,
    pub mean_force: f64,
}

impl ObservableSample {
    pub fn new(energy: f64, mean_force: f64) -> Self {
        Self { energy, mean_force }
    }
}

/// One entry of a sweep history: the candidate that was dispatched and what it produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub candidate: ParameterValue,
    pub sample: ObservableSample,
}

/// Append-only record of the samples produced by a single parameter sweep,
/// ordered by candidate index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceHistory {
    points: Vec<HistoryPoint>,
}

impl ConvergenceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, candidate: ParameterValue, sample: ObservableSample) {
        self.points.push(HistoryPoint { candidate, sample });
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn candidates(&self) -> impl Iterator<Item = ParameterValue> + '_ {
        self.points.iter().map(|p| p.candidate)
    }

    pub fn energies(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.sample.energy)
    }

    pub fn mean_forces(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.sample.mean_force)
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    /// The entry before the most recent one, if at least two have been recorded.
    pub fn second_to_last(&self) -> Option<&HistoryPoint> {
        self.points.len().checked_sub(2).map(|i| &self.points[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_preserves_insertion_order() {
        let mut history = ConvergenceHistory::new();
        history.push(ParameterValue::Integer(100), ObservableSample::new(-1.0, 0.5));
        history.push(ParameterValue::Integer(200), ObservableSample::new(-2.0, 0.4));
        history.push(ParameterValue::Integer(300), ObservableSample::new(-3.0, 0.3));

        let candidates: Vec<_> = history.candidates().collect();
        assert_eq!(
            candidates,
            vec![
                ParameterValue::Integer(100),
                ParameterValue::Integer(200),
                ParameterValue::Integer(300)
            ]
        );
        assert_eq!(history.energies().collect::<Vec<_>>(), vec![-1.0, -2.0, -3.0]);
        assert_eq!(history.mean_forces().collect::<Vec<_>>(), vec![0.5, 0.4, 0.3]);
    }

    #[test]
    fn second_to_last_requires_two_entries() {
        let mut history = ConvergenceHistory::new();
        assert!(history.second_to_last().is_none());
        history.push(ParameterValue::Integer(1), ObservableSample::new(0.0, 0.0));
        assert!(history.second_to_last().is_none());
        history.push(ParameterValue::Integer(2), ObservableSample::new(0.0, 0.0));
        assert_eq!(
            history.second_to_last().map(|p| p.candidate),
            Some(ParameterValue::Integer(1))
        );
    }
}
