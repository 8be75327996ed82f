use crate::core::models::parameter::{
    GridParameter, ParameterSpec, ParameterSpecError, ParameterValue, ValueKind,
};
use crate::core::observables::ArtifactMarkers;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    InvalidSweep(#[from] ParameterSpecError),

    #[error(
        "Automatic sweep ranges are not supported for '{0}'. Give an explicit stop value; a cutoff maximum of 1500 Ry is a safe choice."
    )]
    UnsupportedMode(GridParameter),

    #[error("Tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),

    #[error("Stage '{later}' cannot be swept before '{earlier}'")]
    StageOrder {
        earlier: GridParameter,
        later: GridParameter,
    },

    #[error("Parameter '{0}' is swept more than once")]
    DuplicateStage(GridParameter),

    #[error("Required {what} is missing: {detail}")]
    MissingResource { what: &'static str, detail: String },
}

/// Where a sweep stops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepStop {
    Value(f64),
    /// Let the optimizer pick its own upper bound. Not implemented; rejected at build time.
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRange {
    pub start: f64,
    pub stop: SweepStop,
    pub sample_count: usize,
    pub kind: ValueKind,
}

impl SweepRange {
    pub fn new(start: f64, stop: f64, sample_count: usize) -> Self {
        Self {
            start,
            stop: SweepStop::Value(stop),
            sample_count,
            kind: ValueKind::Integer,
        }
    }

    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    fn into_spec(self, parameter: GridParameter) -> Result<ParameterSpec, ConfigError> {
        match self.stop {
            SweepStop::Auto => Err(ConfigError::UnsupportedMode(parameter)),
            SweepStop::Value(stop) => Ok(ParameterSpec::new(
                parameter,
                self.start,
                stop,
                self.sample_count,
                self.kind,
            )?),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub tolerance: f64,
    pub stages: Vec<ParameterSpec>,
    /// Values every run starts from before the corresponding stage has been swept.
    pub baseline: BTreeMap<GridParameter, ParameterValue>,
    pub markers: ArtifactMarkers,
}

/// Checks that stages are strictly increasing in [`GridParameter`] order.
///
/// # Errors
///
/// Returns [`ConfigError::DuplicateStage`] if a parameter appears twice and
/// [`ConfigError::StageOrder`] if a later parameter precedes an earlier one.
pub fn validate_stage_order(stages: &[ParameterSpec]) -> Result<(), ConfigError> {
    for pair in stages.windows(2) {
        let (earlier, later) = (pair[0].parameter(), pair[1].parameter());
        if earlier == later {
            return Err(ConfigError::DuplicateStage(later));
        }
        if earlier > later {
            return Err(ConfigError::StageOrder {
                earlier: later,
                later: earlier,
            });
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    tolerance: Option<f64>,
    stages: Vec<(GridParameter, SweepRange)>,
    baseline: BTreeMap<GridParameter, ParameterValue>,
    markers: Option<ArtifactMarkers>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn stage(mut self, parameter: GridParameter, range: SweepRange) -> Self {
        self.stages.push((parameter, range));
        self
    }
    pub fn baseline(mut self, parameter: GridParameter, value: ParameterValue) -> Self {
        self.baseline.insert(parameter, value);
        self
    }
    pub fn markers(mut self, markers: ArtifactMarkers) -> Self {
        self.markers = Some(markers);
        self
    }

    /// Validates the collected settings and fills the baseline for every swept parameter
    /// that has no explicit baseline with its first candidate.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingParameter`] if no tolerance or no stage was given.
    /// - [`ConfigError::InvalidTolerance`] if the tolerance is not positive and finite.
    /// - [`ConfigError::InvalidSweep`] if a range cannot form a valid [`ParameterSpec`].
    /// - [`ConfigError::UnsupportedMode`] if a range asks for an automatic stop.
    /// - [`ConfigError::StageOrder`] or [`ConfigError::DuplicateStage`] if the stages are
    ///   out of order.
    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let tolerance = self
            .tolerance
            .ok_or(ConfigError::MissingParameter("tolerance"))?;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        if self.stages.is_empty() {
            return Err(ConfigError::MissingParameter("stages"));
        }

        let stages = self
            .stages
            .into_iter()
            .map(|(parameter, range)| range.into_spec(parameter))
            .collect::<Result<Vec<_>, _>>()?;
        validate_stage_order(&stages)?;

        let mut baseline = self.baseline;
        for spec in &stages {
            baseline
                .entry(spec.parameter())
                .or_insert_with(|| spec.first_candidate());
        }

        Ok(SweepConfig {
            tolerance,
            stages,
            baseline,
            markers: self.markers.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_builder() -> SweepConfigBuilder {
        SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 1500.0, 10))
            .stage(GridParameter::RelCutoff, SweepRange::new(60.0, 120.0, 10))
            .stage(GridParameter::Ngrids, SweepRange::new(5.0, 8.0, 4))
    }

    #[test]
    fn build_fills_baseline_from_first_candidates() {
        let config = full_builder().build().unwrap();
        assert_eq!(config.stages.len(), 3);
        assert_eq!(
            config.baseline.get(&GridParameter::RelCutoff),
            Some(&ParameterValue::Integer(60))
        );
        assert_eq!(
            config.baseline.get(&GridParameter::Ngrids),
            Some(&ParameterValue::Integer(5))
        );
    }

    #[test]
    fn explicit_baseline_is_kept() {
        let config = full_builder()
            .baseline(GridParameter::Ngrids, ParameterValue::Integer(4))
            .build()
            .unwrap();
        assert_eq!(
            config.baseline.get(&GridParameter::Ngrids),
            Some(&ParameterValue::Integer(4))
        );
    }

    #[test]
    fn auto_stop_fails_at_build_time() {
        let result = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(
                GridParameter::Cutoff,
                SweepRange {
                    start: 100.0,
                    stop: SweepStop::Auto,
                    sample_count: 10,
                    kind: ValueKind::Integer,
                },
            )
            .build();
        assert_eq!(
            result,
            Err(ConfigError::UnsupportedMode(GridParameter::Cutoff))
        );
    }

    #[test]
    fn missing_tolerance_is_reported() {
        let result = SweepConfigBuilder::new()
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 200.0, 2))
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("tolerance")));
    }

    #[test]
    fn missing_stages_are_reported() {
        let result = SweepConfigBuilder::new().tolerance(0.1).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("stages")));
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let result = full_builder().tolerance(0.0).build();
        assert_eq!(result, Err(ConfigError::InvalidTolerance(0.0)));
    }

    #[test]
    fn out_of_order_stages_are_rejected() {
        let result = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::RelCutoff, SweepRange::new(60.0, 120.0, 10))
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 1500.0, 10))
            .build();
        assert_eq!(
            result,
            Err(ConfigError::StageOrder {
                earlier: GridParameter::Cutoff,
                later: GridParameter::RelCutoff
            })
        );
    }

    #[test]
    fn duplicate_stages_are_rejected() {
        let result = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 1500.0, 10))
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 1500.0, 10))
            .build();
        assert_eq!(
            result,
            Err(ConfigError::DuplicateStage(GridParameter::Cutoff))
        );
    }

    #[test]
    fn invalid_range_surfaces_spec_error() {
        let result = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Ngrids, SweepRange::new(8.0, 5.0, 4))
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSweep(
                ParameterSpecError::DescendingRange { .. }
            ))
        ));
    }

    #[test]
    fn subset_of_stages_in_order_is_accepted() {
        let config = SweepConfigBuilder::new()
            .tolerance(0.002)
            .stage(GridParameter::Cutoff, SweepRange::new(100.0, 1500.0, 10))
            .stage(GridParameter::Ngrids, SweepRange::new(5.0, 8.0, 4))
            .build()
            .unwrap();
        assert_eq!(config.stages.len(), 2);
    }
}
