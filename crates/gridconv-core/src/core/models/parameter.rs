use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The closed set of integration-grid parameters that can be swept.
///
/// The derived ordering is the stage order: the primary cutoff is converged first,
/// then the relative cutoff, then the number of multigrid levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridParameter {
    Cutoff,
    RelCutoff,
    Ngrids,
}

impl GridParameter {
    /// All parameters in stage order.
    pub const ALL: [GridParameter; 3] = [Self::Cutoff, Self::RelCutoff, Self::Ngrids];

    /// The keyword used for this parameter inside the `&MGRID` section of an engine input.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Cutoff => "CUTOFF",
            Self::RelCutoff => "REL_CUTOFF",
            Self::Ngrids => "NGRIDS",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cutoff => "cutoff",
            Self::RelCutoff => "rel-cutoff",
            Self::Ngrids => "ngrids",
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::Cutoff | Self::RelCutoff => Some("Ry"),
            Self::Ngrids => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for GridParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether candidate values of a sweep are rounded down to integers or kept as floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    #[default]
    Integer,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Integer(i64),
    Float(f64),
}

impl ParameterValue {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => v as f64,
            Self::Float(v) => v,
        }
    }

    /// Converts a raw value into the representation dictated by `kind`.
    ///
    /// Integer conversion floors the value, so `linspace` points between two integers
    /// collapse onto the lower one.
    pub fn from_f64(value: f64, kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => Self::Integer(value.floor() as i64),
            ValueKind::Float => Self::Float(value),
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParameterSpecError {
    #[error("Sweep for '{parameter}' needs at least 2 samples, got {sample_count}")]
    TooFewSamples {
        parameter: GridParameter,
        sample_count: usize,
    },
    #[error("Sweep for '{parameter}' must step upward, but start {start} > stop {stop}")]
    DescendingRange {
        parameter: GridParameter,
        start: f64,
        stop: f64,
    },
    #[error("Sweep for '{parameter}' has a non-finite bound")]
    NonFiniteBound { parameter: GridParameter },
}

/// A validated sweep definition for one parameter.
///
/// Fields are private so that a constructed spec always satisfies
/// `start <= stop` and `sample_count >= 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    parameter: GridParameter,
    start: f64,
    stop: f64,
    sample_count: usize,
    kind: ValueKind,
}

impl ParameterSpec {
    /// Creates a validated sweep definition.
    ///
    /// # Arguments
    ///
    /// * `parameter` - The grid parameter this sweep varies.
    /// * `start` - The first candidate value.
    /// * `stop` - The last candidate value; always included in the candidate list.
    /// * `sample_count` - The number of evenly spaced candidates.
    /// * `kind` - Whether candidates are floored to integers or kept as floats.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterSpecError::NonFiniteBound`] if either bound is NaN or infinite,
    /// [`ParameterSpecError::TooFewSamples`] if `sample_count < 2`, and
    /// [`ParameterSpecError::DescendingRange`] if `start > stop`.
    pub fn new(
        parameter: GridParameter,
        start: f64,
        stop: f64,
        sample_count: usize,
        kind: ValueKind,
    ) -> Result<Self, ParameterSpecError> {
        if !start.is_finite() || !stop.is_finite() {
            return Err(ParameterSpecError::NonFiniteBound { parameter });
        }
        if sample_count < 2 {
            return Err(ParameterSpecError::TooFewSamples {
                parameter,
                sample_count,
            });
        }
        if start > stop {
            return Err(ParameterSpecError::DescendingRange {
                parameter,
                start,
                stop,
            });
        }
        Ok(Self {
            parameter,
            start,
            stop,
            sample_count,
            kind,
        })
    }

    pub fn parameter(&self) -> GridParameter {
        self.parameter
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Evenly spaced candidates from `start` to `stop`, both inclusive.
    ///
    /// The final point is pinned to `stop` rather than accumulated, so rounding in the
    /// step never pushes the last candidate past the requested bound.
    pub fn candidates(&self) -> Vec<ParameterValue> {
        let n = self.sample_count;
        let step = (self.stop - self.start) / (n - 1) as f64;
        (0..n)
            .map(|i| {
                let raw = if i == n - 1 {
                    self.stop
                } else {
                    self.start + step * i as f64
                };
                ParameterValue::from_f64(raw, self.kind)
            })
            .collect()
    }

    /// The first candidate, used as the baseline value before this parameter is swept.
    pub fn first_candidate(&self) -> ParameterValue {
        ParameterValue::from_f64(self.start, self.kind)
    }
}
