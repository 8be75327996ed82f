use crate::core::io::artifact::Artifact;
use crate::core::models::observable::ObservableSample;
use nalgebra::DVector;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observable {
    Energy,
    Forces,
}

impl fmt::Display for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Energy => f.write_str("total energy"),
            Self::Forces => f.write_str("force table"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("No {observable} in '{origin}' (marker '{marker}'); the run most likely did not complete")]
    MissingObservable {
        observable: Observable,
        marker: String,
        origin: String,
    },
    #[error("Malformed artifact '{origin}': {reason}")]
    MalformedArtifact { origin: String, reason: String },
}

/// The text markers that delimit observables inside an artifact.
///
/// Matching ignores runs of whitespace, so a marker written with single spaces still finds
/// the column-aligned header the engine prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMarkers {
    pub energy: String,
    pub force_table_start: String,
    pub force_table_end: String,
}

impl Default for ArtifactMarkers {
    fn default() -> Self {
        Self {
            energy: "Total FORCE_EVAL".to_string(),
            force_table_start: "# Atom Kind Element X Y Z".to_string(),
            force_table_end: "SUM OF ATOMIC FORCES".to_string(),
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turns an artifact into an [`ObservableSample`].
#[derive(Debug, Clone, Default)]
pub struct ObservableExtractor {
    markers: ArtifactMarkers,
}

impl ObservableExtractor {
    pub fn new(markers: ArtifactMarkers) -> Self {
        Self { markers }
    }

    /// Extracts the total energy and the mean per-atom force magnitude.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::MissingObservable`] if the energy line or the force-table start is absent.
    /// - [`ExtractError::MalformedArtifact`] if the force table is never closed, a value does not
    ///   parse, or `atom_count` is zero.
    pub fn extract(
        &self,
        artifact: &Artifact,
        atom_count: usize,
    ) -> Result<ObservableSample, ExtractError> {
        let energy = self.read_energy(artifact)?;
        let mean_force = self.read_mean_force(artifact, atom_count)?;
        Ok(ObservableSample::new(energy, mean_force))
    }

    fn malformed(artifact: &Artifact, reason: String) -> ExtractError {
        ExtractError::MalformedArtifact {
            origin: artifact.origin().to_string(),
            reason,
        }
    }

    fn read_energy(&self, artifact: &Artifact) -> Result<f64, ExtractError> {
        let marker = normalize(&self.markers.energy);
        let line = artifact
            .lines()
            .iter()
            .rev()
            .find(|line| normalize(line).contains(&marker))
            .ok_or_else(|| ExtractError::MissingObservable {
                observable: Observable::Energy,
                marker: self.markers.energy.clone(),
                origin: artifact.origin().to_string(),
            })?;

        let token = line.split_whitespace().last().unwrap_or_default();
        token.parse().map_err(|_| {
            Self::malformed(
                artifact,
                format!("energy line ends in '{}', not a number", token),
            )
        })
    }

    /// Number of atom rows in the last force table.
    ///
    /// The engine prints one row per atom, so this stands in for the atom count when the
    /// artifact carries no header and no structure was supplied.
    ///
    /// # Errors
    ///
    /// Same as [`extract`](Self::extract) for a missing or unterminated force table.
    pub fn force_row_count(&self, artifact: &Artifact) -> Result<usize, ExtractError> {
        let (start, end) = self.force_table_bounds(artifact)?;
        Ok(artifact.lines()[start + 1..end]
            .iter()
            .filter(|line| !line.trim().is_empty())
            .count())
    }

    /// Line indices of the last force-table header and its closing marker.
    fn force_table_bounds(&self, artifact: &Artifact) -> Result<(usize, usize), ExtractError> {
        let start_marker = normalize(&self.markers.force_table_start);
        let end_marker = normalize(&self.markers.force_table_end);
        let lines = artifact.lines();

        let start = lines
            .iter()
            .rposition(|line| normalize(line).contains(&start_marker))
            .ok_or_else(|| ExtractError::MissingObservable {
                observable: Observable::Forces,
                marker: self.markers.force_table_start.clone(),
                origin: artifact.origin().to_string(),
            })?;

        let end = lines[start + 1..]
            .iter()
            .position(|line| normalize(line).contains(&end_marker))
            .map(|offset| start + 1 + offset)
            .ok_or_else(|| {
                Self::malformed(
                    artifact,
                    format!(
                        "force table opened on line {} is never closed by '{}'",
                        start + 1,
                        self.markers.force_table_end
                    ),
                )
            })?;
        Ok((start, end))
    }

    fn read_mean_force(&self, artifact: &Artifact, atom_count: usize) -> Result<f64, ExtractError> {
        if atom_count == 0 {
            return Err(Self::malformed(
                artifact,
                "cannot average forces over zero atoms".to_string(),
            ));
        }

        let (start, end) = self.force_table_bounds(artifact)?;
        let lines = artifact.lines();

        let mut total = 0.0;
        for (offset, line) in lines[start + 1..end].iter().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            let line_num = start + 2 + offset;
            if fields.len() < 4 {
                return Err(Self::malformed(
                    artifact,
                    format!("force row on line {} has no vector components", line_num),
                ));
            }
            let components: Vec<f64> = fields[3..]
                .iter()
                .map(|raw| raw.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| {
                    Self::malformed(
                        artifact,
                        format!("force row on line {} contains a non-numeric value", line_num),
                    )
                })?;
            total += DVector::from_vec(components).norm();
        }

        Ok(total / atom_count as f64)
    }
}
