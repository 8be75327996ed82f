use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BoxSizeError {
    #[error("At least one species is required")]
    NoSpecies,
    #[error("Density must be positive, got {0}")]
    NonPositiveDensity(f64),
    #[error("Species '{symbol}' has a non-positive mass {mass}")]
    NonPositiveMass { symbol: String, mass: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub symbol: String,
    pub mass: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDimensions {
    pub volume: f64,
    pub cubic_length: f64,
    pub spherical_radius: f64,
}

/// Box volume, cubic edge length, and sphere radius that hold the given species at `density`.
///
/// Units follow the inputs: `volume = Σ(mass · count) / density`.
///
/// # Errors
///
/// Returns a [`BoxSizeError`] for an empty species list, a non-positive density, or a
/// species with a non-positive mass.
pub fn box_dimensions(species: &[Species], density: f64) -> Result<BoxDimensions, BoxSizeError> {
    if species.is_empty() {
        return Err(BoxSizeError::NoSpecies);
    }
    if density <= 0.0 || !density.is_finite() {
        return Err(BoxSizeError::NonPositiveDensity(density));
    }
    if let Some(bad) = species.iter().find(|s| s.mass <= 0.0) {
        return Err(BoxSizeError::NonPositiveMass {
            symbol: bad.symbol.clone(),
            mass: bad.mass,
        });
    }

    let total_mass: f64 = species.iter().map(|s| s.mass * s.count as f64).sum();
    let volume = total_mass / density;

    Ok(BoxDimensions {
        volume,
        cubic_length: volume.cbrt(),
        spherical_radius: (3.0 * volume / (4.0 * PI)).cbrt(),
    })
}
