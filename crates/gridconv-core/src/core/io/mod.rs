//! Provides input/output functionality for structures and simulation artifacts.
//!
//! Structure formats share the [`traits::StructureFile`] interface; simulation output is
//! read into an [`artifact::Artifact`] before observables are extracted from it.

pub mod artifact;
pub mod traits;
pub mod xyz;
