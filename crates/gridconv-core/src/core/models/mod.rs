//! Data models shared by the sweep engine.
//!
//! - [`parameter`] - the closed set of grid parameters, their values, and validated sweep ranges
//! - [`observable`] - per-run energy/force samples and the ordered history of a sweep
//! - [`structure`] - atomic positions and the optional periodic cell handed to the engine

pub mod observable;
pub mod parameter;
pub mod structure;
