//! # Core Module
//!
//! Stateless building blocks of a grid-convergence study.
//!
//! - **Models** ([`models`]) - grid parameters and sweep ranges, observable samples and
//!   histories, structures
//! - **File I/O** ([`io`]) - structure files and simulation artifacts
//! - **Observables** ([`observables`]) - extraction of energy and mean force from an artifact
//! - **Convergence** ([`convergence`]) - the stop rule evaluated after every run
//! - **Utilities** ([`utils`]) - box-size arithmetic for preparing structures
//!
//! Nothing in this module runs a simulation; see [`crate::engine`] for that.

pub mod convergence;
pub mod io;
pub mod models;
pub mod observables;
pub mod utils;
