//! # gridconv
//!
//! Convergence-driven parameter sweeps for the real-space integration grid of CP2K-style
//! electronic-structure codes.
//!
//! A sweep runs the simulation once per candidate value, extracts the total energy and the
//! mean per-atom force from each output, and stops as soon as consecutive runs agree on the
//! force within a tolerance. Three stages run in a fixed order (primary cutoff, relative
//! cutoff, grid count), each freezing its accepted value for the stages after it.
//!
//! ## Layers
//!
//! - **[`core`]** - Stateless models and pure functions: parameter specs and candidate
//!   generation, observable extraction, the convergence rule, structure I/O and box sizing.
//!
//! - **[`engine`]** - The sweep machinery: configuration, the simulation boundary, a single
//!   parameter sweep, progress reporting and a subprocess engine for CP2K.
//!
//! - **[`workflows`]** - The public entry point that runs all stages end to end.

pub mod core;
pub mod engine;
pub mod workflows;
