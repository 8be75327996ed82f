//! # Engine Module
//!
//! Stateful sweep machinery: everything that drives an external simulation code through a
//! parameter sweep and decides when to stop.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Sweep ranges, tolerance, baseline values and the builder
//! - **Simulation boundary** ([`simulation`]) - The [`simulation::SimulationEngine`] trait and the
//!   immutable request/result values passed across it
//! - **Sweeps** ([`sweep`]) - A single-parameter sweep with its stop rule
//! - **State Tracking** ([`state`]) - Sweep lifecycle and per-stage results
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine error taxonomy
//! - **CP2K** ([`cp2k`]) - A subprocess engine for CP2K-style input files

pub mod config;
pub mod cp2k;
pub mod error;
pub mod progress;
pub mod simulation;
pub mod state;
pub mod sweep;
