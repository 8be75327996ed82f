//! # Workflows Module
//!
//! Top-level entry points. A workflow owns the whole procedure: it validates the
//! configuration, performs one-time engine setup, runs the stages and collects results.
//!
//! - **Staged optimization** ([`optimize`]) - Converges the primary cutoff, the relative
//!   cutoff and the grid count in that order, each stage running with the values accepted
//!   by the stages before it.

pub mod optimize;
