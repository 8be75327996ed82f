use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::parameter::{GridParameter, ParameterValue};
use crate::core::observables::ExtractError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("Simulation for {parameter} = {value} failed: {message}")]
    Simulation {
        parameter: GridParameter,
        value: ParameterValue,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
