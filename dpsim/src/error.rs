//! Error types for dpsim.

use thiserror::Error;

use crate::simulation::states::PhysicsState;

#[derive(Debug, Error)]
pub enum DpsimError {
    #[error("pendulum state became non-finite: {0:?}")]
    NonFinite(PhysicsState),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DpsimError>;
