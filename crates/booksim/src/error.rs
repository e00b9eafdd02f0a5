//! Error types.

use booksim_core::SimError;
use thiserror::Error;

/// Errors returned by the booking tier simulation.
///
/// Dropped and abandoned requests are simulation outcomes and never surface as errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration violates a constraint; raised before the simulation starts.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Engine failure, signals a defect in model logic.
    #[error(transparent)]
    Simulation(#[from] SimError),
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid YAML or has unknown structure.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Worker thread of a parallel experiment died before reporting its result.
    #[error("experiment worker failed: {0}")]
    Worker(String),
}

pub(crate) fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfiguration(msg.into())
}
