use std::result::Result as StdResult;

use carryover_config::ConfigError;
use carryover_core::{CoreError, ErrorKind};
use carryover_domain::UnknownCycleType;
use serde::Serialize;
use thiserror::Error;

/// Unified error type for the engine facade.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Unknown cycle type: {0}")]
    UnknownCycleType(String),
}

pub type Result<T> = StdResult<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Core(err) => err.kind(),
            EngineError::Config(_) | EngineError::UnknownCycleType(_) => ErrorKind::Internal,
        }
    }

    /// Wire tag of the error, e.g. `BUDGET_NOT_FOUND`.
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn to_api(&self) -> ApiError {
        ApiError {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<UnknownCycleType> for EngineError {
    fn from(err: UnknownCycleType) -> Self {
        EngineError::UnknownCycleType(err.0)
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Core(CoreError::Io(err))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Core(CoreError::Serde(err.to_string()))
    }
}

/// Structured error handed to API callers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}
