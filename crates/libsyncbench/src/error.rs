//! Error types for the benchmark harness

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("phase '{phase}' aborted: {source}")]
    Phase {
        phase: String,
        #[source]
        source: EngineError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Exit code for the CLI. Configuration problems are usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            BenchError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
