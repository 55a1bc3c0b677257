//! Error types for the logging subsystem.

use thiserror::Error;

pub type LogResult<T> = Result<T, LogError>;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid filter directive `{0}`")]
    Filter(String),
    #[error("logger configuration error: {0}")]
    Config(String),
}
