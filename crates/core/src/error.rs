//! Error type shared by every environment implementation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("unknown environment: {0}")]
    UnknownEnv(String),

    #[error("environment is closed")]
    Closed,

    #[error("environment must be reset before use")]
    NotReset,

    #[error("{0}")]
    Engine(String),
}

impl EnvError {
    pub fn engine(msg: impl Into<String>) -> Self {
        EnvError::Engine(msg.into())
    }
}
