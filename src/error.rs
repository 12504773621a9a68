use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("session expired; run `tickettractor login` to re-authenticate")]
    AuthExpired,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
