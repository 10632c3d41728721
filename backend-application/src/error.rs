use thiserror::Error;

use backend_domain::IdentifierError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<IdentifierError> for AppError {
    fn from(err: IdentifierError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
