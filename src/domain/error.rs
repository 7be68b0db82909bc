use thiserror::Error;

pub type Result<T, E = TodoError> = std::result::Result<T, E>;

/// Errors shared by the repository and service layers.
///
/// The service hands these back untouched; only the HTTP layer turns them into status codes.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo not found")]
    NotFound,
    #[error("invalid todo id `{0}`")]
    InvalidId(String),
    #[error("store failure: {0}")]
    Internal(#[source] anyhow::Error),
}

impl From<sqlx::Error> for TodoError {
    fn from(e: sqlx::Error) -> Self { Self::Internal(e.into()) }
}

impl From<chrono::ParseError> for TodoError {
    fn from(e: chrono::ParseError) -> Self { Self::Internal(anyhow::Error::new(e).context("corrupt timestamp")) }
}

impl From<uuid::Error> for TodoError {
    fn from(e: uuid::Error) -> Self { Self::Internal(anyhow::Error::new(e).context("corrupt stored id")) }
}
