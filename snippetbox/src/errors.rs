use thiserror::Error;

/// Error kinds returned by the snippet and user stores.
///
/// Callers only ever see these variants; driver errors are classified before they leave
/// the store layer.
#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// The row is absent, or excluded because it has expired
    #[error("No matching record found")]
    NotFound,

    #[error("Duplicate email")]
    DuplicateEmail,

    /// Unknown email, wrong password, or wrong current password on update
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Storage error: {0}")]
    Storage(String),

    /// The request context was cancelled or its deadline passed
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ModelError::NotFound,
            other => ModelError::Storage(other.to_string()),
        }
    }
}

impl From<argon2::password_hash::Error> for ModelError {
    fn from(err: argon2::password_hash::Error) -> Self {
        ModelError::Storage(format!("Password hash error: {err}"))
    }
}

impl From<argon2::Error> for ModelError {
    fn from(err: argon2::Error) -> Self {
        ModelError::Storage(format!("Password hash parameters: {err}"))
    }
}

impl From<tokio::task::JoinError> for ModelError {
    fn from(err: tokio::task::JoinError) -> Self {
        ModelError::Storage(format!("Background task failed: {err}"))
    }
}
