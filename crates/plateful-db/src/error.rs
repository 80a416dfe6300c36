use thiserror::Error;

/// Store-level failure taxonomy. The first three carry a short noun
/// phrase naming what was violated; the API layer maps them onto HTTP
/// status codes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("connection lock poisoned: {0}")]
    Lock(String),
}

impl StoreError {
    /// True when the underlying SQLite error is a constraint violation
    /// (unique index hit, foreign key miss).
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
