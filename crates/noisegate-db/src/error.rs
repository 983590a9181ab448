use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user '{0}' already exists")]
    AlreadyExists(String),

    #[error("no user with id {0}")]
    NotFound(i64),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// Maps a sqlite constraint violation on insert to `AlreadyExists`.
    pub(crate) fn from_insert(err: rusqlite::Error, username: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::AlreadyExists(username.to_string())
            }
            _ => StoreError::Sqlite(err),
        }
    }
}
