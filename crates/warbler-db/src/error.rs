use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A table constraint rejected the write: NOT NULL, UNIQUE, primary
    /// key or foreign key.
    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("password must be non-empty")]
    MissingPassword,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, DbError::Integrity(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                DbError::Integrity(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => DbError::Sqlite(err),
        }
    }
}
