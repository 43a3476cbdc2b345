use thiserror::Error;

/// Coarse classification of a [`DbError`], so callers can branch without
/// matching on driver messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not reach, authenticate with, or keep talking to the server.
    Connectivity,
    /// Unique, foreign-key, not-null or check constraint rejected the statement.
    Constraint,
    /// Any other failure reported for a statement (syntax, missing table, decoding).
    Statement,
    /// The session was used in a way its lifecycle does not allow.
    Misuse,
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Invalid connection target: {0}")]
    InvalidTarget(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("Statement failed: {0}")]
    Statement(#[source] sqlx::Error),
    #[error("Row decode error: {0}")]
    Decode(String),
    #[error("Session is not connected")]
    NotConnected,
    #[error("Session is already connected")]
    AlreadyConnected,
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("Expected a single statement: {0:?}")]
    MultipleStatements(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Connection(_) | DbError::InvalidTarget(_) => ErrorKind::Connectivity,
            DbError::ConstraintViolation(_) => ErrorKind::Constraint,
            DbError::Statement(_) | DbError::Decode(_) => ErrorKind::Statement,
            DbError::NotConnected
            | DbError::AlreadyConnected
            | DbError::InvalidIdentifier(_)
            | DbError::MultipleStatements(_) => ErrorKind::Misuse,
        }
    }

    /// Classify a driver error raised while running a statement.
    pub(crate) fn from_statement(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation
                | sqlx::error::ErrorKind::ForeignKeyViolation
                | sqlx::error::ErrorKind::NotNullViolation
                | sqlx::error::ErrorKind::CheckViolation => {
                    DbError::ConstraintViolation(db_err.message().to_string())
                }
                _ => DbError::Statement(sqlx::Error::Database(db_err)),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::Connection(err),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Decode(err.to_string())
            }
            other => DbError::Statement(other),
        }
    }

    /// Every failure while establishing a session is a connectivity failure.
    pub(crate) fn from_connect(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => DbError::InvalidTarget(e.to_string()),
            other => DbError::Connection(other),
        }
    }
}
