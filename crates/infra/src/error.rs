//! Storage error model.

use thiserror::Error;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failure of a storage round-trip.
///
/// These are not recovered by request handlers; they surface as a server
/// error.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// An update targeted a row that does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A save was attempted with a missing required reference.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("in-memory store lock poisoned")]
    Poisoned,
}

impl RepositoryError {
    pub fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { operation, source }
    }
}
