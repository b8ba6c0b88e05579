//! Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested change violates a record constraint.
    #[error("invalid update: {0}")]
    Validation(String),
}

impl StoreError {
    /// Adapter for `map_err` that attaches a short description.
    pub(crate) fn database(message: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Database {
            message: message.to_string(),
            source,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
