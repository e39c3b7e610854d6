//! Persistence collaborator errors.

use thiserror::Error;

/// Errors raised by a `LedgerStore` or one of its units of work.
///
/// Any of these means the unit did not commit; callers see no partial state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database rejected or failed the statement.
    #[error("Database error: {0}")]
    Database(String),

    /// A row the unit expected to hold was not there.
    #[error("{entity} {id} not found in unit of work")]
    MissingRow {
        /// Table or entity name.
        entity: &'static str,
        /// Identifier of the missing row.
        id: i64,
    },

    /// A stored value could not be mapped back to a domain type.
    #[error("Corrupt {entity} row: {detail}")]
    Corrupt {
        /// Table or entity name.
        entity: &'static str,
        /// What was wrong with it.
        detail: String,
    },
}

impl StoreError {
    /// Creates a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::MissingRow { .. } => "MISSING_ROW",
            Self::Corrupt { .. } => "CORRUPT_ROW",
        }
    }
}
