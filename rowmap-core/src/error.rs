//! Error types for rowmap

use thiserror::Error;

/// Boxed error reported by a connection or transaction implementation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for rowmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Error reported by the connection collaborator, passed through unchanged
    #[error("Database error: {0}")]
    Database(#[source] BoxError),

    /// SQL generation error
    #[error("SQL generation error: {message}")]
    SqlGeneration { message: String },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A terminal operation needs a table and none was bound or derivable
    #[error("No table bound to query")]
    NoTableBound,

    /// A single-row lookup matched nothing
    #[error("No rows found: {what}")]
    NotFound { what: String },

    /// An UPDATE executed successfully but matched no rows
    #[error("Update on '{table}' affected 0 rows")]
    RowsAffectedZero { table: String },

    /// The next id could not be read from the table's sequence
    #[error("Failed to fetch next value from sequence '{sequence}': {source}")]
    SequenceFetchFailed {
        sequence: String,
        #[source]
        source: Box<Error>,
    },

    /// A column's text could not be converted to the field's declared type
    #[error("Cannot convert column '{column}' value '{value}' to {target}")]
    Coercion {
        column: String,
        value: String,
        target: &'static str,
    },

    /// Commit, rollback or a locking read was requested without a bound transaction
    #[error("No transaction bound to query")]
    NoTransaction,
}

/// Convenience Result type for rowmap operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error coming from the connection collaborator
    pub fn database(source: impl Into<BoxError>) -> Self {
        Self::Database(source.into())
    }

    /// Create a new SQL generation error
    pub fn sql_generation(message: impl Into<String>) -> Self {
        Self::SqlGeneration {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn rows_affected_zero(table: impl Into<String>) -> Self {
        Self::RowsAffectedZero {
            table: table.into(),
        }
    }

    pub fn sequence_fetch_failed(sequence: impl Into<String>, source: Error) -> Self {
        Self::SequenceFetchFailed {
            sequence: sequence.into(),
            source: Box::new(source),
        }
    }

    /// Create a new coercion error for a column value
    pub fn coercion(
        column: impl Into<String>,
        value: impl Into<String>,
        target: &'static str,
    ) -> Self {
        Self::Coercion {
            column: column.into(),
            value: value.into(),
            target,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_rows_affected_zero(&self) -> bool {
        matches!(self, Self::RowsAffectedZero { .. })
    }
}
