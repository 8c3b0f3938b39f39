//! Error types for the PostgreSQL MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! The taxonomy separates engine-reported query faults (which the `query` and
//! `explain_analyze` tools surface to the caller as error-flagged results) from
//! hard faults that propagate to the MCP harness as protocol-level errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    /// Error reported by the database engine while executing a statement:
    /// malformed SQL, constraint violations, permission denials. Recoverable
    /// at the tool layer.
    #[error("{message}{}", match .sql_state { Some(code) => format!(" (SQLSTATE {code})"), None => String::new() })]
    Query {
        message: String,
        /// e.g., "42601" for a syntax error
        sql_state: Option<String>,
    },

    /// A row failed to decode into the in-memory value domain.
    #[error("Failed to scan row: column '{column}': {message}")]
    Scan { column: String, message: String },

    /// The cursor reported a fault after rows were already consumed.
    #[error("Row iteration error: {message}")]
    Iteration { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create an engine-reported query fault.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a scan error for a specific column.
    pub fn scan(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scan {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a cursor iteration error.
    pub fn iteration(message: impl Into<String>) -> Self {
        Self::Iteration {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for faults the engine reported about the statement itself.
    ///
    /// These are returned to the calling agent as error-flagged tool results
    /// so it can read the engine's message; everything else aborts the tool
    /// invocation.
    pub fn is_query_fault(&self) -> bool {
        matches!(self, Self::Query { .. })
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check the connection string format and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            sqlx::Error::PoolTimedOut => DbError::connection(
                "Timed out acquiring a connection from the pool",
                "Check for long-running statements holding connections",
            ),
            sqlx::Error::PoolClosed => {
                DbError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::scan(index, source.to_string())
            }
            sqlx::Error::Decode(source) => DbError::scan("<unknown>", source.to_string()),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::internal(format!("Type not found: {}", type_name))
            }
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Convert DbError to MCP ErrorData for protocol-level failures.
///
/// Query faults normally never reach this conversion (the query and explain
/// tools convert them to error-flagged results first); when one does, it is
/// reported as invalid params since the statement text came from the caller.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::Query { .. } => rmcp::ErrorData::invalid_params(err.to_string(), None),
            DbError::InvalidInput { .. } => rmcp::ErrorData::invalid_params(err.to_string(), None),
            DbError::Connection { suggestion, .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                Some(serde_json::json!({ "suggestion": suggestion })),
            ),
            DbError::Scan { .. } | DbError::Iteration { .. } | DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), None)
            }
        }
    }
}
