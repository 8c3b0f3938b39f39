//! Free-form query execution tool.
//!
//! This module implements the `query` MCP tool. It executes whatever SQL the
//! caller supplies directly against the pool - no implicit transaction, no
//! rollback - so statements that mutate data take effect. This is the
//! general-purpose escape hatch; the guard-railing lives in the explain tool.

use crate::db::marshal_rows;
use crate::error::{DbError, DbResult};
use crate::tools::envelope;
use futures_util::TryStreamExt;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgRow;
use tracing::{debug, info};

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL query to execute
    pub query: String,
}

/// Handler for the query tool.
pub struct QueryToolHandler {
    pool: PgPool,
}

impl QueryToolHandler {
    /// Create a new query tool handler.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Handle the query tool call.
    ///
    /// Engine-reported execution faults (malformed SQL, constraint
    /// violations, permission denials) come back as error-flagged results so
    /// the caller can read the message; scan and iteration faults abort the
    /// invocation.
    pub async fn run(&self, input: QueryInput) -> DbResult<CallToolResult> {
        debug!(sql = %input.query, "Executing query");

        let fetched = sqlx::query(&input.query)
            .fetch(&self.pool)
            .try_collect::<Vec<PgRow>>()
            .await;

        let rows = match fetched {
            Ok(rows) => rows,
            Err(e) => {
                let err = DbError::from(e);
                if err.is_query_fault() {
                    return Ok(envelope::fault_reply("Query error", &err));
                }
                return Err(err);
            }
        };

        let records = marshal_rows(&rows)?;
        info!(row_count = records.len(), "Query executed");
        envelope::json_reply(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_input_deserialization() {
        let json = r#"{"query": "SELECT * FROM users"}"#;
        let input: QueryInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.query, "SELECT * FROM users");
    }

    #[test]
    fn test_query_input_rejects_missing_query() {
        let result = serde_json::from_str::<QueryInput>("{}");
        assert!(result.is_err());
    }
}
