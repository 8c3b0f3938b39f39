//! Catalog introspection tools.
//!
//! This module implements the `list_tables`, `get_table_schema`,
//! `get_table_constraints`, and `get_table_indexes` MCP tools. All four are
//! thin wrappers over the fixed catalog queries; faults here are hard errors
//! since the SQL text is ours, not the caller's.

use crate::db::CatalogInspector;
use crate::error::DbResult;
use crate::tools::envelope;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

/// Input for the list_tables tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesInput {
    /// Schema name (default: public)
    #[serde(default)]
    pub schema: Option<String>,
}

/// Input shared by the table-scoped introspection tools.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TableTarget {
    /// Name of the table
    pub table_name: String,
    /// Schema name (default: public)
    #[serde(default)]
    pub schema: Option<String>,
}

impl TableTarget {
    fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or("")
    }
}

/// Handler for the catalog introspection tools.
pub struct SchemaToolHandler {
    pool: PgPool,
}

impl SchemaToolHandler {
    /// Create a new schema tool handler.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all tables and views in a schema.
    pub async fn list_tables(&self, input: ListTablesInput) -> DbResult<CallToolResult> {
        let inspector = CatalogInspector::new(&self.pool);
        let tables = inspector
            .list_tables(input.schema.as_deref().unwrap_or(""))
            .await?;

        info!(count = tables.len(), "Listed tables");
        envelope::json_reply(&tables)
    }

    /// Get column definitions for a table.
    pub async fn get_table_schema(&self, input: TableTarget) -> DbResult<CallToolResult> {
        let inspector = CatalogInspector::new(&self.pool);
        let columns = inspector
            .table_columns(input.schema(), &input.table_name)
            .await?;

        info!(
            table = %input.table_name,
            count = columns.len(),
            "Fetched table schema"
        );
        envelope::json_reply(&columns)
    }

    /// Get all constraints for a table.
    pub async fn get_table_constraints(&self, input: TableTarget) -> DbResult<CallToolResult> {
        let inspector = CatalogInspector::new(&self.pool);
        let constraints = inspector
            .table_constraints(input.schema(), &input.table_name)
            .await?;

        info!(
            table = %input.table_name,
            count = constraints.len(),
            "Fetched table constraints"
        );
        envelope::json_reply(&constraints)
    }

    /// Get all indexes for a table, one row per indexed column.
    pub async fn get_table_indexes(&self, input: TableTarget) -> DbResult<CallToolResult> {
        let inspector = CatalogInspector::new(&self.pool);
        let indexes = inspector
            .table_indexes(input.schema(), &input.table_name)
            .await?;

        info!(
            table = %input.table_name,
            count = indexes.len(),
            "Fetched table indexes"
        );
        envelope::json_reply(&indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tables_input_schema_optional() {
        let input: ListTablesInput = serde_json::from_str("{}").unwrap();
        assert!(input.schema.is_none());

        let input: ListTablesInput =
            serde_json::from_str(r#"{"schema": "analytics"}"#).unwrap();
        assert_eq!(input.schema.as_deref(), Some("analytics"));
    }

    #[test]
    fn test_table_target_requires_table_name() {
        assert!(serde_json::from_str::<TableTarget>(r#"{"schema": "public"}"#).is_err());

        let target: TableTarget =
            serde_json::from_str(r#"{"table_name": "users"}"#).unwrap();
        assert_eq!(target.table_name, "users");
        assert_eq!(target.schema(), "");
    }
}
