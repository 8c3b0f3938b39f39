//! MCP service implementation using rmcp.
//!
//! This module defines the PgService struct with all database tools
//! exposed via the MCP protocol using the rmcp framework's macros. The
//! connection pool is injected at construction and handed to each tool
//! handler; there is no global pool.

use crate::tools::explain::{ExplainInput, ExplainToolHandler};
use crate::tools::query::{QueryInput, QueryToolHandler};
use crate::tools::schema::{ListTablesInput, SchemaToolHandler, TableTarget};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgService {
    /// Shared connection pool for all database operations
    pool: PgPool,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl PgService {
    /// Create a new PgService instance backed by the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl PgService {
    #[tool(
        description = "Execute a SQL query against the PostgreSQL database and return results as JSON"
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        QueryToolHandler::new(self.pool.clone())
            .run(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(description = "List all tables in the specified schema (default: public)")]
    async fn list_tables(
        &self,
        Parameters(input): Parameters<ListTablesInput>,
    ) -> Result<CallToolResult, McpError> {
        SchemaToolHandler::new(self.pool.clone())
            .list_tables(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get the schema information (columns, data types, etc.) for a specific table"
    )]
    async fn get_table_schema(
        &self,
        Parameters(input): Parameters<TableTarget>,
    ) -> Result<CallToolResult, McpError> {
        SchemaToolHandler::new(self.pool.clone())
            .get_table_schema(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get all constraints (primary key, foreign key, unique, check) for a specific table"
    )]
    async fn get_table_constraints(
        &self,
        Parameters(input): Parameters<TableTarget>,
    ) -> Result<CallToolResult, McpError> {
        SchemaToolHandler::new(self.pool.clone())
            .get_table_constraints(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get all indexes for a specific table including index type and columns"
    )]
    async fn get_table_indexes(
        &self,
        Parameters(input): Parameters<TableTarget>,
    ) -> Result<CallToolResult, McpError> {
        SchemaToolHandler::new(self.pool.clone())
            .get_table_indexes(input)
            .await
            .map_err(McpError::from)
    }

    #[tool(
        description = "Run EXPLAIN ANALYZE on a query to get the query execution plan and performance metrics.\nSupports options for analyze, verbose, costs, buffers, timing, summary, and output format (text, json, xml, yaml).\nThe statement runs inside a transaction that is always rolled back, so it is safe on writes."
    )]
    async fn explain_analyze(
        &self,
        Parameters(input): Parameters<ExplainInput>,
    ) -> Result<CallToolResult, McpError> {
        ExplainToolHandler::new(self.pool.clone())
            .run(input)
            .await
            .map_err(McpError::from)
    }
}

#[tool_handler]
impl ServerHandler for PgService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pg-mcp-server".to_owned(),
                title: Some("PostgreSQL MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for querying and inspecting a PostgreSQL database.\n\
                \n\
                ## Workflow\n\
                1. Call `list_tables` to discover tables (optionally pass `schema`; default is `public`)\n\
                2. Inspect a table with `get_table_schema`, `get_table_constraints`, `get_table_indexes`\n\
                3. Run SQL with `query`; results come back as JSON rows\n\
                4. Use `explain_analyze` to profile a statement - it runs inside a transaction\n\
                   that is always rolled back, so INSERT/UPDATE/DELETE statements leave no trace\n\
                \n\
                ## Errors\n\
                `query` and `explain_analyze` return error-flagged results carrying the\n\
                database's own message when a statement fails; read the message and adjust\n\
                the SQL rather than retrying verbatim."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pg_service_get_info_lists_tools_capability() {
        let pool = PgPool::connect_lazy("postgres://localhost/unused")
            .expect("lazy pool construction should not fail");
        let service = PgService::new(pool);
        let info = service.get_info();

        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "pg-mcp-server");
    }
}
