//! MCP tool implementations.
//!
//! This module contains all database tool handlers:
//! - `query`: Execute arbitrary SQL and return marshaled rows
//! - `explain_analyze`: Guarded EXPLAIN inside an always-rolled-back transaction
//! - `schema`: Catalog introspection (list_tables, get_table_schema,
//!   get_table_constraints, get_table_indexes)
//! - `envelope`: Uniform success/error result shape for the transport harness

pub mod envelope;
pub mod explain;
pub mod query;
pub mod schema;

pub use explain::{ExplainFormat, ExplainInput, ExplainOptions, ExplainToolHandler};
pub use query::{QueryInput, QueryToolHandler};
pub use schema::{ListTablesInput, SchemaToolHandler, TableTarget};
