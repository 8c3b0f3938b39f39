//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool construction and liveness checks
//! - Row marshaling into generic JSON-shaped records
//! - Fixed catalog introspection queries

pub mod catalog;
pub mod pool;
pub mod row;

pub use catalog::{CatalogInspector, schema_or_default};
pub use row::{CellValue, marshal_rows};
