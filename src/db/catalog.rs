//! Fixed catalog introspection queries.
//!
//! These statements query the standard system catalogs only, never user
//! tables, so they are read-only by construction and need no transactional
//! wrapping. The `information_schema` columns are cast to concrete types in
//! the SQL because their declared domain types (`sql_identifier`,
//! `cardinal_number`, ...) do not decode directly.

use crate::error::DbResult;
use schemars::JsonSchema;
use serde::Serialize;
use sqlx::{PgPool, Row};

/// Resolve the effective schema name; empty or omitted means `public`.
pub fn schema_or_default(schema: &str) -> &str {
    if schema.is_empty() { "public" } else { schema }
}

const LIST_TABLES_SQL: &str = r#"
    SELECT table_name::text, table_type::text
    FROM information_schema.tables
    WHERE table_schema = $1
    ORDER BY table_name
"#;

const TABLE_COLUMNS_SQL: &str = r#"
    SELECT
        column_name::text,
        data_type::text,
        character_maximum_length::int,
        is_nullable::text,
        column_default::text
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    ORDER BY ordinal_position
"#;

// Outer joins so a single constraint row may carry foreign-key target and
// check-clause fields at the same time; every secondary field is nullable.
const TABLE_CONSTRAINTS_SQL: &str = r#"
    SELECT
        tc.constraint_name::text,
        tc.constraint_type::text,
        kcu.column_name::text,
        ccu.table_name::text AS foreign_table_name,
        ccu.column_name::text AS foreign_column_name,
        rc.update_rule::text,
        rc.delete_rule::text,
        cc.check_clause::text
    FROM information_schema.table_constraints tc
    LEFT JOIN information_schema.key_column_usage kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
    LEFT JOIN information_schema.constraint_column_usage ccu
        ON tc.constraint_name = ccu.constraint_name
        AND tc.table_schema = ccu.table_schema
    LEFT JOIN information_schema.referential_constraints rc
        ON tc.constraint_name = rc.constraint_name
        AND tc.table_schema = rc.constraint_schema
    LEFT JOIN information_schema.check_constraints cc
        ON tc.constraint_name = cc.constraint_name
        AND tc.table_schema = cc.constraint_schema
    WHERE tc.table_schema = $1 AND tc.table_name = $2
    ORDER BY tc.constraint_type, tc.constraint_name, kcu.ordinal_position
"#;

// Expands each index into one row per indexed column via a lateral
// cross-product over the index's attribute count. The pg_class join matches
// on index name alone, as the original did; see DESIGN.md.
const TABLE_INDEXES_SQL: &str = r#"
    SELECT
        i.indexname::text,
        i.indexdef::text,
        a.amname::text AS index_type,
        idx.indisunique AS is_unique,
        idx.indisprimary AS is_primary,
        pg_get_indexdef(idx.indexrelid, k + 1, true) AS column_name,
        k::int AS column_position
    FROM pg_indexes i
    JOIN pg_class c ON c.relname = i.indexname
    JOIN pg_index idx ON idx.indexrelid = c.oid
    JOIN pg_am a ON a.oid = c.relam
    CROSS JOIN LATERAL generate_series(0, idx.indnatts - 1) AS k
    WHERE i.schemaname = $1 AND i.tablename = $2
    ORDER BY i.indexname, k
"#;

/// A table or view visible in a schema.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TableEntry {
    pub table_name: String,
    /// "BASE TABLE" or "VIEW"
    pub table_type: String,
}

/// One column definition of a table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnEntry {
    pub column_name: String,
    pub data_type: String,
    /// "YES" or "NO", as reported by the catalog
    pub is_nullable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One constraint row. Secondary fields are present-or-absent independently:
/// a foreign-key row carries the foreign_* fields, a check-constraint row
/// carries check_clause, and neither implies the other.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConstraintEntry {
    pub constraint_name: String,
    /// PRIMARY KEY, FOREIGN KEY, UNIQUE, or CHECK
    pub constraint_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_column_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_clause: Option<String>,
}

/// One indexed column of one index.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct IndexEntry {
    pub index_name: String,
    /// Access method: btree, hash, gin, ...
    pub index_type: String,
    pub is_unique: bool,
    pub is_primary: bool,
    pub column_name: String,
    /// Zero-based position of the column within the index
    pub column_position: i32,
    pub index_definition: String,
}

/// Executes the fixed catalog queries against a borrowed pool.
pub struct CatalogInspector<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogInspector<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all tables and views in a schema, ordered by name.
    pub async fn list_tables(&self, schema: &str) -> DbResult<Vec<TableEntry>> {
        let rows = sqlx::query(LIST_TABLES_SQL)
            .bind(schema_or_default(schema))
            .fetch_all(self.pool)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            tables.push(TableEntry {
                table_name: row.try_get(0)?,
                table_type: row.try_get(1)?,
            });
        }
        Ok(tables)
    }

    /// Column definitions for one table, in ordinal order.
    pub async fn table_columns(&self, schema: &str, table: &str) -> DbResult<Vec<ColumnEntry>> {
        let rows = sqlx::query(TABLE_COLUMNS_SQL)
            .bind(schema_or_default(schema))
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(ColumnEntry {
                column_name: row.try_get(0)?,
                data_type: row.try_get(1)?,
                max_length: row.try_get(2)?,
                is_nullable: row.try_get(3)?,
                default: row.try_get(4)?,
            });
        }
        Ok(columns)
    }

    /// All constraints on one table, outer-joined across the key-usage,
    /// referential, and check-constraint catalogs.
    pub async fn table_constraints(
        &self,
        schema: &str,
        table: &str,
    ) -> DbResult<Vec<ConstraintEntry>> {
        let rows = sqlx::query(TABLE_CONSTRAINTS_SQL)
            .bind(schema_or_default(schema))
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        let mut constraints = Vec::with_capacity(rows.len());
        for row in &rows {
            constraints.push(ConstraintEntry {
                constraint_name: row.try_get(0)?,
                constraint_type: row.try_get(1)?,
                column_name: row.try_get(2)?,
                foreign_table_name: row.try_get(3)?,
                foreign_column_name: row.try_get(4)?,
                update_rule: row.try_get(5)?,
                delete_rule: row.try_get(6)?,
                check_clause: row.try_get(7)?,
            });
        }
        Ok(constraints)
    }

    /// All indexes on one table, one row per indexed column, ordered by
    /// index name then column ordinal.
    pub async fn table_indexes(&self, schema: &str, table: &str) -> DbResult<Vec<IndexEntry>> {
        let rows = sqlx::query(TABLE_INDEXES_SQL)
            .bind(schema_or_default(schema))
            .bind(table)
            .fetch_all(self.pool)
            .await?;

        let mut indexes = Vec::with_capacity(rows.len());
        for row in &rows {
            indexes.push(IndexEntry {
                index_name: row.try_get(0)?,
                index_definition: row.try_get(1)?,
                index_type: row.try_get(2)?,
                is_unique: row.try_get(3)?,
                is_primary: row.try_get(4)?,
                column_name: row.try_get(5)?,
                column_position: row.try_get(6)?,
            });
        }
        Ok(indexes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_or_default_empty() {
        assert_eq!(schema_or_default(""), "public");
    }

    #[test]
    fn test_schema_or_default_explicit() {
        assert_eq!(schema_or_default("public"), "public");
        assert_eq!(schema_or_default("analytics"), "analytics");
    }

    #[test]
    fn test_constraint_entry_skips_absent_fields() {
        let entry = ConstraintEntry {
            constraint_name: "users_pkey".to_string(),
            constraint_type: "PRIMARY KEY".to_string(),
            column_name: Some("id".to_string()),
            foreign_table_name: None,
            foreign_column_name: None,
            update_rule: None,
            delete_rule: None,
            check_clause: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["column_name"], "id");
        assert!(json.get("foreign_table_name").is_none());
        assert!(json.get("check_clause").is_none());
    }

    #[test]
    fn test_column_entry_serializes_optional_fields_when_present() {
        let entry = ColumnEntry {
            column_name: "email".to_string(),
            data_type: "character varying".to_string(),
            is_nullable: "NO".to_string(),
            max_length: Some(100),
            default: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["max_length"], 100);
        assert!(json.get("default").is_none());
    }
}
