//! Integration tests for the query tool.
//!
//! These tests need a live PostgreSQL database. Set TEST_DATABASE_URL (or
//! DATABASE_URL) to run them; they are skipped otherwise.

use pg_mcp_server::tools::{QueryInput, QueryToolHandler};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;
    PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .ok()
}

fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", rand::random::<u32>())
}

#[tokio::test]
async fn test_select_one_round_trip() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = QueryToolHandler::new(pool);

    let result = handler
        .run(QueryInput {
            query: "SELECT 1 AS x".to_string(),
        })
        .await
        .expect("query should succeed");

    assert_eq!(result.is_error, Some(false));
    assert_eq!(
        result.structured_content,
        Some(serde_json::json!([{"x": 1}]))
    );
}

#[tokio::test]
async fn test_empty_result_returns_empty_sequence() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = QueryToolHandler::new(pool);

    let result = handler
        .run(QueryInput {
            query: "SELECT 1 AS x WHERE false".to_string(),
        })
        .await
        .expect("query should succeed");

    // empty sequence, never a null/absent payload
    assert_eq!(result.structured_content, Some(serde_json::json!([])));
}

#[tokio::test]
async fn test_heterogeneous_row_values() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = QueryToolHandler::new(pool);

    let result = handler
        .run(QueryInput {
            query: "SELECT 1 AS n, 'a' AS s, true AS b, 1.5::float8 AS f, NULL::text AS missing"
                .to_string(),
        })
        .await
        .expect("query should succeed");

    assert_eq!(
        result.structured_content,
        Some(serde_json::json!([{
            "n": 1,
            "s": "a",
            "b": true,
            "f": 1.5,
            "missing": null
        }]))
    );
}

#[tokio::test]
async fn test_duplicate_column_names_last_write_wins() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = QueryToolHandler::new(pool);

    let result = handler
        .run(QueryInput {
            query: "SELECT 1 AS x, 2 AS x".to_string(),
        })
        .await
        .expect("query should succeed");

    assert_eq!(
        result.structured_content,
        Some(serde_json::json!([{"x": 2}]))
    );
}

#[tokio::test]
async fn test_invalid_sql_returns_error_flagged_result() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = QueryToolHandler::new(pool);

    let result = handler
        .run(QueryInput {
            query: "SELEC 1".to_string(),
        })
        .await
        .expect("fault must not propagate as an error");

    assert_eq!(result.is_error, Some(true));
    let text = result.content[0].as_text().expect("text content");
    assert!(text.text.starts_with("Query error: "));
    assert!(text.text.len() > "Query error: ".len());
}

#[tokio::test]
async fn test_query_tool_can_mutate_data() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let table = unique("query_tool_writes");
    sqlx::query(&format!("CREATE TABLE {table} (id int)"))
        .execute(&pool)
        .await
        .expect("create table");

    // no implicit transaction: the write must take effect
    let handler = QueryToolHandler::new(pool.clone());
    let result = handler
        .run(QueryInput {
            query: format!("INSERT INTO {table} VALUES (1), (2)"),
        })
        .await
        .expect("insert should succeed");
    assert_eq!(result.is_error, Some(false));

    let count: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM {table}"))
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(count, 2);

    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(&pool)
        .await
        .expect("drop table");
}
