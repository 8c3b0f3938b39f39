//! Integration tests for the explain_analyze tool.
//!
//! These tests need a live PostgreSQL database. Set TEST_DATABASE_URL (or
//! DATABASE_URL) to run them; they are skipped otherwise.

use pg_mcp_server::tools::{ExplainInput, ExplainToolHandler};
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

/// Explain input with every optional field omitted.
fn explain_input(query: impl Into<String>) -> ExplainInput {
    serde_json::from_value(serde_json::json!({ "query": query.into() }))
        .expect("valid explain input")
}

/// Create a scratch table seeded with three rows; returns its name.
async fn seeded_table(pool: &PgPool) -> String {
    let table = unique("explain_scratch");
    sqlx::query(&format!(
        "CREATE TABLE {table} (id serial PRIMARY KEY, name text)"
    ))
    .execute(pool)
    .await
    .expect("create table");
    sqlx::query(&format!(
        "INSERT INTO {table} (name) VALUES ('a'), ('b'), ('c')"
    ))
    .execute(pool)
    .await
    .expect("seed rows");
    table
}

async fn row_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT count(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("count")
}

async fn drop_table(pool: &PgPool, table: &str) {
    sqlx::query(&format!("DROP TABLE {table}"))
        .execute(pool)
        .await
        .expect("drop table");
}

#[tokio::test]
async fn test_default_settings_return_plan_rows() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let result = handler
        .run(explain_input("SELECT 1"))
        .await
        .expect("explain should succeed");

    assert_eq!(result.is_error, Some(false));
    let rows = result.structured_content.expect("structured rows");
    let rows = rows.as_array().expect("row sequence");
    assert!(!rows.is_empty());
    // FORMAT json yields a single QUERY PLAN column holding the plan array
    assert!(rows[0].get("QUERY PLAN").is_some());
}

#[tokio::test]
async fn test_unrecognized_format_falls_back_to_rows() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let mut input = explain_input("SELECT 1");
    input.format = Some("markdown".to_string());
    let result = handler.run(input).await.expect("explain should succeed");

    // coerced to json: a row sequence, not a text blob
    assert!(result.structured_content.is_some());
}

#[tokio::test]
async fn test_text_format_returns_joined_lines() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let mut input = explain_input("SELECT 1");
    input.format = Some("text".to_string());
    let result = handler.run(input).await.expect("explain should succeed");

    assert!(result.structured_content.is_none());
    let text = result.content[0].as_text().expect("text content");
    assert!(!text.text.is_empty());
    assert!(text.text.ends_with('\n'));
}

#[tokio::test]
async fn test_xml_format_returns_text_payload() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let mut input = explain_input("SELECT 1");
    input.format = Some("xml".to_string());
    let result = handler.run(input).await.expect("explain should succeed");

    let text = result.content[0].as_text().expect("text content");
    assert!(text.text.contains("<explain"));
}

#[tokio::test]
async fn test_analyze_false_produces_estimates_only() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let mut input = explain_input("SELECT 1");
    input.analyze = Some(false);
    input.format = Some("text".to_string());
    let result = handler.run(input).await.expect("explain should succeed");

    let text = result.content[0].as_text().expect("text content");
    assert!(!text.text.contains("actual time"));
}

#[tokio::test]
async fn test_insert_is_rolled_back() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let table = seeded_table(&pool).await;
    let handler = ExplainToolHandler::new(pool.clone());

    // ANALYZE actually executes the insert; the wrapping transaction must
    // undo it
    let result = handler
        .run(explain_input(format!(
            "INSERT INTO {table} (name) VALUES ('d')"
        )))
        .await
        .expect("explain should succeed");
    assert_eq!(result.is_error, Some(false));

    assert_eq!(row_count(&pool, &table).await, 3);
    drop_table(&pool, &table).await;
}

#[tokio::test]
async fn test_update_is_rolled_back() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let table = seeded_table(&pool).await;
    let handler = ExplainToolHandler::new(pool.clone());

    handler
        .run(explain_input(format!("UPDATE {table} SET name = 'zzz'")))
        .await
        .expect("explain should succeed");

    let changed: i64 = sqlx::query_scalar(&format!(
        "SELECT count(*) FROM {table} WHERE name = 'zzz'"
    ))
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(changed, 0);
    drop_table(&pool, &table).await;
}

#[tokio::test]
async fn test_delete_is_rolled_back() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let table = seeded_table(&pool).await;
    let handler = ExplainToolHandler::new(pool.clone());

    handler
        .run(explain_input(format!("DELETE FROM {table}")))
        .await
        .expect("explain should succeed");

    assert_eq!(row_count(&pool, &table).await, 3);
    drop_table(&pool, &table).await;
}

#[tokio::test]
async fn test_invalid_sql_returns_error_flagged_result() {
    let Some(pool) = test_pool().await else {
        eprintln!("skipping: TEST_DATABASE_URL not set");
        return;
    };
    let handler = ExplainToolHandler::new(pool);

    let result = handler
        .run(explain_input("SELEC * FROM nowhere"))
        .await
        .expect("fault must not propagate as an error");

    assert_eq!(result.is_error, Some(true));
    let text = result.content[0].as_text().expect("text content");
    assert!(text.text.starts_with("EXPLAIN error: "));
}
