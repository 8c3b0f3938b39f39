//! Guarded query-plan tool.
//!
//! This module implements the `explain_analyze` MCP tool. EXPLAIN ANALYZE
//! actually executes the target statement to gather timing and row
//! statistics, so the statement runs inside a transaction that is rolled
//! back on every exit path - success, fault, or early return. That makes the
//! tool safe to point at INSERT/UPDATE/DELETE statements on live data.

use crate::db::marshal_rows;
use crate::db::row::RawText;
use crate::error::{DbError, DbResult};
use crate::tools::envelope;
use futures_util::TryStreamExt;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map as JsonMap, Value as JsonValue};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::fmt;
use tracing::{debug, warn};

/// EXPLAIN output format. Anything unrecognized coerces to json.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExplainFormat {
    Text,
    #[default]
    Json,
    Xml,
    Yaml,
}

impl ExplainFormat {
    /// Parse a caller-supplied format string. Missing, empty, or
    /// unrecognized values fall back to json.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("text") => Self::Text,
            Some("json") => Self::Json,
            Some("xml") => Self::Xml,
            Some("yaml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

impl fmt::Display for ExplainFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
        };
        write!(f, "{s}")
    }
}

/// Input for the explain_analyze tool.
///
/// Every flag is tri-state: `None` means the caller omitted the key and the
/// default applies; `Some(false)` is an explicit choice and is honored.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExplainInput {
    /// SQL query to explain and analyze
    pub query: String,
    /// Run ANALYZE to get actual execution statistics (default: true)
    #[serde(default)]
    pub analyze: Option<bool>,
    /// Include verbose output with additional details (default: false)
    #[serde(default)]
    pub verbose: Option<bool>,
    /// Include estimated startup and total costs (default: true)
    #[serde(default)]
    pub costs: Option<bool>,
    /// Include buffer usage statistics (default: false)
    #[serde(default)]
    pub buffers: Option<bool>,
    /// Include actual timing information (default: true; only applies when analyze is true)
    #[serde(default)]
    pub timing: Option<bool>,
    /// Include summary information (default: true)
    #[serde(default)]
    pub summary: Option<bool>,
    /// Output format: text, json, xml, or yaml (default: json)
    #[serde(default)]
    pub format: Option<String>,
}

/// Fully-resolved EXPLAIN options after the presence-aware merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainOptions {
    pub analyze: bool,
    pub verbose: bool,
    pub costs: bool,
    pub buffers: bool,
    pub timing: bool,
    pub summary: bool,
    pub format: ExplainFormat,
}

impl ExplainOptions {
    /// Merge caller-supplied flags with defaults. Defaults apply only to
    /// fields the caller omitted entirely.
    pub fn resolve(input: &ExplainInput) -> Self {
        Self {
            analyze: input.analyze.unwrap_or(true),
            costs: input.costs.unwrap_or(true),
            timing: input.timing.unwrap_or(true),
            summary: input.summary.unwrap_or(true),
            buffers: input.buffers.unwrap_or(false),
            verbose: input.verbose.unwrap_or(false),
            format: ExplainFormat::parse(input.format.as_deref()),
        }
    }

    /// Assemble the option clause. Order is fixed: ANALYZE, COSTS, SUMMARY,
    /// FORMAT, then VERBOSE and BUFFERS only when enabled. TIMING is invalid
    /// without ANALYZE, so it is appended only when analyze is on (rather
    /// than set to false).
    pub fn clause(&self) -> String {
        let mut options = vec![
            format!("ANALYZE {}", self.analyze),
            format!("COSTS {}", self.costs),
            format!("SUMMARY {}", self.summary),
            format!("FORMAT {}", self.format),
        ];

        if self.verbose {
            options.push("VERBOSE true".to_string());
        }
        if self.buffers {
            options.push("BUFFERS true".to_string());
        }
        if self.analyze {
            options.push(format!("TIMING {}", self.timing));
        }

        options.join(", ")
    }
}

/// What one explain run produced, before enveloping.
enum ExplainPayload {
    Rows(Vec<JsonMap<String, JsonValue>>),
    Text(String),
}

/// Handler for the explain_analyze tool.
pub struct ExplainToolHandler {
    pool: PgPool,
}

impl ExplainToolHandler {
    /// Create a new explain tool handler.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Handle the explain_analyze tool call.
    pub async fn run(&self, input: ExplainInput) -> DbResult<CallToolResult> {
        let options = ExplainOptions::resolve(&input);
        let explain_sql = format!("EXPLAIN ({}) {}", options.clause(), input.query);
        debug!(sql = %explain_sql, "Running explain");

        let mut tx = self.pool.begin().await?;
        let outcome = Self::execute(&mut tx, &explain_sql, options.format).await;

        // Best-effort cleanup: a rollback failure is not surfaced to the
        // caller. Early returns above drop the transaction, which also
        // rolls back.
        if let Err(e) = tx.rollback().await {
            warn!(error = %e, "Rollback after explain failed");
        }

        match outcome {
            Ok(ExplainPayload::Rows(rows)) => envelope::json_reply(&rows),
            Ok(ExplainPayload::Text(text)) => Ok(envelope::text_reply(text)),
            Err(err) if err.is_query_fault() => {
                Ok(envelope::fault_reply("EXPLAIN error", &err))
            }
            Err(err) => Err(err),
        }
    }

    /// Run the EXPLAIN statement inside the transaction and shape its output.
    async fn execute(
        tx: &mut Transaction<'static, Postgres>,
        explain_sql: &str,
        format: ExplainFormat,
    ) -> DbResult<ExplainPayload> {
        let rows = sqlx::query(explain_sql)
            .fetch(&mut **tx)
            .try_collect::<Vec<PgRow>>()
            .await?;

        if format == ExplainFormat::Json {
            return Ok(ExplainPayload::Rows(marshal_rows(&rows)?));
        }

        // text/xml/yaml plans arrive as one text-ish column per line
        let mut output = String::new();
        for row in &rows {
            let line: RawText = row
                .try_get(0)
                .map_err(|e| DbError::scan("0", e.to_string()))?;
            output.push_str(&line.0);
            output.push('\n');
        }
        Ok(ExplainPayload::Text(output))
    }
}
