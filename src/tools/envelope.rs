//! Uniform result envelope for tool output.
//!
//! Successful payloads become a text content block (pretty-printed JSON or
//! raw text) paired with a structured side channel for programmatic
//! consumers. Engine-reported statement faults become the same shape flagged
//! as an error, carrying the engine's message, so the calling agent can read
//! why a statement failed instead of the whole session aborting.

use crate::error::{DbError, DbResult};
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Wrap a JSON-shaped payload: pretty-printed text content plus the value
/// itself as structured content.
pub fn json_reply<T: Serialize>(data: &T) -> DbResult<CallToolResult> {
    let value = serde_json::to_value(data)
        .map_err(|e| DbError::internal(format!("Failed to marshal results: {e}")))?;
    let pretty = serde_json::to_string_pretty(&value)
        .map_err(|e| DbError::internal(format!("Failed to marshal results: {e}")))?;

    let mut reply = CallToolResult::success(vec![Content::text(pretty)]);
    reply.structured_content = Some(value);
    Ok(reply)
}

/// Wrap a raw text payload (non-JSON explain output).
pub fn text_reply(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Wrap a recoverable statement fault as an error-flagged result.
///
/// This is a *successful* tool reply at the protocol level; only the flag and
/// the engine's message distinguish it.
pub fn fault_reply(prefix: &str, err: &DbError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("{prefix}: {err}"))])
}
