//! Row marshaling into generic JSON-shaped records.
//!
//! A result cursor yields heterogeneous, engine-typed rows; this module
//! converts them into ordered name/value records suitable for JSON
//! serialization. Column values pass through [`CellValue`], a closed variant
//! type over the open Postgres value domain, so the serializer is exhaustive
//! rather than relying on runtime type inspection.

use crate::error::{DbError, DbResult};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};
use uuid::Uuid;

/// In-memory value domain for a single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Bytes(Vec<u8>),
    /// json/jsonb columns, carried through as-is.
    Nested(JsonValue),
}

impl From<CellValue> for JsonValue {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Null => JsonValue::Null,
            CellValue::Bool(b) => JsonValue::Bool(b),
            CellValue::Int(v) => JsonValue::Number(v.into()),
            CellValue::Float(v) => serde_json::Number::from_f64(v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            CellValue::Text(s) => JsonValue::String(s),
            CellValue::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
            CellValue::Bytes(bytes) => decode_binary_value(&bytes),
            CellValue::Nested(v) => v,
        }
    }
}

/// Decode binary data to a JSON value.
///
/// Attempts UTF-8 text first, falling back to base64 encoding.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

/// Text-format passthrough for columns whose declared type is not decodable
/// as `String` by sqlx (e.g. the `xml` rows EXPLAIN emits). The wire bytes of
/// these types are plain UTF-8, so they are read as text directly.
#[derive(Debug)]
pub struct RawText(pub String);

impl Type<sqlx::Postgres> for RawText {
    fn type_info() -> PgTypeInfo {
        <String as Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

impl<'r> Decode<'r, sqlx::Postgres> for RawText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::Postgres>>::decode(value)?;
        Ok(RawText(s.to_string()))
    }
}

/// Marshal a fully-fetched result set into ordered name/value records.
///
/// Column order within each record and row order within the sequence follow
/// the cursor. Zero rows produce an empty vector, never an absent payload.
/// Any cell that fails to decode aborts the marshal with a scan error; no
/// partial data is returned.
pub fn marshal_rows(rows: &[PgRow]) -> DbResult<Vec<JsonMap<String, JsonValue>>> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut record = JsonMap::new();
        for (idx, col) in row.columns().iter().enumerate() {
            let cell = decode_column(row, idx)?;
            // Duplicate column names from the source are last-write-wins.
            record.insert(col.name().to_string(), cell.into());
        }
        records.push(record);
    }
    Ok(records)
}

/// Decode one column of one row into the in-memory value domain.
///
/// Dispatch is by the engine-reported type name. Types without a dedicated
/// arm fall back to a text read; if that also fails the cell is undecodable
/// and the whole invocation errors.
pub fn decode_column(row: &PgRow, idx: usize) -> DbResult<CellValue> {
    let col = &row.columns()[idx];
    let name = col.name();
    let type_name = col.type_info().name();

    let scan = |e: sqlx::Error| DbError::scan(name, e.to_string());

    let cell = match type_name {
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Int(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Int(v.into())),
        "INT8" => row
            .try_get::<Option<i64>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Int),
        "OID" => row
            .try_get::<Option<sqlx::postgres::types::Oid>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Int(v.0.into())),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Float(v.into())),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Float),
        // NUMERIC is kept as text to preserve the exact database representation.
        "NUMERIC" => row
            .try_get::<Option<BigDecimal>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Text(v.to_string())),
        "BOOL" => row
            .try_get::<Option<bool>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Bool),
        "JSON" | "JSONB" => row
            .try_get::<Option<JsonValue>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Nested),
        "UUID" => row
            .try_get::<Option<Uuid>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Text(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Timestamp(v.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Text(v.to_string())),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Text(v.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Bytes),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => row
            .try_get::<Option<String>, _>(idx)
            .map_err(scan)?
            .map(CellValue::Text),
        _ => row
            .try_get::<Option<RawText>, _>(idx)
            .map_err(scan)?
            .map(|v| CellValue::Text(v.0)),
    };

    Ok(cell.unwrap_or(CellValue::Null))
}
