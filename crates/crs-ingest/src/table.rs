//! Row-wise DataFrame access helpers.
//!
//! Roster logic is mostly row-oriented (per-student checks, per-submission
//! joins), so the crates in this workspace read cells through these helpers
//! instead of dtype-specific chunked-array APIs.

use polars::prelude::{AnyValue, DataFrame, IdxCa};

use crate::error::Result;

/// Converts a polars `AnyValue` to its string form; `Null` becomes the empty
/// string, floats are printed without trailing zeros.
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let s = other.to_string();
            if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                s[1..s.len() - 1].to_string()
            } else {
                s
            }
        }
    }
}

/// Converts an `AnyValue` to `f64`, `None` for missing or non-numeric cells.
pub fn any_to_f64(value: AnyValue<'_>) -> Option<f64> {
    match value {
        AnyValue::Null => None,
        AnyValue::Int8(v) => Some(f64::from(v)),
        AnyValue::Int16(v) => Some(f64::from(v)),
        AnyValue::Int32(v) => Some(f64::from(v)),
        AnyValue::Int64(v) => Some(v as f64),
        AnyValue::UInt8(v) => Some(f64::from(v)),
        AnyValue::UInt16(v) => Some(f64::from(v)),
        AnyValue::UInt32(v) => Some(f64::from(v)),
        AnyValue::UInt64(v) => Some(v as f64),
        AnyValue::Float32(v) => Some(f64::from(v)),
        AnyValue::Float64(v) => Some(v),
        AnyValue::String(s) => s.trim().parse::<f64>().ok(),
        AnyValue::StringOwned(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

/// String value of one cell; empty string for missing cells or unknown columns.
pub fn value_string(df: &DataFrame, column: &str, idx: usize) -> String {
    match df.column(column) {
        Ok(col) => any_to_string(col.get(idx).unwrap_or(AnyValue::Null)),
        Err(_) => String::new(),
    }
}

/// All values of a column as trimmed strings, missing cells as empty strings.
pub fn column_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let col = df.column(column)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = any_to_string(col.get(idx).unwrap_or(AnyValue::Null));
        values.push(value.trim().to_string());
    }
    Ok(values)
}

/// Renders the given rows of a table as display text, for error listings and
/// diagnostics.
pub fn format_rows(df: &DataFrame, indices: &[usize]) -> String {
    let idx: Vec<u32> = indices.iter().map(|&i| i as u32).collect();
    match df.take(&IdxCa::from_vec("idx".into(), idx)) {
        Ok(subset) => format!("{subset}"),
        Err(_) => format!("{} rows (unrenderable)", indices.len()),
    }
}
