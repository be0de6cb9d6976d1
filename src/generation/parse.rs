//! Response parser: raw model text to [`IdeaRecord`], tolerant of truncation and noise.

use crate::error::{sanitize_message, FailureKind, GenerationError};
use crate::provider::OutputFormat;
use crate::record::IdeaRecord;
use serde_json::Value;

/// Minimum number of non-empty fields for a record to be accepted.
pub const DEFAULT_MIN_FILLED_FIELDS: usize = 4;

/// Parse according to the configured wire format. Does not apply the acceptance rule.
pub fn parse_response(text: &str, format: OutputFormat) -> Result<IdeaRecord, GenerationError> {
    match format {
        OutputFormat::Kv => Ok(parse_kv(text)),
        OutputFormat::Json => parse_json(text),
    }
}

/// Parse and enforce the minimum filled-field count.
pub fn parse_and_accept(
    text: &str,
    format: OutputFormat,
    min_filled: usize,
) -> Result<IdeaRecord, GenerationError> {
    let record = parse_response(text, format)?;
    accept(record, min_filled)
}

pub fn accept(record: IdeaRecord, min_filled: usize) -> Result<IdeaRecord, GenerationError> {
    let filled = record.filled_count();
    if filled < min_filled {
        return Err(GenerationError::new(
            FailureKind::LowSignalOutput,
            format!("only {} of 10 fields filled (need {})", filled, min_filled),
        ));
    }
    Ok(record)
}

/// `key=value` lines. Unknown keys, blank lines and fences are skipped; a key seen
/// twice keeps its last value.
pub fn parse_kv(text: &str) -> IdeaRecord {
    let mut record = IdeaRecord::default();
    let cleaned = text.replace("```", "");
    for line in cleaned.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if let Some(slot) = record.field_mut(key.trim()) {
            *slot = value.trim().to_string();
        }
    }
    record
}

/// Strict JSON, with one repair pass that cuts the outermost object or array out of
/// surrounding chatter.
pub fn parse_json(text: &str) -> Result<IdeaRecord, GenerationError> {
    let value = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) => value,
        Err(_) => {
            let extracted = extract_json_span(text).ok_or_else(|| malformed(text, "no JSON found"))?;
            serde_json::from_str::<Value>(extracted)
                .map_err(|e| malformed(text, &format!("invalid JSON: {}", e)))?
        }
    };
    record_from_value(&value).ok_or_else(|| malformed(text, "JSON is not an object"))
}

/// From the first `{` or `[` to the last matching closer.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn record_from_value(value: &Value) -> Option<IdeaRecord> {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) => items.iter().find_map(Value::as_object)?,
        _ => return None,
    };
    let mut record = IdeaRecord::default();
    for (key, value) in object {
        let Some(slot) = record.field_mut(key) else {
            continue;
        };
        *slot = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            Value::Bool(_) | Value::Number(_) => value.to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            Value::Object(_) => value.to_string(),
        };
    }
    Some(record)
}

fn malformed(text: &str, reason: &str) -> GenerationError {
    GenerationError::malformed(format!("{}; output: {}", reason, sanitize_message(text)))
}
