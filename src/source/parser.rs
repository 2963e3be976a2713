//! Parser for the session source response
//!
//! Expected shape: `{"sessions": [{"key", "model", "inputTokens", "outputTokens"}]}`.

use serde_json::{Map, Value};

use crate::consts::UNKNOWN;
use crate::core::{Session, TokenTotals};
use crate::error::AppError;

fn malformed(reason: impl Into<String>) -> AppError {
    AppError::SourceMalformed {
        reason: reason.into(),
    }
}

/// Missing or null counts are 0; anything other than a non-negative integer is rejected.
fn token_field(obj: &Map<String, Value>, key: &str, field: &'static str) -> Result<u64, AppError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(0),
        Some(value) => value.as_u64().ok_or_else(|| AppError::InvalidTokenCount {
            key: key.to_string(),
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_session(index: usize, value: &Value) -> Result<Session, AppError> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed(format!("sessions[{index}] is not an object")))?;

    let key = match obj.get("key") {
        Some(Value::String(k)) if !k.is_empty() => k.clone(),
        _ => return Err(malformed(format!("sessions[{index}] has no string \"key\""))),
    };

    let model = match obj.get("model") {
        Some(Value::String(m)) if !m.is_empty() => m.clone(),
        _ => UNKNOWN.to_string(),
    };

    let tokens = TokenTotals::new(
        token_field(obj, &key, "inputTokens")?,
        token_field(obj, &key, "outputTokens")?,
    );

    Ok(Session { key, model, tokens })
}

/// Parse a raw source response into sessions, preserving source order
pub(crate) fn parse_sessions(raw: &str) -> Result<Vec<Session>, AppError> {
    let root: Value =
        serde_json::from_str(raw).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let sessions = root
        .get("sessions")
        .ok_or_else(|| malformed("missing \"sessions\" key"))?
        .as_array()
        .ok_or_else(|| malformed("\"sessions\" is not a list"))?;

    sessions
        .iter()
        .enumerate()
        .map(|(i, v)| parse_session(i, v))
        .collect()
}
