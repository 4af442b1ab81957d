//! Wire messages for the echo and broadcast endpoints.
//!
//! Both endpoints speak JSON text frames. A position report is
//! `{"x": int, "y": int}`; a broadcast is
//! `{"players": int, "cursors": [{"x": int, "y": int}, ...]}`.
//!
//! DECODING
//! ========
//! Reports must be JSON objects; arrays, scalars and `null` are rejected.
//! Coordinate keys match case-insensitively (`"X"` fills `x`). A missing or
//! `null` coordinate is zero, and unknown keys are ignored. When both `"x"`
//! and `"X"` appear, the lowercase key wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid position payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("coordinate `{field}` is not an integer: {value}")]
    Coordinate { field: &'static str, value: Value },
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to encode message: {0}")]
    Json(#[from] serde_json::Error),
}

/// A pointer position reported by one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Periodic push to broadcast subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Broadcast {
    pub players: usize,
    pub cursors: Vec<Position>,
}

/// Decode one inbound report.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] if the payload is not a JSON object and
/// [`DecodeError::Coordinate`] if `x` or `y` holds anything but an integer
/// or `null`.
pub fn decode_position(payload: &[u8]) -> Result<Position, DecodeError> {
    // `Map` only accepts objects; a derived struct visitor would also take `[x, y]`.
    let object: Map<String, Value> = serde_json::from_slice(payload)?;
    Ok(Position { x: coordinate(&object, "x")?, y: coordinate(&object, "y")? })
}

fn coordinate(object: &Map<String, Value>, field: &'static str) -> Result<i64, DecodeError> {
    let value = object
        .get(field)
        .or_else(|| object.iter().find(|(key, _)| key.eq_ignore_ascii_case(field)).map(|(_, v)| v));

    match value {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| DecodeError::Coordinate { field, value: v.clone() }),
    }
}

/// Encode any outbound message as JSON text.
///
/// # Errors
///
/// Returns [`EncodeError::Json`] if serialization fails.
pub fn encode<T: Serialize>(message: &T) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
