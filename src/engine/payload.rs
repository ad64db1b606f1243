//! Datagram payloads
//!
//! One datagram carries one JSON object:
//!
//! ```text
//! {"tabs": ["User", "Errors"], "log1": "<time>[12:00:01]</time> hello", "log2": ""}
//! ```
//!
//! `tabs` replaces channel captions in order. `logK` (1-based) is the
//! fragment for channel `K - 1`; absent or empty means "no update".

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Field prefix of per-channel fragments (`log1`, `log2`, ...)
const ENTRY_PREFIX: &str = "log";

/// Why a datagram could not be decoded
#[derive(Debug)]
pub enum DecodeError {
    /// Payload bytes are not UTF-8
    Utf8(std::str::Utf8Error),
    /// Not a JSON object of the expected shape
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(e) => write!(f, "Payload is not valid UTF-8: {}", e),
            Self::Json(e) => write!(f, "Payload is not a valid JSON document: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Utf8(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}

/// Wire shape before entry keys are picked out of the remaining fields
#[derive(Debug, Deserialize)]
struct WirePayload {
    #[serde(default)]
    tabs: Option<Vec<String>>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Decoded content of one datagram
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// New captions, in channel order
    pub captions: Vec<String>,
    /// 0-based channel index -> fragment (may be empty)
    pub entries: BTreeMap<usize, String>,
}

impl Payload {
    /// Decode raw datagram bytes
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(DecodeError::Utf8)?;
        let wire: WirePayload = serde_json::from_str(text).map_err(DecodeError::Json)?;

        let entries = wire
            .fields
            .into_iter()
            .filter_map(|(key, value)| {
                let index = entry_index(&key)?;
                let text = match value {
                    Value::String(s) => s,
                    // Scalars are stringified; null, arrays and objects carry no text
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((index, text))
            })
            .collect();

        Ok(Self {
            captions: wire.tabs.unwrap_or_default(),
            entries,
        })
    }

    /// Non-empty fragment for a channel, if any
    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries
            .get(&index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Encode for the wire with `logK` keys for every channel in `0..channel_count`
    pub fn encode(&self, channel_count: usize) -> String {
        let mut object = Map::new();
        object.insert(
            "tabs".to_string(),
            Value::Array(self.captions.iter().cloned().map(Value::String).collect()),
        );
        for index in 0..channel_count {
            let text = self.entries.get(&index).cloned().unwrap_or_default();
            object.insert(entry_key(index), Value::String(text));
        }
        Value::Object(object).to_string()
    }
}

/// `log3` -> `Some(2)`; anything else -> `None`
/// `log3` -> `2`; only the canonical spelling counts (`log03`, `log+3` do not)
fn entry_index(key: &str) -> Option<usize> {
    let number: usize = key.strip_prefix(ENTRY_PREFIX)?.parse().ok()?;
    let index = number.checked_sub(1)?;
    (entry_key(index) == key).then_some(index)
}

/// `2` -> `log3`
pub fn entry_key(index: usize) -> String {
    format!("{}{}", ENTRY_PREFIX, index + 1)
}
