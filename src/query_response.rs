use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decoded answer to a `check_acl` or `check_utnet` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    /// Backend failure text, shown verbatim
    Error(String),
    Matches(Vec<MatchRecord>),
}

/// One backend-reported outcome for a protocol/address/port combination.
///
/// Fields are read leniently: missing or `null` values become empty text and numbers
/// (the backend sends port `0` for ICMP) are converted to their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchRecord {
    #[serde(deserialize_with = "lenient_text")]
    pub protocol: String,
    #[serde(deserialize_with = "lenient_text")]
    pub policy_file: String,
    #[serde(deserialize_with = "lenient_text")]
    pub result: String,
    #[serde(deserialize_with = "lenient_text")]
    pub source_address: String,
    #[serde(deserialize_with = "lenient_text")]
    pub source_port: String,
    #[serde(deserialize_with = "lenient_text")]
    pub destination_address: String,
    #[serde(deserialize_with = "lenient_text")]
    pub destination_port: String,
}

impl QueryResponse {
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(message) => Self::Error(message),
            Value::Array(items) => {
                Self::Matches(items.into_iter().map(MatchRecord::from_json).collect())
            }
            other => Self::Error(format!("Unexpected response from backend: {}", other)),
        }
    }
}

impl MatchRecord {
    fn from_json(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_else(|e| {
            log::debug!("Unreadable match record, rendering it empty: {}", e);
            Self::default()
        })
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}
