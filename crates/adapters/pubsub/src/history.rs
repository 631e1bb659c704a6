//! Decoding of channel history answers.
//!
//! With `include_token=true` the service answers
//! `[[{"message": m, "timetoken": t}, ...], start, end]`, oldest message
//! first. Entries without the wrapper are accepted as bare messages.

use serde_json::Value;

use crate::error::PubSubError;

/// One message read back from a channel.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HistoryEntry {
    pub message: Value,
    /// Publication time in 100 ns ticks since the Unix epoch.
    pub timetoken: Option<u64>,
}

impl HistoryEntry {
    fn from_value(entry: Value) -> Self {
        match entry {
            Value::Object(mut fields) if fields.contains_key("message") => {
                let timetoken = fields.get("timetoken").and_then(|token| match token {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                });
                Self {
                    message: fields.remove("message").unwrap_or_default(),
                    timetoken,
                }
            }
            bare => Self {
                message: bare,
                timetoken: None,
            },
        }
    }

    /// Device state carried by the message: its `state` field, else its
    /// `target_temperature` field, else the message itself.
    pub fn state(&self) -> Value {
        ["state", "target_temperature"]
            .iter()
            .find_map(|key| self.message.get(key))
            .unwrap_or(&self.message)
            .clone()
    }
}

/// Decode a history answer, oldest entry first.
pub(crate) fn parse(answer: Value) -> Result<Vec<HistoryEntry>, PubSubError> {
    let Value::Array(mut parts) = answer else {
        return Err(PubSubError::Decode("history answer is not an array".to_string()));
    };
    if parts.is_empty() {
        return Err(PubSubError::Decode("history answer is empty".to_string()));
    }
    match parts.swap_remove(0) {
        Value::Array(entries) => Ok(entries.into_iter().map(HistoryEntry::from_value).collect()),
        other => Err(PubSubError::Decode(format!(
            "history messages are not a list: {other}"
        ))),
    }
}
