//! Reader for the JSON result stream returned by the session protocol.
//!
//! The body is one or more concatenated JSON documents. Each document may
//! carry `messages` (diagnostics) and `results` (rows); the export flavour
//! uses a single `result` object per document instead.

use crate::error::SearchError;
use crate::outcome::Record;
use serde::Deserialize;
use serde_json::{Deserializer, Value};

/// Diagnostic message interleaved with result rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamMessage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl StreamMessage {
    pub fn is_error(&self) -> bool {
        matches!(self.kind.as_str(), "ERROR" | "FATAL")
    }
}

/// One entry emitted by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEntry {
    Record(Record),
    Message(StreamMessage),
    /// A `results` element that is not a JSON object.
    Other(Value),
}

/// Decode every entry of a result stream, in order.
pub fn read_entries(body: &[u8]) -> Result<Vec<ResultEntry>, SearchError> {
    let mut entries = Vec::new();
    for document in Deserializer::from_slice(body).into_iter::<Value>() {
        let document = document?;
        let Value::Object(mut document) = document else {
            entries.push(ResultEntry::Other(document));
            continue;
        };

        if let Some(Value::Array(messages)) = document.remove("messages") {
            for message in messages {
                match serde_json::from_value::<StreamMessage>(message.clone()) {
                    Ok(m) => entries.push(ResultEntry::Message(m)),
                    Err(_) => entries.push(ResultEntry::Other(message)),
                }
            }
        }

        match document.remove("results") {
            Some(Value::Array(results)) => {
                entries.extend(results.into_iter().map(classify));
            }
            Some(other) => entries.push(ResultEntry::Other(other)),
            None => {}
        }

        if let Some(result) = document.remove("result") {
            entries.push(classify(result));
        }
    }
    Ok(entries)
}

/// Keep only genuine records.
pub fn records(entries: Vec<ResultEntry>) -> Vec<Record> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            ResultEntry::Record(record) => Some(record),
            _ => None,
        })
        .collect()
}

fn classify(value: Value) -> ResultEntry {
    match value {
        Value::Object(record) => ResultEntry::Record(record),
        other => ResultEntry::Other(other),
    }
}
