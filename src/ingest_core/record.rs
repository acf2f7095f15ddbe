//! Crawl observation decoding and archive row mapping
//!
//! A crawl log line holds one JSON object or an array of them. Each object
//! names a torrent by infohash and describes it either as a single file
//! (`length`) or as a file list (`items`).
//!
//! Only the line syntax and the infohash are load-bearing. Size fields that
//! are missing, mistyped, negative or too large make the record incomplete;
//! other fields fall back to defaults.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Columns of one archive row, in insert order.
pub const ROW_COLUMNS: [&str; 7] = [
    "infohash",
    "name",
    "updated_at",
    "total_length",
    "source",
    "occurrences",
    "files_count",
];

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("record {index} has no usable infohash")]
    MissingInfohash { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlItem {
    pub relative_path: String,
    pub length: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    SingleFile { length: i64 },
    MultiFile { items: Vec<CrawlItem> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub infohash: String,
    pub name: String,
    pub payload: Payload,
    /// Single length or sum of item lengths, checked when decoded
    pub total_length: i64,
}

impl Observation {
    pub fn single_file(infohash: &str, name: &str, length: i64) -> Self {
        Self {
            infohash: infohash.to_string(),
            name: name.to_string(),
            payload: Payload::SingleFile { length },
            total_length: length,
        }
    }

    pub fn files_count(&self) -> u64 {
        match &self.payload {
            Payload::SingleFile { .. } => 1,
            Payload::MultiFile { items } => items.len() as u64,
        }
    }
}

/// A record whose size fields cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRecord {
    pub infohash: String,
    pub reason: &'static str,
}

// Every field is optional and untyped so that a bad value in one field
// never fails the whole record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawObservation {
    infohash: Value,
    identifier: Value,
    name: Value,
    #[serde(rename = "displayName")]
    display_name: Value,
    length: Value,
    items: Value,
    files: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItem {
    #[serde(rename = "relativePath")]
    relative_path: Value,
    path: Value,
    length: Value,
}

fn first_present(candidates: [Value; 2]) -> Value {
    let [first, second] = candidates;
    if first.is_null() {
        second
    } else {
        first
    }
}

fn non_negative(value: &Value) -> Option<i64> {
    value.as_i64().filter(|n| *n >= 0)
}

fn text_or_empty(value: Value) -> String {
    match value {
        Value::String(s) => s,
        _ => String::new(),
    }
}

fn decode_items(value: Value) -> Result<Vec<CrawlItem>, &'static str> {
    let values = match value {
        Value::Array(values) if !values.is_empty() => values,
        Value::Array(_) => return Err("empty items list"),
        _ => return Err("no length or items"),
    };

    values
        .into_iter()
        .map(|value| {
            if !value.is_object() {
                return Err("item is not an object");
            }
            let raw: RawItem =
                serde_json::from_value(value).map_err(|_| "item is not an object")?;
            let length = non_negative(&raw.length).ok_or("item length is not a non-negative integer")?;
            Ok(CrawlItem {
                relative_path: text_or_empty(first_present([raw.relative_path, raw.path])),
                length,
            })
        })
        .collect()
}

impl RawObservation {
    fn classify(self, infohash: String) -> Result<Observation, IncompleteRecord> {
        let incomplete = |reason| IncompleteRecord {
            infohash: infohash.clone(),
            reason,
        };
        let name = text_or_empty(first_present([self.name, self.display_name]));

        let (payload, total_length) = match self.length {
            Value::Null => {
                let items = decode_items(first_present([self.items, self.files]))
                    .map_err(incomplete)?;
                let total = items
                    .iter()
                    .try_fold(0i64, |acc, item| acc.checked_add(item.length))
                    .ok_or_else(|| incomplete("total length overflows"))?;
                (Payload::MultiFile { items }, total)
            }
            length => {
                let length = non_negative(&length)
                    .ok_or_else(|| incomplete("length is not a non-negative integer"))?;
                (Payload::SingleFile { length }, length)
            }
        };

        Ok(Observation {
            infohash,
            name,
            payload,
            total_length,
        })
    }
}

/// Decode one non-blank crawl log line.
///
/// The outer `Err` means the line itself is unusable: bad syntax, or a record
/// with no string infohash. Inner `Err`s are single incomplete records.
pub fn decode_line(line: &str) -> Result<Vec<Result<Observation, IncompleteRecord>>, DecodeError> {
    let values = match serde_json::from_str::<Value>(line)? {
        Value::Array(values) => values,
        value => vec![value],
    };

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            if !value.is_object() {
                return Err(DecodeError::MissingInfohash { index });
            }
            let mut raw: RawObservation = serde_json::from_value(value)
                .map_err(|_| DecodeError::MissingInfohash { index })?;
            let infohash = first_present([
                std::mem::take(&mut raw.infohash),
                std::mem::take(&mut raw.identifier),
            ]);
            match infohash {
                Value::String(infohash) if !infohash.is_empty() => Ok(raw.classify(infohash)),
                _ => Err(DecodeError::MissingInfohash { index }),
            }
        })
        .collect()
}

/// One row of the infohash archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfohashRow {
    pub infohash: String,
    pub name: String,
    pub updated_at: String,
    pub total_length: i64,
    pub source: String,
    pub occurrences: u64,
    pub files_count: u64,
}

impl InfohashRow {
    pub fn from_observation(
        observation: Observation,
        occurrences: u64,
        updated_at: &str,
        source: &str,
    ) -> Self {
        Self {
            total_length: observation.total_length,
            files_count: observation.files_count(),
            infohash: observation.infohash,
            name: observation.name,
            updated_at: updated_at.to_string(),
            source: source.to_string(),
            occurrences,
        }
    }
}
