use chrono::{DateTime, NaiveDateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

// naive datetimes coming from the backend are UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const CURSOR_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Validation failures for a record received over the wire.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record has an empty message_type")]
    EmptyKind,
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
    #[error("unknown record status '{0}'")]
    Status(String),
}

/// Kind of notification a record carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Trade,
    Portfolio,
    Other(String),
}

impl RecordKind {
    /// Normalises the backend's kind codes (`trade_batch`, `trd`, `pfl`, ...).
    pub fn from_code(code: &str) -> Result<Self, RecordError> {
        let code = code.trim();
        match code.to_ascii_lowercase().as_str() {
            "" => Err(RecordError::EmptyKind),
            "trade_batch" | "trade" | "trd" => Ok(Self::Trade),
            "portfolio" | "pfl" => Ok(Self::Portfolio),
            _ => Ok(Self::Other(code.to_string())),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Trade => "trade",
            Self::Portfolio => "portfolio",
            Self::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    InProgress,
}

impl RecordStatus {
    pub fn from_code(code: &str) -> Result<Self, RecordError> {
        match code.trim() {
            "in_progress" => Ok(Self::InProgress),
            other => Err(RecordError::Status(other.to_string())),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
        }
    }
}

/// A single immutable feed entry, ordered by `timestamp`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct Record {
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub kind: RecordKind,
    pub content: String,
    pub status: Option<RecordStatus>,
    pub metadata: Map<String, Value>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>, kind: RecordKind, content: impl Into<String>) -> Self {
        Self {
            id: None,
            timestamp,
            kind,
            content: content.into(),
            status: None,
            metadata: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == Some(RecordStatus::InProgress)
    }
}

#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    id: Option<Value>,
    content: String,
    timestamp: String,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(alias = "kind")]
    message_type: String,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<WireRecord> for Record {
    type Error = RecordError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let id = match wire.id {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            id,
            timestamp: parse_timestamp(&wire.timestamp)?,
            kind: RecordKind::from_code(&wire.message_type)?,
            content: wire.content,
            status: wire
                .status
                .as_deref()
                .map(RecordStatus::from_code)
                .transpose()?,
            metadata: wire.metadata.unwrap_or_default(),
        })
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO datetime taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RecordError::Timestamp(raw.to_string()))
}

/// Renders a cursor the way the backend stores timestamps (naive UTC).
pub fn format_cursor(ts: &DateTime<Utc>) -> String {
    ts.format(CURSOR_FORMAT).to_string()
}

/// A fetched page, guaranteed newest-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Normalises a page into descending timestamp order.
    ///
    /// Pages are expected to arrive newest-first already; a page that doesn't
    /// is stably re-sorted rather than trusted.
    pub fn newest_first(mut records: Vec<Record>) -> Self {
        let ordered = records
            .iter()
            .tuple_windows()
            .all(|(newer, older)| newer.timestamp >= older.timestamp);

        if !ordered {
            log::warn!(
                "Received a page of {} records out of order, re-sorting newest-first",
                records.len()
            );
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }

        Self { records }
    }

    /// Keeps only records strictly older than `bound`.
    pub fn older_than(self, bound: Option<DateTime<Utc>>) -> Self {
        match bound {
            Some(bound) => self.retain_logged(|r| r.timestamp < bound, "not older than cursor"),
            None => self,
        }
    }

    /// Keeps only records strictly newer than `bound`.
    pub fn newer_than(self, bound: Option<DateTime<Utc>>) -> Self {
        match bound {
            Some(bound) => self.retain_logged(|r| r.timestamp > bound, "not newer than cursor"),
            None => self,
        }
    }

    fn retain_logged(mut self, keep: impl Fn(&Record) -> bool, reason: &str) -> Self {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        let dropped = before - self.records.len();
        if dropped > 0 {
            log::warn!("Dropped {} records {}", dropped, reason);
        }
        self
    }

    pub fn newest(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn oldest(&self) -> Option<&Record> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
