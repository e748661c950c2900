//! Single-line JSON log records.
//!
//! Each record is one JSON object on one line:
//!
//! ```text
//! {"timestamp":"2022-06-01T09:30:00.123456789Z","message":"hello 2","severity":"INFO"}
//! ```
//!
//! The logging agent on the host parses these lines and maps `severity` and
//! `timestamp` onto the corresponding Cloud Logging fields.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::severity::Severity;

/// Errors produced while emitting a log record.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The record could not be serialised.
    #[error("failed to serialise log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The output stream rejected the write.
    #[error("failed to write log entry: {0}")]
    Write(#[from] std::io::Error),
}

/// One log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "rfc3339_nanos")]
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub severity: Severity,
}

fn rfc3339_nanos<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

impl LogEntry {
    /// Create a record stamped with the current time.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self::at(Utc::now(), message, severity)
    }

    /// Create a record with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            timestamp,
            message: message.into(),
            severity,
        }
    }

    /// Render the record as a JSON object without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError::Serialize`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, EntryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the record to `out` as one newline-terminated line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or the write fails.
    pub fn write_line<W: Write>(&self, out: &mut W) -> Result<(), EntryError> {
        let line = self.to_json()?;
        writeln!(out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    #[test]
    fn json_has_exactly_three_fields() {
        let entry = LogEntry::new("hello 3", Severity::Warn);
        let v: Value = serde_json::from_str(&entry.to_json().unwrap()).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["message"], "hello 3");
        assert_eq!(obj["severity"], "WARN");

        let ts = obj["timestamp"].as_str().unwrap();
        let parsed = DateTime::parse_from_rfc3339(ts).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), entry.timestamp);
    }

    #[test]
    fn fixed_timestamp_renders_with_nanos() {
        let ts = Utc.with_ymd_and_hms(2022, 6, 1, 9, 30, 0).unwrap();
        let entry = LogEntry::at(ts, "hello 0", Severity::Default);
        assert_eq!(
            entry.to_json().unwrap(),
            r#"{"timestamp":"2022-06-01T09:30:00.000000000Z","message":"hello 0","severity":"DEFAULT"}"#
        );
    }

    #[test]
    fn message_is_escaped() {
        let entry = LogEntry::new("say \"hi\"\nbye", Severity::Info);
        let json = entry.to_json().unwrap();
        assert!(!json.contains('\n'));
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["message"], "say \"hi\"\nbye");
    }

    #[test]
    fn write_line_appends_single_newline() {
        let mut buf = Vec::new();
        LogEntry::new("hello 5", Severity::Fatal)
            .write_line(&mut buf)
            .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.ends_with('\n'));
        assert_eq!(out.matches('\n').count(), 1);
        assert!(out.contains(r#""severity":"FATAL""#));
    }

    #[test]
    fn write_failure_is_reported() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let err = LogEntry::new("x", Severity::Debug)
            .write_line(&mut Broken)
            .unwrap_err();
        assert!(matches!(err, EntryError::Write(_)));
    }
}
