//! Error types for telemetry parsing and tracking

use thiserror::Error;

/// Errors raised while turning a raw telemetry line into a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed record item '{item}': {reason}")]
    MalformedRecord { item: String, reason: String },

    #[error("Malformed timestamp: '{value}'")]
    MalformedTimestamp { value: String },

    #[error("Line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub fn record<S: Into<String>, R: Into<String>>(item: S, reason: R) -> Self {
        Self::MalformedRecord {
            item: item.into(),
            reason: reason.into(),
        }
    }

    pub fn timestamp<S: Into<String>>(value: S) -> Self {
        Self::MalformedTimestamp {
            value: value.into(),
        }
    }

    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }
}

/// Errors raised while folding a record into a tracker
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),
}

impl TrackError {
    pub fn missing_field(key: &str) -> Self {
        Self::MalformedRecord(format!("missing required field '{}'", key))
    }
}
