//! Typed telemetry records

use chrono::{Duration, NaiveDateTime};
use std::collections::BTreeMap;

/// Field names emitted by the sensor, plus the synthetic elapsed-time field
pub mod keys {
    pub const LEFT: &str = "Left";
    pub const TOP: &str = "Top";
    pub const RIGHT: &str = "Right";
    pub const BOTTOM: &str = "Bottom";

    pub const UPTIME: &str = "Uptime";
    pub const SCORE: &str = "Score";
    pub const SURPRISED: &str = "Surprised";
    pub const SAD: &str = "Sad";
    pub const HAPPY: &str = "Happy";
    pub const ANGRY: &str = "Angry";
    pub const AGE: &str = "Age";
    pub const MOUTH_OPEN: &str = "MouthOpen";
    pub const LEFT_EYE_CLOSED: &str = "LeftEyeClosed";
    pub const RIGHT_EYE_CLOSED: &str = "RightEyeClosed";

    pub const ID: &str = "Id";
    pub const FRAME: &str = "Frame";
    pub const ROLL: &str = "Roll";
    pub const YAW: &str = "Yaw";
    pub const PITCH: &str = "Pitch";

    pub const TIMESTAMP: &str = "TimeStamp";
    pub const DELTA_TIME: &str = "DeltaTime";

    pub const GENDER: &str = "Gender";
}

/// How a field's textual value is coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Float scaled by 1000 and truncated to an integer
    Scaled,
    Float,
    Int,
    Timestamp,
    /// Anything the parser does not know about
    Text,
}

impl FieldKind {
    pub fn of(key: &str) -> Self {
        use self::keys::*;
        match key {
            LEFT | TOP | RIGHT | BOTTOM => FieldKind::Scaled,
            UPTIME | SCORE | SURPRISED | SAD | HAPPY | ANGRY | AGE | MOUTH_OPEN
            | LEFT_EYE_CLOSED | RIGHT_EYE_CLOSED => FieldKind::Float,
            ID | FRAME | ROLL | YAW | PITCH => FieldKind::Int,
            TIMESTAMP => FieldKind::Timestamp,
            _ => FieldKind::Text,
        }
    }
}

/// A coerced field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scaled(i64),
    Float(f64),
    Int(i64),
    Timestamp(NaiveDateTime),
    Elapsed(Duration),
    Text(String),
}

/// One parsed telemetry line
///
/// Fields that were missing, `nil` or empty are stored as `None`; a lookup of
/// a key that never appeared also yields `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryRecord {
    fields: BTreeMap<String, Option<FieldValue>>,
}

impl TelemetryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field; later occurrences of a key win
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Option<FieldValue>) {
        self.fields.insert(key.into(), value);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with<K: Into<String>>(mut self, key: K, value: FieldValue) -> Self {
        self.insert(key, Some(value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).and_then(Option::as_ref)
    }

    /// Whether the key appeared on the line, with or without a value
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn scaled(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(FieldValue::Scaled(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.get(key) {
            Some(FieldValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FieldValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self.get(keys::TIMESTAMP) {
            Some(FieldValue::Timestamp(v)) => Some(*v),
            _ => None,
        }
    }

    /// Elapsed time since the session start
    pub fn elapsed(&self) -> Option<Duration> {
        match self.get(keys::DELTA_TIME) {
            Some(FieldValue::Elapsed(v)) => Some(*v),
            _ => None,
        }
    }
}
