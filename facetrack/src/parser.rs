//! Telemetry line parser
//!
//! The sensor writes one face per line as `Key=value` pairs separated by bare
//! spaces, while some values (the timestamp) contain spaces themselves. A space
//! immediately followed by a letter starts a new field; any other space belongs
//! to the current value. Values containing a space followed by a letter are
//! therefore split, exactly as the sensor's consumers always have.

use crate::error::ParseError;
use crate::record::{keys, FieldKind, FieldValue, TelemetryRecord};
use crate::time_codec;
use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const FIELD_DELIMITER: &str = ", ";
const NIL: &str = "nil";

fn field_separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| Regex::new(r"[ ]([a-zA-Z])").expect("separator pattern is valid"))
}

/// Rewrite field-separating spaces as `", "`
fn normalise(line: &str) -> String {
    field_separator()
        .replace_all(line, format!("{}$1", FIELD_DELIMITER).as_str())
        .into_owned()
}

/// Split `Key=value` into its key and optional raw value
fn split_item(item: &str) -> Result<(&str, Option<&str>), ParseError> {
    let mut parts = item.split('=');
    let key = parts.next().unwrap_or_default();

    match (parts.next(), parts.next()) {
        (None, _) => Ok((key, None)),
        (Some(value), None) => {
            let value = if value.is_empty() || value == NIL {
                None
            } else {
                Some(value)
            };
            Ok((key, value))
        }
        (Some(_), Some(_)) => Err(ParseError::record(
            item,
            "expected at most one '=' between key and value",
        )),
    }
}

/// Sensor coordinate to integer units, truncated toward zero
fn scale(value: f64) -> Option<i64> {
    let scaled = value * 1000.0;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}

fn coerce(key: &str, raw: &str) -> Result<FieldValue, ParseError> {
    let number = raw.trim();
    match FieldKind::of(key) {
        FieldKind::Scaled => {
            let value = number
                .parse::<f64>()
                .map_err(|e| ParseError::record(format!("{}={}", key, raw), e.to_string()))?;
            scale(value).map(FieldValue::Scaled).ok_or_else(|| {
                ParseError::record(
                    format!("{}={}", key, raw),
                    "coordinate is not finite or out of range",
                )
            })
        }
        FieldKind::Float => number
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|e| ParseError::record(format!("{}={}", key, raw), e.to_string())),
        FieldKind::Int => number
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|e| ParseError::record(format!("{}={}", key, raw), e.to_string())),
        FieldKind::Timestamp => time_codec::parse_date(raw).map(FieldValue::Timestamp),
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

/// Elapsed time of `timestamp` relative to the session start
///
/// Without a start the timestamp is taken as already relative and measured
/// from the codec epoch.
fn elapsed_since(
    timestamp: NaiveDateTime,
    session_start: Option<NaiveDateTime>,
) -> Result<Duration, ParseError> {
    match session_start {
        Some(start) => {
            let elapsed = timestamp - start;
            if elapsed < Duration::zero() {
                return Err(ParseError::timestamp(format!(
                    "{} precedes session start {}",
                    time_codec::format_date(&timestamp),
                    time_codec::format_date(&start)
                )));
            }
            Ok(elapsed)
        }
        None => Ok(time_codec::since_epoch(timestamp)),
    }
}

/// Parse one telemetry line into a typed record
///
/// `TimeStamp` additionally produces the synthetic `DeltaTime` field holding
/// the elapsed time since `session_start`. Any structural or coercion error
/// rejects the whole line.
pub fn parse_line(
    line: &str,
    session_start: Option<NaiveDateTime>,
) -> Result<TelemetryRecord, ParseError> {
    let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
    let normalised = normalise(line);
    let mut record = TelemetryRecord::new();

    for item in normalised.split(FIELD_DELIMITER) {
        let (key, raw) = split_item(item)?;

        if key == keys::TIMESTAMP {
            let raw = raw.ok_or_else(|| ParseError::timestamp(item))?;
            let timestamp = time_codec::parse_date(raw)?;
            let elapsed = elapsed_since(timestamp, session_start)?;
            record.insert(keys::DELTA_TIME, Some(FieldValue::Elapsed(elapsed)));
            record.insert(key, Some(FieldValue::Timestamp(timestamp)));
            continue;
        }

        let value = raw.map(|raw| coerce(key, raw)).transpose()?;
        record.insert(key, value);
    }

    Ok(record)
}

/// Parse a sequence of lines, skipping blank ones
///
/// Stops at the first bad line; the error carries its 1-based line number.
pub fn parse_lines<I, S>(
    lines: I,
    session_start: Option<NaiveDateTime>,
) -> Result<Vec<TelemetryRecord>, ParseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut records = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(line, session_start).map_err(|e| e.at_line(idx + 1))?;
        records.push(record);
    }
    Ok(records)
}
