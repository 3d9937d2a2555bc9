//! Date and duration codecs for the telemetry text formats
//!
//! Absolute timestamps come in two shapes, told apart by length:
//! - `2013-Jul-02 16:32:46` (exactly 20 characters)
//! - `2013-Jul-02 16:32:46.396849`
//!
//! Durations and times of day come in three shapes, told apart by length:
//! - `0:00:01` / `16:32:46` (up to 8 characters)
//! - `16:32:46.396849` (up to 15 characters)
//! - `2013-07-02 13:24:30.310070` (anything longer)
//!
//! Durations are measured from [`epoch`]; a time of day is the duration since
//! midnight and a full datetime is the duration since the epoch.

use crate::error::ParseError;
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

/// Length of an absolute timestamp without fractional seconds
const DATE_SECONDS_LEN: usize = 20;
/// Maximum length of a time of day without fractional seconds
const TIME_SECONDS_MAX_LEN: usize = 8;
/// Maximum length of a time of day with fractional seconds
const TIME_FRACTION_MAX_LEN: usize = 15;

/// Sensor frame rate assumed when a stream does not state one
pub const FRAMES_PER_SECOND: u32 = 25;

const DATE_SECONDS_FORMAT: &str = "%Y-%b-%d %H:%M:%S";
const DATE_FRACTION_FORMAT: &str = "%Y-%b-%d %H:%M:%S%.f";
const TIME_SECONDS_FORMAT: &str = "%H:%M:%S";
const TIME_FRACTION_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FRACTION_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Reference point for durations: 1970-01-01 00:00:00
pub fn epoch() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// Duration between the epoch and `timestamp`
pub fn since_epoch(timestamp: NaiveDateTime) -> Duration {
    timestamp - epoch()
}

/// Parse an absolute sensor timestamp
pub fn parse_date(value: &str) -> Result<NaiveDateTime, ParseError> {
    let parsed = if value.len() == DATE_SECONDS_LEN {
        NaiveDateTime::parse_from_str(value, DATE_SECONDS_FORMAT)
    } else if value.as_bytes().get(DATE_SECONDS_LEN) == Some(&b'.') {
        NaiveDateTime::parse_from_str(value, DATE_FRACTION_FORMAT)
    } else {
        return Err(ParseError::timestamp(value));
    };

    parsed.map_err(|_| ParseError::timestamp(value))
}

/// Parse a duration or time of day into a duration from the epoch
pub fn parse_time(value: &str) -> Result<Duration, ParseError> {
    let len = value.len();
    if len > TIME_SECONDS_MAX_LEN && !value.contains('.') {
        return Err(ParseError::timestamp(value));
    }

    let parsed = if len <= TIME_SECONDS_MAX_LEN {
        NaiveTime::parse_from_str(value, TIME_SECONDS_FORMAT).map(since_midnight)
    } else if len <= TIME_FRACTION_MAX_LEN {
        NaiveTime::parse_from_str(value, TIME_FRACTION_FORMAT).map(since_midnight)
    } else {
        NaiveDateTime::parse_from_str(value, DATETIME_FRACTION_FORMAT).map(since_epoch)
    };

    parsed.map_err(|_| ParseError::timestamp(value))
}

/// Format an absolute timestamp with microsecond precision
pub fn format_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%b-%d %H:%M:%S%.6f").to_string()
}

/// Format a duration as a time of day (`HH:MM:SS.ffffff`), wrapping at 24 hours
pub fn format_time(duration: Duration) -> String {
    let time = epoch().time() + duration;
    time.format("%H:%M:%S%.6f").to_string()
}

/// Time covered by `start_frame` frames at `fps`, truncated to whole
/// milliseconds; `None` for a zero frame rate
pub fn frame_offset(start_frame: u32, fps: u32) -> Option<Duration> {
    (i64::from(start_frame) * 1000)
        .checked_div(i64::from(fps))
        .map(Duration::milliseconds)
}

fn since_midnight(time: NaiveTime) -> Duration {
    Duration::seconds(i64::from(time.num_seconds_from_midnight()))
        + Duration::nanoseconds(i64::from(time.nanosecond()))
}
