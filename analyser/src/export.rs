//! CSV export of per-second windowed statistics

use crate::config::{ExportConfig, TimeRange};
use crate::error::{AnalyserError, Result};
use crate::session::Analyser;
use chrono::Duration;
use facetrack::time_codec::format_time;
use facetrack::TrackSnapshot;
use log::info;
use std::fs::File;
use std::io;

/// Length of one exported window
pub const WINDOW_SECONDS: i64 = 1;

pub const HEADER: [&str; 13] = [
    "Person",
    "TimeFrom",
    "TimeTo",
    "Happy_AVG",
    "Sad_AVG",
    "Angry_AVG",
    "Surprise_AVG",
    "MouthOpen_AVG",
    "Pitch_AVG",
    "Roll_AVG",
    "Yaw_AVG",
    "ID",
    "Label",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(snapshot: &TrackSnapshot, from: Duration, to: Duration, range: &TimeRange) -> Vec<String> {
    vec![
        snapshot.id.to_string(),
        format_time(from),
        format_time(to),
        cell(snapshot.happy),
        cell(snapshot.sad),
        cell(snapshot.angry),
        cell(snapshot.surprised),
        cell(snapshot.mouth_open),
        cell(snapshot.pitch),
        cell(snapshot.roll),
        cell(snapshot.yaw),
        range.id.clone(),
        range.label.clone(),
    ]
}

/// Write the report for `ranges` to `writer`, returning the number of rows
///
/// Each range is walked in one-second windows `[t, t + 1s)` while `t < to`;
/// every valid track of the range's input contributes one row per window.
pub fn write_report<W: io::Write>(
    analyser: &Analyser,
    ranges: &[TimeRange],
    writer: W,
) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    let step = Duration::seconds(WINDOW_SECONDS);
    let mut rows = 0usize;

    for range in ranges {
        let stream = analyser.stream(&range.input_id)?;
        let (from, to) = range.bounds()?;

        let mut window_from = from;
        while window_from < to {
            let window_to = window_from + step;
            for snapshot in stream.tracker.query(window_from, window_to, stream.max_tracks) {
                csv.write_record(row(&snapshot, window_from, window_to, range))?;
                rows += 1;
            }
            window_from = window_to;
        }
    }

    csv.flush()
        .map_err(|e| AnalyserError::Io {
            path: "<report>".into(),
            source: e,
        })?;
    Ok(rows)
}

/// Write one configured report to its output file
pub fn export(analyser: &Analyser, config: &ExportConfig) -> Result<usize> {
    info!("Exporting to '{}'", config.output.display());
    let file = File::create(&config.output).map_err(|e| AnalyserError::io(&config.output, e))?;
    let rows = write_report(analyser, &config.time_ranges, file)?;
    info!("Exported {} rows to '{}'", rows, config.output.display());
    Ok(rows)
}
