//! Analysis job configuration
//!
//! A job is a JSON file listing the telemetry inputs to analyse and the CSV
//! reports to produce from them:
//!
//! ```json
//! {
//!   "inputs": [
//!     { "id": "cam1", "filename": "cam1.txt", "start_date": "2013-Jul-02 16:32:46",
//!       "start_frame": 250, "fps": 25, "output_log": "cam1.log", "max_tracks": 4 }
//!   ],
//!   "configurations": [
//!     { "output": "report.csv",
//!       "time_ranges": [ { "id": "R1", "inputId": "cam1", "from": "00:00:00",
//!                          "to": "00:01:00", "label": "intro" } ] }
//!   ]
//! }
//! ```

use crate::error::{AnalyserError, Result};
use chrono::{Duration, NaiveDateTime};
use facetrack::time_codec;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobConfig {
    pub inputs: Vec<InputConfig>,
    #[serde(default)]
    pub configurations: Vec<ExportConfig>,
}

/// One telemetry stream
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputConfig {
    pub id: String,
    pub filename: PathBuf,
    /// Wall-clock time of the first recorded frame, sensor date format
    pub start_date: String,
    /// Frame number the recording starts at; back-dates `start_date`
    #[serde(default)]
    pub start_frame: Option<u32>,
    /// Sensor frame rate, used with `start_frame`
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Where to write the statistics text for this stream
    #[serde(default)]
    pub output_log: Option<PathBuf>,
    /// Only report the most observed tracks
    #[serde(default)]
    pub max_tracks: Option<usize>,
}

fn default_fps() -> u32 {
    time_codec::FRAMES_PER_SECOND
}

impl InputConfig {
    /// Session start, corrected for `start_frame`
    pub fn session_start(&self) -> Result<NaiveDateTime> {
        let start = time_codec::parse_date(&self.start_date).map_err(|e| {
            AnalyserError::config(format!("input '{}' start_date: {}", self.id, e))
        })?;

        match self.start_frame {
            Some(frame) => time_codec::frame_offset(frame, self.fps)
                .map(|offset| start - offset)
                .ok_or_else(|| {
                    AnalyserError::config(format!("input '{}' fps must be positive", self.id))
                }),
            None => Ok(start),
        }
    }
}

/// One CSV report
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExportConfig {
    pub output: PathBuf,
    pub time_ranges: Vec<TimeRange>,
}

/// Elapsed-time range of one input to export
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeRange {
    pub id: String,
    #[serde(rename = "inputId")]
    pub input_id: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

impl TimeRange {
    /// Parsed `[from, to)` bounds
    pub fn bounds(&self) -> Result<(Duration, Duration)> {
        let parse = |value: &str| {
            time_codec::parse_time(value)
                .map_err(|e| AnalyserError::config(format!("time range '{}': {}", self.id, e)))
        };
        Ok((parse(&self.from)?, parse(&self.to)?))
    }
}

impl JobConfig {
    /// Load a job file; relative paths resolve against its directory
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AnalyserError::io(path, e))?;
        let mut config = Self::from_json(&text)?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: JobConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn input(&self, id: &str) -> Option<&InputConfig> {
        self.inputs.iter().find(|input| input.id == id)
    }

    fn validate(&self) -> Result<()> {
        for (idx, input) in self.inputs.iter().enumerate() {
            if self.inputs[..idx].iter().any(|other| other.id == input.id) {
                return Err(AnalyserError::config(format!(
                    "duplicate input id '{}'",
                    input.id
                )));
            }
            input.session_start()?;
        }

        for export in &self.configurations {
            for range in &export.time_ranges {
                if self.input(&range.input_id).is_none() {
                    return Err(AnalyserError::UnknownInput(range.input_id.clone()));
                }
                range.bounds()?;
            }
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        for input in &mut self.inputs {
            resolve(&mut input.filename);
            if let Some(log) = input.output_log.as_mut() {
                resolve(log);
            }
        }
        for export in &mut self.configurations {
            resolve(&mut export.output);
        }
    }
}
