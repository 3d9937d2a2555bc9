//! Analysis session: one tracker per configured input stream

use crate::config::{InputConfig, JobConfig};
use crate::error::{AnalyserError, Result};
use facetrack::{parse_line, AudienceSummary, Tracker};
use log::{debug, info};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

/// Ingested state of one input stream
#[derive(Debug)]
pub struct StreamAnalysis {
    pub id: String,
    pub tracker: Tracker,
    pub max_tracks: Option<usize>,
}

impl StreamAnalysis {
    /// Read and track every line of the input's telemetry file
    pub fn from_input(input: &InputConfig) -> Result<Self> {
        let start = input.session_start()?;
        let path = input.filename.as_path();
        let file = File::open(path).map_err(|e| AnalyserError::io(path, e))?;

        info!("Analysing '{}' ({})", input.id, path.display());
        let started = Instant::now();
        let mut tracker = Tracker::new();
        let mut records = 0usize;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| AnalyserError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            let record = parse_line(&line, Some(start)).map_err(|e| AnalyserError::Parse {
                path: path.to_path_buf(),
                source: e.at_line(idx + 1),
            })?;
            tracker.ingest(&record).map_err(|e| AnalyserError::Track {
                path: path.to_path_buf(),
                line: idx + 1,
                source: e,
            })?;
            records += 1;
        }

        info!(
            "Finished '{}': {} records, {} frames, {} tracks in {:.2?}",
            input.id,
            records,
            tracker.frame_count(),
            tracker.tracks().len(),
            started.elapsed()
        );

        Ok(Self {
            id: input.id.clone(),
            tracker,
            max_tracks: input.max_tracks,
        })
    }

    pub fn summary(&self) -> AudienceSummary {
        self.tracker.summary()
    }

    /// Write the statistics text to `path`
    pub fn write_log(&self, path: &Path) -> Result<()> {
        info!("Exporting log file '{}'", path.display());
        fs::write(path, self.summary().to_string()).map_err(|e| AnalyserError::io(path, e))
    }
}

/// All streams of one job
#[derive(Debug)]
pub struct Analyser {
    streams: Vec<StreamAnalysis>,
}

impl Analyser {
    /// Ingest every configured input
    ///
    /// Streams share no state and are ingested in parallel; the result keeps
    /// configuration order. Statistics logs are written where configured.
    pub fn from_config(config: &JobConfig) -> Result<Self> {
        let streams = config
            .inputs
            .par_iter()
            .map(|input| -> Result<StreamAnalysis> {
                let stream = StreamAnalysis::from_input(input)?;
                if let Some(log_path) = &input.output_log {
                    stream.write_log(log_path)?;
                }
                Ok(stream)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Analysed {} streams", streams.len());
        Ok(Self { streams })
    }

    pub fn from_streams(streams: Vec<StreamAnalysis>) -> Self {
        Self { streams }
    }

    pub fn streams(&self) -> &[StreamAnalysis] {
        &self.streams
    }

    pub fn stream(&self, id: &str) -> Result<&StreamAnalysis> {
        self.streams
            .iter()
            .find(|stream| stream.id == id)
            .ok_or_else(|| AnalyserError::UnknownInput(id.to_string()))
    }
}
