//! Error types for the audience analyser

use facetrack::{ParseError, TrackError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the analyser
pub type Result<T> = std::result::Result<T, AnalyserError>;

#[derive(Error, Debug)]
pub enum AnalyserError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown input '{0}'")]
    UnknownInput(String),

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Failed to track '{path}' line {line}: {source}")]
    Track {
        path: PathBuf,
        line: usize,
        #[source]
        source: TrackError,
    },

    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl AnalyserError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
