//! Batch audience analysis over face telemetry logs
//!
//! Reads a JSON job describing telemetry inputs, tracks the audience of each
//! input with [`facetrack::Tracker`], and exports per-second emotion and pose
//! averages as CSV.

pub mod config;
pub mod error;
pub mod export;
pub mod session;

pub use config::{ExportConfig, InputConfig, JobConfig, TimeRange};
pub use error::{AnalyserError, Result};
pub use export::{export, write_report};
pub use session::{Analyser, StreamAnalysis};

/// Get library version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
