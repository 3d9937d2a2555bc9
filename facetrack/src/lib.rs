//! Face telemetry parsing and audience tracking
//!
//! This crate turns the per-face text records written by a face-analysis sensor
//! into persistent per-person tracks and answers time-windowed statistics
//! queries over them.
//!
//! # Pipeline
//!
//! ```rust,ignore
//! use facetrack::{parse_line, Tracker};
//! use chrono::Duration;
//!
//! let mut tracker = Tracker::new();
//! for line in lines {
//!     let record = parse_line(&line, Some(session_start))?;
//!     tracker.ingest(&record)?;
//! }
//!
//! // Mean emotions per person for the first second
//! let snapshots = tracker.query(Duration::zero(), Duration::seconds(1), None);
//! ```
//!
//! Identity matching is pluggable through [`IdentityMatcher`]; the default
//! [`ProximityMatcher`] attaches a face to the first track whose last box
//! center lies within a fixed distance.

pub mod error;
pub mod frame;
pub mod matching;
pub mod parser;
pub mod record;
pub mod time_codec;
pub mod track;
pub mod tracker;

pub use error::{ParseError, TrackError};
pub use frame::Frame;
pub use matching::{IdentityMatcher, NearestMatcher, ProximityMatcher};
pub use parser::{parse_line, parse_lines};
pub use record::{FieldKind, FieldValue, TelemetryRecord};
pub use track::{Gender, Observation, Track, TrackSnapshot};
pub use tracker::{AudienceSummary, TrackSummary, Tracker};
