//! Per-person observation history and aggregates

use crate::error::TrackError;
use crate::frame::Frame;
use crate::record::{keys, TelemetryRecord};
use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

/// One record folded into a track
///
/// Optional sensor fields stay `None` when the record had no value for them.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub elapsed: Duration,
    pub uptime: Option<f64>,
    pub score: Option<f64>,
    pub gender: Option<Gender>,
    pub surprised: Option<f64>,
    pub sad: Option<f64>,
    pub happy: Option<f64>,
    pub angry: Option<f64>,
    pub age: Option<f64>,
    pub mouth_open: Option<f64>,
    pub left_eye_closed: Option<f64>,
    pub right_eye_closed: Option<f64>,
    pub pitch: Option<i64>,
    pub roll: Option<i64>,
    pub yaw: Option<i64>,
}

impl Observation {
    /// Extract an observation; timestamp and elapsed time are required
    pub fn from_record(record: &TelemetryRecord) -> Result<Self, TrackError> {
        let timestamp = record
            .timestamp()
            .ok_or_else(|| TrackError::MalformedTimestamp(format!("missing '{}'", keys::TIMESTAMP)))?;
        let elapsed = record
            .elapsed()
            .ok_or_else(|| TrackError::MalformedTimestamp(format!("missing '{}'", keys::DELTA_TIME)))?;

        Ok(Self {
            timestamp,
            elapsed,
            uptime: record.float(keys::UPTIME),
            score: record.float(keys::SCORE),
            gender: record
                .text(keys::GENDER)
                .and_then(|label| label.parse().ok()),
            surprised: record.float(keys::SURPRISED),
            sad: record.float(keys::SAD),
            happy: record.float(keys::HAPPY),
            angry: record.float(keys::ANGRY),
            age: record.float(keys::AGE),
            mouth_open: record.float(keys::MOUTH_OPEN),
            left_eye_closed: record.float(keys::LEFT_EYE_CLOSED),
            right_eye_closed: record.float(keys::RIGHT_EYE_CLOSED),
            pitch: record.int(keys::PITCH),
            roll: record.int(keys::ROLL),
            yaw: record.int(keys::YAW),
        })
    }
}

/// Windowed means for one track; `None` where the window held no value
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub id: u32,
    pub happy: Option<f64>,
    pub sad: Option<f64>,
    pub angry: Option<f64>,
    pub surprised: Option<f64>,
    pub mouth_open: Option<f64>,
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub yaw: Option<f64>,
}

/// Mean of the present values, `None` if there are none
fn mean_of<F>(observations: &[Observation], field: F) -> Option<f64>
where
    F: Fn(&Observation) -> Option<f64>,
{
    let (sum, count) = observations
        .iter()
        .filter_map(field)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count > 0 {
        Some(sum / count as f64)
    } else {
        None
    }
}

/// One persistent identity
#[derive(Debug, Clone)]
pub struct Track {
    id: u32,
    last_frame: Frame,
    observations: Vec<Observation>,
}

impl Track {
    /// Start a track from its first observation
    pub fn new(id: u32, frame: Frame, observation: Observation) -> Self {
        Self {
            id,
            last_frame: frame,
            observations: vec![observation],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }

    /// Most recent face box
    pub fn last_frame(&self) -> &Frame {
        &self.last_frame
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Append a matched observation
    pub fn push(&mut self, frame: Frame, observation: Observation) {
        self.last_frame = frame;
        self.observations.push(observation);
    }

    /// Observation indices covering `[from, to)`
    ///
    /// Scans forward: an elapsed time `<= from` moves both ends to it, one `< to`
    /// moves the end, and the first one `>= to` stops the scan. The window thus
    /// starts at the last observation at or before `from`; if there is none, or
    /// `from >= to`, the window is empty.
    pub fn window(&self, from: Duration, to: Duration) -> Option<RangeInclusive<usize>> {
        if from >= to {
            return None;
        }

        let mut from_idx = None;
        let mut to_idx = None;

        for (idx, observation) in self.observations.iter().enumerate() {
            if observation.elapsed <= from {
                from_idx = Some(idx);
                to_idx = Some(idx);
            }

            if observation.elapsed < to {
                to_idx = Some(idx);
            } else {
                break;
            }
        }

        match (from_idx, to_idx) {
            (Some(start), Some(end)) => Some(start..=end),
            _ => None,
        }
    }

    /// Observations inside the window, empty when the window is undefined
    pub fn window_observations(&self, from: Duration, to: Duration) -> &[Observation] {
        match self.window(from, to) {
            Some(range) => &self.observations[range],
            None => &[],
        }
    }

    /// Windowed means of emotion and pose fields
    pub fn snapshot(&self, from: Duration, to: Duration) -> TrackSnapshot {
        let window = self.window_observations(from, to);

        TrackSnapshot {
            id: self.id,
            happy: mean_of(window, |o| o.happy),
            sad: mean_of(window, |o| o.sad),
            angry: mean_of(window, |o| o.angry),
            surprised: mean_of(window, |o| o.surprised),
            mouth_open: mean_of(window, |o| o.mouth_open),
            pitch: mean_of(window, |o| o.pitch.map(|v| v as f64)),
            roll: mean_of(window, |o| o.roll.map(|v| v as f64)),
            yaw: mean_of(window, |o| o.yaw.map(|v| v as f64)),
        }
    }

    /// Majority gender over the whole history; ties go to `Female`
    pub fn dominant_gender(&self) -> Option<Gender> {
        let (male, female) = self
            .observations
            .iter()
            .filter_map(|o| o.gender)
            .fold((0usize, 0usize), |(male, female), gender| match gender {
                Gender::Male => (male + 1, female),
                Gender::Female => (male, female + 1),
            });

        if male + female == 0 {
            None
        } else if male > female {
            Some(Gender::Male)
        } else {
            Some(Gender::Female)
        }
    }

    /// Mean age over the whole history
    pub fn mean_age(&self) -> Option<f64> {
        mean_of(&self.observations, |o| o.age)
    }
}
