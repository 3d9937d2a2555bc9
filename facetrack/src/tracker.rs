//! Audience tracker for one telemetry stream
//!
//! Folds parsed records into persistent tracks and answers time-window and
//! spatial queries over them. Ingestion expects records in frame order.

use crate::error::TrackError;
use crate::frame::Frame;
use crate::matching::{IdentityMatcher, ProximityMatcher};
use crate::record::{keys, TelemetryRecord};
use crate::track::{Gender, Observation, Track, TrackSnapshot};
use chrono::{Duration, NaiveDateTime};
use log::{debug, trace};
use std::fmt;

/// Per-track line of the audience summary
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub id: u32,
    pub observation_count: usize,
    /// Share of stream frames this track was seen in, truncated
    pub frame_percentage: usize,
    pub gender: Option<Gender>,
    pub mean_age: Option<f64>,
    pub center: (i64, i64),
}

/// Population statistics for one stream
#[derive(Debug, Clone, PartialEq)]
pub struct AudienceSummary {
    pub frames: usize,
    pub tracks: Vec<TrackSummary>,
}

impl fmt::Display for AudienceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames: {}", self.frames)?;
        for track in &self.tracks {
            let gender = track
                .gender
                .map_or_else(|| "unknown".to_string(), |g| g.to_string());
            let age = track
                .mean_age
                .map_or_else(|| "unknown".to_string(), |a| format!("{:.1}", a));
            writeln!(
                f,
                "Person_{}: {} ({}%) - {} ({}) - {}x{}",
                track.id,
                track.observation_count,
                track.frame_percentage,
                gender,
                age,
                track.center.0,
                track.center.1
            )?;
        }
        Ok(())
    }
}

/// Tracks the audience of one input stream
#[derive(Debug)]
pub struct Tracker {
    matcher: Box<dyn IdentityMatcher>,
    tracks: Vec<Track>,
    next_track_id: u32,
    frames: usize,
    last_frame_number: Option<i64>,
    frame_timestamps: Vec<NaiveDateTime>,
    frame_elapsed: Vec<Duration>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Tracker using the default [`ProximityMatcher`]
    pub fn new() -> Self {
        Self::with_matcher(Box::new(ProximityMatcher::default()))
    }

    pub fn with_matcher(matcher: Box<dyn IdentityMatcher>) -> Self {
        Tracker {
            matcher,
            tracks: Vec::new(),
            next_track_id: 0,
            frames: 0,
            last_frame_number: None,
            frame_timestamps: Vec::new(),
            frame_elapsed: Vec::new(),
        }
    }

    /// Fold one record into the tracked population
    ///
    /// The record is validated before any state changes, so a rejected record
    /// leaves the tracker untouched.
    pub fn ingest(&mut self, record: &TelemetryRecord) -> Result<(), TrackError> {
        let frame_number = record
            .int(keys::FRAME)
            .ok_or_else(|| TrackError::missing_field(keys::FRAME))?;
        let frame = frame_from_record(record)?;
        let observation = Observation::from_record(record)?;

        if self.last_frame_number != Some(frame_number) {
            self.frames += 1;
            self.last_frame_number = Some(frame_number);
            self.frame_timestamps.push(observation.timestamp);
            self.frame_elapsed.push(observation.elapsed);
            trace!("Frame {} starts at {:?}", frame_number, observation.elapsed);
        }

        match self.matcher.find_match(&self.tracks, &frame) {
            Some(idx) => self.tracks[idx].push(frame, observation),
            None => {
                let id = self.next_track_id;
                self.next_track_id += 1;
                debug!("New track {} at {} in frame {}", id, frame, frame_number);
                self.tracks.push(Track::new(id, frame, observation));
            }
        }

        Ok(())
    }

    /// All tracks in creation order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: u32) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    /// Number of distinct frames seen
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn frame_timestamps(&self) -> &[NaiveDateTime] {
        &self.frame_timestamps
    }

    pub fn frame_elapsed_times(&self) -> &[Duration] {
        &self.frame_elapsed
    }

    /// Tracks eligible for queries
    ///
    /// Without a cap every track is returned in creation order. With a cap the
    /// `max_tracks` most observed tracks are returned, most observed first,
    /// equal counts kept in creation order.
    pub fn valid_tracks(&self, max_tracks: Option<usize>) -> Vec<&Track> {
        let mut tracks: Vec<&Track> = self.tracks.iter().collect();
        if let Some(max) = max_tracks {
            tracks.sort_by(|a, b| b.observation_count().cmp(&a.observation_count()));
            tracks.truncate(max);
        }
        tracks
    }

    /// Windowed snapshot of every valid track
    pub fn query(
        &self,
        from: Duration,
        to: Duration,
        max_tracks: Option<usize>,
    ) -> Vec<TrackSnapshot> {
        self.valid_tracks(max_tracks)
            .into_iter()
            .map(|track| track.snapshot(from, to))
            .collect()
    }

    /// Valid track whose last center is nearest to `point`
    pub fn closest_track(&self, point: (i64, i64), max_tracks: Option<usize>) -> Option<&Track> {
        let mut closest: Option<(&Track, f64)> = None;

        for track in self.valid_tracks(max_tracks) {
            let distance = track.last_frame().distance_to(point);
            if closest.map_or(true, |(_, d)| distance < d) {
                closest = Some((track, distance));
            }
        }

        closest.map(|(track, _)| track)
    }

    /// Windowed snapshot of the track nearest to `point`
    pub fn query_closest(
        &self,
        from: Duration,
        to: Duration,
        point: (i64, i64),
        max_tracks: Option<usize>,
    ) -> Option<TrackSnapshot> {
        self.closest_track(point, max_tracks)
            .map(|track| track.snapshot(from, to))
    }

    /// Per-track statistics over the whole stream
    pub fn summary(&self) -> AudienceSummary {
        let tracks = self
            .tracks
            .iter()
            .map(|track| TrackSummary {
                id: track.id(),
                observation_count: track.observation_count(),
                frame_percentage: if self.frames > 0 {
                    track.observation_count() * 100 / self.frames
                } else {
                    0
                },
                gender: track.dominant_gender(),
                mean_age: track.mean_age(),
                center: track.last_frame().center(),
            })
            .collect();

        AudienceSummary {
            frames: self.frames,
            tracks,
        }
    }
}

fn frame_from_record(record: &TelemetryRecord) -> Result<Frame, TrackError> {
    let coord = |key: &str| {
        record
            .scaled(key)
            .ok_or_else(|| TrackError::missing_field(key))
    };

    Ok(Frame::new(
        coord(keys::LEFT)?,
        coord(keys::TOP)?,
        coord(keys::RIGHT)?,
        coord(keys::BOTTOM)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::NearestMatcher;
    use crate::parser::parse_line;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 7, 2)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    /// Telemetry line for a 0.1x0.1 box centered on (x, y), in sensor units
    fn line(frame: i64, secs: u32, x: f64, y: f64, extra: &str) -> String {
        format!(
            "TimeStamp=2013-Jul-02 16:00:{:02}.000000 Frame={} Left={:.3} Top={:.3} Right={:.3} Bottom={:.3} {}",
            secs,
            frame,
            x - 0.05,
            y - 0.05,
            x + 0.05,
            y + 0.05,
            extra
        )
    }

    fn ingest_line(tracker: &mut Tracker, text: &str) {
        let record = parse_line(text, Some(start())).unwrap();
        tracker.ingest(&record).unwrap();
    }

    #[test]
    fn test_matching_extends_track() {
        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.5, 0.5, "Happy=0.2"));
        ingest_line(&mut tracker, &line(2, 1, 0.52, 0.51, "Happy=nil"));
        ingest_line(&mut tracker, &line(3, 2, 0.54, 0.5, "Happy=0.8"));

        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.frame_count(), 3);
        assert_eq!(tracker.tracks()[0].observation_count(), 3);

        let snapshots = tracker.query(Duration::seconds(0), Duration::seconds(3), None);
        assert_eq!(snapshots.len(), 1);
        assert_abs_diff_eq!(snapshots[0].happy.unwrap(), 0.5);
    }

    #[test]
    fn test_distant_face_starts_new_track() {
        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.2, 0.5, ""));
        ingest_line(&mut tracker, &line(1, 0, 0.8, 0.5, ""));
        ingest_line(&mut tracker, &line(2, 1, 0.2, 0.52, ""));

        assert_eq!(tracker.frame_count(), 2);
        assert_eq!(tracker.frame_elapsed_times(), &[Duration::zero(), Duration::seconds(1)]);
        assert_eq!(tracker.frame_timestamps().len(), 2);

        let ids: Vec<u32> = tracker.tracks().iter().map(Track::id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(tracker.tracks()[0].observation_count(), 2);
        assert_eq!(tracker.tracks()[1].observation_count(), 1);
    }

    #[test]
    fn test_first_created_track_wins() {
        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.5, 0.5, ""));
        ingest_line(&mut tracker, &line(1, 0, 0.59, 0.5, ""));
        // Closer to track 1 but within reach of track 0
        ingest_line(&mut tracker, &line(2, 1, 0.57, 0.5, ""));

        assert_eq!(tracker.tracks()[0].observation_count(), 2);
        assert_eq!(tracker.tracks()[1].observation_count(), 1);
    }

    #[test]
    fn test_custom_matcher() {
        let mut tracker = Tracker::with_matcher(Box::new(NearestMatcher::default()));
        ingest_line(&mut tracker, &line(1, 0, 0.5, 0.5, ""));
        ingest_line(&mut tracker, &line(1, 0, 0.59, 0.5, ""));
        ingest_line(&mut tracker, &line(2, 1, 0.57, 0.5, ""));

        assert_eq!(tracker.tracks()[0].observation_count(), 1);
        assert_eq!(tracker.tracks()[1].observation_count(), 2);
    }

    #[test]
    fn test_ingest_is_deterministic() {
        let lines = vec![
            line(1, 0, 0.2, 0.2, ""),
            line(1, 0, 0.6, 0.6, ""),
            line(2, 1, 0.22, 0.21, ""),
            line(2, 1, 0.9, 0.1, ""),
            line(3, 2, 0.61, 0.62, ""),
        ];

        let run = || {
            let mut tracker = Tracker::new();
            for l in &lines {
                ingest_line(&mut tracker, l);
            }
            tracker
                .tracks()
                .iter()
                .map(|t| (t.id(), t.observation_count()))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(), run());
        assert_eq!(run(), vec![(0, 2), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_missing_required_fields() {
        let mut tracker = Tracker::new();

        let no_frame = "TimeStamp=2013-Jul-02 16:00:00 Left=0.1 Top=0.1 Right=0.2 Bottom=0.2";
        let record = parse_line(no_frame, Some(start())).unwrap();
        assert!(matches!(
            tracker.ingest(&record),
            Err(TrackError::MalformedRecord(_))
        ));

        let nil_left = "TimeStamp=2013-Jul-02 16:00:00 Frame=1 Left=nil Top=0.1 Right=0.2 Bottom=0.2";
        let record = parse_line(nil_left, Some(start())).unwrap();
        assert!(matches!(
            tracker.ingest(&record),
            Err(TrackError::MalformedRecord(_))
        ));

        let no_timestamp = "Frame=1 Left=0.1 Top=0.1 Right=0.2 Bottom=0.2";
        let record = parse_line(no_timestamp, None).unwrap();
        assert!(matches!(
            tracker.ingest(&record),
            Err(TrackError::MalformedTimestamp(_))
        ));

        assert!(tracker.tracks().is_empty());
        assert_eq!(tracker.frame_count(), 0);
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let mut tracker = Tracker::new();
        let wide = "TimeStamp=2013-Jul-02 16:00:00 Frame=1 Left=-9e15 Top=0.1 Right=9e15 Bottom=0.2";
        ingest_line(&mut tracker, wide);
        ingest_line(&mut tracker, &line(2, 1, 0.5, 0.5, ""));
        ingest_line(&mut tracker, wide.replace("Frame=1", "Frame=3").as_str());

        assert_eq!(tracker.tracks().len(), 2);
        let summary = tracker.summary();
        assert_eq!(summary.tracks[0].observation_count, 2);
        assert_eq!(
            summary.tracks[0].center,
            (-9_000_000_000_000_000_000 + i64::MAX / 2, 150)
        );
        assert!(tracker.closest_track((i64::MAX, 0), None).is_some());

        let rejected = "TimeStamp=2013-Jul-02 16:00:04 Frame=4 Left=-inf Top=0.1 Right=inf Bottom=0.2";
        assert!(parse_line(rejected, Some(start())).is_err());
    }

    #[test]
    fn test_empty_or_reversed_window_has_no_data() {
        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.5, 0.5, "Happy=0.2"));
        ingest_line(&mut tracker, &line(2, 1, 0.5, 0.5, "Happy=nil"));
        ingest_line(&mut tracker, &line(3, 2, 0.5, 0.5, "Happy=0.8"));

        let snapshots = tracker.query(Duration::seconds(2), Duration::seconds(2), None);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].happy, None);

        let snapshots = tracker.query(Duration::seconds(2), Duration::seconds(1), None);
        assert_eq!(snapshots[0].happy, None);
    }

    fn tracker_with_counts(counts: &[usize]) -> Tracker {
        let mut tracker = Tracker::new();
        let mut frame = 0;
        for round in 0..counts.iter().copied().max().unwrap_or(0) {
            frame += 1;
            for (idx, count) in counts.iter().enumerate() {
                if round < *count {
                    let x = 0.1 + 0.15 * idx as f64;
                    ingest_line(&mut tracker, &line(frame, 0, x, 0.5, ""));
                }
            }
        }
        tracker
    }

    #[test]
    fn test_top_n_selection() {
        let tracker = tracker_with_counts(&[10, 3, 7, 1, 9]);
        let counts: Vec<usize> = tracker.tracks().iter().map(Track::observation_count).collect();
        assert_eq!(counts, vec![10, 3, 7, 1, 9]);

        let snapshots = tracker.query(Duration::zero(), Duration::seconds(1), Some(2));
        let ids: Vec<u32> = snapshots.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 4]);

        assert_eq!(tracker.query(Duration::zero(), Duration::seconds(1), None).len(), 5);
        assert_eq!(tracker.valid_tracks(Some(10)).len(), 5);
    }

    #[test]
    fn test_top_n_ties_keep_creation_order() {
        let tracker = tracker_with_counts(&[2, 5, 2, 2]);
        let ids: Vec<u32> = tracker.valid_tracks(Some(3)).iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![1, 0, 2]);
    }

    #[test]
    fn test_closest_track() {
        let empty = Tracker::new();
        assert!(empty.closest_track((500, 500), None).is_none());
        assert!(empty
            .query_closest(Duration::zero(), Duration::seconds(1), (500, 500), None)
            .is_none());

        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.2, 0.5, "Happy=0.1"));
        ingest_line(&mut tracker, &line(1, 0, 0.6, 0.5, "Happy=0.9"));

        assert_eq!(tracker.closest_track((550, 500), None).map(Track::id), Some(1));
        assert_eq!(tracker.closest_track((0, 0), None).map(Track::id), Some(0));
        // Equidistant: first encountered wins
        assert_eq!(tracker.closest_track((400, 500), None).map(Track::id), Some(0));

        let snapshot = tracker
            .query_closest(Duration::zero(), Duration::seconds(1), (600, 500), None)
            .unwrap();
        assert_eq!(snapshot.id, 1);
        assert_abs_diff_eq!(snapshot.happy.unwrap(), 0.9);
    }

    #[test]
    fn test_summary() {
        let mut tracker = Tracker::new();
        ingest_line(&mut tracker, &line(1, 0, 0.5, 0.5, "Gender=Male Age=30"));
        ingest_line(&mut tracker, &line(2, 1, 0.5, 0.5, "Gender=Female Age=34"));
        ingest_line(&mut tracker, &line(3, 2, 0.9, 0.9, "Gender=nil Age=nil"));

        let summary = tracker.summary();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.tracks.len(), 2);
        assert_eq!(summary.tracks[0].frame_percentage, 66);
        assert_eq!(summary.tracks[0].gender, Some(Gender::Female));
        assert_abs_diff_eq!(summary.tracks[0].mean_age.unwrap(), 32.0);
        assert_eq!(summary.tracks[0].center, (500, 500));
        assert_eq!(summary.tracks[1].gender, None);

        let text = summary.to_string();
        assert!(text.starts_with("Frames: 3\n"));
        assert!(text.contains("Person_0: 2 (66%) - Female (32.0) - 500x500"));
        assert!(text.contains("Person_1: 1 (33%) - unknown (unknown) - 900x900"));
    }
}
