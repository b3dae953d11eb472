//! Frame-by-frame driver tying a face detector to a [`FaceTracker`].
//!
//! The detector is only consulted on detection frames; every other frame is
//! served from the tracker's predictions. Recent reports are kept in a
//! bounded log for dashboards and exports.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use serde_derive::Serialize;
use tracing::{info, warn};

use crate::attributes::{AttributeEstimator, Emotion};
use crate::bbox::BoundingBox;
use crate::engine::FaceTracker;
use crate::error::{Error, Result};
use crate::frame::FrameReport;
use crate::history::History;
use crate::rng::{RandomSource, RngSource};

/// Number of frame reports a session remembers.
pub const REPORT_LOG_LEN: usize = 100;

/// Yields face boxes from a still image.
pub trait Detector {
    type Image: ?Sized;

    fn detect(&mut self, image: &Self::Image) -> Result<Vec<BoundingBox>>;
}

/// Summary of a session's report log.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub entries: usize,
    pub total_faces: usize,
    pub frames_without_faces: usize,
    pub frames_with_one_face: usize,
    pub frames_with_several_faces: usize,
    pub distinct_tracks: usize,
    pub emotions: BTreeMap<Emotion, usize>,
}

pub struct Session<D, E, R = RngSource<StdRng>> {
    detector: D,
    tracker: FaceTracker<E, R>,
    fps: f32,
    reports: History<FrameReport>,
}

impl<D, E, R> Session<D, E, R>
where
    D: Detector,
    E: AttributeEstimator,
    R: RandomSource,
{
    pub fn new(detector: D, tracker: FaceTracker<E, R>, fps: f32) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "fps must be positive, got {}",
                fps
            )));
        }

        Ok(Self {
            detector,
            tracker,
            fps,
            reports: History::with_capacity(REPORT_LOG_LEN),
        })
    }

    /// Tracks one frame, running the detector if this is a detection frame.
    ///
    /// A failing detector turns the frame into a prediction-only frame.
    pub fn process(&mut self, frame_index: u64, image: &D::Image) -> Result<FrameReport> {
        let detections = if self.tracker.config().is_detection_frame(frame_index) {
            match self.detector.detect(image) {
                Ok(boxes) => Some(boxes),
                Err(err) => {
                    warn!(frame = frame_index, error = %err, "detector failed, predicting only");
                    None
                }
            }
        } else {
            None
        };

        let tracks = self.tracker.advance(frame_index, detections.as_deref())?;

        let report = FrameReport {
            frame_index,
            timestamp: frame_index as f32 / self.fps,
            detected: detections.is_some(),
            tracks,
        };
        self.reports.push(report.clone());

        Ok(report)
    }

    /// Oldest to newest.
    #[inline]
    pub fn reports(&self) -> impl Iterator<Item = &FrameReport> {
        self.reports.asc_iter()
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats {
            entries: self.reports.len(),
            ..Default::default()
        };
        let mut ids = BTreeSet::new();

        for report in self.reports.iter() {
            stats.total_faces += report.len();

            match report.len() {
                0 => stats.frames_without_faces += 1,
                1 => stats.frames_with_one_face += 1,
                _ => stats.frames_with_several_faces += 1,
            }

            for track in report.iter() {
                ids.insert(track.track_id);
                *stats.emotions.entry(track.emotion).or_default() += 1;
            }
        }

        stats.distinct_tracks = ids.len();
        stats
    }

    /// Forgets every track and every report.
    pub fn clear(&mut self) {
        info!(reports = self.reports.len(), "session cleared");

        self.tracker.reset();
        self.reports.clear();
    }

    #[inline]
    pub fn tracker(&self) -> &FaceTracker<E, R> {
        &self.tracker
    }

    #[inline]
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attributes, Unavailable};
    use crate::config::TrackerConfig;

    /// Pretends every image is the list of boxes it contains.
    struct Replay {
        calls: usize,
        fail: bool,
    }

    impl Detector for Replay {
        type Image = [BoundingBox];

        fn detect(&mut self, image: &[BoundingBox]) -> Result<Vec<BoundingBox>> {
            self.calls += 1;
            if self.fail {
                return Err(Error::Detector("camera unplugged".into()));
            }
            Ok(image.to_vec())
        }
    }

    fn session(interval: u64) -> Session<Replay, Unavailable> {
        let config = TrackerConfig {
            detection_interval: interval,
            ..Default::default()
        };
        let tracker = FaceTracker::new(config, Unavailable, RngSource::seeded(2)).unwrap();

        Session::new(
            Replay {
                calls: 0,
                fail: false,
            },
            tracker,
            30.0,
        )
        .unwrap()
    }

    fn face(x: f32) -> BoundingBox {
        BoundingBox::ltwh(x, 10.0, 50.0, 50.0)
    }

    #[test]
    fn detector_runs_on_interval_only() {
        let mut s = session(10);
        let image = [face(10.0)];

        for frame in 0..25 {
            let report = s.process(frame, &image).unwrap();
            assert_eq!(report.detected, frame % 10 == 0);
            assert_eq!(report.len(), 1);
        }

        assert_eq!(s.detector_mut().calls, 3);
        let last = s.reports().last().unwrap();
        assert_eq!(last.frame_index, 24);
        assert!((last.timestamp - 0.8).abs() < 1e-6);
    }

    #[test]
    fn detector_failure_degrades_to_prediction() {
        let mut s = session(1);
        s.process(0, &[face(10.0)]).unwrap();

        s.detector_mut().fail = true;
        let report = s.process(1, &[face(10.0), face(400.0)]).unwrap();

        assert!(!report.detected);
        assert_eq!(report.len(), 1);
        assert_eq!(report.tracks[0].frames_since_seen, 1);
    }

    #[test]
    fn log_is_bounded() {
        let mut s = session(30);
        for frame in 0..(REPORT_LOG_LEN as u64 + 20) {
            s.process(frame, &[]).unwrap();
        }

        assert_eq!(s.reports().count(), REPORT_LOG_LEN);
        assert_eq!(s.reports().next().unwrap().frame_index, 20);
    }

    #[test]
    fn stats_count_faces_and_emotions() {
        let mut s = session(1);
        s.process(0, &[]).unwrap();
        s.process(1, &[face(10.0)]).unwrap();
        s.process(2, &[face(10.0), face(400.0)]).unwrap();

        let stats = s.stats();
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.total_faces, 3);
        assert_eq!(stats.frames_without_faces, 1);
        assert_eq!(stats.frames_with_one_face, 1);
        assert_eq!(stats.frames_with_several_faces, 1);
        assert_eq!(stats.distinct_tracks, 2);
        assert_eq!(stats.emotions.get(&Emotion::Unknown), Some(&3));
        assert!(s.tracker().store().iter().all(|t| t.attributes == Attributes::unavailable()));
    }

    #[test]
    fn clear_resets_tracker_and_log() {
        let mut s = session(1);
        s.process(5, &[face(10.0)]).unwrap();
        s.clear();

        assert_eq!(s.stats(), SessionStats::default());
        assert!(s.tracker().store().is_empty());

        // frame sequence restarts too
        assert!(s.process(0, &[face(10.0)]).is_ok());
    }

    #[test]
    fn rejects_bad_fps() {
        let tracker =
            FaceTracker::new(TrackerConfig::default(), Unavailable, RngSource::seeded(2)).unwrap();
        let replay = Replay {
            calls: 0,
            fail: false,
        };

        assert!(matches!(
            Session::new(replay, tracker, 0.0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
