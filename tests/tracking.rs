//! End-to-end behaviour of the face tracker across frame sequences.

use std::collections::{BTreeMap, HashMap};

use facetrack::attributes::{SimulatedEstimator, Unavailable};
use facetrack::{
    Attributes, BoundingBox, Emotion, Error, FaceTracker, RngSource, TrackId, TrackerConfig,
};
use proptest::prelude::*;

fn face(x: f32, y: f32) -> BoundingBox {
    BoundingBox::ltwh(x, y, 50.0, 50.0)
}

fn init_logs() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn walkthrough_create_move_coast_expire() {
    init_logs();
    let mut tracker = FaceTracker::seeded(TrackerConfig::default(), 17).unwrap();

    let out = tracker.advance(0, Some(&[face(10.0, 10.0)])).unwrap();
    assert_eq!(out.len(), 1);
    let id = out[0].track_id;

    for frame in 1..30 {
        let out = tracker.advance(frame, None).unwrap();
        // no velocity yet, the box stays put
        assert_eq!(out[0].bbox, face(10.0, 10.0));
    }

    let out = tracker.advance(30, Some(&[face(14.0, 10.0)])).unwrap();
    assert_eq!(out[0].track_id, id);
    assert_eq!(out[0].bbox, face(14.0, 10.0));

    tracker.advance(31, None).unwrap();
    tracker.advance(32, None).unwrap();
    let out = tracker.advance(33, None).unwrap();
    let predicted = out[0].bbox;
    assert!((predicted.x - (14.0 + 4.0 * 3.0 * 0.8f32.powi(3))).abs() < 1e-3);
    assert_eq!((predicted.y, predicted.width, predicted.height), (10.0, 50.0, 50.0));

    for frame in 34..=40 {
        tracker.advance(frame, None).unwrap();
    }

    // reported up to 30 frames after the last detection, kept up to 90
    assert_eq!(tracker.advance(60, None).unwrap().len(), 1);
    assert!(tracker.advance(61, None).unwrap().is_empty());
    tracker.advance(120, Some(&[])).unwrap();
    assert!(tracker.store().contains(id));
    tracker.advance(121, Some(&[])).unwrap();
    assert!(!tracker.store().contains(id));
}

#[test]
fn greedy_matching_follows_submission_order() {
    let mut tracker =
        FaceTracker::new(TrackerConfig::default(), Unavailable, RngSource::seeded(1)).unwrap();

    // T1 at x=100, T2 at x=200
    tracker
        .advance(0, Some(&[face(100.0, 100.0), face(200.0, 100.0)]))
        .unwrap();
    let (t1, t2) = (TrackId(1), TrackId(2));

    // A is nearest T1, B is nearest T2; submitted as [B, A], B claims T2
    // first and A still finds T1
    let a = face(110.0, 100.0);
    let b = face(205.0, 100.0);
    tracker.advance(30, Some(&[b, a])).unwrap();
    assert_eq!(tracker.store().get(t1).unwrap().bbox, a);
    assert_eq!(tracker.store().get(t2).unwrap().bbox, b);

    // C lies between the two, slightly nearer T2, and goes first: it takes T2
    // and D, which sits on T2, has to settle for T1
    let c = face(160.0, 100.0);
    let d = face(206.0, 100.0);
    tracker.advance(60, Some(&[c, d])).unwrap();
    assert_eq!(tracker.store().get(t2).unwrap().bbox, c);
    assert_eq!(tracker.store().get(t1).unwrap().bbox, d);
}

#[test]
fn new_face_at_expired_location_gets_new_id() {
    let mut tracker = FaceTracker::seeded(TrackerConfig::default(), 3).unwrap();

    let first = tracker.advance(0, Some(&[face(10.0, 10.0)])).unwrap()[0].track_id;
    let second = tracker.advance(200, Some(&[face(10.0, 10.0)])).unwrap()[0].track_id;

    assert_ne!(first, second);
    assert!(second > first);
}

#[test]
fn refused_frames_leave_state_untouched() {
    let mut tracker = FaceTracker::seeded(TrackerConfig::default(), 3).unwrap();
    tracker.advance(10, Some(&[face(10.0, 10.0)])).unwrap();

    let err = tracker
        .advance(20, Some(&[BoundingBox::ltwh(5.0, 5.0, 10.0, 0.0)]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidBBox { index: 0, .. }));

    let err = tracker.advance(10, None).unwrap_err();
    assert_eq!(err, Error::NonMonotonicFrame { last: 10, got: 10 });

    assert_eq!(tracker.last_frame(), Some(10));
    assert_eq!(tracker.store().len(), 1);
}

#[test]
fn attributes_are_frozen_for_the_track_lifetime() {
    let mut tracker = FaceTracker::new(
        TrackerConfig::default(),
        SimulatedEstimator::new(RngSource::seeded(8)),
        RngSource::seeded(9),
    )
    .unwrap();

    let first = tracker.advance(0, Some(&[face(300.0, 300.0)])).unwrap()[0].clone();
    for step in 1..20u64 {
        let x = 300.0 + step as f32 * 3.0;
        let out = tracker.advance(step * 30, Some(&[face(x, 300.0)])).unwrap();

        assert_eq!(out[0].track_id, first.track_id);
        assert_eq!(out[0].age_bucket, first.age_bucket);
        assert_eq!(out[0].gender, first.gender);
        assert_eq!(out[0].ethnicity, first.ethnicity);
    }

    let snapshot: &Attributes = &tracker.store().get(first.track_id).unwrap().attributes;
    assert_eq!(snapshot.age_bucket, first.age_bucket);
}

#[test]
fn report_serializes_for_export() {
    let mut tracker =
        FaceTracker::new(TrackerConfig::default(), Unavailable, RngSource::seeded(1)).unwrap();
    let out = tracker.advance(0, Some(&[face(10.0, 20.0)])).unwrap();

    let json = serde_json::to_value(&out[0]).unwrap();
    assert_eq!(json["track_id"], "face_0001");
    assert_eq!(json["emotion"], "Unknown");
    assert_eq!(json["bbox"]["x"], 10.0);
    assert_eq!(json["first_seen_frame"], 0);
}

proptest! {
    #[test]
    fn small_moves_keep_identity(steps in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 1..12)) {
        let mut tracker = FaceTracker::seeded(TrackerConfig::default(), 5).unwrap();
        let (mut x, mut y) = (2000.0f32, 2000.0f32);

        let id = tracker.advance(0, Some(&[face(x, y)])).unwrap()[0].track_id;

        for (i, (dx, dy)) in steps.into_iter().enumerate() {
            x += dx;
            y += dy;
            let frame = (i as u64 + 1) * 30;
            let out = tracker.advance(frame, Some(&[face(x, y)])).unwrap();

            prop_assert_eq!(out.len(), 1);
            prop_assert_eq!(out[0].track_id, id);
        }
    }

    #[test]
    fn ids_are_never_reused(
        frames in prop::collection::vec(
            (1u64..60, prop::collection::vec((0.0f32..1500.0, 0.0f32..1000.0), 0..5)),
            1..40,
        )
    ) {
        let mut tracker = FaceTracker::seeded(TrackerConfig::default(), 21).unwrap();
        let mut first_seen: HashMap<TrackId, u64> = HashMap::new();
        let mut highest: Option<TrackId> = None;
        let mut frame = 0u64;

        for (gap, boxes) in frames {
            frame += gap;
            let boxes: Vec<_> = boxes.into_iter().map(|(x, y)| face(x, y)).collect();
            let out = tracker.advance(frame, Some(&boxes)).unwrap();

            let mut issued_now = Vec::new();
            for track in &out {
                match first_seen.get(&track.track_id) {
                    Some(seen) => prop_assert_eq!(*seen, track.first_seen_frame),
                    None => {
                        prop_assert_eq!(track.first_seen_frame, frame);
                        issued_now.push(track.track_id);
                    }
                }
            }

            for id in issued_now {
                if let Some(h) = highest {
                    prop_assert!(id > h, "{} issued after {}", id, h);
                }
                first_seen.insert(id, frame);
            }
            highest = first_seen.keys().max().copied();
        }
    }

    #[test]
    fn emotion_holds_for_its_stability_duration(
        seed in any::<u64>(),
        gaps in prop::collection::vec(1u64..40, 10..200),
    ) {
        let config = TrackerConfig {
            emotion_stability_range: 5..=20,
            detection_interval: 1,
            ..Default::default()
        };
        let mut tracker = FaceTracker::seeded(config, seed).unwrap();
        let mut frame = 0u64;
        let mut shown: BTreeMap<TrackId, Emotion> = BTreeMap::new();

        for gap in gaps {
            frame += gap;
            let before: BTreeMap<_, _> = tracker
                .store()
                .iter()
                .map(|t| (t.id, t.emotion))
                .collect();

            let out = tracker.advance(frame, Some(&[face(100.0, 300.0)])).unwrap();

            for track in &out {
                if let (Some(prev), Some(state)) = (shown.get(&track.track_id), before.get(&track.track_id)) {
                    if *prev != track.emotion {
                        prop_assert!(
                            frame - state.last_change_frame >= state.stability_duration as u64,
                            "{} changed {:?} -> {:?} at {} inside hold {:?}",
                            track.track_id, prev, track.emotion, frame, state
                        );
                    }
                }
                shown.insert(track.track_id, track.emotion);
            }
        }
    }
}
