use std::io::{Cursor, Write};

use gesture_shooter::config::FrameGeometry;
use gesture_shooter::entities::Intent;
use gesture_shooter::gesture::{
    GestureClassifier, GestureConfig, HandLandmark, LandmarkPoint, LANDMARK_COUNT,
};
use gesture_shooter::source::*;

fn pairs_line(n: usize) -> String {
    let pairs: Vec<String> = (0..n).map(|i| format!("[{}, 0.5]", i as f32 / 40.0)).collect();
    format!("[{}]", pairs.join(", "))
}

fn classify(detection: &Detection) -> Intent {
    let mut c = GestureClassifier::new(GestureConfig::default(), FrameGeometry::default());
    c.classify(detection.hands(), 0.0)
}

// ── Replay ────────────────────────────────────────────────────────────────────

#[test]
fn replay_reads_frames_in_order() {
    let text = format!("null\n\n{}\n", pairs_line(LANDMARK_COUNT));
    let mut source = ReplaySource::from_reader(Cursor::new(text));

    assert_eq!(source.poll().expect("frame 1"), Some(Detection::NoHand));
    match source.poll().expect("frame 2") {
        Some(Detection::Hand(hand)) => {
            let tip = hand.get(HandLandmark::IndexTip);
            assert_eq!((tip.x, tip.y), (8.0 / 40.0, 0.5));
        }
        other => panic!("expected a hand, got {other:?}"),
    }
    assert_eq!(source.poll().expect("end"), None);
    assert_eq!(source.poll().expect("still ended"), None);
}

#[test]
fn empty_replay_is_dry() {
    let mut source = ReplaySource::from_reader(Cursor::new(""));
    assert_eq!(source.poll().expect("end"), None);
}

#[test]
fn wrong_landmark_count_reports_line() {
    let text = format!("null\n{}\n", pairs_line(20));
    let mut source = ReplaySource::from_reader(Cursor::new(text));
    source.poll().expect("first line is fine");
    match source.poll() {
        Err(SourceError::LandmarkCount { line, found }) => {
            assert_eq!(line, 2);
            assert_eq!(found, 20);
        }
        other => panic!("expected LandmarkCount, got {other:?}"),
    }
}

#[test]
fn malformed_line_is_parse_error() {
    let mut source = ReplaySource::from_reader(Cursor::new("\n[[0.1, oops]]\n"));
    match source.poll() {
        Err(SourceError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected Parse, got {other:?}"),
    }
}

#[test]
fn encoded_frames_replay_identically() {
    let hand = VirtualHand::default().detection();
    let text = format!(
        "{}\n{}\n",
        encode_frame(&hand).expect("encode hand"),
        encode_frame(&Detection::NoHand).expect("encode no hand")
    );
    let mut source = ReplaySource::from_reader(Cursor::new(text));
    assert_eq!(source.poll().expect("hand"), Some(hand));
    assert_eq!(source.poll().expect("no hand"), Some(Detection::NoHand));
}

#[test]
fn no_hand_encodes_as_null() {
    assert_eq!(encode_frame(&Detection::NoHand).expect("encode"), "null");
}

#[test]
fn non_finite_landmark_is_not_encoded() {
    let mut hand = VirtualHand::default().landmarks();
    hand.set(HandLandmark::IndexPip, LandmarkPoint::new(f32::NAN, 0.5));
    match encode_frame(&Detection::Hand(hand)) {
        Err(SourceError::NonFinite { index }) => assert_eq!(index, HandLandmark::IndexPip.index()),
        other => panic!("expected NonFinite, got {other:?}"),
    }
}

#[test]
fn replay_opens_files() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "null").expect("write");
    let line = encode_frame(&VirtualHand::default().detection()).expect("encode");
    writeln!(file, "{line}").expect("write");
    let mut source = ReplaySource::open(file.path()).expect("open replay");
    assert_eq!(source.poll().expect("frame"), Some(Detection::NoHand));
    assert!(matches!(source.poll().expect("frame"), Some(Detection::Hand(_))));
    assert_eq!(source.poll().expect("end"), None);
}

#[test]
fn replay_missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = ReplaySource::open(&dir.path().join("nope.jsonl"));
    assert!(matches!(result, Err(SourceError::Io(_))));
}

// ── Virtual hand ──────────────────────────────────────────────────────────────

#[test]
fn pointing_hand_moves_to_fingertip() {
    let hand = VirtualHand {
        x: 0.25,
        y: 0.5,
        ..VirtualHand::default()
    };
    assert_eq!(classify(&hand.detection()), Intent::Move { x: 200.0, y: 300.0 });
}

#[test]
fn curled_hand_shoots() {
    let hand = VirtualHand {
        curled: true,
        ..VirtualHand::default()
    };
    assert_eq!(classify(&hand.detection()), Intent::Shoot);
}

#[test]
fn hidden_hand_is_no_detection() {
    let mut hand = VirtualHand {
        visible: false,
        ..VirtualHand::default()
    };
    assert_eq!(hand.poll().expect("poll"), Some(Detection::NoHand));
    assert!(Detection::NoHand.hands().is_empty());
    assert_eq!(classify(&hand.detection()), Intent::None);
}

#[test]
fn virtual_hand_never_runs_dry() {
    let mut hand = VirtualHand::default();
    for _ in 0..10 {
        assert!(hand.poll().expect("poll").is_some());
    }
}

#[test]
fn nudge_stays_inside_image() {
    let mut hand = VirtualHand::default();
    hand.nudge(2.0, -3.0);
    assert_eq!((hand.x, hand.y), (1.0, 0.0));
    hand.nudge(-0.25, 0.5);
    assert_eq!((hand.x, hand.y), (0.75, 0.5));
}

#[test]
fn hand_detection_exposes_one_hand() {
    let detection = VirtualHand::default().detection();
    assert_eq!(detection.hands().len(), 1);
}
