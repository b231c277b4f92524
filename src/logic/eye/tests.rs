use super::*;
use crate::logic::testutil::{stream, Face};

fn estimator() -> EyeStateEstimator {
    EyeStateEstimator::new(EyeConfig::default(), CameraConfig::default())
}

fn drive(est: &mut EyeStateEstimator, frames: &[LandmarkFrame], baseline: &Baseline) -> EyeState {
    let mut last = EyeState::default();
    for frame in frames {
        let sample = est.measure(frame).ok();
        last = est.update(frame.timestamp, sample.as_ref(), baseline);
    }
    last
}

#[test]
fn test_ear_matches_geometry() {
    let est = estimator();
    let sample = est.measure(&Face::default().eyes(0.28).frame(1.0)).unwrap();
    assert!((sample.ear - 0.28).abs() < 1e-3);
    assert!((sample.left_ear - sample.right_ear).abs() < 1e-3);
}

#[test]
fn test_ear_invariant_to_pose() {
    let est = estimator();
    let tilted = est
        .measure(&Face::default().with_pose(12.0, -15.0, 0.0).eyes(0.3).frame(1.0))
        .unwrap();
    let rolled = est
        .measure(&Face::default().with_pose(0.0, 0.0, 20.0).eyes(0.3).frame(1.0))
        .unwrap();
    assert!((tilted.ear - 0.3).abs() < 1e-3);
    assert!((rolled.ear - 0.3).abs() < 1e-3);
}

#[test]
fn test_no_face_measure() {
    let est = estimator();
    assert_eq!(est.measure(&LandmarkFrame::no_face(1.0)), Err(EngineError::NoFaceDetected));
}

#[test]
fn test_degenerate_eye_rejected() {
    let est = estimator();
    let frame = LandmarkFrame::new(1.0, vec![Point3::new(0.5, 0.5, 0.0); 468]);
    assert!(matches!(est.measure(&frame), Err(EngineError::InvalidLandmarkFrame { .. })));
}

#[test]
fn test_blink_rate_matches_cadence() {
    let mut est = estimator();
    let baseline = Baseline::defaults();
    // One blink every 4 s over 2 minutes
    let state = drive(&mut est, &stream(Face::default(), 0.0, 120.0, Some(4.0)), &baseline);

    assert_eq!(state.blink_count, 30);
    let rate = state.blink_rate.unwrap();
    assert!((rate - 15.0).abs() <= 1.5, "rate {}", rate);
    assert!(state.eye_strain_score < 5.0);
}

#[test]
fn test_rate_unknown_before_min_window() {
    let mut est = estimator();
    let state = drive(&mut est, &stream(Face::default(), 0.0, 5.0, Some(2.0)), &Baseline::defaults());
    assert!(state.blink_rate.is_none());
    assert!(state.known);
}

#[test]
fn test_staring_raises_score() {
    let mut est = estimator();
    let state = drive(&mut est, &stream(Face::default(), 0.0, 45.0, None), &Baseline::defaults());

    assert_eq!(state.blink_count, 0);
    assert_eq!(state.blink_rate, Some(0.0));
    assert!(state.time_since_last_blink > 44.0);
    assert!(state.eye_strain_score > 60.0, "score {}", state.eye_strain_score);
    assert!(state.eye_strain_score <= 100.0);
}

#[test]
fn test_long_closure_is_not_a_blink() {
    let mut est = estimator();
    let baseline = Baseline::defaults();
    let mut frames = stream(Face::default(), 0.0, 2.0, None);
    frames.extend(stream(Face::default().eyes(0.05), 2.0, 1.0, None));
    frames.extend(stream(Face::default(), 3.0, 1.0, None));

    let state = drive(&mut est, &frames, &baseline);
    assert_eq!(state.blink_count, 0);
}

#[test]
fn test_absence_freezes_state() {
    let mut est = estimator();
    let baseline = Baseline::defaults();
    let before = drive(&mut est, &stream(Face::default(), 0.0, 30.0, Some(5.0)), &baseline);

    let mut during = before.clone();
    for i in 1..=300 {
        during = est.update(30.0 + i as f64 * 0.1, None, &baseline);
    }
    assert!(!during.known);
    assert_eq!(during.blink_count, before.blink_count);
    assert_eq!(during.time_since_last_blink, before.time_since_last_blink);
    assert_eq!(during.eye_strain_score, before.eye_strain_score);

    // Clock resumes without counting the gap
    let after = drive(&mut est, &stream(Face::default(), 60.0, 0.5, None), &baseline);
    assert!(after.known);
    assert!(after.time_since_last_blink < before.time_since_last_blink + 1.0);
}

#[test]
fn test_calibrated_threshold() {
    let est = estimator();
    let mut baseline = Baseline::defaults();
    assert_eq!(est.blink_threshold(&baseline), 0.21);

    baseline.quality = CalibrationQuality::Full;
    baseline.eye_openness_ref = 0.4;
    assert!((est.blink_threshold(&baseline) - 0.28).abs() < 1e-6);
}

#[test]
fn test_partial_closure_accumulates() {
    let mut est = estimator();
    let baseline = Baseline::defaults();
    // 0.22: above the blink threshold, below 0.8 × 0.30
    let state = drive(&mut est, &stream(Face::default().eyes(0.22), 0.0, 60.0, Some(4.0)), &baseline);
    assert!(state.partial_closure > 0.5);
    assert!(state.eye_strain_score > 15.0);
}

#[test]
fn test_reset_clears_counters() {
    let mut est = estimator();
    drive(&mut est, &stream(Face::default(), 0.0, 20.0, Some(4.0)), &Baseline::defaults());
    est.reset();
    assert_eq!(est.state(), &EyeState::default());
}
