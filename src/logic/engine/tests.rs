use super::*;
use crate::logic::alert::Severity;
use crate::logic::baseline::storage::{load_baseline, save_baseline};
use crate::logic::baseline::{CalibrationConfig, CalibrationQuality};
use crate::logic::testutil::{stream, Face};

fn quick_config() -> MonitorConfig {
    MonitorConfig {
        calibration: CalibrationConfig::quick(),
        ..Default::default()
    }
}

fn calibrated(quality: CalibrationQuality) -> Baseline {
    Baseline {
        neutral_distance: 55.0,
        quality,
        ..Baseline::defaults()
    }
}

fn ready_engine() -> HealthMonitorEngine {
    let mut engine = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();
    engine.adopt_baseline(calibrated(CalibrationQuality::Full)).unwrap();
    engine
}

fn absent(from: f64, secs: f64) -> Vec<LandmarkFrame> {
    let steps = (secs * 10.0).round() as usize;
    (1..=steps).map(|i| LandmarkFrame::no_face(from + i as f64 * 0.1)).collect()
}

fn run(engine: &mut HealthMonitorEngine, frames: &[LandmarkFrame]) -> Vec<TickOutcome> {
    frames.iter().map(|f| engine.tick(f)).collect()
}

fn in_range(v: f32) -> bool {
    (0.0..=100.0).contains(&v)
}

#[test]
fn test_new_rejects_invalid_config() {
    let mut config = MonitorConfig::default();
    config.alerts.eye = crate::logic::alert::SeverityThresholds::new(80.0, 60.0, 90.0);
    assert!(matches!(HealthMonitorEngine::new(config), Err(ConfigError::Invalid(_))));

    let mut config = MonitorConfig::default();
    config.alerts.escalation.interval_secs = 0.0;
    assert!(HealthMonitorEngine::new(config).is_err());

    assert!(HealthMonitorEngine::new(MonitorConfig::relaxed()).is_ok());
}

// ============================================================================
// CALIBRATION
// ============================================================================

#[test]
fn test_calibration_recovers_known_values() {
    let mut engine = HealthMonitorEngine::new(quick_config()).unwrap();
    let face = Face::default().with_pose(6.0, -4.0, 3.0).at(62.0);

    let outcomes = run(&mut engine, &stream(face, 0.0, 25.0, Some(4.0)));
    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(outcomes
        .iter()
        .all(|o| !o.notices.iter().any(|n| matches!(n, EngineError::CalibrationIncomplete { .. }))));

    let baseline = engine.baseline();
    assert_eq!(baseline.quality, CalibrationQuality::Full);
    assert!((baseline.neutral_pitch - 6.0).abs() < 1.0, "pitch {}", baseline.neutral_pitch);
    assert!((baseline.neutral_yaw + 4.0).abs() < 1.0, "yaw {}", baseline.neutral_yaw);
    assert!((baseline.neutral_roll - 3.0).abs() < 1.0, "roll {}", baseline.neutral_roll);
    assert!((baseline.neutral_distance - 62.0).abs() < 2.0, "distance {}", baseline.neutral_distance);
    assert!((baseline.resting_blink_rate - 15.0).abs() < 3.5, "rate {}", baseline.resting_blink_rate);
    assert!((baseline.eye_openness_ref - 0.30).abs() < 0.02);

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.calibration.phase, CalibrationPhase::Ready);
    let risk = snapshot.risk.as_ref().expect("risk once calibrated");
    assert_eq!(risk.confidence, 1.0);
    // Sitting at the calibrated neutral is low posture risk
    assert!(risk.posture_risk.unwrap_or(100.0) < 20.0);
}

#[test]
fn test_no_risk_while_calibrating() {
    let mut engine = HealthMonitorEngine::new(quick_config()).unwrap();
    let outcomes = run(&mut engine, &stream(Face::default(), 0.0, 3.0, None));

    for o in &outcomes {
        assert_eq!(o.snapshot.calibration.phase, CalibrationPhase::Calibrating);
        assert!(o.snapshot.risk.is_none());
        assert_eq!(o.snapshot.status, WellnessStatus::Unknown);
    }
    assert!(outcomes.last().unwrap().snapshot.calibration.posture_progress > 0.5);
}

#[test]
fn test_interrupted_calibration_is_incomplete() {
    let mut engine = HealthMonitorEngine::new(quick_config()).unwrap();
    run(&mut engine, &stream(Face::default(), 0.0, 3.0, Some(4.0)));
    let outcomes = run(&mut engine, &absent(3.0, 60.0));

    // Ticks keep succeeding through the fallback
    assert!(outcomes.iter().all(|o| o.is_ok()));
    let reported = outcomes
        .iter()
        .filter(|o| o.notices.iter().any(|n| matches!(n, EngineError::CalibrationIncomplete { .. })))
        .count();
    assert_eq!(reported, 1);

    assert_eq!(engine.baseline().quality, CalibrationQuality::Incomplete);
    assert!(engine.snapshot().calibration.is_incomplete());

    let outcomes = run(&mut engine, &stream(Face::default(), 63.0, 5.0, None));
    let risk = outcomes.last().unwrap().snapshot.risk.clone().expect("risk after fallback");
    assert_eq!(risk.confidence, 0.7);
    assert!(risk.posture_risk.is_some());
}

#[test]
fn test_recalibrate_restarts_warm_up() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 2.0, None));
    assert!(engine.snapshot().risk.is_some());

    engine.recalibrate();
    assert_eq!(engine.snapshot().calibration.phase, CalibrationPhase::Idle);
    assert!(!engine.baseline().is_calibrated());

    let outcome = engine.tick(&Face::default().frame(2.5));
    assert_eq!(outcome.snapshot.calibration.phase, CalibrationPhase::Calibrating);
    assert!(outcome.snapshot.risk.is_none());
}

#[test]
fn test_reloaded_baseline_scores_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.json");

    let original = Baseline {
        neutral_pitch: 4.0,
        neutral_yaw: -2.0,
        resting_blink_rate: 13.0,
        ..calibrated(CalibrationQuality::Full)
    };
    save_baseline(&original, &path).unwrap();
    let reloaded = load_baseline(&path).unwrap();
    assert_eq!(reloaded, original);

    let mut a = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();
    let mut b = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();
    a.adopt_baseline(original).unwrap();
    b.adopt_baseline(reloaded).unwrap();

    let face = Face::default().with_pose(18.0, 5.0, 0.0).at(45.0);
    for frame in stream(face, 0.0, 90.0, Some(7.0)) {
        let ra = a.tick(&frame).snapshot.risk;
        let rb = b.tick(&frame).snapshot.risk;
        assert_eq!(ra, rb);
    }
}

#[test]
fn test_adopt_rejects_foreign_layout() {
    let mut engine = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();
    let foreign = Baseline {
        layout_hash: 0xDEAD_BEEF,
        ..calibrated(CalibrationQuality::Full)
    };
    assert!(matches!(
        engine.adopt_baseline(foreign),
        Err(BaselineError::LayoutMismatch { .. })
    ));
    assert!(!engine.baseline().is_calibrated());
}

// ============================================================================
// TICK FAULTS
// ============================================================================

#[test]
fn test_non_monotonic_frame_discarded() {
    let mut engine = ready_engine();
    engine.tick(&Face::default().frame(1.0));
    let before = engine.tick(&Face::default().frame(2.0)).snapshot;

    for t in [1.5, 2.0] {
        let outcome = engine.tick(&Face::default().with_pose(30.0, 0.0, 0.0).frame(t));
        assert!(matches!(outcome.fault, Some(EngineError::ClockNonMonotonic { .. })));
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.snapshot.timestamp, 2.0);
        assert_eq!(outcome.snapshot.posture, before.posture);
    }
    assert_eq!(engine.snapshot().frames_rejected, 2);

    assert!(engine.tick(&Face::default().frame(2.1)).is_ok());
    assert_eq!(engine.snapshot().frames_processed, 3);
}

#[test]
fn test_invalid_frame_changes_nothing() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 1.0, None));
    let before = engine.snapshot().clone();

    let mut short = Face::default().frame(1.5);
    short.points.truncate(100);
    let outcome = engine.tick(&short);
    assert!(matches!(outcome.fault, Some(EngineError::InvalidLandmarkFrame { .. })));

    let mut nan = Face::default().frame(1.6);
    nan.points[33].x = f32::NAN;
    assert!(engine.tick(&nan).fault.is_some());

    let after = engine.snapshot();
    assert_eq!(after.timestamp, before.timestamp);
    assert_eq!(after.eye, before.eye);
    assert_eq!(after.session, before.session);
    assert_eq!(after.frames_processed, before.frames_processed);

    // The rejected timestamps were never accepted
    assert!(engine.tick(&Face::default().frame(1.2)).is_ok());
}

#[test]
fn test_stop_is_idempotent() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 2.0, None));

    engine.stop();
    let end = engine.snapshot().session.session_end;
    assert_eq!(end, Some(2.0));
    engine.stop();
    assert_eq!(engine.snapshot().session.session_end, end);
    assert!(engine.is_stopped());

    let outcome = engine.tick(&Face::default().frame(3.0));
    assert!(matches!(outcome.fault, Some(EngineError::Stopped)));
    assert_eq!(outcome.snapshot.timestamp, 2.0);
}

#[test]
fn test_no_face_is_a_notice() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 1.0, None));
    let outcome = engine.tick(&LandmarkFrame::no_face(1.1));

    assert!(outcome.is_ok());
    assert!(outcome.notices.contains(&EngineError::NoFaceDetected));
    assert!(!outcome.snapshot.eye.known);
    assert!(!outcome.snapshot.posture.known);
}

// ============================================================================
// END TO END
// ============================================================================

#[test]
fn test_scores_bounded_under_random_input() {
    let mut engine = ready_engine();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 10_000) as f32 / 10_000.0
    };

    for i in 1..=6000 {
        let t = i as f64 * 0.1;
        let frame = if next() < 0.05 {
            LandmarkFrame::no_face(t)
        } else {
            Face::default()
                .with_pose(next() * 60.0 - 30.0, next() * 70.0 - 35.0, next() * 50.0 - 25.0)
                .at(25.0 + next() * 85.0)
                .eyes(0.05 + next() * 0.35)
                .frame(t)
        };

        let s = engine.tick(&frame).snapshot;
        assert!(in_range(s.eye.eye_strain_score), "eye {}", s.eye.eye_strain_score);
        assert!(in_range(s.posture.posture_score), "posture {}", s.posture.posture_score);
        if let Some(risk) = &s.risk {
            assert!(risk.eye_risk.map_or(true, in_range));
            assert!(risk.posture_risk.map_or(true, in_range));
        }
        assert!(s.wellness.map_or(true, in_range));
    }
}

#[test]
fn test_presence_lost_once_and_active_time_paused() {
    let mut engine = ready_engine();
    let face = Face::default();

    let mut outcomes = run(&mut engine, &stream(face, 0.0, 300.0, Some(4.0)));
    outcomes.extend(run(&mut engine, &absent(300.0, 600.0)));
    outcomes.extend(run(&mut engine, &stream(face, 900.0, 300.0, Some(4.0))));

    let lost = outcomes
        .iter()
        .flat_map(|o| &o.events)
        .filter(|e| e.kind == AlertKind::PresenceLost)
        .count();
    assert_eq!(lost, 1);

    let session = &engine.snapshot().session;
    assert!((session.active_secs - 600.0).abs() < 10.0, "active {}", session.active_secs);
    assert!(session.away_secs > 580.0);
    // Ten minutes away counts as a short break
    assert_eq!(session.breaks_taken, 1);
    assert_eq!(session.sessions, 2);
}

#[test]
fn test_staring_raises_eye_strain_within_cooldown_rules() {
    let mut engine = ready_engine();
    let cooldown = engine.config().alerts.cooldown.clone();
    let outcomes = run(&mut engine, &stream(Face::default(), 0.0, 600.0, None));

    let fired: Vec<&AlertEvent> = outcomes
        .iter()
        .flat_map(|o| &o.events)
        .filter(|e| e.kind == AlertKind::EyeStrain)
        .collect();
    assert!(!fired.is_empty());
    assert!(fired.iter().any(|e| e.severity >= Severity::Warning));

    for pair in fired.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let elapsed = next.timestamp - prev.timestamp;
        assert!(
            elapsed >= cooldown.for_severity(prev.severity) || next.severity > prev.severity,
            "{:?} after {:?} within cooldown",
            next.severity,
            prev.severity
        );
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.session.alerts_today, snapshot.alerts.alerts_fired);
    assert!(snapshot.recent_alerts.len() <= engine.config().recent_alerts);
    assert!(snapshot.status != WellnessStatus::Excellent);
}

#[test]
fn test_pause_and_acknowledge_through_engine() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 1.0, None));
    engine.pause_alerts(10_000.0);
    assert!(engine.snapshot().alerts.paused);

    let outcomes = run(&mut engine, &stream(Face::default(), 1.0, 300.0, None));
    assert!(outcomes.iter().all(|o| o.events.is_empty()));

    engine.resume_alerts();
    let outcomes = run(&mut engine, &stream(Face::default(), 301.0, 5.0, None));
    assert!(outcomes.iter().any(|o| !o.events.is_empty()));

    assert!(engine.acknowledge_all() > 0);
    assert!(engine.active_alerts().is_empty());
    assert_eq!(engine.snapshot().alerts.active_count, 0);
}

#[test]
fn test_daily_summary_reflects_session() {
    let mut engine = ready_engine();
    run(&mut engine, &stream(Face::default(), 0.0, 120.0, Some(4.0)));
    engine.record_break(BreakKind::Micro);
    engine.stop();

    let summary = engine.daily_summary();
    assert!((summary.active_minutes - 2.0).abs() < 0.1);
    assert_eq!(summary.breaks_taken, 1);
    assert_eq!(summary.break_compliance_rate, 100.0);
    assert!(summary.mean_eye_risk.is_some());
}
