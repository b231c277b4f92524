use std::fs;

use tempfile::tempdir;

use super::*;
use crate::logic::alert::{AlertSummary, KindCount};
use crate::logic::config::MonitorConfig;
use crate::logic::engine::HealthMonitorEngine;
use crate::logic::session::{SessionConfig, SessionScheduler, SessionState};
use crate::logic::testutil::{stream, Face};

fn snapshot_at(t: f64) -> Snapshot {
    let mut engine = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();
    let frame = Face::default().frame(t);
    engine.tick(&frame).snapshot
}

fn session(active_secs: f64, sessions: u32, breaks: u32, on_time: u32) -> SessionState {
    let mut s = SessionScheduler::new(SessionConfig::default()).state();
    s.active_secs = active_secs;
    s.sessions = sessions;
    s.breaks_taken = breaks;
    s.on_time_breaks = on_time;
    s
}

fn no_alerts() -> AlertSummary {
    AlertSummary {
        alerts_fired: 0,
        active_count: 0,
        paused: false,
        pause_remaining_secs: 0.0,
        by_kind: Vec::<KindCount>::new(),
    }
}

#[test]
fn test_append_and_read_back() {
    let dir = tempdir().unwrap();
    let writer = HistoryWriter::from_path(dir.path().to_path_buf(), DEFAULT_MAX_FILE_BYTES);

    let record = LogRecord::Snapshot(SnapshotRecord::from(&snapshot_at(3.0)));
    writer.append(&record).unwrap();

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].extension().unwrap(), "jsonl");

    let content = fs::read_to_string(&entries[0]).unwrap();
    assert!(content.contains(r#""type":"snapshot""#));

    let records = read_history(dir.path()).unwrap();
    assert_eq!(records, vec![record]);
}

#[test]
fn test_rotation_by_size() {
    let dir = tempdir().unwrap();
    // Every record overflows the limit, so each append rotates
    let writer = HistoryWriter::from_path(dir.path().to_path_buf(), 64);

    for t in 0..3 {
        let record = LogRecord::Snapshot(SnapshotRecord::from(&snapshot_at(t as f64 + 1.0)));
        writer.append(&record).unwrap();
    }

    let stats = writer.stats().unwrap();
    assert_eq!(stats.files, 3);
    assert!(stats.total_bytes > 0);
    assert!(stats.current_file.unwrap().starts_with("history-"));

    let timestamps: Vec<f64> = read_history(dir.path())
        .unwrap()
        .into_iter()
        .map(|r| match r {
            LogRecord::Snapshot(s) => s.timestamp,
            LogRecord::Alert(a) => a.timestamp,
        })
        .collect();
    assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);
}

#[test]
fn test_resume_latest_file() {
    let dir = tempdir().unwrap();
    let record = LogRecord::Snapshot(SnapshotRecord::from(&snapshot_at(1.0)));

    HistoryWriter::from_path(dir.path().to_path_buf(), DEFAULT_MAX_FILE_BYTES)
        .append(&record)
        .unwrap();
    let writer = HistoryWriter::from_path(dir.path().to_path_buf(), DEFAULT_MAX_FILE_BYTES);
    writer.append(&record).unwrap();

    assert_eq!(writer.stats().unwrap().files, 1);
    assert_eq!(read_history(dir.path()).unwrap().len(), 2);
}

#[test]
fn test_corrupt_line_skipped() {
    let dir = tempdir().unwrap();
    let record = LogRecord::Snapshot(SnapshotRecord::from(&snapshot_at(1.0)));
    let line = serde_json::to_string(&record).unwrap();
    fs::write(
        dir.path().join("history-2026-01-01-000000.jsonl"),
        format!("{}\n{{ broken\n\n{}\n", line, line),
    )
    .unwrap();

    assert_eq!(read_history(dir.path()).unwrap().len(), 2);
}

#[test]
fn test_throttle_interval() {
    let mut throttle = SnapshotThrottle::new(60.0);
    assert!(throttle.should_log(0.0));
    assert!(!throttle.should_log(30.0));
    assert!(!throttle.should_log(59.9));
    assert!(throttle.should_log(60.0));
    assert!(!throttle.should_log(100.0));
    assert!(throttle.should_log(120.5));
}

#[test]
fn test_history_log_throttles_snapshots() {
    let dir = tempdir().unwrap();
    let config = HistoryConfig {
        snapshot_interval_secs: 60.0,
        ..Default::default()
    };
    let mut history = HistoryLog::from_path(&config, dir.path().to_path_buf());
    let mut engine = HealthMonitorEngine::new(MonitorConfig::default()).unwrap();

    // 3 minutes at 10 Hz
    for frame in stream(Face::default(), 0.1, 180.0, Some(4.0)) {
        let outcome = engine.tick(&frame);
        history.record_tick(&outcome.snapshot, &outcome.events);
    }

    let snapshots = read_history(dir.path())
        .unwrap()
        .into_iter()
        .filter(|r| matches!(r, LogRecord::Snapshot(_)))
        .count();
    assert_eq!(snapshots, 3);
}

#[test]
fn test_summary_written_per_day() {
    let dir = tempdir().unwrap();
    let summary = DailySummary::build(&session(600.0, 1, 0, 0), &no_alerts(), &ScoreTally::default());
    let path = save_summary(&summary, dir.path()).unwrap();

    assert!(path.file_name().unwrap().to_str().unwrap().starts_with("summary-"));
    let loaded: DailySummary = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(loaded, summary);
}

#[test]
fn test_summary_recommendations() {
    // 9 hours, one stretch, no breaks
    let tired = DailySummary::build(&session(9.0 * 3600.0, 1, 0, 0), &no_alerts(), &ScoreTally::default());
    assert_eq!(tired.recommendations.len(), 3);
    assert!((tired.total_hours - 9.0).abs() < 1e-9);
    assert_eq!(tired.break_compliance_rate, 0.0);

    // 2 hours over 4 stretches, breaks on schedule
    let fine = DailySummary::build(&session(2.0 * 3600.0, 4, 4, 3), &no_alerts(), &ScoreTally::default());
    assert!(fine.recommendations.is_empty());
    assert_eq!(fine.average_session_minutes, 30.0);
    assert_eq!(fine.break_compliance_rate, 75.0);
}

#[test]
fn test_summary_score_means() {
    let mut tally = ScoreTally::default();
    assert_eq!(tally.mean_eye_risk(), None);
    tally.add(Some(80.0), None);
    tally.add(Some(60.0), Some(10.0));

    let summary = DailySummary::build(&session(600.0, 1, 1, 1), &no_alerts(), &tally);
    assert_eq!(summary.mean_eye_risk, Some(70.0));
    assert_eq!(summary.mean_posture_risk, Some(10.0));
    assert!(summary.recommendations.iter().any(|r| r.contains("20-20-20")));
}

#[test]
fn test_config_validation() {
    assert!(HistoryConfig::default().validate().is_ok());
    let bad = HistoryConfig {
        snapshot_interval_secs: 0.0,
        ..Default::default()
    };
    assert!(bad.validate().is_err());
}
