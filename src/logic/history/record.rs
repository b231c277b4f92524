use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::alert::AlertEvent;
use crate::logic::baseline::CalibrationPhase;
use crate::logic::engine::{Snapshot, WellnessStatus};

/// One JSONL line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogRecord {
    Snapshot(SnapshotRecord),
    Alert(AlertEvent),
}

/// Derived numbers only; no landmarks or imagery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub timestamp: f64,
    pub logged_at: DateTime<Utc>,
    pub calibration: CalibrationPhase,

    // Eye
    pub ear: f32,
    pub blink_rate: Option<f32>,
    pub time_since_last_blink: f64,
    pub blink_count: u64,
    pub eye_strain_score: f32,

    // Posture
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub distance: f32,
    pub posture_score: f32,
    pub bad_posture: bool,

    // Fused
    pub eye_risk: Option<f32>,
    pub posture_risk: Option<f32>,
    pub confidence: Option<f32>,
    pub wellness: Option<f32>,
    pub status: WellnessStatus,

    // Session
    pub present: bool,
    pub active_secs: f64,
    pub away_secs: f64,
    pub breaks_taken: u32,
    pub alerts_fired: u64,
}

impl From<&Snapshot> for SnapshotRecord {
    fn from(s: &Snapshot) -> Self {
        Self {
            timestamp: s.timestamp,
            logged_at: Utc::now(),
            calibration: s.calibration.phase,
            ear: s.eye.ear,
            blink_rate: s.eye.blink_rate,
            time_since_last_blink: s.eye.time_since_last_blink,
            blink_count: s.eye.blink_count,
            eye_strain_score: s.eye.eye_strain_score,
            pitch: s.posture.pitch,
            yaw: s.posture.yaw,
            roll: s.posture.roll,
            distance: s.posture.distance,
            posture_score: s.posture.posture_score,
            bad_posture: s.posture.bad_posture,
            eye_risk: s.risk.as_ref().and_then(|r| r.eye_risk),
            posture_risk: s.risk.as_ref().and_then(|r| r.posture_risk),
            confidence: s.risk.as_ref().map(|r| r.confidence),
            wellness: s.wellness,
            status: s.status,
            present: s.session.present,
            active_secs: s.session.active_secs,
            away_secs: s.session.away_secs,
            breaks_taken: s.session.breaks_taken,
            alerts_fired: s.alerts.alerts_fired,
        }
    }
}
