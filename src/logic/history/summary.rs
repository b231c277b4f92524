use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::alert::AlertSummary;
use crate::logic::session::SessionState;

// ============================================================================
// THROTTLE
// ============================================================================

/// At most one snapshot per interval of engine time
#[derive(Debug, Clone)]
pub struct SnapshotThrottle {
    interval: f64,
    last: Option<f64>,
}

impl SnapshotThrottle {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval: interval_secs,
            last: None,
        }
    }

    pub fn should_log(&mut self, t: f64) -> bool {
        match self.last {
            Some(last) if t - last < self.interval => false,
            _ => {
                self.last = Some(t);
                true
            }
        }
    }
}

// ============================================================================
// SCORE TALLY
// ============================================================================

/// Running means of the fused risks
#[derive(Debug, Clone, Default)]
pub struct ScoreTally {
    eye_sum: f64,
    eye_count: u64,
    posture_sum: f64,
    posture_count: u64,
}

impl ScoreTally {
    pub fn add(&mut self, eye_risk: Option<f32>, posture_risk: Option<f32>) {
        if let Some(v) = eye_risk {
            self.eye_sum += v as f64;
            self.eye_count += 1;
        }
        if let Some(v) = posture_risk {
            self.posture_sum += v as f64;
            self.posture_count += 1;
        }
    }

    pub fn mean_eye_risk(&self) -> Option<f32> {
        (self.eye_count > 0).then(|| (self.eye_sum / self.eye_count as f64) as f32)
    }

    pub fn mean_posture_risk(&self) -> Option<f32> {
        (self.posture_count > 0).then(|| (self.posture_sum / self.posture_count as f64) as f32)
    }
}

// ============================================================================
// DAILY SUMMARY
// ============================================================================

const LONG_DAY_MINUTES: f64 = 480.0;
const LONG_SESSION_MINUTES: f64 = 60.0;
const MINUTES_PER_EXPECTED_BREAK: f64 = 30.0;
const HIGH_MEAN_RISK: f32 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    /// `YYYY-MM-DD`
    pub date: String,
    pub total_hours: f64,
    pub active_minutes: f64,
    pub away_minutes: f64,
    pub sessions: u32,
    pub average_session_minutes: f64,
    pub breaks_taken: u32,
    /// Percent of breaks taken within 120% of the short-break interval
    pub break_compliance_rate: f64,
    pub alerts_fired: u64,
    pub mean_eye_risk: Option<f32>,
    pub mean_posture_risk: Option<f32>,
    pub recommendations: Vec<String>,
}

impl DailySummary {
    pub fn build(session: &SessionState, alerts: &AlertSummary, tally: &ScoreTally) -> Self {
        let active_minutes = session.active_secs / 60.0;
        let sessions = session.sessions.max(1);
        let average_session_minutes = active_minutes / sessions as f64;
        let break_compliance_rate = if session.breaks_taken > 0 {
            session.on_time_breaks as f64 / session.breaks_taken as f64 * 100.0
        } else {
            0.0
        };

        let mut summary = Self {
            date: Utc::now().format("%Y-%m-%d").to_string(),
            total_hours: active_minutes / 60.0,
            active_minutes,
            away_minutes: session.away_secs / 60.0,
            sessions: session.sessions,
            average_session_minutes,
            breaks_taken: session.breaks_taken,
            break_compliance_rate,
            alerts_fired: alerts.alerts_fired,
            mean_eye_risk: tally.mean_eye_risk(),
            mean_posture_risk: tally.mean_posture_risk(),
            recommendations: Vec::new(),
        };
        summary.recommendations = summary.recommend();
        summary
    }

    fn recommend(&self) -> Vec<String> {
        let mut out = Vec::new();

        if self.active_minutes > LONG_DAY_MINUTES {
            out.push("You've had a long screen day. Consider ending work soon and resting your eyes.".to_string());
        }
        if self.average_session_minutes > LONG_SESSION_MINUTES {
            out.push("Your average session length is quite long. Try taking more frequent breaks.".to_string());
        }
        if (self.breaks_taken as f64) < self.active_minutes / MINUTES_PER_EXPECTED_BREAK {
            out.push("You could benefit from more frequent breaks throughout the day.".to_string());
        }
        if self.mean_eye_risk.map_or(false, |r| r > HIGH_MEAN_RISK) {
            out.push("Your eyes were under strain for much of the day. Remember the 20-20-20 rule.".to_string());
        }
        if self.mean_posture_risk.map_or(false, |r| r > HIGH_MEAN_RISK) {
            out.push("Your posture drifted often today. Check your chair and monitor height.".to_string());
        }
        out
    }
}
