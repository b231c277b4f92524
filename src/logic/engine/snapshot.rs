use serde::{Deserialize, Serialize};

use crate::logic::alert::{AlertEvent, AlertSummary};
use crate::logic::baseline::CalibrationStatus;
use crate::logic::eye::EyeState;
use crate::logic::posture::PostureState;
use crate::logic::risk::RiskAssessment;
use crate::logic::session::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WellnessStatus {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
    /// No risk yet (calibrating or no face seen)
    Unknown,
}

impl WellnessStatus {
    pub fn from_score(score: Option<f32>) -> Self {
        match score {
            None => WellnessStatus::Unknown,
            Some(s) if s >= 85.0 => WellnessStatus::Excellent,
            Some(s) if s >= 70.0 => WellnessStatus::Good,
            Some(s) if s >= 50.0 => WellnessStatus::Fair,
            Some(_) => WellnessStatus::NeedsAttention,
        }
    }
}

/// Read-only view published after every accepted tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Engine clock of the last accepted frame
    pub timestamp: f64,
    pub eye: EyeState,
    pub posture: PostureState,
    pub session: SessionState,
    /// `None` until calibrated
    pub risk: Option<RiskAssessment>,
    pub calibration: CalibrationStatus,
    /// 100 − mean risk
    pub wellness: Option<f32>,
    pub status: WellnessStatus,
    /// Newest last
    pub recent_alerts: Vec<AlertEvent>,
    pub alerts: AlertSummary,
    pub frames_processed: u64,
    pub frames_rejected: u64,
}
