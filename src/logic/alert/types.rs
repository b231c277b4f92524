use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    EyeStrain,
    Posture,
    ScreenDistance,
    BreakDue,
    PresenceLost,
}

impl AlertKind {
    /// Evaluation order within a tick
    pub const ALL: [AlertKind; 5] = [
        AlertKind::EyeStrain,
        AlertKind::Posture,
        AlertKind::ScreenDistance,
        AlertKind::BreakDue,
        AlertKind::PresenceLost,
    ];
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlertKind::EyeStrain => "EYE_STRAIN",
            AlertKind::Posture => "POSTURE",
            AlertKind::ScreenDistance => "SCREEN_DISTANCE",
            AlertKind::BreakDue => "BREAK_DUE",
            AlertKind::PresenceLost => "PRESENCE_LOST",
        };
        write!(f, "{}", name)
    }
}

/// Ordered: `Info < Warning < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One firing. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub recommendation: String,
    /// Engine clock, seconds
    pub timestamp: f64,
    pub cooldown_until: f64,
    /// Higher severity than the kind's previous firing
    pub escalated: bool,
    /// Escalation deadlines this kind missed unacknowledged
    #[serde(default)]
    pub escalation_level: u32,
    pub created_at: DateTime<Utc>,
}

/// Per-kind target for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// Input unknown this tick; keep state as is
    Hold,
    /// Condition resolved; state and cooldown reset
    Clear,
    Raise(Severity),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: AlertKind,
    pub count: u64,
}

/// Alert side of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub alerts_fired: u64,
    pub active_count: usize,
    pub paused: bool,
    pub pause_remaining_secs: f64,
    pub by_kind: Vec<KindCount>,
}
