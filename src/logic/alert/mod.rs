//! Alert Module - Cooldown & escalation state machine
//!
//! - `types.rs` - `AlertKind`, `Severity`, `AlertEvent`
//! - `threshold.rs` - score bands, per-severity cooldowns
//! - `machine.rs` - per-kind state, firing rules, pause/acknowledge
//! - `messages.rs` - titles, messages, recommendations
//!
//! # Rules (per kind)
//! - no firing while `now < cooldown_until`, unless severity strictly rises
//! - firing sets `cooldown_until = now + cooldown(severity)`
//! - target below the lowest band resets the kind and its cooldown
//! - a WARNING or CRITICAL left unacknowledged past the escalation interval
//!   raises the kind's escalation level (capped); acknowledging resets it

pub mod types;
pub mod threshold;
pub mod machine;
pub mod messages;

use serde::{Deserialize, Serialize};

use crate::logic::eye::EyeState;
use crate::logic::posture::PostureState;
use crate::logic::risk::RiskAssessment;
use crate::logic::session::{SessionSignals, SessionState};

pub use machine::AlertStateMachine;
pub use threshold::{CooldownConfig, EscalationConfig, SeverityThresholds};
pub use types::{AlertEvent, AlertKind, AlertSummary, KindCount, Severity, Target};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub eye: SeverityThresholds,
    pub posture: SeverityThresholds,
    pub cooldown: CooldownConfig,
    pub escalation: EscalationConfig,
    /// Unacknowledged alerts kept for the GUI
    pub max_active: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            eye: SeverityThresholds::default(),
            posture: SeverityThresholds::default(),
            cooldown: CooldownConfig::default(),
            escalation: EscalationConfig::default(),
            max_active: 20,
        }
    }
}

impl AlertConfig {
    pub fn sensitive() -> Self {
        Self {
            eye: SeverityThresholds::sensitive(),
            posture: SeverityThresholds::sensitive(),
            ..Default::default()
        }
    }

    pub fn relaxed() -> Self {
        Self {
            eye: SeverityThresholds::relaxed(),
            posture: SeverityThresholds::relaxed(),
            cooldown: CooldownConfig {
                info_secs: 600.0,
                warning_secs: 300.0,
                critical_secs: 120.0,
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.eye.validate().map_err(|e| format!("alerts.eye: {}", e))?;
        self.posture.validate().map_err(|e| format!("alerts.posture: {}", e))?;
        self.cooldown.validate().map_err(|e| format!("alerts.cooldown: {}", e))?;
        self.escalation.validate().map_err(|e| format!("alerts.escalation: {}", e))?;
        Ok(())
    }
}

/// Everything the machine looks at for one tick
#[derive(Debug, Clone, Copy)]
pub struct AlertInputs<'a> {
    /// `None` while calibrating
    pub risk: Option<&'a RiskAssessment>,
    pub eye: &'a EyeState,
    pub posture: &'a PostureState,
    pub session: &'a SessionState,
    pub signals: &'a SessionSignals,
}
