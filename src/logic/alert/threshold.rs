//! Severity thresholds and cooldowns
//!
//! Score → severity bands, and severity → cooldown (higher severity, shorter
//! cooldown). Escalation timing for unacknowledged alerts.

use serde::{Deserialize, Serialize};

use super::types::Severity;

/// Ascending score cut-offs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub info: f32,
    pub warning: f32,
    pub critical: f32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            info: 40.0,
            warning: 65.0,
            critical: 85.0,
        }
    }
}

impl SeverityThresholds {
    pub fn new(info: f32, warning: f32, critical: f32) -> Self {
        Self { info, warning, critical }
    }

    /// Lower cut-offs
    pub fn sensitive() -> Self {
        Self::new(30.0, 55.0, 75.0)
    }

    /// Higher cut-offs
    pub fn relaxed() -> Self {
        Self::new(50.0, 75.0, 90.0)
    }

    /// `None` below the lowest band (and for NaN)
    pub fn classify(&self, score: f32) -> Option<Severity> {
        if score.is_nan() {
            return None;
        }
        let score = score.clamp(0.0, 100.0);
        if score >= self.critical {
            Some(Severity::Critical)
        } else if score >= self.warning {
            Some(Severity::Warning)
        } else if score >= self.info {
            Some(Severity::Info)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f32| (0.0..=100.0).contains(&v);
        if !(in_range(self.info) && in_range(self.warning) && in_range(self.critical)) {
            return Err("thresholds must be within [0, 100]".into());
        }
        if !(self.info < self.warning && self.warning < self.critical) {
            return Err(format!(
                "thresholds must ascend (info {} < warning {} < critical {})",
                self.info, self.warning, self.critical
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    pub info_secs: f64,
    pub warning_secs: f64,
    pub critical_secs: f64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            info_secs: 300.0,
            warning_secs: 180.0,
            critical_secs: 90.0,
        }
    }
}

impl CooldownConfig {
    pub fn for_severity(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Info => self.info_secs,
            Severity::Warning => self.warning_secs,
            Severity::Critical => self.critical_secs,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.critical_secs < 0.0 {
            return Err("cooldowns must not be negative".into());
        }
        if !(self.critical_secs <= self.warning_secs && self.warning_secs <= self.info_secs) {
            return Err("cooldowns must not grow with severity".into());
        }
        Ok(())
    }
}

/// Unacknowledged WARNING/CRITICAL alerts gain a level per missed deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub interval_secs: f64,
    pub max_level: u32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60.0,
            max_level: 3,
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_secs <= 0.0 {
            return Err("escalation interval must be positive".into());
        }
        Ok(())
    }
}
