use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use super::messages;
use super::types::{AlertEvent, AlertKind, AlertSummary, KindCount, Severity, Target};
use super::{AlertConfig, AlertInputs};
use crate::logic::session::BreakKind;

#[derive(Debug, Clone, Default)]
struct KindState {
    current: Option<Severity>,
    last_fired_at: Option<f64>,
    cooldown_until: Option<f64>,
    /// Deadlines missed without an acknowledgement, stamped on the next firing
    escalation_level: u32,
    escalate_at: Option<f64>,
}

pub struct AlertStateMachine {
    config: AlertConfig,
    kinds: HashMap<AlertKind, KindState>,
    active: Vec<AlertEvent>,
    fired_by_kind: HashMap<AlertKind, u64>,
    alerts_fired: u64,
    pause_until: Option<f64>,
    last_now: f64,
}

impl AlertStateMachine {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            kinds: HashMap::new(),
            active: Vec::new(),
            fired_by_kind: HashMap::new(),
            alerts_fired: 0,
            pause_until: None,
            last_now: 0.0,
        }
    }

    /// Per-kind targets for this tick
    pub fn targets(&self, inputs: &AlertInputs<'_>) -> [(AlertKind, Target); 5] {
        let from_score = |score: Option<f32>, thresholds: &super::SeverityThresholds| match score {
            None => Target::Hold,
            Some(s) => thresholds.classify(s).map_or(Target::Clear, Target::Raise),
        };

        let eye = from_score(inputs.risk.and_then(|r| r.eye_risk), &self.config.eye);
        let posture = from_score(inputs.risk.and_then(|r| r.posture_risk), &self.config.posture);

        let distance = if inputs.risk.is_none() || !inputs.posture.known {
            Target::Hold
        } else if inputs.posture.too_close {
            Target::Raise(Severity::Warning)
        } else if inputs.posture.too_far {
            Target::Raise(Severity::Info)
        } else {
            Target::Clear
        };

        // Tiers are not evaluated without a face; only a present tick clears
        let break_due = match inputs.signals.break_due {
            Some(BreakKind::Micro) => Target::Raise(Severity::Info),
            Some(BreakKind::Short) => Target::Raise(Severity::Warning),
            Some(BreakKind::Long) => Target::Raise(Severity::Critical),
            None if inputs.signals.absent => Target::Hold,
            None => Target::Clear,
        };

        let presence = if inputs.signals.presence_lost {
            Target::Raise(Severity::Info)
        } else {
            Target::Clear
        };

        [
            (AlertKind::EyeStrain, eye),
            (AlertKind::Posture, posture),
            (AlertKind::ScreenDistance, distance),
            (AlertKind::BreakDue, break_due),
            (AlertKind::PresenceLost, presence),
        ]
    }

    /// Evaluate every kind at `now`. Cannot fail.
    pub fn evaluate(&mut self, now: f64, inputs: &AlertInputs<'_>) -> Vec<AlertEvent> {
        self.last_now = now;
        self.expire_pause(now);
        self.check_escalations(now);

        let mut events = Vec::new();
        for (kind, target) in self.targets(inputs) {
            if let Some((severity, escalated)) = self.step(kind, target, now) {
                let escalation_level = self.schedule_escalation(kind, severity, now);
                let event = AlertEvent {
                    id: Uuid::new_v4(),
                    kind,
                    severity,
                    title: messages::title(kind, severity).to_string(),
                    message: messages::message(kind, severity, inputs),
                    recommendation: messages::recommendation(kind, severity),
                    timestamp: now,
                    cooldown_until: now + self.config.cooldown.for_severity(severity),
                    escalated,
                    escalation_level,
                    created_at: Utc::now(),
                };
                self.record(&event);
                events.push(event);
            }
        }
        events
    }

    /// Apply one target to one kind. Returns `(severity, escalated)` on firing.
    pub fn step(&mut self, kind: AlertKind, target: Target, now: f64) -> Option<(Severity, bool)> {
        let paused = self.is_paused(now);
        let cooldown = &self.config.cooldown;
        let state = self.kinds.entry(kind).or_default();

        match target {
            Target::Hold => None,
            Target::Clear => {
                if state.current.is_some() {
                    log::debug!("{} cleared", kind);
                }
                *state = KindState::default();
                None
            }
            Target::Raise(severity) => {
                let in_cooldown = state.cooldown_until.map_or(false, |until| now < until);
                let escalated = state.current.map_or(false, |current| severity > current);
                if (in_cooldown && !escalated) || paused {
                    return None;
                }

                state.current = Some(severity);
                state.last_fired_at = Some(now);
                state.cooldown_until = Some(now + cooldown.for_severity(severity));
                Some((severity, escalated))
            }
        }
    }

    // ========================================================================
    // ESCALATION
    // ========================================================================

    /// Arm the unacknowledged-alert deadline after a firing. Returns the level
    /// to stamp on the event.
    fn schedule_escalation(&mut self, kind: AlertKind, severity: Severity, now: f64) -> u32 {
        let config = &self.config.escalation;
        let state = self.kinds.entry(kind).or_default();
        if severity >= Severity::Warning && state.escalation_level < config.max_level {
            state.escalate_at = Some(now + config.interval_secs);
        }
        state.escalation_level
    }

    /// Raise the level of every kind whose deadline passed while its alert sat
    /// unacknowledged in the active list
    fn check_escalations(&mut self, now: f64) {
        for (kind, state) in self.kinds.iter_mut() {
            let due = state.escalate_at.map_or(false, |at| now >= at);
            if !due {
                continue;
            }
            state.escalate_at = None;
            if self.active.iter().any(|a| a.kind == *kind) {
                state.escalation_level += 1;
                log::warn!("{} unacknowledged, escalation level {}", kind, state.escalation_level);
            }
        }
    }

    fn cancel_escalation(&mut self, kind: AlertKind) {
        if let Some(state) = self.kinds.get_mut(&kind) {
            state.escalation_level = 0;
            state.escalate_at = None;
        }
    }

    fn record(&mut self, event: &AlertEvent) {
        self.alerts_fired += 1;
        *self.fired_by_kind.entry(event.kind).or_insert(0) += 1;

        if event.escalated {
            log::warn!("{} escalated to {}: {}", event.kind, event.severity, event.message);
        } else {
            log::info!("{} {}: {}", event.kind, event.severity, event.message);
        }

        // One active alert per kind: the newest
        self.active.retain(|a| a.kind != event.kind);
        self.active.push(event.clone());
        if self.active.len() > self.config.max_active {
            let excess = self.active.len() - self.config.max_active;
            self.active.drain(..excess);
        }
    }

    // ========================================================================
    // PAUSE / ACKNOWLEDGE
    // ========================================================================

    pub fn pause(&mut self, now: f64, duration_secs: f64) {
        let until = now + duration_secs.max(0.0);
        self.pause_until = Some(until);
        log::info!("Alerts paused for {:.0}s", duration_secs);
    }

    pub fn resume(&mut self) {
        if self.pause_until.take().is_some() {
            log::info!("Alerts resumed");
        }
    }

    pub fn is_paused(&self, now: f64) -> bool {
        self.pause_until.map_or(false, |until| now < until)
    }

    fn expire_pause(&mut self, now: f64) {
        if self.pause_until.map_or(false, |until| now >= until) {
            self.pause_until = None;
            log::info!("Alert pause expired");
        }
    }

    /// Remove the kind from the active list and drop its escalation.
    /// Cooldown still applies.
    pub fn acknowledge(&mut self, kind: AlertKind) -> bool {
        let before = self.active.len();
        self.active.retain(|a| a.kind != kind);
        self.cancel_escalation(kind);
        before != self.active.len()
    }

    pub fn acknowledge_all(&mut self) -> usize {
        let count = self.active.len();
        self.active.clear();
        for state in self.kinds.values_mut() {
            state.escalation_level = 0;
            state.escalate_at = None;
        }
        count
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn active(&self) -> &[AlertEvent] {
        &self.active
    }

    pub fn current(&self, kind: AlertKind) -> Option<Severity> {
        self.kinds.get(&kind).and_then(|s| s.current)
    }

    pub fn cooldown_until(&self, kind: AlertKind) -> Option<f64> {
        self.kinds.get(&kind).and_then(|s| s.cooldown_until)
    }

    pub fn last_fired_at(&self, kind: AlertKind) -> Option<f64> {
        self.kinds.get(&kind).and_then(|s| s.last_fired_at)
    }

    pub fn escalation_level(&self, kind: AlertKind) -> u32 {
        self.kinds.get(&kind).map_or(0, |s| s.escalation_level)
    }

    pub fn alerts_fired(&self) -> u64 {
        self.alerts_fired
    }

    pub fn summary(&self) -> AlertSummary {
        AlertSummary {
            alerts_fired: self.alerts_fired,
            active_count: self.active.len(),
            paused: self.is_paused(self.last_now),
            pause_remaining_secs: self
                .pause_until
                .map(|until| (until - self.last_now).max(0.0))
                .unwrap_or(0.0),
            by_kind: AlertKind::ALL
                .iter()
                .map(|kind| KindCount {
                    kind: *kind,
                    count: self.fired_by_kind.get(kind).copied().unwrap_or(0),
                })
                .collect(),
        }
    }

    pub fn reset(&mut self) {
        self.kinds.clear();
        self.active.clear();
    }
}
