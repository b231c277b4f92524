//! Session Scheduler - active time, presence, break tiers
//!
//! Driven by the engine clock. Face absence first gets a short grace period
//! (still active), then pauses accrual. A long enough absence counts as a
//! break when the user comes back. Every gap between ticks is booked in
//! full, as active or away time.
//!
//! Tiers run on active time only:
//! - micro (20-20-20): pulse at a fixed cadence
//! - short / long: level signal until a break is taken

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub micro_break_interval_secs: f64,
    pub short_break_interval_secs: f64,
    pub long_break_interval_secs: f64,
    /// Absence shorter than this still accrues active time
    pub pause_after_secs: f64,
    /// One PRESENCE_LOST signal per absence after this long
    pub presence_lost_after_secs: f64,
    /// Absence this long counts as a short break on return
    pub short_break_secs: f64,
    pub long_break_secs: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            micro_break_interval_secs: 20.0 * 60.0,
            short_break_interval_secs: 45.0 * 60.0,
            long_break_interval_secs: 90.0 * 60.0,
            pause_after_secs: 5.0,
            presence_lost_after_secs: 60.0,
            short_break_secs: 5.0 * 60.0,
            long_break_secs: 15.0 * 60.0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        let intervals = [
            self.micro_break_interval_secs,
            self.short_break_interval_secs,
            self.long_break_interval_secs,
        ];
        if intervals.iter().any(|v| *v <= 0.0) {
            return Err("session: intervals must be positive".into());
        }
        if !(intervals[0] <= intervals[1] && intervals[1] <= intervals[2]) {
            return Err("session: break intervals must ascend (micro ≤ short ≤ long)".into());
        }
        if self.short_break_secs > self.long_break_secs {
            return Err("session: short_break_secs must not exceed long_break_secs".into());
        }
        if self.pause_after_secs < 0.0 || self.presence_lost_after_secs < self.pause_after_secs {
            return Err("session: presence_lost_after_secs must be at least pause_after_secs".into());
        }
        Ok(())
    }
}

// ============================================================================
// BREAK TIERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BreakKind {
    Micro,
    Short,
    Long,
}

impl BreakKind {
    pub fn duration_hint(&self) -> &'static str {
        match self {
            BreakKind::Micro => "20 seconds",
            BreakKind::Short => "5 minutes",
            BreakKind::Long => "15 minutes",
        }
    }

    pub fn exercises(&self) -> &'static [&'static str] {
        match self {
            BreakKind::Micro => &[
                "Look at a distant object for 20 seconds",
                "Blink 20 times slowly",
                "Close your eyes and take 3 deep breaths",
            ],
            BreakKind::Short => &[
                "Stand up and stretch your arms overhead",
                "Roll your shoulders backwards 10 times",
                "Tilt your head side to side gently",
                "Take 5 deep breaths",
                "Walk around for a minute",
            ],
            BreakKind::Long => &[
                "Stand up and stretch your whole body",
                "Take a short walk",
                "Do some light exercises or yoga",
                "Get a healthy snack and water",
                "Look out a window at distant objects",
            ],
        }
    }
}

impl std::fmt::Display for BreakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakKind::Micro => write!(f, "micro"),
            BreakKind::Short => write!(f, "short"),
            BreakKind::Long => write!(f, "long"),
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_start: f64,
    /// Set by stop
    pub session_end: Option<f64>,
    pub active_secs: f64,
    pub away_secs: f64,
    pub since_micro_secs: f64,
    pub since_short_secs: f64,
    pub since_long_secs: f64,
    pub last_break_at: Option<f64>,
    /// Engine-clock time the next micro break falls due at current pace
    pub next_micro_break_due: f64,
    pub present: bool,
    pub breaks_taken: u32,
    /// Breaks taken before 120% of the short interval had elapsed
    pub on_time_breaks: u32,
    /// Work stretches separated by breaks
    pub sessions: u32,
    pub alerts_today: u64,
}

/// What the scheduler raised this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSignals {
    /// One-shot, once per absence
    pub presence_lost: bool,
    /// Highest tier currently due
    pub break_due: Option<BreakKind>,
    /// Absence that just ended and counted as a break
    pub returned_from: Option<BreakKind>,
    /// No face this tick, grace period included
    pub absent: bool,
}

pub struct SessionScheduler {
    config: SessionConfig,
    session_start: Option<f64>,
    session_end: Option<f64>,
    last_tick: Option<f64>,
    /// Last face-present tick before the current absence
    absent_since: Option<f64>,
    presence_lost_sent: bool,
    present: bool,
    active_secs: f64,
    away_secs: f64,
    since_micro: f64,
    since_short: f64,
    since_long: f64,
    last_break_at: Option<f64>,
    breaks_taken: u32,
    on_time_breaks: u32,
    sessions: u32,
}

impl SessionScheduler {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session_start: None,
            session_end: None,
            last_tick: None,
            absent_since: None,
            presence_lost_sent: false,
            present: false,
            active_secs: 0.0,
            away_secs: 0.0,
            since_micro: 0.0,
            since_short: 0.0,
            since_long: 0.0,
            last_break_at: None,
            breaks_taken: 0,
            on_time_breaks: 0,
            sessions: 0,
        }
    }

    pub fn tick(&mut self, t: f64, present: bool) -> SessionSignals {
        let mut signals = SessionSignals::default();

        let dt = match self.last_tick {
            None => {
                self.session_start = Some(t);
                0.0
            }
            Some(last) => (t - last).max(0.0),
        };
        let previous_tick = self.last_tick.unwrap_or(t);
        self.last_tick = Some(t);

        if present {
            if let Some(since) = self.absent_since.take() {
                signals.returned_from = self.end_absence(t, t - since);
            } else if self.sessions == 0 {
                self.sessions = 1;
            }
            self.present = true;
            self.accrue_active(dt);

            signals.break_due = self.due_tier();
        } else {
            signals.absent = true;
            let since = *self.absent_since.get_or_insert(previous_tick);
            let absence = t - since;

            if absence < self.config.pause_after_secs {
                self.accrue_active(dt);
            } else {
                if self.present {
                    log::debug!("User away, pausing active time");
                }
                self.present = false;
                self.away_secs += dt;
            }

            if absence >= self.config.presence_lost_after_secs && !self.presence_lost_sent {
                self.presence_lost_sent = true;
                signals.presence_lost = true;
                log::info!("Presence lost ({:.0}s without a face)", absence);
            }
        }

        signals
    }

    fn accrue_active(&mut self, dt: f64) {
        self.active_secs += dt;
        self.since_micro += dt;
        self.since_short += dt;
        self.since_long += dt;
    }

    fn end_absence(&mut self, t: f64, absence: f64) -> Option<BreakKind> {
        self.presence_lost_sent = false;

        let kind = if absence >= self.config.long_break_secs {
            BreakKind::Long
        } else if absence >= self.config.short_break_secs {
            BreakKind::Short
        } else {
            return None;
        };

        log::info!("User returned after {:.0}s, counted as {} break", absence, kind);
        self.take_break(kind, t);
        self.sessions += 1;
        Some(kind)
    }

    fn take_break(&mut self, kind: BreakKind, at: f64) {
        if self.since_short < self.config.short_break_interval_secs * 1.2 {
            self.on_time_breaks += 1;
        }

        match kind {
            BreakKind::Micro => self.since_micro = 0.0,
            BreakKind::Short => {
                self.since_micro = 0.0;
                self.since_short = 0.0;
            }
            BreakKind::Long => {
                self.since_micro = 0.0;
                self.since_short = 0.0;
                self.since_long = 0.0;
            }
        }
        self.breaks_taken += 1;
        self.last_break_at = Some(at);
    }

    /// Long and short are levels; micro fires once per interval
    fn due_tier(&mut self) -> Option<BreakKind> {
        if self.since_long >= self.config.long_break_interval_secs {
            Some(BreakKind::Long)
        } else if self.since_short >= self.config.short_break_interval_secs {
            Some(BreakKind::Short)
        } else if self.since_micro >= self.config.micro_break_interval_secs {
            self.since_micro = 0.0;
            Some(BreakKind::Micro)
        } else {
            None
        }
    }

    /// Explicit break (user confirmed)
    pub fn record_break(&mut self, kind: BreakKind) {
        let at = self.last_tick.unwrap_or(0.0);
        log::info!("{} break recorded", kind);
        self.take_break(kind, at);
    }

    /// Idempotent; only the first call sets the end
    pub fn stop(&mut self) {
        if self.session_end.is_none() {
            self.session_end = Some(self.last_tick.unwrap_or(0.0));
        }
    }

    pub fn state(&self) -> SessionState {
        let now = self.last_tick.unwrap_or(0.0);
        SessionState {
            session_start: self.session_start.unwrap_or(0.0),
            session_end: self.session_end,
            active_secs: self.active_secs,
            away_secs: self.away_secs,
            since_micro_secs: self.since_micro,
            since_short_secs: self.since_short,
            since_long_secs: self.since_long,
            last_break_at: self.last_break_at,
            next_micro_break_due: now + (self.config.micro_break_interval_secs - self.since_micro).max(0.0),
            present: self.present,
            breaks_taken: self.breaks_taken,
            on_time_breaks: self.on_time_breaks,
            sessions: self.sessions,
            alerts_today: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
