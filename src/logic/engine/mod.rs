//! Engine Module - Per-tick orchestration
//!
//! `HealthMonitorEngine` is the only owner of mutable pipeline state. A tick
//! either fully succeeds or changes nothing:
//!
//! 1. reject if stopped, malformed or out of clock order
//! 2. measure with every estimator (pure, may fail)
//! 3. update estimators, feed the calibrator while calibrating
//! 4. score risk once calibrated
//! 5. advance the session scheduler, then the alert machine
//! 6. publish the snapshot + events
//!
//! Nothing escapes `tick`; faults come back in the `TickOutcome`.

pub mod snapshot;
#[cfg(test)]
mod tests;

use std::collections::VecDeque;

use crate::logic::alert::{AlertEvent, AlertInputs, AlertKind, AlertStateMachine};
use crate::logic::baseline::validate::validate_baseline;
use crate::logic::baseline::{
    Baseline, BaselineCalibrator, BaselineError, CalibrationPhase, CalibrationQuality, CalibrationSample,
};
use crate::logic::config::{ConfigError, MonitorConfig};
use crate::logic::error::EngineError;
use crate::logic::eye::EyeStateEstimator;
use crate::logic::history::summary::{DailySummary, ScoreTally};
use crate::logic::landmarks::{FrameEstimator, LandmarkFrame};
use crate::logic::posture::PostureEstimator;
use crate::logic::risk;
use crate::logic::session::{BreakKind, SessionScheduler, SessionSignals};

pub use snapshot::{Snapshot, WellnessStatus};

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// Current snapshot (the previous one when the tick faulted)
    pub snapshot: Snapshot,
    pub events: Vec<AlertEvent>,
    /// Why the frame was discarded
    pub fault: Option<EngineError>,
    /// Non-fatal conditions (`NoFaceDetected`, `CalibrationIncomplete`)
    pub notices: Vec<EngineError>,
}

impl TickOutcome {
    pub fn is_ok(&self) -> bool {
        self.fault.is_none()
    }
}

pub struct HealthMonitorEngine {
    config: MonitorConfig,
    eye: EyeStateEstimator,
    posture: PostureEstimator,
    calibrator: BaselineCalibrator,
    baseline: Baseline,
    session: SessionScheduler,
    alerts: AlertStateMachine,
    recent: VecDeque<AlertEvent>,
    tally: ScoreTally,
    last_timestamp: Option<f64>,
    snapshot: Snapshot,
    frames_processed: u64,
    frames_rejected: u64,
    stopped: bool,
}

fn measure_or_absent<E: FrameEstimator>(
    estimator: &E,
    frame: &LandmarkFrame,
) -> Result<Option<E::Sample>, EngineError> {
    match estimator.measure(frame) {
        Ok(sample) => Ok(Some(sample)),
        Err(EngineError::NoFaceDetected) => Ok(None),
        Err(e) => Err(e),
    }
}

impl HealthMonitorEngine {
    /// Build an engine from a config. Rejects configs that fail `validate`.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let eye = EyeStateEstimator::new(config.eye.clone(), config.camera.clone());
        let posture = PostureEstimator::new(config.posture.clone(), config.camera.clone());
        let calibrator = BaselineCalibrator::new(config.calibration.clone());
        let session = SessionScheduler::new(config.session.clone());
        let alerts = AlertStateMachine::new(config.alerts.clone());

        let snapshot = Snapshot {
            timestamp: 0.0,
            eye: eye.state().clone(),
            posture: posture.state().clone(),
            session: session.state(),
            risk: None,
            calibration: calibrator.status(),
            wellness: None,
            status: WellnessStatus::Unknown,
            recent_alerts: Vec::new(),
            alerts: alerts.summary(),
            frames_processed: 0,
            frames_rejected: 0,
        };

        Ok(Self {
            config,
            eye,
            posture,
            calibrator,
            baseline: Baseline::defaults(),
            session,
            alerts,
            recent: VecDeque::new(),
            tally: ScoreTally::default(),
            last_timestamp: None,
            snapshot,
            frames_processed: 0,
            frames_rejected: 0,
            stopped: false,
        })
    }

    // ========================================================================
    // TICK
    // ========================================================================

    pub fn tick(&mut self, frame: &LandmarkFrame) -> TickOutcome {
        match self.try_tick(frame) {
            Ok((events, notices)) => TickOutcome {
                snapshot: self.snapshot.clone(),
                events,
                fault: None,
                notices,
            },
            Err(e) => {
                self.frames_rejected += 1;
                self.snapshot.frames_rejected = self.frames_rejected;
                log::warn!("Frame at {:.3}s discarded: {}", frame.timestamp, e);
                TickOutcome {
                    snapshot: self.snapshot.clone(),
                    events: Vec::new(),
                    fault: Some(e),
                    notices: Vec::new(),
                }
            }
        }
    }

    fn try_tick(&mut self, frame: &LandmarkFrame) -> Result<(Vec<AlertEvent>, Vec<EngineError>), EngineError> {
        if self.stopped {
            return Err(EngineError::Stopped);
        }
        frame.validate()?;
        if let Some(previous) = self.last_timestamp {
            if frame.timestamp <= previous {
                return Err(EngineError::ClockNonMonotonic {
                    previous,
                    received: frame.timestamp,
                });
            }
        }

        let eye_sample = measure_or_absent(&self.eye, frame)?;
        let pose_sample = measure_or_absent(&self.posture, frame)?;

        // Frame accepted: nothing below can fail
        let t = frame.timestamp;
        self.last_timestamp = Some(t);
        self.frames_processed += 1;
        let mut notices = Vec::new();

        if self.calibrator.phase() == CalibrationPhase::Idle {
            self.calibrator.start(t);
        }

        let eye = self.eye.update(t, eye_sample.as_ref(), &self.baseline);
        let posture = self.posture.update(t, pose_sample.as_ref(), &self.baseline);
        let present = eye_sample.is_some() && pose_sample.is_some();
        if !present {
            notices.push(EngineError::NoFaceDetected);
        }

        if self.calibrator.is_calibrating() {
            let sample = match (&eye_sample, &pose_sample) {
                (Some(e), Some(p)) => Some(CalibrationSample {
                    pitch: p.pitch,
                    yaw: p.yaw,
                    roll: p.roll,
                    distance: p.distance,
                    ear: e.ear,
                    eye_closed: eye.eye_closed,
                    blinked: eye.blinked,
                }),
                _ => None,
            };
            if let Some(baseline) = self.calibrator.feed(t, sample.as_ref()) {
                if baseline.quality != CalibrationQuality::Full {
                    notices.push(EngineError::CalibrationIncomplete {
                        reason: "warm-up ran out of face-present time; defaults fill the gaps".into(),
                    });
                }
                self.baseline = baseline;
            }
        }

        let risk = (self.calibrator.phase() == CalibrationPhase::Ready)
            .then(|| risk::score(&eye, &posture, &self.baseline, &self.config.risk));
        if let Some(r) = &risk {
            self.tally.add(r.eye_risk, r.posture_risk);
        }

        let signals: SessionSignals = self.session.tick(t, present);
        let mut session_state = self.session.state();
        session_state.alerts_today = self.alerts.alerts_fired();

        let events = self.alerts.evaluate(
            t,
            &AlertInputs {
                risk: risk.as_ref(),
                eye: &eye,
                posture: &posture,
                session: &session_state,
                signals: &signals,
            },
        );
        session_state.alerts_today = self.alerts.alerts_fired();

        for event in &events {
            self.recent.push_back(event.clone());
        }
        while self.recent.len() > self.config.recent_alerts {
            self.recent.pop_front();
        }

        let wellness = risk.as_ref().and_then(|r| r.wellness());
        self.snapshot = Snapshot {
            timestamp: t,
            eye,
            posture,
            session: session_state,
            risk,
            calibration: self.calibrator.status(),
            wellness,
            status: WellnessStatus::from_score(wellness),
            recent_alerts: self.recent.iter().cloned().collect(),
            alerts: self.alerts.summary(),
            frames_processed: self.frames_processed,
            frames_rejected: self.frames_rejected,
        };

        Ok((events, notices))
    }

    // ========================================================================
    // CONTROL
    // ========================================================================

    /// Drop the current baseline and warm up again from the next frame
    pub fn recalibrate(&mut self) {
        log::info!("Recalibration requested");
        self.calibrator.reset();
        self.baseline = Baseline::defaults();
        self.eye.reset();
        self.posture.reset();
        self.snapshot.calibration = self.calibrator.status();
        self.snapshot.risk = None;
        self.snapshot.wellness = None;
        self.snapshot.status = WellnessStatus::Unknown;
    }

    /// Use a persisted baseline instead of warming up
    pub fn adopt_baseline(&mut self, baseline: Baseline) -> Result<(), BaselineError> {
        validate_baseline(&baseline)?;
        log::info!(
            "Adopting baseline {} ({:?}, calibrated {})",
            baseline.id,
            baseline.quality,
            baseline.calibrated_at
        );
        self.calibrator.adopt(&baseline);
        self.baseline = baseline;
        self.snapshot.calibration = self.calibrator.status();
        Ok(())
    }

    pub fn record_break(&mut self, kind: BreakKind) {
        self.session.record_break(kind);
        self.refresh_session();
    }

    pub fn pause_alerts(&mut self, duration_secs: f64) {
        let now = self.last_timestamp.unwrap_or(0.0);
        self.alerts.pause(now, duration_secs);
        self.snapshot.alerts = self.alerts.summary();
    }

    pub fn resume_alerts(&mut self) {
        self.alerts.resume();
        self.snapshot.alerts = self.alerts.summary();
    }

    pub fn acknowledge(&mut self, kind: AlertKind) -> bool {
        let removed = self.alerts.acknowledge(kind);
        self.snapshot.alerts = self.alerts.summary();
        removed
    }

    pub fn acknowledge_all(&mut self) -> usize {
        let count = self.alerts.acknowledge_all();
        self.snapshot.alerts = self.alerts.summary();
        count
    }

    /// Idempotent. Later ticks return `Stopped`.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.session.stop();
        self.refresh_session();
        log::info!(
            "Engine stopped after {} frames ({} rejected), {:.1} min active",
            self.frames_processed,
            self.frames_rejected,
            self.snapshot.session.active_secs / 60.0
        );
    }

    fn refresh_session(&mut self) {
        let mut state = self.session.state();
        state.alerts_today = self.alerts.alerts_fired();
        self.snapshot.session = state;
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn active_alerts(&self) -> &[AlertEvent] {
        self.alerts.active()
    }

    pub fn daily_summary(&self) -> DailySummary {
        DailySummary::build(&self.snapshot.session, &self.alerts.summary(), &self.tally)
    }
}
