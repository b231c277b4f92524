//! Baseline Module - Personal Calibration
//!
//! Establishes the user's neutral head pose, screen distance, resting blink
//! rate and open-eye EAR from a warm-up window.
//!
//! # Architecture
//! - `types.rs`: `Baseline`, `CalibrationQuality`, `CalibrationStatus`
//! - `validate.rs`: Layout/value validation, `BaselineError`
//! - `storage.rs`: Persistent JSON storage with validation
//!
//! # State machine
//! `Idle → Calibrating → Ready`. Windows are counted in face-present time, so
//! brief absences stretch the warm-up instead of failing it. The wall-clock
//! deadline is extended once; on the second expiry whatever was sampled well
//! enough is kept, the rest falls back to defaults, quality = `Incomplete`.

pub mod types;
pub mod validate;
pub mod storage;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::logic::landmarks::layout::{layout_hash, LAYOUT_VERSION};
use crate::logic::stats::median;

pub use types::{
    Baseline, CalibrationPhase, CalibrationQuality, CalibrationSample, CalibrationStatus,
    DEFAULT_EYE_OPENNESS_REF, DEFAULT_NEUTRAL_DISTANCE_CM, DEFAULT_RESTING_BLINK_RATE,
};
pub use validate::BaselineError;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Face-present seconds of posture samples
    pub posture_window_secs: f64,
    /// Face-present seconds of blink/EAR samples
    pub blink_window_secs: f64,
    /// First deadline = blink window × grace
    pub deadline_grace: f64,
    /// Minimum blink-window seconds to trust a partial blink rate
    pub min_blink_observed_secs: f64,
    pub min_posture_samples: usize,
    pub min_ear_samples: usize,
    /// Hard cap per sample buffer
    pub max_samples: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            posture_window_secs: 30.0,
            blink_window_secs: 120.0,
            deadline_grace: 1.5,
            min_blink_observed_secs: 30.0,
            min_posture_samples: 10,
            min_ear_samples: 30,
            max_samples: 20_000,
        }
    }
}

impl CalibrationConfig {
    /// Short warm-up (demos, tests)
    pub fn quick() -> Self {
        Self {
            posture_window_secs: 5.0,
            blink_window_secs: 20.0,
            min_blink_observed_secs: 10.0,
            ..Default::default()
        }
    }
}

// ============================================================================
// CALIBRATOR
// ============================================================================

pub struct BaselineCalibrator {
    config: CalibrationConfig,
    phase: CalibrationPhase,
    attempt: u8,
    started_at: f64,
    deadline: f64,
    last_sample_at: Option<f64>,
    posture_observed: f64,
    blink_observed: f64,
    pitches: Vec<f32>,
    yaws: Vec<f32>,
    rolls: Vec<f32>,
    distances: Vec<f32>,
    ears: Vec<f32>,
    blinks: u32,
    quality: CalibrationQuality,
}

impl BaselineCalibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            phase: CalibrationPhase::Idle,
            attempt: 0,
            started_at: 0.0,
            deadline: 0.0,
            last_sample_at: None,
            posture_observed: 0.0,
            blink_observed: 0.0,
            pitches: Vec::new(),
            yaws: Vec::new(),
            rolls: Vec::new(),
            distances: Vec::new(),
            ears: Vec::new(),
            blinks: 0,
            quality: CalibrationQuality::Defaults,
        }
    }

    /// Enter `Calibrating` at `t`. Restarts if already calibrating.
    pub fn start(&mut self, t: f64) {
        self.clear_samples();
        self.phase = CalibrationPhase::Calibrating;
        self.attempt = 1;
        self.started_at = t;
        self.deadline = t + self.config.blink_window_secs * self.config.deadline_grace;
        log::info!(
            "Calibration started (posture {:.0}s, blink {:.0}s, deadline +{:.0}s)",
            self.config.posture_window_secs,
            self.config.blink_window_secs,
            self.deadline - t
        );
    }

    /// Skip warm-up with an already validated baseline
    pub fn adopt(&mut self, baseline: &Baseline) {
        self.clear_samples();
        self.phase = CalibrationPhase::Ready;
        self.attempt = 0;
        self.quality = baseline.quality;
    }

    pub fn reset(&mut self) {
        self.clear_samples();
        self.phase = CalibrationPhase::Idle;
        self.attempt = 0;
        self.quality = CalibrationQuality::Defaults;
    }

    pub fn phase(&self) -> CalibrationPhase {
        self.phase
    }

    pub fn is_calibrating(&self) -> bool {
        self.phase == CalibrationPhase::Calibrating
    }

    pub fn status(&self) -> CalibrationStatus {
        let progress = |observed: f64, window: f64| -> f32 {
            if self.phase == CalibrationPhase::Ready {
                1.0
            } else if window <= 0.0 {
                0.0
            } else {
                (observed / window).clamp(0.0, 1.0) as f32
            }
        };

        CalibrationStatus {
            phase: self.phase,
            attempt: self.attempt,
            posture_progress: progress(self.posture_observed, self.config.posture_window_secs),
            blink_progress: progress(self.blink_observed, self.config.blink_window_secs),
            quality: self.quality,
        }
    }

    /// Feed one tick. Returns the new baseline when calibration finishes.
    pub fn feed(&mut self, t: f64, sample: Option<&CalibrationSample>) -> Option<Baseline> {
        if self.phase != CalibrationPhase::Calibrating {
            return None;
        }

        match sample {
            Some(s) => self.accumulate(t, s),
            // Gap: the next face frame starts a fresh interval
            None => self.last_sample_at = None,
        }

        if self.posture_done() && self.blink_done() {
            return Some(self.finish(t, false));
        }

        if t >= self.deadline {
            if self.attempt < 2 {
                self.attempt = 2;
                self.deadline = t + self.config.blink_window_secs;
                log::warn!(
                    "Calibration window elapsed (posture {:.0}/{:.0}s, blink {:.0}/{:.0}s) - extending once",
                    self.posture_observed,
                    self.config.posture_window_secs,
                    self.blink_observed,
                    self.config.blink_window_secs
                );
            } else {
                return Some(self.finish(t, true));
            }
        }

        None
    }

    fn accumulate(&mut self, t: f64, s: &CalibrationSample) {
        let dt = self
            .last_sample_at
            .map(|last| (t - last).max(0.0))
            .unwrap_or(0.0);
        self.last_sample_at = Some(t);

        let cap = self.config.max_samples;

        if !self.posture_done() {
            self.posture_observed += dt;
            if self.pitches.len() < cap {
                self.pitches.push(s.pitch);
                self.yaws.push(s.yaw);
                self.rolls.push(s.roll);
                self.distances.push(s.distance);
            }
        }

        if !self.blink_done() {
            self.blink_observed += dt;
            if !s.eye_closed && self.ears.len() < cap {
                self.ears.push(s.ear);
            }
            if s.blinked {
                self.blinks += 1;
            }
        }
    }

    fn posture_done(&self) -> bool {
        self.posture_observed >= self.config.posture_window_secs
    }

    fn blink_done(&self) -> bool {
        self.blink_observed >= self.config.blink_window_secs
    }

    fn finish(&mut self, t: f64, timed_out: bool) -> Baseline {
        let mut baseline = Baseline {
            calibrated_at: Utc::now(),
            layout_version: LAYOUT_VERSION,
            layout_hash: layout_hash(),
            ..Baseline::defaults()
        };

        let mut complete = !timed_out;

        if self.pitches.len() >= self.config.min_posture_samples {
            baseline.neutral_pitch = median(&mut self.pitches).unwrap_or(0.0);
            baseline.neutral_yaw = median(&mut self.yaws).unwrap_or(0.0);
            baseline.neutral_roll = median(&mut self.rolls).unwrap_or(0.0);
            baseline.neutral_distance = median(&mut self.distances)
                .filter(|d| *d > 0.0)
                .unwrap_or(DEFAULT_NEUTRAL_DISTANCE_CM);
            baseline.samples = self.pitches.len() as u64;
        } else {
            complete = false;
        }

        if self.ears.len() >= self.config.min_ear_samples {
            baseline.eye_openness_ref = median(&mut self.ears)
                .filter(|e| *e > 0.0)
                .unwrap_or(DEFAULT_EYE_OPENNESS_REF);
        } else {
            complete = false;
        }

        if self.blink_observed >= self.config.min_blink_observed_secs {
            baseline.resting_blink_rate = (self.blinks as f64 * 60.0 / self.blink_observed) as f32;
        } else {
            complete = false;
        }

        baseline.quality = if complete {
            CalibrationQuality::Full
        } else {
            CalibrationQuality::Incomplete
        };

        if complete {
            log::info!(
                "Calibration complete in {:.0}s: pitch {:.1}°, yaw {:.1}°, roll {:.1}°, distance {:.0}cm, blink {:.1}/min, EAR {:.3}",
                t - self.started_at,
                baseline.neutral_pitch,
                baseline.neutral_yaw,
                baseline.neutral_roll,
                baseline.neutral_distance,
                baseline.resting_blink_rate,
                baseline.eye_openness_ref
            );
        } else {
            log::warn!(
                "Calibration incomplete after {:.0}s ({} posture / {} EAR samples) - using defaults where data is missing",
                t - self.started_at,
                self.pitches.len(),
                self.ears.len()
            );
        }

        self.phase = CalibrationPhase::Ready;
        self.quality = baseline.quality;
        self.clear_samples();
        baseline
    }

    fn clear_samples(&mut self) {
        self.last_sample_at = None;
        self.posture_observed = 0.0;
        self.blink_observed = 0.0;
        self.pitches.clear();
        self.yaws.clear();
        self.rolls.clear();
        self.distances.clear();
        self.ears.clear();
        self.blinks = 0;
    }
}
