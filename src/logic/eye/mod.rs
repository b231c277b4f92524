//! Eye Module - EAR, blinks and eye strain score
//!
//! - `blink.rs` - closure-run classification, trailing blink rate
//!
//! # Score
//! Weighted sum of three factors in [0, 1]:
//! 1. blink-rate deficit below the healthy band
//! 2. time since the eyes last closed (stare), linear between threshold and cap
//! 3. partial-closure EMA (squinting / drooping lids)
//!
//! The raw score is clamped to [0, 100] and time-constant smoothed.

pub mod blink;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::logic::baseline::{Baseline, CalibrationQuality};
use crate::logic::error::EngineError;
use crate::logic::landmarks::layout::{LEFT_EYE, RIGHT_EYE};
use crate::logic::landmarks::{CameraConfig, FrameEstimator, LandmarkFrame, Point3};
use crate::logic::stats::{clamp_score, clamp_unit, ema_alpha, Smoother};

use blink::{BlinkDetector, BlinkRateWindow, ClosureEnd};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// Closure threshold before calibration
    pub default_blink_threshold: f32,
    /// Calibrated threshold = eye_openness_ref × ratio
    pub blink_ratio: f32,
    pub min_blink_secs: f64,
    /// Longer closures are not blinks
    pub max_blink_secs: f64,
    pub rate_window_secs: f64,
    /// No rate is reported before this much observed time
    pub min_rate_secs: f64,
    /// Healthy band, blinks/min
    pub healthy_rate_low: f32,
    pub healthy_rate_high: f32,
    pub stare_threshold_secs: f64,
    pub stare_cap_secs: f64,
    /// Open but below ref × ratio counts as partially closed
    pub partial_closure_ratio: f32,
    pub partial_closure_tau_secs: f64,
    /// Partial-closure EMA value that maps to a full factor
    pub partial_closure_cap: f32,
    pub weight_rate: f32,
    pub weight_stare: f32,
    pub weight_partial: f32,
    pub smoothing_tau_secs: f64,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            default_blink_threshold: 0.21,
            blink_ratio: 0.7,
            min_blink_secs: 0.05,
            max_blink_secs: 0.5,
            rate_window_secs: 60.0,
            min_rate_secs: 10.0,
            healthy_rate_low: 12.0,
            healthy_rate_high: 20.0,
            stare_threshold_secs: 10.0,
            stare_cap_secs: 30.0,
            partial_closure_ratio: 0.8,
            partial_closure_tau_secs: 30.0,
            partial_closure_cap: 0.5,
            weight_rate: 0.4,
            weight_stare: 0.35,
            weight_partial: 0.25,
            smoothing_tau_secs: 2.0,
        }
    }
}

impl EyeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_blink_secs < 0.0 || self.max_blink_secs <= self.min_blink_secs {
            return Err("eye: max_blink_secs must exceed min_blink_secs".into());
        }
        if self.rate_window_secs <= 0.0 {
            return Err("eye: windows must be positive".into());
        }
        if self.stare_cap_secs <= self.stare_threshold_secs {
            return Err("eye: stare_cap_secs must exceed stare_threshold_secs".into());
        }
        if self.healthy_rate_low <= 0.0 || self.healthy_rate_high < self.healthy_rate_low {
            return Err("eye: healthy blink band is empty".into());
        }
        if self.partial_closure_cap <= 0.0 {
            return Err("eye: partial_closure_cap must be positive".into());
        }
        Ok(())
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Per-frame measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSample {
    /// Mean of both eyes
    pub ear: f32,
    pub left_ear: f32,
    pub right_ear: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EyeState {
    pub ear: f32,
    /// Blinks/min; `None` until enough time was observed
    pub blink_rate: Option<f32>,
    pub time_since_last_blink: f64,
    /// EMA of partially-closed frames, 0..1
    pub partial_closure: f32,
    pub blink_count: u64,
    pub eye_strain_score: f32,
    /// False while no face is visible
    pub known: bool,
    /// A blink completed this tick
    pub blinked: bool,
    /// Inside a closure run this tick
    pub eye_closed: bool,
}

impl Default for EyeState {
    fn default() -> Self {
        Self {
            ear: 0.0,
            blink_rate: None,
            time_since_last_blink: 0.0,
            partial_closure: 0.0,
            blink_count: 0,
            eye_strain_score: 0.0,
            known: false,
            blinked: false,
            eye_closed: false,
        }
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

pub struct EyeStateEstimator {
    config: EyeConfig,
    camera: CameraConfig,
    /// Face-present seconds since reset
    observed: f64,
    last_seen: Option<f64>,
    detector: BlinkDetector,
    rate: BlinkRateWindow,
    last_blink_at: Option<f64>,
    /// End of the last closure of any length
    last_rest_at: Option<f64>,
    partial: f32,
    smoother: Smoother,
    blink_count: u64,
    state: EyeState,
}

impl EyeStateEstimator {
    pub fn new(config: EyeConfig, camera: CameraConfig) -> Self {
        let rate = BlinkRateWindow::new(config.rate_window_secs);
        let smoother = Smoother::new(config.smoothing_tau_secs);
        Self {
            config,
            camera,
            observed: 0.0,
            last_seen: None,
            detector: BlinkDetector::new(),
            rate,
            last_blink_at: None,
            last_rest_at: None,
            partial: 0.0,
            smoother,
            blink_count: 0,
            state: EyeState::default(),
        }
    }

    pub fn state(&self) -> &EyeState {
        &self.state
    }

    /// Closure threshold for this baseline
    pub fn blink_threshold(&self, baseline: &Baseline) -> f32 {
        if baseline.quality == CalibrationQuality::Defaults {
            self.config.default_blink_threshold
        } else {
            baseline.eye_openness_ref * self.config.blink_ratio
        }
    }

    fn eye_aspect_ratio(&self, frame: &LandmarkFrame, contour: &[usize; 6]) -> Result<f32, EngineError> {
        let mut p = [Point3::default(); 6];
        for (slot, &index) in p.iter_mut().zip(contour.iter()) {
            *slot = frame
                .pixel(index, &self.camera)
                .ok_or_else(|| EngineError::invalid(format!("missing eye landmark {}", index)))?;
        }

        let vertical = p[1].distance(&p[5]) + p[2].distance(&p[4]);
        let horizontal = p[0].distance(&p[3]);
        if !horizontal.is_finite() || horizontal < 1e-6 {
            return Err(EngineError::invalid("degenerate eye contour"));
        }

        Ok(vertical / (2.0 * horizontal))
    }

    fn factors(&self, blink_rate: Option<f32>) -> (f32, f32, f32) {
        let c = &self.config;

        let rate_factor = blink_rate
            .map(|r| clamp_unit((c.healthy_rate_low - r) / c.healthy_rate_low))
            .unwrap_or(0.0);

        let stare = if self.detector.is_closed() {
            0.0
        } else {
            let since = match (self.last_blink_at, self.last_rest_at) {
                (Some(a), Some(b)) => a.max(b),
                (a, b) => a.or(b).unwrap_or(0.0),
            };
            self.observed - since
        };
        let stare_factor = clamp_unit(
            ((stare - c.stare_threshold_secs) / (c.stare_cap_secs - c.stare_threshold_secs)) as f32,
        );

        let partial_factor = clamp_unit(self.partial / c.partial_closure_cap);

        (rate_factor, stare_factor, partial_factor)
    }
}

impl FrameEstimator for EyeStateEstimator {
    type Sample = EyeSample;
    type State = EyeState;

    fn measure(&self, frame: &LandmarkFrame) -> Result<EyeSample, EngineError> {
        if !frame.face_present {
            return Err(EngineError::NoFaceDetected);
        }
        let right_ear = self.eye_aspect_ratio(frame, &RIGHT_EYE)?;
        let left_ear = self.eye_aspect_ratio(frame, &LEFT_EYE)?;
        Ok(EyeSample {
            ear: (left_ear + right_ear) / 2.0,
            left_ear,
            right_ear,
        })
    }

    fn update(&mut self, timestamp: f64, sample: Option<&EyeSample>, baseline: &Baseline) -> EyeState {
        let sample = match sample {
            Some(s) => s,
            None => {
                // Freeze: clock stops, open run is dropped
                self.last_seen = None;
                self.detector.abort();
                self.state.known = false;
                self.state.blinked = false;
                self.state.eye_closed = false;
                return self.state.clone();
            }
        };

        let dt = self
            .last_seen
            .map(|last| (timestamp - last).max(0.0))
            .unwrap_or(0.0);
        self.last_seen = Some(timestamp);
        self.observed += dt;

        let threshold = self.blink_threshold(baseline);
        let closed = sample.ear < threshold;

        let mut blinked = false;
        match self.detector.observe(self.observed, closed, self.config.min_blink_secs, self.config.max_blink_secs) {
            Some(ClosureEnd::Blink(_)) => {
                blinked = true;
                self.blink_count += 1;
                self.rate.record(self.observed);
                self.last_blink_at = Some(self.observed);
                self.last_rest_at = Some(self.observed);
            }
            Some(ClosureEnd::Rest(secs)) => {
                log::debug!("Eye closure of {:.2}s ignored as blink", secs);
                self.last_rest_at = Some(self.observed);
            }
            Some(ClosureEnd::Flicker(_)) | None => {}
        }
        self.rate.evict(self.observed);
        let blink_rate = self.rate.rate(self.observed, self.config.min_rate_secs);

        let partially_closed =
            !closed && sample.ear < baseline.eye_openness_ref * self.config.partial_closure_ratio;
        let target = if partially_closed { 1.0 } else { 0.0 };
        self.partial += ema_alpha(dt, self.config.partial_closure_tau_secs) * (target - self.partial);

        let (rate_factor, stare_factor, partial_factor) = self.factors(blink_rate);
        let c = &self.config;
        let raw = 100.0
            * (c.weight_rate * rate_factor + c.weight_stare * stare_factor + c.weight_partial * partial_factor);
        let score = clamp_score(self.smoother.update(clamp_score(raw), dt));

        self.state = EyeState {
            ear: sample.ear,
            blink_rate,
            time_since_last_blink: self.observed - self.last_blink_at.unwrap_or(0.0),
            partial_closure: clamp_unit(self.partial),
            blink_count: self.blink_count,
            eye_strain_score: score,
            known: true,
            blinked,
            eye_closed: self.detector.is_closed(),
        };
        self.state.clone()
    }

    fn reset(&mut self) {
        self.observed = 0.0;
        self.last_seen = None;
        self.detector.abort();
        self.rate.clear();
        self.last_blink_at = None;
        self.last_rest_at = None;
        self.partial = 0.0;
        self.smoother.reset();
        self.blink_count = 0;
        self.state = EyeState::default();
    }
}
