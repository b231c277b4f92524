//! Posture Module - Head pose, screen distance, posture score
//!
//! - `pose.rs` - rigid-geometry pose + pinhole distance
//!
//! `posture_score` is a risk value: 0 = neutral, 100 = severe sustained
//! deviation. It blends how far the head is from the calibrated neutral with
//! how much of the trailing window was spent deviating.

pub mod pose;

use serde::{Deserialize, Serialize};

use crate::logic::baseline::Baseline;
use crate::logic::error::EngineError;
use crate::logic::landmarks::{CameraConfig, FrameEstimator, LandmarkFrame};
use crate::logic::stats::{clamp_score, clamp_unit, ema_alpha, Smoother, TrailingFraction};

pub use pose::{estimate_pose, PoseSample};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// EMA on raw angles and distance
    pub angle_smoothing_tau_secs: f64,
    /// Deviation from neutral that counts as bad posture
    pub pitch_threshold_deg: f32,
    pub yaw_threshold_deg: f32,
    /// Roll only produces an issue string
    pub roll_threshold_deg: f32,
    /// Deviation must last this long before `bad_posture` is set
    pub min_bad_posture_secs: f64,
    /// Angle factor: 0 below dead zone, 1 at cap
    pub dead_zone_deg: f32,
    pub angle_cap_deg: f32,
    pub duration_window_secs: f64,
    pub weight_angle: f32,
    pub weight_duration: f32,
    pub smoothing_tau_secs: f64,
    pub too_close_cm: f32,
    pub too_far_cm: f32,
    /// Distance flags need this much sustained time
    pub distance_gate_secs: f64,
    /// Bad posture longer than this adds an issue line
    pub long_bad_posture_secs: f64,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            angle_smoothing_tau_secs: 0.5,
            pitch_threshold_deg: 15.0,
            yaw_threshold_deg: 20.0,
            roll_threshold_deg: 15.0,
            min_bad_posture_secs: 10.0,
            dead_zone_deg: 5.0,
            angle_cap_deg: 35.0,
            duration_window_secs: 60.0,
            weight_angle: 0.5,
            weight_duration: 0.5,
            smoothing_tau_secs: 2.0,
            too_close_cm: 30.0,
            too_far_cm: 80.0,
            distance_gate_secs: 5.0,
            long_bad_posture_secs: 60.0,
        }
    }
}

impl PostureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.angle_cap_deg <= self.dead_zone_deg {
            return Err("posture: angle_cap_deg must exceed dead_zone_deg".into());
        }
        if self.duration_window_secs <= 0.0 {
            return Err("posture: windows must be positive".into());
        }
        if self.too_close_cm <= 0.0 || self.too_far_cm <= self.too_close_cm {
            return Err("posture: too_far_cm must exceed too_close_cm".into());
        }
        if self.pitch_threshold_deg <= 0.0 || self.yaw_threshold_deg <= 0.0 {
            return Err("posture: angle thresholds must be positive".into());
        }
        Ok(())
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostureState {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Centimetres
    pub distance: f32,
    pub pitch_deviation: f32,
    pub yaw_deviation: f32,
    pub roll_deviation: f32,
    pub posture_score: f32,
    /// Current continuous deviating time
    pub bad_posture_secs: f64,
    pub bad_posture: bool,
    pub too_close: bool,
    pub too_far: bool,
    pub issues: Vec<String>,
    pub known: bool,
}

impl Default for PostureState {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            distance: 0.0,
            pitch_deviation: 0.0,
            yaw_deviation: 0.0,
            roll_deviation: 0.0,
            posture_score: 0.0,
            bad_posture_secs: 0.0,
            bad_posture: false,
            too_close: false,
            too_far: false,
            issues: Vec::new(),
            known: false,
        }
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

/// Time a condition has held continuously
#[derive(Debug, Clone, Default)]
struct Gate {
    held: f64,
}

impl Gate {
    fn step(&mut self, active: bool, dt: f64) -> f64 {
        if active {
            self.held += dt;
        } else {
            self.held = 0.0;
        }
        self.held
    }
}

pub struct PostureEstimator {
    config: PostureConfig,
    camera: CameraConfig,
    last_seen: Option<f64>,
    /// Smoothed (pitch, yaw, roll, distance)
    smoothed: Option<[f32; 4]>,
    deviating: Gate,
    close: Gate,
    far: Gate,
    window: TrailingFraction,
    score: Smoother,
    /// Face-present seconds; the trailing window runs on this clock
    observed: f64,
    state: PostureState,
}

impl PostureEstimator {
    pub fn new(config: PostureConfig, camera: CameraConfig) -> Self {
        let window = TrailingFraction::new(config.duration_window_secs);
        let score = Smoother::new(config.smoothing_tau_secs);
        Self {
            config,
            camera,
            last_seen: None,
            smoothed: None,
            deviating: Gate::default(),
            close: Gate::default(),
            far: Gate::default(),
            window,
            score,
            observed: 0.0,
            state: PostureState::default(),
        }
    }

    pub fn state(&self) -> &PostureState {
        &self.state
    }

    fn smooth(&mut self, sample: &PoseSample, dt: f64) -> [f32; 4] {
        let raw = [sample.pitch, sample.yaw, sample.roll, sample.distance];
        let next = match self.smoothed {
            None => raw,
            Some(prev) => {
                let a = ema_alpha(dt, self.config.angle_smoothing_tau_secs);
                let mut out = prev;
                for (o, r) in out.iter_mut().zip(raw.iter()) {
                    *o += a * (r - *o);
                }
                out
            }
        };
        self.smoothed = Some(next);
        next
    }

    fn issues(&self, state: &PostureState) -> Vec<String> {
        let c = &self.config;
        let mut issues = Vec::new();

        if state.pitch_deviation > c.pitch_threshold_deg {
            issues.push("Forward head posture detected".to_string());
        } else if state.pitch_deviation < -c.pitch_threshold_deg {
            issues.push("Head tilted back too far".to_string());
        }

        if state.roll_deviation.abs() > c.roll_threshold_deg {
            let direction = if state.roll_deviation > 0.0 { "right" } else { "left" };
            issues.push(format!("Head tilted to the {}", direction));
        }

        if state.yaw_deviation.abs() > c.yaw_threshold_deg {
            let direction = if state.yaw_deviation > 0.0 { "right" } else { "left" };
            issues.push(format!("Head turned to the {}", direction));
        }

        if state.too_close {
            issues.push(format!("Too close to screen ({:.0}cm)", state.distance));
        } else if state.too_far {
            issues.push(format!("Too far from screen ({:.0}cm)", state.distance));
        }

        if state.bad_posture_secs > c.long_bad_posture_secs {
            issues.push(format!("Poor posture for {:.0} seconds", state.bad_posture_secs));
        }

        issues
    }
}

impl FrameEstimator for PostureEstimator {
    type Sample = PoseSample;
    type State = PostureState;

    fn measure(&self, frame: &LandmarkFrame) -> Result<PoseSample, EngineError> {
        if !frame.face_present {
            return Err(EngineError::NoFaceDetected);
        }
        estimate_pose(frame, &self.camera)
    }

    fn update(&mut self, timestamp: f64, sample: Option<&PoseSample>, baseline: &Baseline) -> PostureState {
        let sample = match sample {
            Some(s) => s,
            None => {
                self.last_seen = None;
                self.state.known = false;
                return self.state.clone();
            }
        };

        let dt = self
            .last_seen
            .map(|last| (timestamp - last).max(0.0))
            .unwrap_or(0.0);
        self.last_seen = Some(timestamp);
        self.observed += dt;

        let [pitch, yaw, roll, distance] = self.smooth(sample, dt);
        let c = &self.config;

        let pitch_deviation = pitch - baseline.neutral_pitch;
        let yaw_deviation = yaw - baseline.neutral_yaw;
        let roll_deviation = roll - baseline.neutral_roll;

        let deviating = pitch_deviation.abs() > c.pitch_threshold_deg
            || yaw_deviation.abs() > c.yaw_threshold_deg;
        let bad_posture_secs = self.deviating.step(deviating, dt);
        let bad_posture = deviating && bad_posture_secs >= c.min_bad_posture_secs;

        let too_close = self.close.step(distance < c.too_close_cm, dt) >= c.distance_gate_secs
            && distance < c.too_close_cm;
        let too_far = self.far.step(distance > c.too_far_cm, dt) >= c.distance_gate_secs
            && distance > c.too_far_cm;

        self.window.push(self.observed, dt, deviating);

        let magnitude = pitch_deviation.abs().max(yaw_deviation.abs());
        let angle_factor = clamp_unit((magnitude - c.dead_zone_deg) / (c.angle_cap_deg - c.dead_zone_deg));
        let duration_factor = self.window.fraction();
        let raw = 100.0 * (c.weight_angle * angle_factor + c.weight_duration * duration_factor);
        let posture_score = clamp_score(self.score.update(clamp_score(raw), dt));

        let mut state = PostureState {
            pitch,
            yaw,
            roll,
            distance,
            pitch_deviation,
            yaw_deviation,
            roll_deviation,
            posture_score,
            bad_posture_secs,
            bad_posture,
            too_close,
            too_far,
            issues: Vec::new(),
            known: true,
        };
        state.issues = self.issues(&state);

        if bad_posture && !self.state.bad_posture {
            log::debug!(
                "Bad posture sustained {:.0}s (pitch {:+.1}°, yaw {:+.1}°)",
                bad_posture_secs,
                pitch_deviation,
                yaw_deviation
            );
        }

        self.state = state;
        self.state.clone()
    }

    fn reset(&mut self) {
        self.last_seen = None;
        self.smoothed = None;
        self.deviating = Gate::default();
        self.close = Gate::default();
        self.far = Gate::default();
        self.window.reset();
        self.score.reset();
        self.observed = 0.0;
        self.state = PostureState::default();
    }
}
