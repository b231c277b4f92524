use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::landmarks::layout::{layout_hash, LAYOUT_VERSION};

// ============================================================================
// DEFAULTS (used before / instead of calibration)
// ============================================================================

pub const DEFAULT_NEUTRAL_DISTANCE_CM: f32 = 50.0;
pub const DEFAULT_RESTING_BLINK_RATE: f32 = 15.0;
pub const DEFAULT_EYE_OPENNESS_REF: f32 = 0.30;

// ============================================================================
// BASELINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationQuality {
    /// Both warm-up windows filled
    Full,
    /// Warm-up timed out; some values are defaults
    Incomplete,
    /// Never calibrated
    Defaults,
}

/// Personal reference values. Only the calibrator creates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Degrees
    pub neutral_pitch: f32,
    pub neutral_yaw: f32,
    pub neutral_roll: f32,
    /// Centimetres
    pub neutral_distance: f32,
    /// Blinks per minute
    pub resting_blink_rate: f32,
    /// Open-eye EAR
    pub eye_openness_ref: f32,
    pub calibrated_at: DateTime<Utc>,

    // Metadata
    pub quality: CalibrationQuality,
    pub layout_version: u8,
    pub layout_hash: u32,
    pub id: String,
    /// Face-present frames that went into the posture medians
    #[serde(default)]
    pub samples: u64,
}

impl Baseline {
    /// Fixed default thresholds
    pub fn defaults() -> Self {
        Self {
            neutral_pitch: 0.0,
            neutral_yaw: 0.0,
            neutral_roll: 0.0,
            neutral_distance: DEFAULT_NEUTRAL_DISTANCE_CM,
            resting_blink_rate: DEFAULT_RESTING_BLINK_RATE,
            eye_openness_ref: DEFAULT_EYE_OPENNESS_REF,
            calibrated_at: Utc::now(),
            quality: CalibrationQuality::Defaults,
            layout_version: LAYOUT_VERSION,
            layout_hash: layout_hash(),
            id: uuid::Uuid::new_v4().to_string(),
            samples: 0,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.quality != CalibrationQuality::Defaults
    }

    pub fn is_incomplete(&self) -> bool {
        self.quality != CalibrationQuality::Full
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::defaults()
    }
}

// ============================================================================
// CALIBRATION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationPhase {
    Idle,
    Calibrating,
    Ready,
}

/// Calibrator progress for the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationStatus {
    pub phase: CalibrationPhase,
    /// 1 = first window, 2 = extended window
    pub attempt: u8,
    /// 0..1 of the posture warm-up window
    pub posture_progress: f32,
    /// 0..1 of the blink warm-up window
    pub blink_progress: f32,
    /// Quality of the baseline currently in use
    pub quality: CalibrationQuality,
}

impl CalibrationStatus {
    /// Degraded-confidence indicator
    pub fn is_incomplete(&self) -> bool {
        self.phase == CalibrationPhase::Ready && self.quality != CalibrationQuality::Full
    }
}

/// What the calibrator consumes from one face-present tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub distance: f32,
    pub ear: f32,
    /// EAR is inside a closure run (not an open-eye sample)
    pub eye_closed: bool,
    /// A blink completed this tick
    pub blinked: bool,
}
