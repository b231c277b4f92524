//! Landmarks Module - Frame input contract
//!
//! - `layout.rs` - key landmark indices, layout version + hash
//! - `frame.rs` - `LandmarkFrame`, `Point3`
//!
//! Every per-frame estimator implements [`FrameEstimator`].

pub mod layout;
pub mod frame;

use serde::{Deserialize, Serialize};

use crate::logic::baseline::Baseline;
use crate::logic::error::EngineError;

pub use frame::{LandmarkFrame, Point3};
pub use layout::{LANDMARK_COUNT, LAYOUT_VERSION, layout_hash, validate_layout};

/// Camera / frame geometry used to go from normalized points to pixels and cm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub frame_width_px: f32,
    pub frame_height_px: f32,
    /// Pinhole focal length estimate
    pub focal_length_px: f32,
    /// Assumed physical distance between the outer eye corners
    pub eye_span_cm: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_width_px: 640.0,
            frame_height_px: 480.0,
            focal_length_px: 600.0,
            eye_span_cm: 6.3,
        }
    }
}

// ============================================================================
// ESTIMATOR TRAIT
// ============================================================================

/// Capability shared by the per-frame estimators.
///
/// `measure` is pure and may reject the frame; `update` cannot fail. The
/// engine measures with every estimator first and only then updates, so a
/// rejected frame never leaves one estimator advanced and another not.
pub trait FrameEstimator {
    /// Raw per-frame measurement
    type Sample;
    /// Published state after the update
    type State;

    /// Returns `NoFaceDetected` for no-face frames.
    fn measure(&self, frame: &LandmarkFrame) -> Result<Self::Sample, EngineError>;

    /// Advance to `timestamp`. `None` means no face: state freezes.
    fn update(&mut self, timestamp: f64, sample: Option<&Self::Sample>, baseline: &Baseline) -> Self::State;

    fn reset(&mut self);
}
