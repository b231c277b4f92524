//! Head pose + screen distance from rigid face geometry
//!
//! `r` = right→left outer eye corner, `u` = forehead→chin. The face normal
//! `f = u × r` points at the camera for a frontal face.
//! - pitch = asin(f.y / |f|), positive = head down/forward
//! - yaw = atan2(-f.x, -f.z)
//! - roll = atan2(r.y, r.x)
//!
//! Distance uses a pinhole model on the eye-corner span.

use crate::logic::error::EngineError;
use crate::logic::landmarks::layout::{CHIN, FOREHEAD, LEFT_EYE_OUTER, RIGHT_EYE_OUTER};
use crate::logic::landmarks::{CameraConfig, LandmarkFrame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Degrees
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    /// Centimetres
    pub distance: f32,
}

const MIN_AXIS_PX: f32 = 1e-3;

pub fn estimate_pose(frame: &LandmarkFrame, camera: &CameraConfig) -> Result<PoseSample, EngineError> {
    let get = |index: usize| {
        frame
            .pixel(index, camera)
            .ok_or_else(|| EngineError::invalid(format!("missing pose landmark {}", index)))
    };

    let right = get(RIGHT_EYE_OUTER)?;
    let left = get(LEFT_EYE_OUTER)?;
    let forehead = get(FOREHEAD)?;
    let chin = get(CHIN)?;

    let r = left - right;
    let u = chin - forehead;
    let f = u.cross(&r);

    let span = r.norm();
    let normal = f.norm();
    if span < MIN_AXIS_PX || u.norm() < MIN_AXIS_PX || normal < MIN_AXIS_PX * MIN_AXIS_PX {
        return Err(EngineError::invalid("degenerate face geometry"));
    }

    let pitch = (f.y / normal).clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = (-f.x).atan2(-f.z).to_degrees();
    let roll = r.y.atan2(r.x).to_degrees();
    let distance = camera.eye_span_cm * camera.focal_length_px / span;

    if !(pitch.is_finite() && yaw.is_finite() && roll.is_finite() && distance.is_finite()) {
        return Err(EngineError::invalid("non-finite head pose"));
    }

    Ok(PoseSample { pitch, yaw, roll, distance })
}
