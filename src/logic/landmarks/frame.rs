//! Landmark Frame - one detector output per tick

use serde::{Deserialize, Serialize};
use std::ops::Sub;

use super::layout::LANDMARK_COUNT;
use super::CameraConfig;
use crate::logic::error::EngineError;

/// Detector point. `x`/`y` normalized to the frame, `z` in the same scale as `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn cross(&self, other: &Point3) -> Point3 {
        Point3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Planar (image) distance
    pub fn distance_2d(&self, other: &Point3) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        (*self - *other).norm()
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// One tick of detector output. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic clock, seconds
    pub timestamp: f64,
    /// Ordered points, face-mesh index semantics
    #[serde(default)]
    pub points: Vec<Point3>,
    pub face_present: bool,
}

impl LandmarkFrame {
    pub fn new(timestamp: f64, points: Vec<Point3>) -> Self {
        Self {
            timestamp,
            points,
            face_present: true,
        }
    }

    /// Explicit "no face" frame
    pub fn no_face(timestamp: f64) -> Self {
        Self {
            timestamp,
            points: Vec::new(),
            face_present: false,
        }
    }

    /// Shape checks. Geometry checks happen in the estimators' `measure`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.timestamp.is_finite() {
            return Err(EngineError::invalid("timestamp is not finite"));
        }

        if !self.face_present {
            return Ok(());
        }

        if self.points.len() < LANDMARK_COUNT {
            return Err(EngineError::invalid(format!(
                "expected at least {} landmarks, got {}",
                LANDMARK_COUNT,
                self.points.len()
            )));
        }

        if let Some(index) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(EngineError::invalid(format!(
                "landmark {} has non-finite coordinates",
                index
            )));
        }

        Ok(())
    }

    /// Point scaled to pixel space (`z` uses the frame width, like `x`)
    pub fn pixel(&self, index: usize, camera: &CameraConfig) -> Option<Point3> {
        self.points.get(index).map(|p| {
            Point3::new(
                p.x * camera.frame_width_px,
                p.y * camera.frame_height_px,
                p.z * camera.frame_width_px,
            )
        })
    }
}
