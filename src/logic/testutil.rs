//! Synthetic face-mesh frames for tests.
//!
//! Builds a rigid face in pixel space from a pose, a screen distance and an
//! eye openness, then normalizes it the way the detector would.

use crate::logic::landmarks::layout::{
    CHIN, FOREHEAD, LANDMARK_COUNT, LEFT_EYE, NOSE_TIP, RIGHT_EYE,
};
use crate::logic::landmarks::{CameraConfig, LandmarkFrame, Point3};

#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub distance_cm: f32,
    pub ear: f32,
}

impl Default for Face {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            distance_cm: 55.0,
            ear: 0.30,
        }
    }
}

impl Face {
    pub fn with_pose(mut self, pitch: f32, yaw: f32, roll: f32) -> Self {
        self.pitch = pitch;
        self.yaw = yaw;
        self.roll = roll;
        self
    }

    pub fn at(mut self, distance_cm: f32) -> Self {
        self.distance_cm = distance_cm;
        self
    }

    pub fn eyes(mut self, ear: f32) -> Self {
        self.ear = ear;
        self
    }

    pub fn frame(&self, timestamp: f64) -> LandmarkFrame {
        LandmarkFrame::new(timestamp, self.points(&CameraConfig::default()))
    }

    pub fn points(&self, camera: &CameraConfig) -> Vec<Point3> {
        let (p, y, r) = (
            self.pitch.to_radians(),
            self.yaw.to_radians(),
            self.roll.to_radians(),
        );

        // Face normal toward the camera, eye axis and forehead→chin axis
        let normal = Point3::new(-y.sin() * p.cos(), p.sin(), -y.cos() * p.cos());
        let level = Point3::new(y.cos(), 0.0, -y.sin());
        let down = level.cross(&normal);
        let across = add(scale(level, r.cos()), scale(down, r.sin()));
        let vertical = across.cross(&normal);

        let span = camera.eye_span_cm * camera.focal_length_px / self.distance_cm;
        let center = Point3::new(camera.frame_width_px / 2.0, camera.frame_height_px / 2.0, 0.0);
        let at = |u: f32, v: f32| add(center, add(scale(across, u * span), scale(vertical, v * span)));

        let mut px = vec![center; LANDMARK_COUNT];
        px[FOREHEAD] = at(0.0, -0.9);
        px[CHIN] = at(0.0, 1.1);
        px[NOSE_TIP] = add(at(0.0, 0.3), scale(normal, 0.3 * span));

        let eye_width = 0.3;
        let lid = self.ear * eye_width / 2.0;
        // [outer/inner corner, top, top, inner/outer corner, bottom, bottom]
        let contour = |c1: f32, c4: f32| {
            let q1 = c1 + (c4 - c1) / 3.0;
            let q2 = c1 + 2.0 * (c4 - c1) / 3.0;
            [
                at(c1, 0.0),
                at(q1, -lid),
                at(q2, -lid),
                at(c4, 0.0),
                at(q2, lid),
                at(q1, lid),
            ]
        };
        for (&index, point) in RIGHT_EYE.iter().zip(contour(-0.5, -0.5 + eye_width)) {
            px[index] = point;
        }
        for (&index, point) in LEFT_EYE.iter().zip(contour(0.5 - eye_width, 0.5)) {
            px[index] = point;
        }

        px.into_iter()
            .map(|q| {
                Point3::new(
                    q.x / camera.frame_width_px,
                    q.y / camera.frame_height_px,
                    q.z / camera.frame_width_px,
                )
            })
            .collect()
    }
}

fn add(a: Point3, b: Point3) -> Point3 {
    Point3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

fn scale(a: Point3, k: f32) -> Point3 {
    Point3::new(a.x * k, a.y * k, a.z * k)
}

/// A 10 Hz stream: `(timestamp, frame)` pairs with one blink (two closed
/// frames) every `blink_every_secs`.
pub fn stream(face: Face, from: f64, secs: f64, blink_every_secs: Option<f64>) -> Vec<LandmarkFrame> {
    let steps = (secs * 10.0).round() as usize;
    let closed = face.eyes(0.05);
    (1..=steps)
        .map(|i| {
            let t = from + i as f64 * 0.1;
            let blinking = blink_every_secs
                .map(|every| {
                    let k = (every * 10.0).round() as usize;
                    k > 0 && i % k < 2
                })
                .unwrap_or(false);
            if blinking { closed.frame(t) } else { face.frame(t) }
        })
        .collect()
}
