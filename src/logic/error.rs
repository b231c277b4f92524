//! Engine Error Taxonomy
//!
//! None of these escape `HealthMonitorEngine::tick`. A faulted tick is a
//! no-op that keeps the previous snapshot.

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Frame carries no face. Estimators freeze.
    NoFaceDetected,
    /// Warm-up ran out of face-present time; defaults are in use.
    CalibrationIncomplete { reason: String },
    /// Malformed landmark set (wrong length, non-finite values, degenerate geometry).
    InvalidLandmarkFrame { reason: String },
    /// Frame timestamp is not after the last accepted one.
    ClockNonMonotonic { previous: f64, received: f64 },
    /// Engine already stopped.
    Stopped,
}

impl EngineError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidLandmarkFrame { reason: reason.into() }
    }

    /// Faults cause the tick to be skipped; conditions only degrade output.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidLandmarkFrame { .. }
                | EngineError::ClockNonMonotonic { .. }
                | EngineError::Stopped
        )
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoFaceDetected => write!(f, "No face detected"),
            EngineError::CalibrationIncomplete { reason } => {
                write!(f, "Calibration incomplete: {}", reason)
            }
            EngineError::InvalidLandmarkFrame { reason } => {
                write!(f, "Invalid landmark frame: {}", reason)
            }
            EngineError::ClockNonMonotonic { previous, received } => write!(
                f,
                "Non-monotonic clock: frame at {:.3}s after {:.3}s",
                received, previous
            ),
            EngineError::Stopped => write!(f, "Engine stopped"),
        }
    }
}

impl std::error::Error for EngineError {}
