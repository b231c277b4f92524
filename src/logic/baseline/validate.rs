use crate::logic::landmarks::layout::validate_layout;
use super::types::Baseline;

#[derive(Debug)]
pub enum BaselineError {
    IoError(std::io::Error),
    SerializationError(serde_json::Error),
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },
    Invalid(String),
}

impl std::fmt::Display for BaselineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineError::IoError(e) => write!(f, "IO Error: {}", e),
            BaselineError::SerializationError(e) => write!(f, "Serialization Error: {}", e),
            BaselineError::LayoutMismatch { expected_version, expected_hash, actual_version, actual_hash } => {
                write!(f, "Baseline Layout Mismatch: Expected v{} ({:x}), Got v{} ({:x})",
                    expected_version, expected_hash, actual_version, actual_hash)
            },
            BaselineError::Invalid(msg) => write!(f, "Invalid Baseline: {}", msg),
        }
    }
}

impl std::error::Error for BaselineError {}

impl From<std::io::Error> for BaselineError {
    fn from(err: std::io::Error) -> Self {
        BaselineError::IoError(err)
    }
}

impl From<serde_json::Error> for BaselineError {
    fn from(err: serde_json::Error) -> Self {
        BaselineError::SerializationError(err)
    }
}

/// Validate baseline compatibility with current engine
pub fn validate_baseline(baseline: &Baseline) -> Result<(), BaselineError> {
    if let Err(e) = validate_layout(baseline.layout_version, baseline.layout_hash) {
        return Err(BaselineError::LayoutMismatch {
            expected_version: e.expected_version,
            expected_hash: e.expected_hash,
            actual_version: e.actual_version,
            actual_hash: e.actual_hash,
        });
    }

    let values = [
        ("neutral_pitch", baseline.neutral_pitch),
        ("neutral_yaw", baseline.neutral_yaw),
        ("neutral_roll", baseline.neutral_roll),
        ("neutral_distance", baseline.neutral_distance),
        ("resting_blink_rate", baseline.resting_blink_rate),
        ("eye_openness_ref", baseline.eye_openness_ref),
    ];
    if let Some((name, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(BaselineError::Invalid(format!("{} is not finite", name)));
    }

    if baseline.neutral_distance <= 0.0 {
        return Err(BaselineError::Invalid("neutral_distance must be positive".into()));
    }
    if baseline.eye_openness_ref <= 0.0 {
        return Err(BaselineError::Invalid("eye_openness_ref must be positive".into()));
    }
    if baseline.resting_blink_rate < 0.0 {
        return Err(BaselineError::Invalid("resting_blink_rate must not be negative".into()));
    }

    Ok(())
}
