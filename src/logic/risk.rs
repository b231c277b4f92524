//! Risk Scorer - estimator scores → alert-ready risk
//!
//! Stateless. Scores are clamped and discounted by how much the baseline can
//! be trusted; an unknown estimator produces no risk rather than zero risk.

use serde::{Deserialize, Serialize};

use crate::logic::baseline::{Baseline, CalibrationQuality};
use crate::logic::eye::EyeState;
use crate::logic::posture::PostureState;
use crate::logic::stats::clamp_score;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub confidence_full: f32,
    pub confidence_incomplete: f32,
    pub confidence_defaults: f32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confidence_full: 1.0,
            confidence_incomplete: 0.7,
            confidence_defaults: 0.5,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), String> {
        let all = [self.confidence_full, self.confidence_incomplete, self.confidence_defaults];
        if all.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err("risk: confidences must be within [0, 1]".into());
        }
        Ok(())
    }

    pub fn confidence(&self, quality: CalibrationQuality) -> f32 {
        match quality {
            CalibrationQuality::Full => self.confidence_full,
            CalibrationQuality::Incomplete => self.confidence_incomplete,
            CalibrationQuality::Defaults => self.confidence_defaults,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub eye_risk: Option<f32>,
    pub posture_risk: Option<f32>,
    pub confidence: f32,
}

impl RiskAssessment {
    /// Overall wellness 0..100 (100 = no risk)
    pub fn wellness(&self) -> Option<f32> {
        let known: Vec<f32> = [self.eye_risk, self.posture_risk].into_iter().flatten().collect();
        if known.is_empty() {
            return None;
        }
        let mean = known.iter().sum::<f32>() / known.len() as f32;
        Some(clamp_score(100.0 - mean))
    }
}

pub fn score(eye: &EyeState, posture: &PostureState, baseline: &Baseline, config: &RiskConfig) -> RiskAssessment {
    let confidence = config.confidence(baseline.quality).clamp(0.0, 1.0);
    let discount = |s: f32| clamp_score(clamp_score(s) * confidence);

    RiskAssessment {
        eye_risk: eye.known.then(|| discount(eye.eye_strain_score)),
        posture_risk: posture.known.then(|| discount(posture.posture_score)),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(eye_score: f32, posture_score: f32) -> (EyeState, PostureState) {
        let eye = EyeState { eye_strain_score: eye_score, known: true, ..Default::default() };
        let posture = PostureState { posture_score, known: true, ..Default::default() };
        (eye, posture)
    }

    #[test]
    fn test_full_confidence_passes_through() {
        let (eye, posture) = states(70.0, 30.0);
        let mut baseline = Baseline::defaults();
        baseline.quality = CalibrationQuality::Full;

        let risk = score(&eye, &posture, &baseline, &RiskConfig::default());
        assert_eq!(risk.eye_risk, Some(70.0));
        assert_eq!(risk.posture_risk, Some(30.0));
        assert_eq!(risk.confidence, 1.0);
        assert_eq!(risk.wellness(), Some(50.0));
    }

    #[test]
    fn test_degraded_confidence_discounts() {
        let (eye, posture) = states(80.0, 40.0);
        let mut baseline = Baseline::defaults();
        baseline.quality = CalibrationQuality::Incomplete;

        let risk = score(&eye, &posture, &baseline, &RiskConfig::default());
        assert!((risk.eye_risk.unwrap() - 56.0).abs() < 1e-4);
        assert!((risk.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nan_and_overflow_clamped() {
        let (eye, posture) = states(f32::NAN, 250.0);
        let mut baseline = Baseline::defaults();
        baseline.quality = CalibrationQuality::Full;

        let risk = score(&eye, &posture, &baseline, &RiskConfig::default());
        assert_eq!(risk.eye_risk, Some(0.0));
        assert_eq!(risk.posture_risk, Some(100.0));
    }

    #[test]
    fn test_unknown_has_no_risk() {
        let eye = EyeState::default();
        let posture = PostureState::default();
        let risk = score(&eye, &posture, &Baseline::defaults(), &RiskConfig::default());
        assert_eq!(risk.eye_risk, None);
        assert_eq!(risk.posture_risk, None);
        assert_eq!(risk.wellness(), None);
    }
}
