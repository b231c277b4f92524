//! User-facing alert texts, chosen by (kind, severity)

use super::types::{AlertKind, Severity};
use super::AlertInputs;
use crate::logic::session::BreakKind;

pub fn title(kind: AlertKind, severity: Severity) -> &'static str {
    match (kind, severity) {
        (AlertKind::EyeStrain, Severity::Info) => "Eye Care Reminder",
        (AlertKind::EyeStrain, Severity::Warning) => "Eye Strain Detected",
        (AlertKind::EyeStrain, Severity::Critical) => "High Eye Strain Warning",
        (AlertKind::Posture, Severity::Info) => "Posture Tip",
        (AlertKind::Posture, Severity::Warning) => "Posture Check",
        (AlertKind::Posture, Severity::Critical) => "Posture Alert",
        (AlertKind::ScreenDistance, _) => "Screen Distance",
        (AlertKind::BreakDue, _) => "Break Reminder",
        (AlertKind::PresenceLost, _) => "Monitoring Paused",
    }
}

pub fn break_tier(severity: Severity) -> BreakKind {
    match severity {
        Severity::Info => BreakKind::Micro,
        Severity::Warning => BreakKind::Short,
        Severity::Critical => BreakKind::Long,
    }
}

pub fn message(kind: AlertKind, severity: Severity, inputs: &AlertInputs<'_>) -> String {
    match kind {
        AlertKind::EyeStrain => {
            let score = inputs.risk.and_then(|r| r.eye_risk).unwrap_or(0.0);
            match inputs.eye.blink_rate {
                Some(rate) => format!(
                    "Your eye strain score is {:.0}% ({:.0} blinks/min, last blink {:.0}s ago)",
                    score, rate, inputs.eye.time_since_last_blink
                ),
                None => format!("Your eye strain score is {:.0}%", score),
            }
        }
        AlertKind::Posture => {
            if inputs.posture.issues.is_empty() {
                let score = inputs.risk.and_then(|r| r.posture_risk).unwrap_or(0.0);
                format!("Your posture risk is {:.0}%", score)
            } else {
                inputs.posture.issues.join(". ")
            }
        }
        AlertKind::ScreenDistance => {
            if inputs.posture.too_close {
                format!("Too close to screen ({:.0}cm)", inputs.posture.distance)
            } else {
                format!("Too far from screen ({:.0}cm)", inputs.posture.distance)
            }
        }
        AlertKind::BreakDue => {
            let minutes = |secs: f64| secs / 60.0;
            match break_tier(severity) {
                BreakKind::Micro => {
                    "Time for the 20-20-20 rule: Look at something 20 feet away for 20 seconds.".to_string()
                }
                BreakKind::Short => format!(
                    "You've been working for {:.0} minutes. Take a short break.",
                    minutes(inputs.session.since_short_secs)
                ),
                BreakKind::Long => format!(
                    "You've been working for {:.0} minutes. Time for a longer break.",
                    minutes(inputs.session.since_long_secs)
                ),
            }
        }
        AlertKind::PresenceLost => {
            "No face detected for a while. Active time is paused until you return.".to_string()
        }
    }
}

pub fn recommendation(kind: AlertKind, severity: Severity) -> String {
    match (kind, severity) {
        (AlertKind::EyeStrain, Severity::Info) => {
            "Your eyes may be getting tired. Consider resting them soon.".to_string()
        }
        (AlertKind::EyeStrain, Severity::Warning) => {
            "Your blink rate is lower than normal. Try to blink more consciously and follow the 20-20-20 rule.".to_string()
        }
        (AlertKind::EyeStrain, Severity::Critical) => {
            "Your eyes are showing signs of strain. Take a short break and look away from the screen.".to_string()
        }
        (AlertKind::Posture, Severity::Info) => "Adjust your sitting position.".to_string(),
        (AlertKind::Posture, Severity::Warning) => {
            "Your head is leaning forward. Sit back and align your ears with your shoulders.".to_string()
        }
        (AlertKind::Posture, Severity::Critical) => {
            "You've had poor posture for a while. Take a moment to sit up straight and reset your position.".to_string()
        }
        (AlertKind::ScreenDistance, Severity::Info) => {
            "You're sitting far from the screen. Move a little closer or enlarge the text to avoid squinting.".to_string()
        }
        (AlertKind::ScreenDistance, _) => {
            "You're too close to the screen. Move back to at least 50cm for better eye and posture health.".to_string()
        }
        (AlertKind::BreakDue, severity) => {
            let tier = break_tier(severity);
            format!("Take a break of {}: {}", tier.duration_hint(), tier.exercises().join("; "))
        }
        (AlertKind::PresenceLost, _) => {
            "Time away from the screen counts toward your break schedule.".to_string()
        }
    }
}
