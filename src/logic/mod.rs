//! Logic Module - Engines & Estimators
//!
//! Pipeline per tick:
//! `LandmarkFrame → eye / posture → calibrator → risk → session → alert → Snapshot`
//!
//! - `landmarks/` - Frame type, landmark layout, estimator trait
//! - `eye/`, `posture/` - Per-frame estimators
//! - `baseline/` - Calibration + persisted baseline
//! - `alert/` - Cooldown/escalation state machine
//! - `engine/` - Orchestrator, sole owner of mutable state
//! - `history/` - Append-only JSONL log (downstream of the engine)
//! - `queue`, `events` - Frame hand-off in, alert delivery out

// Core modules
pub mod config;
pub mod error;
pub mod stats;
pub mod events;
pub mod queue;

// Engine components
pub mod landmarks;
pub mod eye;
pub mod posture;
pub mod baseline;
pub mod risk;
pub mod session;
pub mod alert;
pub mod engine;

// Persistence collaborators
pub mod history;

#[cfg(test)]
pub(crate) mod testutil;
