//! Health Monitor Core - Signal Fusion & Decision Engine
//!
//! Consumes facial landmark frames, estimates eye strain and posture risk,
//! tracks the break schedule and decides when (and how loudly) to alert.
//! Camera capture, the landmark model, GUI and notification delivery live
//! outside this crate.

pub mod constants;
pub mod logic;

pub use logic::config::MonitorConfig;
pub use logic::engine::{HealthMonitorEngine, Snapshot, TickOutcome};
pub use logic::error::EngineError;
pub use logic::landmarks::{LandmarkFrame, Point3};
