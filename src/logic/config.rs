//! Monitor Configuration
//!
//! Every tuning value of the pipeline. Loaded from JSON (missing fields take
//! their defaults); a missing file means defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::logic::alert::AlertConfig;
use crate::logic::baseline::CalibrationConfig;
use crate::logic::eye::EyeConfig;
use crate::logic::history::HistoryConfig;
use crate::logic::landmarks::CameraConfig;
use crate::logic::posture::PostureConfig;
use crate::logic::risk::RiskConfig;
use crate::logic::session::SessionConfig;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO Error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse Error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid Config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err)
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub camera: CameraConfig,
    pub calibration: CalibrationConfig,
    pub eye: EyeConfig,
    pub posture: PostureConfig,
    pub risk: RiskConfig,
    pub session: SessionConfig,
    pub alerts: AlertConfig,
    pub history: HistoryConfig,
    /// Alerts kept in each snapshot
    pub recent_alerts: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            calibration: CalibrationConfig::default(),
            eye: EyeConfig::default(),
            posture: PostureConfig::default(),
            risk: RiskConfig::default(),
            session: SessionConfig::default(),
            alerts: AlertConfig::default(),
            history: HistoryConfig::default(),
            recent_alerts: 10,
        }
    }
}

impl MonitorConfig {
    /// Lower alert thresholds, tighter posture gates
    pub fn sensitive() -> Self {
        Self {
            alerts: AlertConfig::sensitive(),
            posture: PostureConfig {
                pitch_threshold_deg: 12.0,
                yaw_threshold_deg: 15.0,
                min_bad_posture_secs: 5.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Higher alert thresholds, longer cooldowns
    pub fn relaxed() -> Self {
        Self {
            alerts: AlertConfig::relaxed(),
            posture: PostureConfig {
                pitch_threshold_deg: 20.0,
                yaw_threshold_deg: 25.0,
                min_bad_posture_secs: 20.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.calibration;
        if c.posture_window_secs <= 0.0 || c.blink_window_secs <= 0.0 || c.deadline_grace < 1.0 {
            return Err(ConfigError::Invalid(
                "calibration: windows must be positive and deadline_grace at least 1".into(),
            ));
        }
        let cam = &self.camera;
        if cam.frame_width_px <= 0.0 || cam.frame_height_px <= 0.0 || cam.focal_length_px <= 0.0 || cam.eye_span_cm <= 0.0 {
            return Err(ConfigError::Invalid("camera: dimensions must be positive".into()));
        }

        self.eye.validate().map_err(ConfigError::Invalid)?;
        self.posture.validate().map_err(ConfigError::Invalid)?;
        self.risk.validate().map_err(ConfigError::Invalid)?;
        self.session.validate().map_err(ConfigError::Invalid)?;
        self.alerts.validate().map_err(ConfigError::Invalid)?;
        self.history.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Load and validate. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let data = fs::read(path)?;
        let config: MonitorConfig = serde_json::from_slice(&data)?;
        config.validate()?;
        log::info!("Config loaded from {:?}", path);
        Ok(config)
    }

    /// `HEALTH_MONITOR_CONFIG` or the default data dir
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&crate::constants::get_config_path())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
