//! Central Configuration Constants
//!
//! Single source of truth for app-level defaults and environment overrides.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Health Monitor";

/// Directory name under the platform data dir
pub const DATA_DIR_NAME: &str = "health-monitor";

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default baseline file name (bump suffix together with LAYOUT_VERSION)
pub const BASELINE_FILE_NAME: &str = "baseline_v1.json";

/// Default snapshot logging interval (seconds)
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 60;

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Base data directory (`HEALTH_MONITOR_DATA_DIR` or platform local data dir)
pub fn get_data_dir() -> PathBuf {
    std::env::var("HEALTH_MONITOR_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(DATA_DIR_NAME)
        })
}

/// Config file path from environment or default
pub fn get_config_path() -> PathBuf {
    std::env::var("HEALTH_MONITOR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join(CONFIG_FILE_NAME))
}

/// Baseline file path
pub fn get_baseline_path() -> PathBuf {
    get_data_dir().join(BASELINE_FILE_NAME)
}

/// History log directory
pub fn get_history_dir() -> PathBuf {
    get_data_dir().join("history")
}

/// Snapshot logging interval from environment or default
pub fn get_snapshot_interval() -> u64 {
    std::env::var("HEALTH_MONITOR_SNAPSHOT_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SNAPSHOT_INTERVAL)
}

/// Check if history logging is enabled
pub fn is_history_enabled() -> bool {
    std::env::var("HEALTH_MONITOR_HISTORY")
        .map(|s| s.to_lowercase() != "false" && s != "0")
        .unwrap_or(true)
}
