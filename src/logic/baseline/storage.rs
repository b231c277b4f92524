//! Baseline persistence
//!
//! One pretty-printed JSON file per user. Writes go through a sibling
//! `.tmp` file and a rename, so a crash mid-write leaves the previous
//! baseline readable.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::Baseline;
use super::validate::{validate_baseline, BaselineError};
use crate::constants;

/// Where the binary keeps the baseline (`HEALTH_MONITOR_DATA_DIR` aware)
pub fn default_baseline_path() -> PathBuf {
    constants::get_baseline_path()
}

/// Persist a baseline. Refuses anything `load_baseline` would reject.
pub fn save_baseline(baseline: &Baseline, path: &Path) -> Result<(), BaselineError> {
    validate_baseline(baseline)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(baseline)?)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }

    log::debug!("Baseline {} written to {:?}", baseline.id, path);
    Ok(())
}

/// Read and validate a baseline. A missing file is an `IoError` of kind
/// `NotFound`.
pub fn load_baseline(path: &Path) -> Result<Baseline, BaselineError> {
    let data = fs::read(path)?;
    let baseline: Baseline = serde_json::from_slice(&data)?;
    validate_baseline(&baseline)?;

    log::debug!("Baseline {} loaded from {:?} ({:?})", baseline.id, path, baseline.quality);
    Ok(baseline)
}

/// Like `load_baseline`, but a missing file is `Ok(None)`
pub fn load_baseline_if_present(path: &Path) -> Result<Option<Baseline>, BaselineError> {
    match load_baseline(path) {
        Ok(baseline) => Ok(Some(baseline)),
        Err(BaselineError::IoError(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
