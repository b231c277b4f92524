//! Landmark Layout - Centralized Landmark Index Definition
//!
//! **CRITICAL: This file controls which detector points the engine reads**
//!
//! ## Rules (NEVER break these):
//! 1. Add a key landmark → increment LAYOUT_VERSION
//! 2. Change an index → increment LAYOUT_VERSION
//! 3. Remove a key landmark → increment LAYOUT_VERSION
//!
//! Persisted baselines carry the version + hash; neutral angles measured on
//! a different set of points are not comparable and get rejected on load.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// LAYOUT VERSION
// ============================================================================

/// Current landmark layout version
/// MUST be incremented when the key landmark table changes
pub const LAYOUT_VERSION: u8 = 1;

/// Minimum number of points per frame (face-mesh topology)
pub const LANDMARK_COUNT: usize = 468;

// ============================================================================
// KEY LANDMARKS (Authoritative source)
// ============================================================================

/// Right eye contour in EAR order: outer corner, top ×2, inner corner, bottom ×2
pub const RIGHT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Left eye contour in EAR order: inner corner, top ×2, outer corner, bottom ×2
pub const LEFT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

pub const NOSE_TIP: usize = 1;
pub const FOREHEAD: usize = 10;
pub const CHIN: usize = 152;
pub const RIGHT_EYE_OUTER: usize = 33;
pub const LEFT_EYE_OUTER: usize = 263;

/// Named key landmarks in the order they are hashed
pub const KEY_LANDMARKS: &[(&str, usize)] = &[
    // === Right eye (EAR) ===
    ("right_eye_outer", 33),
    ("right_eye_top_1", 160),
    ("right_eye_top_2", 158),
    ("right_eye_inner", 133),
    ("right_eye_bottom_2", 153),
    ("right_eye_bottom_1", 144),

    // === Left eye (EAR) ===
    ("left_eye_inner", 362),
    ("left_eye_top_1", 385),
    ("left_eye_top_2", 387),
    ("left_eye_outer", 263),
    ("left_eye_bottom_2", 373),
    ("left_eye_bottom_1", 380),

    // === Rigid pose anchors ===
    ("nose_tip", 1),
    ("forehead", 10),
    ("chin", 152),
];

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over version, names and indices
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[LAYOUT_VERSION]);

    for (name, index) in KEY_LANDMARKS {
        hasher.update(name.as_bytes());
        hasher.update(&(*index as u32).to_le_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub landmark_count: usize,
    pub key_landmarks: Vec<(String, usize)>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: LAYOUT_VERSION,
            hash: layout_hash(),
            landmark_count: LANDMARK_COUNT,
            key_landmarks: KEY_LANDMARKS
                .iter()
                .map(|(name, index)| (name.to_string(), *index))
                .collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Landmark layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that persisted data was produced with the current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != LAYOUT_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: LAYOUT_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Landmark index by name
pub fn landmark_index(name: &str) -> Option<usize> {
    KEY_LANDMARKS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, index)| *index)
}

/// Highest index the engine reads
pub fn max_key_index() -> usize {
    KEY_LANDMARKS.iter().map(|(_, index)| *index).max().unwrap_or(0)
}

// ============================================================================
// TESTS
// ============================================================================
