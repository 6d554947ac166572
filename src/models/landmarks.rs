// Data models for per-frame hand landmark traces and their feature encoding

use serde::{Deserialize, Serialize};

// ==============================================================================
// Shape Constants
// ==============================================================================

/// MediaPipe hand model landmark count (per hand)
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Coordinates stored per landmark (x, y, z)
pub const COORDS_PER_LANDMARK: usize = 3;

/// Flattened feature length for one hand (21 points x 3 coordinates)
pub const HAND_FEATURE_LEN: usize = HAND_LANDMARK_COUNT * COORDS_PER_LANDMARK;

/// Flattened feature length for one frame (left hand block + right hand block)
pub const FEATURE_VECTOR_LEN: usize = HAND_FEATURE_LEN * 2;

/// Hard cap on persisted frames per session; frames past this index are dropped
pub const MAX_FRAMES_PER_SESSION: usize = 90;

// ==============================================================================
// Landmark Point
// ==============================================================================

/// A single 3D hand landmark as submitted by the capture client.
/// Coordinates the client omitted default to 0; values are passed through
/// without range validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// ==============================================================================
// Landmark Frame
// ==============================================================================

/// One frame of the client's hand-landmark trace. A side that is absent,
/// null, or an empty list all mean "no hand detected" and encode as zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub left: Option<Vec<LandmarkPoint>>,
    #[serde(default)]
    pub right: Option<Vec<LandmarkPoint>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandSide {
    Left,
    Right,
}

// ==============================================================================
// Feature Vector
// ==============================================================================

/// Fixed-length numeric encoding of one frame: 63 left-hand values followed
/// by 63 right-hand values, point-major (x, y, z per point, input order).
/// Length is always exactly [`FEATURE_VECTOR_LEN`]; absent hands are
/// zero-filled, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Wrap a flattened frame encoding. Callers are expected to hand in
    /// exactly [`FEATURE_VECTOR_LEN`] values; this is debug-asserted, not
    /// re-validated on every construction.
    pub fn new(values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), FEATURE_VECTOR_LEN);
        Self(values)
    }

    pub fn zeros() -> Self {
        Self(vec![0.0; FEATURE_VECTOR_LEN])
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The left-hand block (first 63 values).
    pub fn left_block(&self) -> &[f32] {
        &self.0[..HAND_FEATURE_LEN]
    }

    /// The right-hand block (last 63 values).
    pub fn right_block(&self) -> &[f32] {
        &self.0[HAND_FEATURE_LEN..]
    }
}
