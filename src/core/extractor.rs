// Keypoint extraction - flattens one landmark frame into a fixed-size feature vector

use crate::models::landmarks::{
    FeatureVector, HandSide, LandmarkFrame, LandmarkPoint, FEATURE_VECTOR_LEN, HAND_FEATURE_LEN,
    HAND_LANDMARK_COUNT,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Frame {frame_index}: {side:?} hand has {count} landmarks, expected 21")]
    LandmarkCount {
        frame_index: usize,
        side: HandSide,
        count: usize,
    },
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Flatten one frame's hand landmarks into a 126-value feature vector:
/// left-hand block first, then right, point-major x/y/z in input order.
///
/// A missing or empty hand side encodes as 63 zeros. A hand that is present
/// with a landmark count other than 21 fails the frame rather than
/// producing a ragged vector. Coordinate values pass through unvalidated.
pub fn extract_keypoints(
    frame: &LandmarkFrame,
    frame_index: usize,
) -> ExtractionResult<FeatureVector> {
    let mut values = Vec::with_capacity(FEATURE_VECTOR_LEN);
    flatten_hand(frame.left.as_deref(), HandSide::Left, frame_index, &mut values)?;
    flatten_hand(frame.right.as_deref(), HandSide::Right, frame_index, &mut values)?;
    Ok(FeatureVector::new(values))
}

fn flatten_hand(
    hand: Option<&[LandmarkPoint]>,
    side: HandSide,
    frame_index: usize,
    out: &mut Vec<f32>,
) -> ExtractionResult<()> {
    match hand {
        // Absent, null, and empty are all "no hand detected"
        None | Some([]) => out.extend(std::iter::repeat(0.0).take(HAND_FEATURE_LEN)),
        Some(points) => {
            if points.len() != HAND_LANDMARK_COUNT {
                return Err(ExtractionError::LandmarkCount {
                    frame_index,
                    side,
                    count: points.len(),
                });
            }
            for point in points {
                out.extend_from_slice(&[point.x, point.y, point.z]);
            }
        }
    }
    Ok(())
}
