// Session staging - writes submitted artifacts into a deterministic local layout

use crate::core::extractor::{extract_keypoints, ExtractionError};
use crate::models::landmarks::{LandmarkFrame, MAX_FRAMES_PER_SESSION};
use crate::models::session::Session;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const VIDEO_RAW_FILENAME: &str = "video_raw.webm";
pub const VIDEO_OVERLAY_FILENAME: &str = "video_overlay.webm";
pub const METADATA_FILENAME: &str = "metadata.json";
pub const LANDMARKS_DIRNAME: &str = "landmarks";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Landmarks payload is not a JSON array of frames: {0}")]
    LandmarkParse(#[from] serde_json::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

pub type StagingResult<T> = Result<T, StagingError>;

/// A session's artifacts staged on local disk, owned by the current
/// ingestion call. Created by [`SessionStager`]; removed on every exit path
/// once the commit attempt has been made.
#[derive(Debug, Clone)]
pub struct StagedSession {
    root: PathBuf,
    action: String,
    folder_name: String,
    frame_count: usize,
}

impl StagedSession {
    /// Root of the staged directory tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    /// Number of frame vectors persisted (capped at 90).
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Path of this session inside the remote dataset repository.
    pub fn remote_path(&self) -> String {
        format!("data/{}/{}", self.action, self.folder_name)
    }

    /// Recursively remove the staged tree. Safe to call when the tree is
    /// already gone.
    pub fn remove(&self) -> std::io::Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Stages one session's artifacts under `<staging_root>/<action>/<folder_name>/`.
pub struct SessionStager {
    staging_root: PathBuf,
}

impl SessionStager {
    pub fn new(staging_root: PathBuf) -> Self {
        Self { staging_root }
    }

    /// Persist the two video blobs, optional metadata, and at most 90
    /// per-frame feature vectors. On any failure after the staging directory
    /// was created, the directory is removed before the error is returned.
    pub async fn stage(
        &self,
        session: &Session,
        video_raw: &[u8],
        video_overlay: &[u8],
        landmarks_payload: &[u8],
        metadata: Option<&[u8]>,
    ) -> StagingResult<StagedSession> {
        let folder_name = session.folder_name();
        let root = self.staging_root.join(&session.action).join(&folder_name);

        // Parent partitions for a new action may not exist yet
        std::fs::create_dir_all(&root)?;

        let staged = StagedSession {
            root: root.clone(),
            action: session.action.clone(),
            folder_name,
            frame_count: 0,
        };

        match Self::write_artifacts(&root, video_raw, video_overlay, landmarks_payload, metadata) {
            Ok(frame_count) => {
                debug!(
                    folder = %staged.folder_name,
                    frames = frame_count,
                    "staged session"
                );
                Ok(StagedSession {
                    frame_count,
                    ..staged
                })
            }
            Err(e) => {
                // Never leave a half-written session behind
                let _ = staged.remove();
                Err(e)
            }
        }
    }

    fn write_artifacts(
        root: &Path,
        video_raw: &[u8],
        video_overlay: &[u8],
        landmarks_payload: &[u8],
        metadata: Option<&[u8]>,
    ) -> StagingResult<usize> {
        std::fs::write(root.join(VIDEO_RAW_FILENAME), video_raw)?;
        std::fs::write(root.join(VIDEO_OVERLAY_FILENAME), video_overlay)?;

        if let Some(metadata) = metadata {
            std::fs::write(root.join(METADATA_FILENAME), metadata)?;
        }

        let frames: Vec<LandmarkFrame> = serde_json::from_slice(landmarks_payload)?;

        let landmarks_dir = root.join(LANDMARKS_DIRNAME);
        std::fs::create_dir_all(&landmarks_dir)?;

        let mut frame_count = 0;
        for (i, frame) in frames.iter().enumerate() {
            if i >= MAX_FRAMES_PER_SESSION {
                // Frames past the cap are discarded, not an error
                break;
            }
            let vector = extract_keypoints(frame, i)?;
            let contents = serde_json::to_vec(&vector).map_err(std::io::Error::other)?;
            std::fs::write(landmarks_dir.join(format!("{}.json", i)), contents)?;
            frame_count += 1;
        }

        Ok(frame_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::landmarks::{
        LandmarkPoint, FEATURE_VECTOR_LEN, HAND_LANDMARK_COUNT,
    };
    use uuid::Uuid;

    fn test_root() -> PathBuf {
        std::env::temp_dir().join(format!("gesture_ingest_staging_{}", Uuid::new_v4()))
    }

    fn frames_json(count: usize) -> Vec<u8> {
        let frame = LandmarkFrame {
            left: Some(
                (0..HAND_LANDMARK_COUNT)
                    .map(|i| LandmarkPoint::new(i as f32, 0.0, 0.0))
                    .collect(),
            ),
            right: None,
        };
        serde_json::to_vec(&vec![frame; count]).unwrap()
    }

    #[tokio::test]
    async fn test_stage_writes_expected_layout() {
        let root = test_root();
        let stager = SessionStager::new(root.clone());
        let session = Session::with_timestamp("abcdefghijkl", "wave", 1_700_000_000);

        let staged = stager
            .stage(&session, b"raw", b"overlay", &frames_json(3), Some(b"{}"))
            .await
            .expect("staging should succeed");

        assert_eq!(staged.root(), root.join("wave").join("1700000000_abcdefgh"));
        assert_eq!(staged.remote_path(), "data/wave/1700000000_abcdefgh");
        assert_eq!(staged.frame_count(), 3);
        assert_eq!(std::fs::read(staged.root().join(VIDEO_RAW_FILENAME)).unwrap(), b"raw");
        assert_eq!(
            std::fs::read(staged.root().join(VIDEO_OVERLAY_FILENAME)).unwrap(),
            b"overlay"
        );
        assert!(staged.root().join(METADATA_FILENAME).exists());

        let vector: Vec<f32> = serde_json::from_slice(
            &std::fs::read(staged.root().join(LANDMARKS_DIRNAME).join("0.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(vector.len(), FEATURE_VECTOR_LEN);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_metadata_is_optional() {
        let root = test_root();
        let stager = SessionStager::new(root.clone());
        let session = Session::with_timestamp("sess", "wave", 1_700_000_000);

        let staged = stager
            .stage(&session, b"raw", b"overlay", &frames_json(1), None)
            .await
            .expect("staging should succeed without metadata");

        assert!(!staged.root().join(METADATA_FILENAME).exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_frames_capped_at_ninety() {
        let root = test_root();
        let stager = SessionStager::new(root.clone());
        let session = Session::with_timestamp("sess", "wave", 1_700_000_000);

        let staged = stager
            .stage(&session, b"raw", b"overlay", &frames_json(150), None)
            .await
            .expect("staging should succeed");

        assert_eq!(staged.frame_count(), MAX_FRAMES_PER_SESSION);
        let landmarks_dir = staged.root().join(LANDMARKS_DIRNAME);
        assert!(landmarks_dir.join("0.json").exists());
        assert!(landmarks_dir.join("89.json").exists());
        assert!(!landmarks_dir.join("90.json").exists());
        assert_eq!(
            std::fs::read_dir(&landmarks_dir).unwrap().count(),
            MAX_FRAMES_PER_SESSION
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_unparseable_landmarks_removes_directory() {
        let root = test_root();
        let stager = SessionStager::new(root.clone());
        let session = Session::with_timestamp("sess", "wave", 1_700_000_000);

        let result = stager
            .stage(&session, b"raw", b"overlay", b"not json", None)
            .await;

        assert!(matches!(result, Err(StagingError::LandmarkParse(_))));
        assert!(!root.join("wave").join("1700000000_sess").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_ragged_frame_removes_directory() {
        let root = test_root();
        let stager = SessionStager::new(root.clone());
        let session = Session::with_timestamp("sess", "wave", 1_700_000_000);

        let frame = LandmarkFrame {
            left: Some(vec![LandmarkPoint::new(0.1, 0.2, 0.3); 5]),
            right: None,
        };
        let payload = serde_json::to_vec(&vec![frame]).unwrap();

        let result = stager.stage(&session, b"raw", b"overlay", &payload, None).await;

        assert!(matches!(result, Err(StagingError::Extraction(_))));
        assert!(!root.join("wave").join("1700000000_sess").exists());

        let _ = std::fs::remove_dir_all(&root);
    }
}
