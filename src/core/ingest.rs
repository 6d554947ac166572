// Ingestion orchestration - validates a request and sequences stage -> commit

use crate::core::committer::SessionCommitter;
use crate::core::config::{Config, ConfigError};
use crate::core::extractor::ExtractionError;
use crate::core::staging::{SessionStager, StagingError};
use crate::core::store::{DatasetStore, StoreError};
use crate::models::session::{IngestReceipt, Session};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// One parsed multipart submission as handed over by the HTTP boundary.
/// Field presence is validated here, not at the boundary.
#[derive(Debug, Default)]
pub struct IngestRequest {
    pub session_id: Option<String>,
    pub action: Option<String>,
    pub video_raw: Option<Vec<u8>>,
    pub video_overlay: Option<Vec<u8>>,
    pub landmarks: Option<Vec<u8>>,
    pub metadata: Option<Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Missing files: {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Extraction(ExtractionError),

    #[error("Staging failed: {0}")]
    Staging(StagingError),

    #[error("Upload failed: {0}")]
    Upload(#[from] StoreError),
}

impl From<StagingError> for IngestError {
    fn from(e: StagingError) -> Self {
        // Surface malformed landmark structure as its own failure kind
        match e {
            StagingError::Extraction(e) => IngestError::Extraction(e),
            other => IngestError::Staging(other),
        }
    }
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Runs one ingestion end to end. Every failure mode maps to an
/// [`IngestError`] variant; nothing escapes this boundary, and any staging
/// directory created along the way is removed on every exit path.
pub struct IngestionOrchestrator {
    config: Config,
    stager: SessionStager,
    store: Arc<dyn DatasetStore>,
}

impl IngestionOrchestrator {
    pub fn new(config: Config, store: Arc<dyn DatasetStore>) -> Self {
        let stager = SessionStager::new(config.staging_root.clone());
        Self {
            config,
            stager,
            store,
        }
    }

    /// Validate, stage, commit. Order matters: the storage configuration is
    /// checked before any filesystem write, and required fields before any
    /// staging, so a rejected request leaves nothing behind.
    pub async fn ingest(&self, request: IngestRequest) -> IngestResult<IngestReceipt> {
        let storage = self.config.storage()?;

        let session_id = request
            .session_id
            .ok_or(IngestError::MissingField("session_id"))?;
        let action = request.action.ok_or(IngestError::MissingField("action"))?;
        let video_raw = request
            .video_raw
            .ok_or(IngestError::MissingField("video_raw"))?;
        let video_overlay = request
            .video_overlay
            .ok_or(IngestError::MissingField("video_overlay"))?;
        let landmarks = request
            .landmarks
            .ok_or(IngestError::MissingField("landmarks"))?;

        let session = Session::new(session_id, action);
        let staged = self
            .stager
            .stage(
                &session,
                &video_raw,
                &video_overlay,
                &landmarks,
                request.metadata.as_deref(),
            )
            .await?;

        let committer = SessionCommitter::new(self.store.clone(), storage.dataset_repo);
        if let Err(e) = committer.commit(&staged).await {
            error!(folder = %staged.folder_name(), error = %e, "upload failed");
            return Err(e.into());
        }

        info!(
            action = %staged.action(),
            folder = %staged.folder_name(),
            frames = staged.frame_count(),
            "session ingested"
        );

        Ok(IngestReceipt {
            action: staged.action().to_string(),
            folder_name: staged.folder_name().to_string(),
            remote_path: staged.remote_path(),
            frame_count: staged.frame_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::StoreResult;
    use crate::models::landmarks::{LandmarkFrame, LandmarkPoint, HAND_LANDMARK_COUNT};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Mirrors uploaded trees into a local directory so tests can observe
    /// what the remote store would contain.
    struct MirrorStore {
        root: PathBuf,
        uploads: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MirrorStore {
        fn new(root: PathBuf, fail: bool) -> Self {
            Self {
                root,
                uploads: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl DatasetStore for MirrorStore {
        async fn upload_folder(
            &self,
            local_dir: &Path,
            _repo_id: &str,
            path_in_repo: &str,
        ) -> StoreResult<()> {
            if self.fail {
                return Err(StoreError::EmptyTree(local_dir.to_path_buf()));
            }
            let target = self.root.join(path_in_repo);
            copy_tree(local_dir, &target)?;
            self.uploads.lock().unwrap().push(path_in_repo.to_string());
            Ok(())
        }
    }

    fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            let target = to.join(entry.file_name());
            if entry.path().is_dir() {
                copy_tree(&entry.path(), &target)?;
            } else {
                std::fs::copy(entry.path(), &target)?;
            }
        }
        Ok(())
    }

    fn test_dirs() -> (PathBuf, PathBuf) {
        let base = std::env::temp_dir().join(format!("gesture_ingest_orch_{}", Uuid::new_v4()));
        (base.join("staging"), base.join("remote"))
    }

    fn configured(staging_root: PathBuf) -> Config {
        Config {
            staging_root,
            storage_token: Some("hf_test".to_string()),
            dataset_repo: Some("user/gestures".to_string()),
            ..Config::default()
        }
    }

    fn frames_json(count: usize) -> Vec<u8> {
        let frame = LandmarkFrame {
            left: Some(vec![LandmarkPoint::new(0.1, 0.2, 0.3); HAND_LANDMARK_COUNT]),
            right: None,
        };
        serde_json::to_vec(&vec![frame; count]).unwrap()
    }

    fn valid_request() -> IngestRequest {
        IngestRequest {
            session_id: Some("abcdefghijkl".to_string()),
            action: Some("wave".to_string()),
            video_raw: Some(b"raw".to_vec()),
            video_overlay: Some(b"overlay".to_vec()),
            landmarks: Some(frames_json(3)),
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_missing_configuration_rejects_before_any_write() {
        let (staging, remote) = test_dirs();
        let config = Config {
            staging_root: staging.clone(),
            ..Config::default()
        };
        let store = Arc::new(MirrorStore::new(remote, false));
        let orchestrator = IngestionOrchestrator::new(config, store);

        let result = orchestrator.ingest(valid_request()).await;

        assert!(matches!(result, Err(IngestError::Configuration(_))));
        assert!(!staging.exists(), "no filesystem writes on config error");
    }

    #[tokio::test]
    async fn test_missing_overlay_is_a_missing_files_error() {
        let (staging, remote) = test_dirs();
        let store = Arc::new(MirrorStore::new(remote.clone(), false));
        let orchestrator = IngestionOrchestrator::new(configured(staging.clone()), store.clone());

        let request = IngestRequest {
            video_overlay: None,
            ..valid_request()
        };
        let result = orchestrator.ingest(request).await;

        assert!(matches!(
            result,
            Err(IngestError::MissingField("video_overlay"))
        ));
        assert!(!staging.exists(), "rejected request must not stage anything");
        assert!(store.uploads.lock().unwrap().is_empty());

        let _ = std::fs::remove_dir_all(staging.parent().unwrap());
    }

    #[tokio::test]
    async fn test_successful_ingest_commits_and_cleans_up() {
        let (staging, remote) = test_dirs();
        let store = Arc::new(MirrorStore::new(remote.clone(), false));
        let orchestrator = IngestionOrchestrator::new(configured(staging.clone()), store.clone());

        let receipt = orchestrator
            .ingest(valid_request())
            .await
            .expect("ingest should succeed");

        assert_eq!(receipt.action, "wave");
        assert_eq!(receipt.frame_count, 3);
        assert!(receipt.remote_path.starts_with("data/wave/"));
        assert!(receipt.remote_path.ends_with("_abcdefgh"));

        // Local staging gone, remote tree present
        assert!(
            !staging.join("wave").join(&receipt.folder_name).exists(),
            "staging directory must be cleaned up after commit"
        );
        let committed = remote.join(&receipt.remote_path);
        assert!(committed.join("video_raw.webm").exists());
        assert!(committed.join("video_overlay.webm").exists());
        assert!(committed.join("landmarks").join("0.json").exists());
        assert!(committed.join("landmarks").join("2.json").exists());

        let _ = std::fs::remove_dir_all(staging.parent().unwrap());
    }

    #[tokio::test]
    async fn test_failed_upload_surfaces_and_cleans_up() {
        let (staging, remote) = test_dirs();
        let store = Arc::new(MirrorStore::new(remote, true));
        let orchestrator = IngestionOrchestrator::new(configured(staging.clone()), store);

        let result = orchestrator.ingest(valid_request()).await;

        assert!(matches!(result, Err(IngestError::Upload(_))));
        let action_dir = staging.join("wave");
        let leftovers = action_dir
            .read_dir()
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0, "staging must be cleaned up on upload failure");

        let _ = std::fs::remove_dir_all(staging.parent().unwrap());
    }

    #[tokio::test]
    async fn test_ragged_frame_maps_to_extraction_error() {
        let (staging, remote) = test_dirs();
        let store = Arc::new(MirrorStore::new(remote, false));
        let orchestrator = IngestionOrchestrator::new(configured(staging.clone()), store);

        let bad_frame = LandmarkFrame {
            left: Some(vec![LandmarkPoint::new(0.0, 0.0, 0.0); 5]),
            right: None,
        };
        let request = IngestRequest {
            landmarks: Some(serde_json::to_vec(&vec![bad_frame]).unwrap()),
            ..valid_request()
        };

        let result = orchestrator.ingest(request).await;
        assert!(matches!(result, Err(IngestError::Extraction(_))));

        let _ = std::fs::remove_dir_all(staging.parent().unwrap());
    }
}
