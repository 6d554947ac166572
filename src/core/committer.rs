// Session commit - uploads the staged tree, then unconditionally cleans it up

use crate::core::staging::StagedSession;
use crate::core::store::{DatasetStore, StoreResult};
use std::sync::Arc;
use tracing::{info, warn};

/// Commits staged sessions to the remote dataset repository and removes the
/// local staging directory on every exit path. Staged videos can be large
/// and must never accumulate as orphaned local state.
pub struct SessionCommitter {
    store: Arc<dyn DatasetStore>,
    dataset_repo: String,
}

impl SessionCommitter {
    pub fn new(store: Arc<dyn DatasetStore>, dataset_repo: impl Into<String>) -> Self {
        Self {
            store,
            dataset_repo: dataset_repo.into(),
        }
    }

    /// Upload the staged tree to `data/<action>/<folder_name>` inside the
    /// configured repository, then remove the staging directory whether or
    /// not the upload succeeded. A cleanup failure is logged and never
    /// overrides the commit outcome.
    pub async fn commit(&self, staged: &StagedSession) -> StoreResult<()> {
        let result = self
            .store
            .upload_folder(staged.root(), &self.dataset_repo, &staged.remote_path())
            .await;

        self.cleanup(staged);

        if result.is_ok() {
            info!(
                repo = %self.dataset_repo,
                path = %staged.remote_path(),
                "session committed"
            );
        }
        result
    }

    /// Remove the local staging directory. Failure here is a secondary
    /// concern; it is surfaced in the log only.
    pub fn cleanup(&self, staged: &StagedSession) {
        if let Err(e) = staged.remove() {
            warn!(
                path = %staged.root().display(),
                error = %e,
                "failed to remove staging directory"
            );
        }
    }
}
