// Remote dataset store - recursive folder upload to the Hugging Face Hub

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error reading staged tree: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected by remote store ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Staged tree {0} contains no files")]
    EmptyTree(PathBuf),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The single capability the ingestion core needs from remote storage:
/// recursively upload a local directory into a dataset repository under a
/// given path. The upload is fail-or-succeed from the caller's vantage
/// point; partial-tree recovery is the store's concern, and no retries are
/// attempted here.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn upload_folder(
        &self,
        local_dir: &Path,
        repo_id: &str,
        path_in_repo: &str,
    ) -> StoreResult<()>;
}

/// Uploads staged trees to a Hugging Face dataset repository through the
/// Hub commit endpoint, all files in a single commit.
pub struct HfDatasetStore {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HfDatasetStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// One NDJSON line per payload item, header line first, as the commit
    /// endpoint expects.
    fn commit_body(files: &[(String, Vec<u8>)], summary: &str) -> String {
        let mut lines = Vec::with_capacity(files.len() + 1);
        lines.push(
            json!({
                "key": "header",
                "value": { "summary": summary, "description": "" }
            })
            .to_string(),
        );
        for (repo_path, contents) in files {
            lines.push(
                json!({
                    "key": "file",
                    "value": {
                        "path": repo_path,
                        "content": BASE64.encode(contents),
                        "encoding": "base64"
                    }
                })
                .to_string(),
            );
        }
        lines.join("\n")
    }
}

#[async_trait]
impl DatasetStore for HfDatasetStore {
    async fn upload_folder(
        &self,
        local_dir: &Path,
        repo_id: &str,
        path_in_repo: &str,
    ) -> StoreResult<()> {
        let mut files = Vec::new();
        collect_files(local_dir, local_dir, &mut files)?;
        if files.is_empty() {
            return Err(StoreError::EmptyTree(local_dir.to_path_buf()));
        }

        let files: Vec<(String, Vec<u8>)> = files
            .into_iter()
            .map(|(relative, contents)| {
                (format!("{}/{}", path_in_repo, relative), contents)
            })
            .collect();

        info!(repo = repo_id, path = path_in_repo, files = files.len(), "uploading staged tree");

        let url = format!("{}/api/datasets/{}/commit/main", self.endpoint, repo_id);
        let body = Self::commit_body(&files, &format!("Add session {}", path_in_repo));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected { status, body });
        }

        Ok(())
    }
}

/// Walk `dir` depth-first, collecting each file's path relative to `base`
/// (forward-slash separated) together with its contents.
fn collect_files(
    base: &Path,
    dir: &Path,
    out: &mut Vec<(String, Vec<u8>)>,
) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            collect_files(base, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(base)
                .map_err(|_| std::io::Error::other("walked path escaped staging root"))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((relative, std::fs::read(&path)?));
        }
    }
    Ok(())
}
