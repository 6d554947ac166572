// Session identity and the ingestion result types

use serde::{Deserialize, Serialize};

/// Characters of the client session id used in the folder name suffix
const SESSION_ID_PREFIX_LEN: usize = 8;

/// One capture event being ingested. Constructed at request-validation time
/// and alive only for the duration of one ingestion call; it persists only
/// as a directory name locally and a path in the remote dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque client-supplied id; only its first 8 characters are used
    pub session_id: String,
    /// Gesture label, used as the storage partition key
    pub action: String,
    /// Seconds since epoch, assigned server-side at ingestion time
    pub timestamp: i64,
}

impl Session {
    pub fn new(session_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            action: action.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    #[cfg(test)]
    pub fn with_timestamp(
        session_id: impl Into<String>,
        action: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            action: action.into(),
            timestamp,
        }
    }

    /// `<timestamp>_<session_id[:8]>`. A session id shorter than 8 characters
    /// is used in full. Two submissions in the same second with the same id
    /// prefix collide; that window is documented, not guarded.
    pub fn folder_name(&self) -> String {
        let prefix: String = self.session_id.chars().take(SESSION_ID_PREFIX_LEN).collect();
        format!("{}_{}", self.timestamp, prefix)
    }
}

/// Returned to the HTTP boundary after a successful ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub action: String,
    pub folder_name: String,
    pub remote_path: String,
    /// Number of frame vectors actually persisted (capped at 90)
    pub frame_count: usize,
}
