// HTTP boundary - multipart upload endpoint over the ingestion core

use crate::core::ingest::{IngestError, IngestRequest, IngestionOrchestrator};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Staged submissions carry two video blobs; the axum default body limit
/// is far too small for them.
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<IngestionOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload_handler))
        .route("/healthz", get(healthz_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn healthz_handler() -> Response {
    Json(json!({"status": "ok"})).into_response()
}

async fn upload_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request_id = Uuid::new_v4();

    let request = match collect_request(multipart).await {
        Ok(request) => request,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Malformed multipart body: {}", e),
            );
        }
    };

    match state.orchestrator.ingest(request).await {
        Ok(receipt) => {
            info!(%request_id, path = %receipt.remote_path, "upload accepted");
            Json(json!({"status": "success"})).into_response()
        }
        Err(e) => {
            info!(%request_id, error = %e, "upload rejected");
            error_response(status_for(&e), &e.to_string())
        }
    }
}

/// Drain the multipart stream into the core's request shape. Presence of
/// required parts is the orchestrator's concern; unknown parts are ignored.
async fn collect_request(
    mut multipart: Multipart,
) -> Result<IngestRequest, axum::extract::multipart::MultipartError> {
    let mut request = IngestRequest::default();

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "session_id" => request.session_id = Some(field.text().await?),
            "action" => request.action = Some(field.text().await?),
            "video_raw" => request.video_raw = Some(field.bytes().await?.to_vec()),
            "video_overlay" => request.video_overlay = Some(field.bytes().await?.to_vec()),
            "landmarks" => request.landmarks = Some(field.bytes().await?.to_vec()),
            "metadata" => request.metadata = Some(field.bytes().await?.to_vec()),
            _ => {}
        }
    }

    Ok(request)
}

/// Missing required parts are the client's fault; everything else is a
/// server-side processing failure.
fn status_for(error: &IngestError) -> StatusCode {
    match error {
        IngestError::MissingField(_) => StatusCode::BAD_REQUEST,
        IngestError::Configuration(_)
        | IngestError::Extraction(_)
        | IngestError::Staging(_)
        | IngestError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}
