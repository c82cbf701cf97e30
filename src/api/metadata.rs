// Metadata API - CSV export and import of the metadata store

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{services::metadata, AppState};

use super::ApiError;

const EXPORT_FILENAME: &str = "video_metadata.csv";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/export", get(export_metadata))
        .route("/import", post(import_metadata))
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub imported: usize,
}

/// GET /api/metadata/export - download the store as CSV
async fn export_metadata(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.read_all().await.map_err(|e| {
        tracing::error!("Error exporting metadata: {}", e);
        ApiError::Internal("Failed to export metadata")
    })?;

    let disposition = format!("attachment; filename={}", EXPORT_FILENAME);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        metadata::export_csv(&records),
    ))
}

/// POST /api/metadata/import - replace the store with the CSV body
async fn import_metadata(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let imported = metadata::import_csv(&state.store, &body)
        .await
        .map_err(ApiError::from_metadata("Failed to import metadata"))?;

    Ok(Json(ImportResponse {
        success: true,
        imported,
    }))
}
