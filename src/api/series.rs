// Series API - listing of the series folder and series renames

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    models::SeriesEntry,
    scanner::{self, ScanContext, SearchFilter},
    services::metadata,
    AppState,
};

use super::{movies::SearchQuery, parse_json_body, ApiError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_series))
        .route("/:series_name/title", put(rename_series))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub series: BTreeMap<String, SeriesEntry>,
    pub total_series: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSeriesRequest {
    pub new_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSeriesResponse {
    pub success: bool,
    pub old_title: String,
    pub new_title: String,
}

/// GET /api/series?search=<q>
async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let metadata = state.store.lookup().await.map_err(|e| {
        tracing::error!("Error reading series: {}", e);
        ApiError::Internal("Failed to read series")
    })?;

    let search = SearchFilter::new(query.search.as_deref());
    let ctx = ScanContext {
        metadata: &metadata,
        extensions: &state.config.scanner.video_extensions,
        search: &search,
    };

    let series = scanner::list_series(&state.config.paths.series_dir(), ctx).await;

    Ok(Json(SeriesResponse {
        total_series: series.len(),
        series,
    }))
}

/// PUT /api/series/:series_name/title - rename a series in the stored metadata
async fn rename_series(
    State(state): State<Arc<AppState>>,
    Path(series_name): Path<String>,
    body: Bytes,
) -> Result<Json<RenameSeriesResponse>, ApiError> {
    let request: RenameSeriesRequest = parse_json_body(&body)?;

    metadata::rename_series(&state.store, &series_name, request.new_title.as_deref())
        .await
        .map_err(ApiError::from_metadata("Failed to update series title"))?;

    Ok(Json(RenameSeriesResponse {
        success: true,
        old_title: series_name,
        new_title: request.new_title.unwrap_or_default(),
    }))
}
