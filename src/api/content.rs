// Content API - custom titles for individual movies and episodes

use axum::{
    body::Bytes,
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    services::metadata::{self, TitleUpdate},
    AppState,
};

use super::{parse_json_body, ApiError};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/:filename/title", put(update_title))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTitleResponse {
    pub success: bool,
    pub filename: String,
    pub custom_title: String,
}

/// PUT /api/content/:filename/title
/// Body: {customTitle, type?, series?, season?, episode?}
async fn update_title(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Json<UpdateTitleResponse>, ApiError> {
    let update: TitleUpdate = parse_json_body(&body)?;

    let record = metadata::update_title(&state.store, &filename, update)
        .await
        .map_err(ApiError::from_metadata("Failed to update title"))?;

    Ok(Json(UpdateTitleResponse {
        success: true,
        filename,
        custom_title: record.custom_title,
    }))
}
