// Movies API - listing of the movies folder

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    models::Movie,
    scanner::{self, ScanContext, SearchFilter},
    AppState,
};

use super::ApiError;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_movies))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoviesResponse {
    pub movies: Vec<Movie>,
    pub total: usize,
}

/// GET /api/movies?search=<q>
async fn get_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<MoviesResponse>, ApiError> {
    let metadata = state.store.lookup().await.map_err(|e| {
        tracing::error!("Error reading movies: {}", e);
        ApiError::Internal("Failed to read movies")
    })?;

    let search = SearchFilter::new(query.search.as_deref());
    let ctx = ScanContext {
        metadata: &metadata,
        extensions: &state.config.scanner.video_extensions,
        search: &search,
    };

    let movies = scanner::list_movies(&state.config.paths.movies_dir(), ctx).await;

    Ok(Json(MoviesResponse {
        total: movies.len(),
        movies,
    }))
}
