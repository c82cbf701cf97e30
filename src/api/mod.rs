use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

use crate::{services::metadata::MetadataError, AppState};

mod content;
mod metadata;
mod movies;
mod series;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/movies", movies::routes())
        .nest("/series", series::routes())
        .nest("/content", content::routes()) // Title overrides for movies and episodes
        .nest("/metadata", metadata::routes()) // CSV export / import
}

/// Error returned by API handlers, rendered as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(&'static str),
}

impl ApiError {
    /// Map a service error: validation failures become 400, anything else is
    /// logged and reported as `message` with a 500.
    fn from_metadata(message: &'static str) -> impl FnOnce(MetadataError) -> ApiError {
        move |err| match err {
            MetadataError::Validation(reason) => ApiError::BadRequest(reason.to_string()),
            MetadataError::Store(e) => {
                tracing::error!("{}: {}", message, e);
                ApiError::Internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Decode an optional JSON body. An empty body decodes to `T::default()`.
fn parse_json_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::{build_router, config::AppConfig, AppState};

    /// Temporary library with its own directory layout and metadata file
    pub struct TestLibrary {
        pub dir: TempDir,
        pub state: Arc<AppState>,
    }

    impl TestLibrary {
        pub async fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = AppConfig::rooted_at(dir.path());
            config.paths.ensure_dirs().await.unwrap();

            let state = Arc::new(AppState::new(config));
            state.store.ensure_initialized().await.unwrap();

            Self { dir, state }
        }

        pub fn router(&self) -> Router {
            build_router(self.state.clone())
        }

        pub fn add_movie(&self, filename: &str) {
            touch(&self.state.config.paths.movies_dir().join(filename));
        }

        /// `relative` is relative to the series root, e.g. "Show/Season 1/e1.mkv"
        pub fn add_series_file(&self, relative: &str) {
            touch(&self.state.config.paths.series_dir().join(relative));
        }

        pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
            let response = self.router().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (status, String::from_utf8(bytes.to_vec()).unwrap())
        }

        pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
            let (status, body) = self
                .send(Request::get(uri).body(Body::empty()).unwrap())
                .await;
            (status, serde_json::from_str(&body).unwrap())
        }

        pub async fn put_json(&self, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
            let request = Request::put(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let (status, body) = self.send(request).await;
            (status, serde_json::from_str(&body).unwrap())
        }
    }

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "fake video content").unwrap();
    }
}
