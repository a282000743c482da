use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fancy_web::{ArchiveError, DatasetError, ExtractError, SearchError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("failed to build archive: {0}")]
    Archive(#[from] ArchiveError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Dataset(_) => StatusCode::BAD_REQUEST,
            ApiError::Extract(ExtractError::ContainerNotFound) => StatusCode::NOT_FOUND,
            ApiError::Extract(_) => StatusCode::BAD_REQUEST,
            ApiError::Search(SearchError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Search(_) | ApiError::Archive(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(target: "app", error = %self, "api.error");
            "internal server error".to_string()
        } else {
            tracing::info!(target: "app", status = status.as_u16(), error = %self, "api.rejected");
            self.to_string()
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
