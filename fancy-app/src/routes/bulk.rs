use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use fancy_web::read_bulk_items;
use fancy_web::search::content_disposition;

use crate::error::ApiError;
use crate::state::AppState;

const UPLOAD_FIELD: &str = "csv_file";

pub fn routes() -> Router<AppState> {
    Router::new().route("/bulk_extract_text", post(bulk_extract_text))
}

async fn bulk_extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().is_none_or(|name| name.trim().is_empty()) {
            return Err(ApiError::BadRequest("No selected file".into()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some(bytes);
        break;
    }
    let Some(bytes) = upload else {
        return Err(ApiError::BadRequest("No file part".into()));
    };

    let items = read_bulk_items(&bytes)?;
    tracing::info!(target: "app", rows = items.len(), "bulk.upload.accepted");
    let zip = state.bulk.export_zip(&items).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&state.archive_name))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/zip")),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, zip).into_response())
}
