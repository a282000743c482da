use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use fancy_web::TextPayload;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/extract_text", post(extract_text))
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    /// Missing is treated like empty and rejected by validation.
    #[serde(default)]
    url: String,
}

async fn extract_text(
    State(state): State<AppState>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<TextPayload>, ApiError> {
    let Json(req) = payload?;
    let extracted = state.extractor.extract(&req.url).await?;
    Ok(Json(TextPayload::from(&extracted)))
}
