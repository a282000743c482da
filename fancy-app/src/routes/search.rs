use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use fancy_web::SearchQuery;
use fancy_web::search::content_disposition;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/extract", get(export_search))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    keyword: Option<String>,
    number: Option<String>,
    #[serde(rename = "orderBy")]
    order_by: Option<String>,
}

async fn export_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let query = SearchQuery::parse(
        params.keyword.as_deref(),
        params.number.as_deref(),
        params.order_by.as_deref(),
        state.search.default_order,
        state.search.max_pages,
    )?;
    let export = state.search.export(&query).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&export.filename))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, export.csv).into_response())
}
