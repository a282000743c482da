pub mod bulk;
pub mod extract;
pub mod health;
pub mod search;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::routes())
        .merge(extract::routes())
        .merge(bulk::routes())
        .merge(search::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
