//! HTTP layer - routing, middleware and handlers
//!
//! Every route is served twice: as is, and under a `/{format}` prefix
//! selecting the response format (`/json/contents`, `/xml/contents`).

pub mod contents;
pub mod flash;
pub mod middleware;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

use crate::views::ApiError;

pub use middleware::AppState;

/// Routes without state or middleware
fn routes() -> Router<AppState> {
    Router::new().merge(contents::router()).merge(flash::router())
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/{format}", routes())
        .fallback(|| async { ApiError::not_found("No such page") })
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(axum_middleware::from_fn(middleware::request_timing))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
