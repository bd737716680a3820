//! Flash page, the target of failed actions

use axum::{extract::State, response::Response, routing::get, Router};
use once_cell::sync::Lazy;

use crate::api::middleware::AppState;
use crate::views::{Format, RequestMeta, ViewConfig, ViewError};

static FLASH_VIEW: Lazy<ViewConfig> =
    Lazy::new(|| ViewConfig::new("common", "flash-view").template(Format::Html, "flash_view.html"));

pub fn router() -> Router<AppState> {
    Router::new().route("/error", get(flash_view))
}

async fn flash_view(State(state): State<AppState>, meta: RequestMeta) -> Result<Response, ViewError> {
    let responder = state.responder(&FLASH_VIEW, meta)?;
    responder.render(responder.base_context()?)
}
