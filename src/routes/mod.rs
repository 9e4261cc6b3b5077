//! Router assembly: common and entity routes behind the shared middleware stack.

mod common;
mod entity;

pub use common::common_routes_with_ready;
pub use entity::entity_routes;

use crate::config::Settings;
use crate::state::AppState;
use axum::Router;
use std::time::Duration;
use tower::Layer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The full application. Trailing slashes are trimmed before routing so
/// `/movies/` and `/movies` reach the same handler.
pub fn app(state: AppState, settings: &Settings) -> NormalizePath<Router> {
    let router = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(entity_routes(state))
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(settings.request_timeout_secs)))
        .layer(TraceLayer::new_for_http());
    NormalizePathLayer::trim_trailing_slash().layer(router)
}
