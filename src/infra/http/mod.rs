pub mod api;
mod middleware;
mod public;

pub use middleware::RequestContext;

use std::sync::Arc;

use axum::{Router, middleware as axum_middleware};

use crate::application::catalog::CatalogService;
use crate::application::submissions::SubmissionService;
use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub catalog: Arc<CatalogService>,
    pub submissions: Arc<SubmissionService>,
}

/// Full application router: HTML pages plus the JSON API, wrapped in the
/// request-id and response-logging middleware.
pub fn build_router(state: RouterState) -> Router {
    Router::new()
        .merge(public::build_public_router())
        .merge(api::build_api_router())
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
