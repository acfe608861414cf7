pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    Router,
    routing::{any, get, post},
};

use crate::infra::http::RouterState;

pub fn build_api_router() -> Router<RouterState> {
    Router::new()
        .route("/api/products", get(handlers::list_products))
        .route("/api/products/{slug_or_id}", get(handlers::get_product))
        .route(
            "/api/reviews",
            get(handlers::list_reviews).post(handlers::create_review),
        )
        .route(
            "/api/reviews/by-product/{id}",
            get(handlers::reviews_by_product),
        )
        .route("/api/leads", post(handlers::create_lead))
        .route("/api/{*rest}", any(handlers::not_found))
}
