use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};

use super::error::ApiError;
use super::models::{
    CreatedResponse, OkResponse, ProductLookupResponse, ProductsQuery, ReviewsQuery,
};
use crate::application::catalog::ReviewQuery;
use crate::domain::leads::LeadSubmission;
use crate::domain::reviews::ReviewSubmission;
use crate::infra::http::RouterState;

pub async fn list_products(
    State(state): State<RouterState>,
    Query(query): Query<ProductsQuery>,
) -> Response {
    if query.debug_requested() {
        return Json(state.catalog.products_debug().await).into_response();
    }
    Json(state.catalog.list_products().await).into_response()
}

pub async fn get_product(
    State(state): State<RouterState>,
    Path(slug_or_id): Path<String>,
) -> Json<ProductLookupResponse> {
    Json(state.catalog.find_product(&slug_or_id).await.into())
}

pub async fn list_reviews(
    State(state): State<RouterState>,
    Query(query): Query<ReviewsQuery>,
) -> Response {
    let reviews = state
        .catalog
        .list_reviews(&ReviewQuery {
            approved_only: query.approved_only(),
            product_id: query.product_id(),
        })
        .await;
    Json(reviews).into_response()
}

pub async fn reviews_by_product(
    State(state): State<RouterState>,
    Path(product_id): Path<String>,
) -> Response {
    Json(state.catalog.reviews_for_product(&product_id).await).into_response()
}

pub async fn create_review(
    State(state): State<RouterState>,
    payload: Result<Json<ReviewSubmission>, JsonRejection>,
) -> Result<Json<CreatedResponse>, ApiError> {
    let Json(submission) = payload?;
    let created = state.submissions.create_review(submission).await?;
    Ok(Json(CreatedResponse {
        ok: true,
        id: created.id,
    }))
}

pub async fn create_lead(
    State(state): State<RouterState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(submission) = payload?;
    state.submissions.create_lead(submission).await?;
    Ok(Json(OkResponse { ok: true }))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("No such API route")
}
