use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        submissions::SubmissionError,
    },
    domain::{
        catalog::CatalogFilter,
        fields::FieldValue,
        leads::LeadSubmission,
        products::Product,
        reviews::ReviewSubmission,
        validation::ValidationErrors,
    },
    infra::http::RouterState,
    presentation::views::{
        self, CatalogTemplate, CatalogView, HomeView, IndexTemplate, LayoutChrome, LayoutContext,
        LeadFormView, Notice, ProductDetailView, ProductTemplate, ReviewFormView,
    },
};

const SOURCE: &str = "infra::http::public";
const STORE_FAILURE_MESSAGE: &str = "We could not save your submission right now. Please try again.";

pub(super) fn build_public_router() -> Router<RouterState> {
    Router::new()
        .route("/", get(index))
        .route("/products", get(catalog))
        .route("/products/{slug}", get(product_detail))
        .route("/products/{slug}/reviews", post(submit_review))
        .route("/products/{slug}/leads", post(submit_lead))
        .route("/_health", get(health))
        .fallback(not_found)
}

async fn index(State(state): State<RouterState>) -> Response {
    let products = state.catalog.list_products().await;
    let view = LayoutContext::new(LayoutChrome::site(""), HomeView::new(&products));
    views::render_template_response(IndexTemplate { view }, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
struct CatalogQuery {
    category: Option<String>,
    min_rating: Option<String>,
    q: Option<String>,
    role: Option<String>,
    fleet: Option<String>,
}

impl CatalogQuery {
    fn into_filter(self) -> CatalogFilter {
        // A malformed rating floor disables the facet rather than rejecting the page.
        let min_rating = self
            .min_rating
            .as_deref()
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        CatalogFilter::new(
            self.category.as_deref(),
            min_rating,
            self.q.as_deref(),
            self.role.as_deref(),
            self.fleet.as_deref(),
        )
    }
}

async fn catalog(State(state): State<RouterState>, Query(query): Query<CatalogQuery>) -> Response {
    let page = state.catalog.catalog(query.into_filter()).await;
    let content = CatalogView::new(&page.products, page.total_products, &page.filter);
    let view = LayoutContext::new(LayoutChrome::site("Browse tools"), content);
    views::render_template_response(CatalogTemplate { view }, StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
struct DetailQuery {
    notice: Option<String>,
}

async fn product_detail(
    State(state): State<RouterState>,
    Path(slug): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Response {
    let Some(product) = state.catalog.find_product(&slug).await else {
        return views::render_product_not_found(&slug);
    };

    let notice = query.notice.as_deref().and_then(Notice::parse);
    let detail = detail_view(&state, &product, notice).await;
    views::render_template_response(ProductTemplate::new(detail), StatusCode::OK)
}

#[derive(Debug, Default, Deserialize)]
struct ReviewForm {
    #[serde(default)]
    reviewer_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    fleet_size: String,
    #[serde(default)]
    rating: String,
    #[serde(default)]
    pros: String,
    #[serde(default)]
    cons: String,
    anonymous: Option<String>,
    would_recommend: Option<String>,
}

impl ReviewForm {
    fn to_submission(&self, product_id: &str) -> ReviewSubmission {
        // Unchecked boxes are absent from the body.
        ReviewSubmission {
            product_id: Some(product_id.to_string()),
            reviewer_name: Some(self.reviewer_name.clone()),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            fleet_size: Some(self.fleet_size.clone()),
            rating: Some(FieldValue::Text(self.rating.clone())),
            pros: Some(self.pros.clone()),
            cons: Some(self.cons.clone()),
            anonymous: Some(FieldValue::Bool(self.anonymous.is_some())),
            would_recommend: Some(FieldValue::Bool(self.would_recommend.is_some())),
        }
    }

    fn echo(&self, errors: Vec<String>) -> ReviewFormView {
        ReviewFormView {
            reviewer_name: self.reviewer_name.clone(),
            email: self.email.clone(),
            rating: self.rating.clone(),
            pros: self.pros.clone(),
            cons: self.cons.clone(),
            anonymous: self.anonymous.is_some(),
            would_recommend: self.would_recommend.is_some(),
            errors,
            ..ReviewFormView::with_selection(&self.role, &self.fleet_size)
        }
    }
}

async fn submit_review(
    State(state): State<RouterState>,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let Some(product) = state.catalog.find_product(&slug).await else {
        return views::render_product_not_found(&slug);
    };

    match state
        .submissions
        .create_review(form.to_submission(&product.id))
        .await
    {
        Ok(_) => redirect_with_notice(&product, Notice::ReviewSubmitted),
        Err(err) => {
            let (status, messages) = rejection(&err);
            let mut detail = detail_view(&state, &product, None).await;
            detail.review_form = form.echo(messages);
            views::render_rejected_submission(
                ProductTemplate::new(detail),
                status,
                ErrorReport::from_error(SOURCE, status, &err),
            )
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct LeadForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    message: String,
}

impl LeadForm {
    fn to_submission(&self, product_id: &str) -> LeadSubmission {
        LeadSubmission {
            product_id: Some(product_id.to_string()),
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            company: Some(self.company.clone()),
            role: Some(self.role.clone()),
            message: Some(self.message.clone()),
        }
    }

    fn echo(&self, errors: Vec<String>) -> LeadFormView {
        LeadFormView {
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            role: self.role.clone(),
            message: self.message.clone(),
            errors,
        }
    }
}

async fn submit_lead(
    State(state): State<RouterState>,
    Path(slug): Path<String>,
    Form(form): Form<LeadForm>,
) -> Response {
    let Some(product) = state.catalog.find_product(&slug).await else {
        return views::render_product_not_found(&slug);
    };

    match state
        .submissions
        .create_lead(form.to_submission(&product.id))
        .await
    {
        Ok(_) => redirect_with_notice(&product, Notice::LeadSubmitted),
        Err(err) => {
            let (status, messages) = rejection(&err);
            let mut detail = detail_view(&state, &product, None).await;
            detail.lead_form = form.echo(messages);
            views::render_rejected_submission(
                ProductTemplate::new(detail),
                status,
                ErrorReport::from_error(SOURCE, status, &err),
            )
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> HttpError {
    HttpError::new(
        "infra::http::public::not_found",
        StatusCode::NOT_FOUND,
        "Page not found",
        "no route matched",
    )
}

async fn detail_view(
    state: &RouterState,
    product: &Product,
    notice: Option<Notice>,
) -> ProductDetailView {
    let reviews = state.catalog.reviews_for_product(&product.id).await;
    ProductDetailView::new(product, &reviews, notice)
}

fn redirect_with_notice(product: &Product, notice: Notice) -> Response {
    Redirect::to(&format!("{}?notice={}", product.href(), notice.as_query())).into_response()
}

fn rejection(err: &SubmissionError) -> (StatusCode, Vec<String>) {
    match err {
        SubmissionError::Validation(errors) => (StatusCode::BAD_REQUEST, form_messages(errors)),
        SubmissionError::Store { .. } | SubmissionError::SchemaBinding { .. } => (
            StatusCode::BAD_GATEWAY,
            vec![STORE_FAILURE_MESSAGE.to_string()],
        ),
    }
}

fn form_messages(errors: &ValidationErrors) -> Vec<String> {
    errors
        .violations()
        .iter()
        .map(|violation| {
            let label = match violation.field {
                "productId" => "Product",
                "name" => "Name",
                "email" => "Email",
                "rating" => "Rating",
                other => other,
            };
            format!("{label} {}", violation.message)
        })
        .collect()
}
