use crate::application::error::{ErrorReport, HttpError};
use crate::domain::catalog::{self, ALL, CatalogFilter};
use crate::domain::products::Product;
use crate::domain::reviews::{DEFAULT_FLEET_SIZE, DEFAULT_ROLE, Review};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use time::macros::format_description;
use url::{Url, form_urlencoded};

/// Askama failure tagged with the component that was rendering.
#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) origin: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(origin: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            origin,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        HttpError::from_error(
            err.origin,
            StatusCode::INTERNAL_SERVER_ERROR,
            err.public_message,
            &err.error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Neutral empty state for an unknown product. Served with 200 so links to
/// retired products do not look like site errors.
pub fn render_product_not_found(requested: &str) -> Response {
    let content = NotFoundView {
        requested: requested.to_string(),
    };
    let view = LayoutContext::new(LayoutChrome::site("Product not found"), content);
    render_template_response(ProductNotFoundTemplate { view }, StatusCode::OK)
}

/// Page re-rendered after a rejected form post, carrying the failure for the logs.
pub fn render_rejected_submission(
    template: ProductTemplate,
    status: StatusCode,
    report: ErrorReport,
) -> Response {
    let mut response = render_template_response(template, status);
    report.attach(&mut response);
    response
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub tagline: String,
    pub href: String,
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: Vec<NavigationLinkView>,
    pub footer: String,
    pub title: String,
}

impl LayoutChrome {
    pub fn site(page_title: &str) -> Self {
        let brand = "AvTools";
        Self {
            brand: BrandView {
                title: brand.to_string(),
                tagline: "Honest reviews of aviation software".to_string(),
                href: "/".to_string(),
            },
            navigation: vec![
                NavigationLinkView {
                    label: "Browse tools".to_string(),
                    href: "/products".to_string(),
                },
                NavigationLinkView {
                    label: "Write a review".to_string(),
                    href: "/products".to_string(),
                },
            ],
            footer: "Reviews are moderated before they appear.".to_string(),
            title: if page_title.is_empty() {
                brand.to_string()
            } else {
                format!("{page_title} | {brand}")
            },
        }
    }
}

pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: Vec<NavigationLinkView>,
    pub footer: String,
    pub title: String,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            title: chrome.title,
            content,
        }
    }
}

#[derive(Clone)]
pub struct ProductCardView {
    pub href: String,
    pub name: String,
    pub vendor: String,
    pub description: String,
    pub categories: Vec<String>,
    pub has_logo: bool,
    pub logo_url: String,
    pub stars: String,
    pub rating_label: String,
    pub review_count_label: String,
}

impl ProductCardView {
    pub fn from_product(product: &Product) -> Self {
        Self {
            href: product.href(),
            name: product.name.clone(),
            vendor: product.vendor.clone(),
            description: product.description.clone(),
            categories: product.categories.clone(),
            has_logo: product.logo_url.is_some(),
            logo_url: product.logo_url.clone().unwrap_or_default(),
            stars: stars(product.avg_rating),
            rating_label: format!("{:.1}", product.avg_rating),
            review_count_label: review_count_label(product.review_count),
        }
    }
}

#[derive(Clone)]
pub struct LinkView {
    pub label: String,
    pub href: String,
}

pub struct HomeView {
    pub featured: Vec<ProductCardView>,
    pub categories: Vec<LinkView>,
    pub vendors: Vec<String>,
}

impl HomeView {
    pub fn new(products: &[Product]) -> Self {
        let mut ranked: Vec<&Product> = products.iter().collect();
        ranked.sort_by(|a, b| b.avg_rating.total_cmp(&a.avg_rating));

        let mut vendors: Vec<String> = Vec::new();
        for product in products {
            if !product.vendor.is_empty() && !vendors.contains(&product.vendor) {
                vendors.push(product.vendor.clone());
            }
        }

        Self {
            featured: ranked
                .into_iter()
                .take(3)
                .map(ProductCardView::from_product)
                .collect(),
            categories: catalog::CATEGORIES
                .iter()
                .map(|category| LinkView {
                    label: (*category).to_string(),
                    href: catalog_href(&[("category", category)]),
                })
                .collect(),
            vendors,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub view: LayoutContext<HomeView>,
}

#[derive(Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub struct CatalogView {
    pub query: String,
    pub categories: Vec<OptionView>,
    pub rating_floors: Vec<OptionView>,
    pub roles: Vec<OptionView>,
    pub fleet_sizes: Vec<OptionView>,
    pub products: Vec<ProductCardView>,
    pub has_results: bool,
    pub summary: String,
    pub reviewer_facets_active: bool,
}

impl CatalogView {
    pub fn new(products: &[Product], total: usize, filter: &CatalogFilter) -> Self {
        let rating_floors = catalog::RATING_FLOORS
            .iter()
            .map(|floor| OptionView {
                value: floor.to_string(),
                label: if *floor == 0.0 {
                    "Any rating".to_string()
                } else {
                    format!("{floor}+ stars")
                },
                selected: *floor == filter.min_rating,
            })
            .collect();

        Self {
            query: filter.query.clone(),
            categories: facet_options(&catalog::CATEGORIES, filter.category.as_deref()),
            rating_floors,
            roles: facet_options(&catalog::ROLES, filter.role.as_deref()),
            fleet_sizes: facet_options(&catalog::FLEET_SIZES, filter.fleet.as_deref()),
            products: products.iter().map(ProductCardView::from_product).collect(),
            has_results: !products.is_empty(),
            summary: format!("Showing {} of {} tools", products.len(), total),
            reviewer_facets_active: filter.reviewer_facets_active(),
        }
    }
}

#[derive(Template)]
#[template(path = "catalog.html")]
pub struct CatalogTemplate {
    pub view: LayoutContext<CatalogView>,
}

#[derive(Clone)]
pub struct ReviewView {
    pub display_name: String,
    pub role: String,
    pub fleet_size: String,
    pub stars: String,
    pub pros: String,
    pub cons: String,
    pub has_pros: bool,
    pub has_cons: bool,
    pub would_recommend: bool,
    pub date_label: String,
}

impl ReviewView {
    pub fn from_review(review: &Review) -> Self {
        Self {
            display_name: review.display_name.clone(),
            role: review.role.clone(),
            fleet_size: review.fleet_size.clone(),
            stars: stars(f64::from(review.rating)),
            pros: review.pros.clone(),
            cons: review.cons.clone(),
            has_pros: !review.pros.is_empty(),
            has_cons: !review.cons.is_empty(),
            would_recommend: review.would_recommend,
            date_label: date_label(review),
        }
    }
}

/// Values echoed back into the review form after a rejected post.
#[derive(Clone, Default)]
pub struct ReviewFormView {
    pub reviewer_name: String,
    pub email: String,
    pub rating: String,
    pub pros: String,
    pub cons: String,
    pub anonymous: bool,
    pub would_recommend: bool,
    pub roles: Vec<OptionView>,
    pub fleet_sizes: Vec<OptionView>,
    pub errors: Vec<String>,
}

impl ReviewFormView {
    pub fn empty() -> Self {
        Self::with_selection(DEFAULT_ROLE, DEFAULT_FLEET_SIZE)
    }

    pub fn with_selection(role: &str, fleet_size: &str) -> Self {
        Self {
            roles: plain_options(&catalog::ROLES, role),
            fleet_sizes: plain_options(&catalog::FLEET_SIZES, fleet_size),
            would_recommend: true,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Clone, Default)]
pub struct LeadFormView {
    pub name: String,
    pub email: String,
    pub company: String,
    pub role: String,
    pub message: String,
    pub errors: Vec<String>,
}

impl LeadFormView {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct ProductDetailView {
    pub product_id: String,
    pub name: String,
    pub vendor: String,
    pub website: String,
    pub has_website: bool,
    pub description: String,
    pub categories: Vec<String>,
    pub features: Vec<String>,
    pub has_logo: bool,
    pub logo_url: String,
    pub screenshots: Vec<String>,
    pub stars: String,
    pub rating_label: String,
    pub review_count_label: String,
    pub recommend_label: String,
    pub reviews: Vec<ReviewView>,
    pub has_reviews: bool,
    pub has_notice: bool,
    pub notice: String,
    pub review_action: String,
    pub lead_action: String,
    pub review_form: ReviewFormView,
    pub lead_form: LeadFormView,
}

/// `raw` when it parses as an absolute http(s) URL. Other schemes, such as
/// `javascript:`, are never rendered as links.
fn web_link(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| raw.to_string())
}

impl ProductDetailView {
    pub fn new(product: &Product, reviews: &[Review], notice: Option<Notice>) -> Self {
        let href = product.href();
        let notice = notice.map(Notice::message).unwrap_or_default();
        let website = web_link(&product.website);
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            vendor: product.vendor.clone(),
            has_website: website.is_some(),
            website: website.unwrap_or_default(),
            description: product.description.clone(),
            categories: product.categories.clone(),
            features: product.features.clone(),
            has_logo: product.logo_url.is_some(),
            logo_url: product.logo_url.clone().unwrap_or_default(),
            screenshots: product.screenshots.clone(),
            stars: stars(product.avg_rating),
            rating_label: format!("{:.1}", product.avg_rating),
            review_count_label: review_count_label(product.review_count),
            recommend_label: format!("{:.0}% would recommend", product.recommend_pct),
            reviews: reviews.iter().map(ReviewView::from_review).collect(),
            has_reviews: !reviews.is_empty(),
            has_notice: !notice.is_empty(),
            notice: notice.to_string(),
            review_action: format!("{href}/reviews"),
            lead_action: format!("{href}/leads"),
            review_form: ReviewFormView::empty(),
            lead_form: LeadFormView::default(),
        }
    }
}

#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub view: LayoutContext<ProductDetailView>,
}

impl ProductTemplate {
    pub fn new(detail: ProductDetailView) -> Self {
        let chrome = LayoutChrome::site(&detail.name);
        Self {
            view: LayoutContext::new(chrome, detail),
        }
    }
}

pub struct NotFoundView {
    pub requested: String,
}

#[derive(Template)]
#[template(path = "product_not_found.html")]
pub struct ProductNotFoundTemplate {
    pub view: LayoutContext<NotFoundView>,
}

/// Flash message selected by the `notice` query parameter after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ReviewSubmitted,
    LeadSubmitted,
    Failed,
}

impl Notice {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "review" => Some(Notice::ReviewSubmitted),
            "lead" => Some(Notice::LeadSubmitted),
            "error" => Some(Notice::Failed),
            _ => None,
        }
    }

    pub fn as_query(self) -> &'static str {
        match self {
            Notice::ReviewSubmitted => "review",
            Notice::LeadSubmitted => "lead",
            Notice::Failed => "error",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Notice::ReviewSubmitted => {
                "Thanks! Your review was received and will appear once it has been approved."
            }
            Notice::LeadSubmitted => "Thanks! The vendor will be in touch shortly.",
            Notice::Failed => "Something went wrong. Please try again.",
        }
    }
}

/// Five-character star bar for a 0–5 rating, rounded to whole stars.
pub fn stars(rating: f64) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    let mut bar = "★".repeat(filled);
    bar.push_str(&"☆".repeat(5 - filled));
    bar
}

fn review_count_label(count: u32) -> String {
    match count {
        1 => "1 review".to_string(),
        n => format!("{n} reviews"),
    }
}

fn date_label(review: &Review) -> String {
    let format = format_description!("[month repr:short] [day padding:none], [year]");
    review
        .parsed_date()
        .and_then(|at| at.date().format(format).ok())
        .unwrap_or_else(|| review.date.clone())
}

fn facet_options(values: &[&str], active: Option<&str>) -> Vec<OptionView> {
    let mut options = vec![OptionView {
        value: ALL.to_string(),
        label: ALL.to_string(),
        selected: active.is_none(),
    }];
    options.extend(values.iter().map(|value| OptionView {
        value: (*value).to_string(),
        label: (*value).to_string(),
        selected: active == Some(*value),
    }));
    options
}

fn plain_options(values: &[&str], selected: &str) -> Vec<OptionView> {
    values
        .iter()
        .map(|value| OptionView {
            value: (*value).to_string(),
            label: (*value).to_string(),
            selected: *value == selected,
        })
        .collect()
}

fn catalog_href(params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("/products?{query}")
}
