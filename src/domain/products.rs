//! Product and category projections of the store's Products/Categories tables.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::fields::{
    self, FieldValue, StoreRecord, coerce_number, coerce_percent, first_text, is_record_id,
};

/// Column names in the Products table.
pub mod columns {
    pub const SLUG: &str = "Slug (optional)";
    pub const NAME: &str = "Product Name";
    pub const VENDOR: &str = "Vendor Name";
    pub const WEBSITE: &str = "Website URL";
    pub const DESCRIPTION: &str = "Short Description";
    pub const CATEGORIES: &str = "Categories";
    pub const FEATURES: &str = "Features";
    pub const MEDIA: &str = "Media";
    pub const AVG_RATING: &str = "Star Rating Rollup (from Reviews)";
    pub const REVIEW_COUNT: &str = "Review Count";
    pub const RECOMMEND_PCT: &str = "Recommend %";
}

/// Columns that may hold a category's display label, in preference order.
pub const CATEGORY_LABEL_COLUMNS: [&str; 4] = ["Name", "Category", "Title", "Label"];

/// Ordered rewrites turning a product name into its URL slug. Applied
/// before lowercasing; the formula builder emits the same chain so the
/// store and this crate always agree on derived slugs.
pub const SLUG_SUBSTITUTIONS: [(&str, &str); 5] = [
    (" / ", "-"),
    (" & ", "-and-"),
    ("/", "-"),
    ("&", "and"),
    (" ", "-"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub vendor: String,
    pub website: String,
    pub description: String,
    pub categories: Vec<String>,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    pub screenshots: Vec<String>,
    pub avg_rating: f64,
    pub review_count: u32,
    pub recommend_pct: f64,
}

impl Product {
    /// Path segment used for this product's detail page.
    pub fn path_key(&self) -> &str {
        if self.slug.is_empty() {
            &self.id
        } else {
            &self.slug
        }
    }

    pub fn href(&self) -> String {
        format!("/products/{}", self.path_key())
    }

    /// Case-insensitive match against the explicit slug or the name-derived one.
    pub fn matches_slug(&self, candidate: &str) -> bool {
        let wanted = candidate.to_lowercase();
        (!self.slug.is_empty() && self.slug.to_lowercase() == wanted)
            || derive_slug(&self.name) == wanted
    }
}

/// Category id → display label.
#[derive(Debug, Clone, Default)]
pub struct CategoryLookup {
    labels: HashMap<String, String>,
}

impl CategoryLookup {
    pub fn from_records(records: &[StoreRecord]) -> Self {
        let labels = records
            .iter()
            .map(|record| {
                let label = first_text(&record.fields, &CATEGORY_LABEL_COLUMNS)
                    .map(str::to_string)
                    .unwrap_or_else(|| record.id.clone());
                (record.id.clone(), label)
            })
            .collect();
        Self { labels }
    }

    /// Label for `id`, or `id` itself when the category is unknown.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Category cell to labels. The first element decides the shape: record ids
/// are resolved through `lookup`, anything else is taken as literal labels.
pub fn resolve_categories(values: &[FieldValue], lookup: &CategoryLookup) -> Vec<String> {
    match values.first().and_then(FieldValue::as_text) {
        Some(first) if is_record_id(first) => values
            .iter()
            .filter_map(FieldValue::as_text)
            .map(|id| lookup.resolve(id).to_string())
            .collect(),
        Some(_) => fields::labels(values),
        None => Vec::new(),
    }
}

pub fn derive_slug(name: &str) -> String {
    SLUG_SUBSTITUTIONS
        .iter()
        .fold(name.to_string(), |acc, (from, to)| acc.replace(from, to))
        .to_lowercase()
}

pub fn normalize_product(record: &StoreRecord, lookup: &CategoryLookup) -> Product {
    let f = &record.fields;

    let media: Vec<String> = fields::list(f, columns::MEDIA)
        .iter()
        .filter_map(attachment_url)
        .collect();
    let mut media = media.into_iter();
    let logo_url = media.next();
    let screenshots = media.collect();

    let avg_rating = coerce_number(f.get(columns::AVG_RATING)).clamp(0.0, 5.0);
    let review_count = coerce_number(f.get(columns::REVIEW_COUNT)).max(0.0).trunc() as u32;

    Product {
        id: record.id.clone(),
        slug: fields::text_or(f, columns::SLUG, ""),
        name: fields::text_or(f, columns::NAME, ""),
        vendor: fields::text_or(f, columns::VENDOR, ""),
        website: fields::text_or(f, columns::WEBSITE, ""),
        description: fields::text_or(f, columns::DESCRIPTION, ""),
        categories: resolve_categories(fields::list(f, columns::CATEGORIES), lookup),
        features: fields::labels(fields::list(f, columns::FEATURES)),
        logo_url,
        screenshots,
        avg_rating,
        review_count,
        recommend_pct: coerce_percent(f.get(columns::RECOMMEND_PCT)),
    }
}

fn attachment_url(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Object(map) => fields::text(map, "url").map(str::to_string),
        FieldValue::Text(url) if !url.is_empty() => Some(url.clone()),
        _ => None,
    }
}
