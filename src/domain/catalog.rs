//! Catalog facets and the filter applied to the product list.

use std::collections::HashMap;

use crate::domain::products::Product;
use crate::domain::reviews::Review;

/// Sentinel facet value meaning "no filter".
pub const ALL: &str = "All";

pub const CATEGORIES: [&str; 3] = ["Scheduling", "Quoting", "Marketplace / Aircraft Sourcing"];
pub const ROLES: [&str; 6] = ["DO", "DOM", "Dispatcher", "Broker", "Safety", "Other"];
pub const FLEET_SIZES: [&str; 3] = ["Small", "Medium", "Large"];
pub const RATING_FLOORS: [f64; 4] = [0.0, 3.0, 4.0, 4.5];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub min_rating: f64,
    pub query: String,
    pub role: Option<String>,
    pub fleet: Option<String>,
}

impl CatalogFilter {
    /// Build a filter from raw facet values; empty strings and `All` disable a facet.
    pub fn new(
        category: Option<&str>,
        min_rating: f64,
        query: Option<&str>,
        role: Option<&str>,
        fleet: Option<&str>,
    ) -> Self {
        Self {
            category: facet(category),
            min_rating: if min_rating.is_finite() { min_rating.max(0.0) } else { 0.0 },
            query: query.map(str::trim).unwrap_or_default().to_string(),
            role: facet(role),
            fleet: facet(fleet),
        }
    }

    pub fn reviewer_facets_active(&self) -> bool {
        self.role.is_some() || self.fleet.is_some()
    }

    pub fn matches(&self, product: &Product, reviews: &[Review]) -> bool {
        if let Some(category) = &self.category
            && !product.categories.iter().any(|c| c == category)
        {
            return false;
        }

        if product.avg_rating < self.min_rating {
            return false;
        }

        if !self.query.is_empty() {
            let haystack = format!(
                "{} {} {}",
                product.name, product.vendor, product.description
            )
            .to_lowercase();
            if !haystack.contains(&self.query.to_lowercase()) {
                return false;
            }
        }

        if self.reviewer_facets_active() {
            return reviews.iter().any(|review| {
                self.role.as_ref().is_none_or(|role| &review.role == role)
                    && self.fleet.as_ref().is_none_or(|fleet| &review.fleet_size == fleet)
            });
        }

        true
    }
}

fn facet(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
        .map(str::to_string)
}

pub fn group_reviews(reviews: Vec<Review>) -> HashMap<String, Vec<Review>> {
    let mut grouped: HashMap<String, Vec<Review>> = HashMap::new();
    for review in reviews {
        grouped
            .entry(review.product_id.clone())
            .or_default()
            .push(review);
    }
    grouped
}

/// Products passing `filter`, in their original order.
pub fn filter_products(
    products: Vec<Product>,
    grouped: &HashMap<String, Vec<Review>>,
    filter: &CatalogFilter,
) -> Vec<Product> {
    products
        .into_iter()
        .filter(|product| {
            let reviews = grouped.get(&product.id).map(Vec::as_slice).unwrap_or(&[]);
            filter.matches(product, reviews)
        })
        .collect()
}
