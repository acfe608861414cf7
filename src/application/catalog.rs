//! Read side: products, reviews and the filtered catalog.
//!
//! Every read degrades instead of failing. Upstream errors are logged and
//! turned into empty lists or a missing product so pages keep rendering
//! through a partial store outage.

use std::sync::Arc;

use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::application::store::{ListQuery, RecordStore, StoreError};
use crate::config::TableSettings;
use crate::domain::catalog::{CatalogFilter, filter_products, group_reviews};
use crate::domain::fields::{StoreRecord, is_record_id};
use crate::domain::formula;
use crate::domain::products::{CategoryLookup, Product, normalize_product};
use crate::domain::reviews::{
    PRODUCT_LINK_CANDIDATES, Review, normalize_review, sort_newest_first,
};

const SOURCE: &str = "application::catalog::CatalogService";
const DEBUG_SAMPLE_SIZE: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    pub approved_only: bool,
    pub product_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total_products: usize,
    pub filter: CatalogFilter,
}

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
    tables: TableSettings,
    approved_field: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn RecordStore>,
        tables: TableSettings,
        approved_field: impl Into<String>,
    ) -> Self {
        Self {
            store,
            tables,
            approved_field: approved_field.into(),
        }
    }

    pub async fn list_products(&self) -> Vec<Product> {
        let all = ListQuery::all();
        let (lookup, products) = tokio::join!(
            self.category_lookup(),
            self.store.list(&self.tables.products, &all),
        );

        match products {
            Ok(records) => records
                .iter()
                .map(|record| normalize_product(record, &lookup))
                .collect(),
            Err(err) => {
                log_degraded("list_products", &err);
                Vec::new()
            }
        }
    }

    /// Raw view of the product table for diagnosing schema problems.
    pub async fn products_debug(&self) -> Value {
        let all = ListQuery::all();
        let (categories, products) = tokio::join!(
            self.store.list(&self.tables.categories, &all),
            self.store.list(&self.tables.products, &all),
        );

        let products = match products {
            Ok(records) => records,
            Err(err) => {
                log_degraded("products_debug", &err);
                return json!({ "ok": false, "error": err.to_string() });
            }
        };

        let (category_count, category_error) = match categories {
            Ok(records) => (records.len(), None),
            Err(err) => (0, Some(err.to_string())),
        };

        let sample: Vec<&StoreRecord> = products.iter().take(DEBUG_SAMPLE_SIZE).collect();
        let mut body = json!({
            "ok": true,
            "counts": { "products": products.len(), "categories": category_count },
            "sample": sample,
        });
        if let Some(error) = category_error {
            body["categoriesError"] = Value::String(error);
        }
        body
    }

    /// Resolve a detail-page key. Record ids are fetched directly; anything
    /// else (or an id the store does not know) is treated as a slug.
    pub async fn find_product(&self, slug_or_id: &str) -> Option<Product> {
        let key = slug_or_id.trim();
        if key.is_empty() {
            return None;
        }

        let (lookup, record) = tokio::join!(self.category_lookup(), self.product_record(key));
        record.map(|record| normalize_product(&record, &lookup))
    }

    async fn product_record(&self, key: &str) -> Option<StoreRecord> {
        if is_record_id(key) {
            match self.store.get(&self.tables.products, key).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(err) => {
                    log_degraded("find_product", &err);
                    return None;
                }
            }
        }

        let query = ListQuery::filtered(formula::slug_match(key)).with_max_records(1);
        match self.store.list(&self.tables.products, &query).await {
            Ok(records) => records.into_iter().find(|record| {
                normalize_product(record, &CategoryLookup::default()).matches_slug(key)
            }),
            Err(err) => {
                log_degraded("find_product", &err);
                None
            }
        }
    }

    /// Review feed. With `approved_only`, unapproved reviews are dropped even
    /// if the store's filter let them through.
    pub async fn list_reviews(&self, query: &ReviewQuery) -> Vec<Review> {
        let list_query = if query.approved_only {
            ListQuery::filtered(formula::approved(&self.approved_field))
        } else {
            ListQuery::all()
        };

        let records = match self.store.list(&self.tables.reviews, &list_query).await {
            Ok(records) => records,
            Err(err) => {
                log_degraded("list_reviews", &err);
                return Vec::new();
            }
        };

        let product_id = query
            .product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());

        let mut reviews: Vec<Review> = self
            .normalize_reviews(&records)
            .filter(|review| !query.approved_only || review.is_visible())
            .filter(|review| product_id.is_none_or(|id| review.product_id == id))
            .collect();
        sort_newest_first(&mut reviews);
        reviews
    }

    /// Approved reviews for one product, newest first.
    ///
    /// The link column is probed in the same order reviews are written. A
    /// 4xx means the table has no such column, so the next one is tried.
    pub async fn reviews_for_product(&self, product_id: &str) -> Vec<Review> {
        let product_id = product_id.trim();
        if product_id.is_empty() {
            return Vec::new();
        }

        let mut records = None;
        for link in PRODUCT_LINK_CANDIDATES {
            let list_query = ListQuery {
                filter_formula: formula::and(&[
                    formula::links_to(link, product_id),
                    formula::approved(&self.approved_field),
                ]),
                max_records: None,
            };

            match self.store.list(&self.tables.reviews, &list_query).await {
                Ok(found) => {
                    records = Some(found);
                    break;
                }
                Err(err) if err.is_rejection() => {
                    debug!(
                        target = "avtools::catalog",
                        source = SOURCE,
                        column = link.column,
                        status = ?err.status(),
                        "review link column rejected; trying next"
                    );
                }
                Err(err) => {
                    log_degraded("reviews_for_product", &err);
                    return Vec::new();
                }
            }
        }

        let Some(records) = records else {
            warn!(
                target = "avtools::catalog",
                source = SOURCE,
                table = %self.tables.reviews,
                "no review link column accepted; serving no reviews"
            );
            return Vec::new();
        };

        let mut reviews: Vec<Review> = self
            .normalize_reviews(&records)
            .filter(|review| review.is_visible() && review.product_id == product_id)
            .collect();
        sort_newest_first(&mut reviews);
        reviews
    }

    pub async fn catalog(&self, filter: CatalogFilter) -> CatalogPage {
        let approved = ReviewQuery {
            approved_only: true,
            product_id: None,
        };
        let (products, reviews) = tokio::join!(self.list_products(), self.list_reviews(&approved));

        let total_products = products.len();
        let grouped = group_reviews(reviews);
        let products = filter_products(products, &grouped, &filter);

        CatalogPage {
            products,
            total_products,
            filter,
        }
    }

    async fn category_lookup(&self) -> CategoryLookup {
        match self
            .store
            .list(&self.tables.categories, &ListQuery::all())
            .await
        {
            Ok(records) => CategoryLookup::from_records(&records),
            Err(err) => {
                log_degraded("category_lookup", &err);
                CategoryLookup::default()
            }
        }
    }

    fn normalize_reviews<'a>(
        &'a self,
        records: &'a [StoreRecord],
    ) -> impl Iterator<Item = Review> + 'a {
        let now = OffsetDateTime::now_utc();
        records
            .iter()
            .map(move |record| normalize_review(record, &self.approved_field, now))
    }
}

fn log_degraded(operation: &'static str, err: &StoreError) {
    warn!(
        target = "avtools::catalog",
        source = SOURCE,
        operation,
        table = err.table(),
        status = ?err.status(),
        error = %err,
        "store read failed; serving degraded result"
    );
}
