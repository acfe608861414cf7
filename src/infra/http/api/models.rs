use serde::{Deserialize, Serialize};

use crate::domain::products::Product;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub debug: Option<String>,
}

impl ProductsQuery {
    pub fn debug_requested(&self) -> bool {
        flag(self.debug.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    pub approved: Option<String>,
    pub product_id: Option<String>,
}

impl ReviewsQuery {
    pub fn approved_only(&self) -> bool {
        flag(self.approved.as_deref())
    }

    pub fn product_id(&self) -> Option<String> {
        self.product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Either the product itself or `{"notFound": true}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ProductLookupResponse {
    Found(Box<Product>),
    Missing {
        #[serde(rename = "notFound")]
        not_found: bool,
    },
}

impl From<Option<Product>> for ProductLookupResponse {
    fn from(product: Option<Product>) -> Self {
        match product {
            Some(product) => Self::Found(Box::new(product)),
            None => Self::Missing { not_found: true },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub ok: bool,
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn flag(value: Option<&str>) -> bool {
    value.is_some_and(|raw| matches!(raw.trim(), "1" | "true"))
}
