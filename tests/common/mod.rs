#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use avtools::application::catalog::CatalogService;
use avtools::application::store::{ListQuery, RecordStore, StoreError};
use avtools::application::submissions::SubmissionService;
use avtools::config::TableSettings;
use avtools::domain::fields::{FieldMap, FieldValue, StoreRecord};
use avtools::infra::http::{self, RouterState};

pub const APPROVED_FIELD: &str = "Approved";

/// In-memory record store. Formulas are not evaluated (nor is `maxRecords`),
/// so every list returns the whole table and the services' own guards do
/// the narrowing. A formula naming a rejected column fails with 422.
#[derive(Default)]
pub struct FakeStore {
    tables: Mutex<HashMap<String, Vec<StoreRecord>>>,
    unavailable: Mutex<HashSet<String>>,
    rejected_columns: Mutex<HashSet<String>>,
    created: Mutex<Vec<(String, FieldMap)>>,
    queries: Mutex<Vec<(String, ListQuery)>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, table: &str, record: StoreRecord) {
        self.tables
            .lock()
            .expect("tables lock")
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    /// Every call against `table` fails as if the store were down.
    pub fn make_unavailable(&self, table: &str) {
        self.unavailable
            .lock()
            .expect("unavailable lock")
            .insert(table.to_string());
    }

    /// Creates that write `column`, and lists whose formula names it, are
    /// refused with 422 like an unknown field name.
    pub fn reject_column(&self, column: &str) {
        self.rejected_columns
            .lock()
            .expect("rejected lock")
            .insert(column.to_string());
    }

    pub fn created(&self) -> Vec<(String, FieldMap)> {
        self.created.lock().expect("created lock").clone()
    }

    pub fn queries(&self) -> Vec<(String, ListQuery)> {
        self.queries.lock().expect("queries lock").clone()
    }

    fn check_available(&self, table: &str) -> Result<(), StoreError> {
        if self
            .unavailable
            .lock()
            .expect("unavailable lock")
            .contains(table)
        {
            return Err(StoreError::Transport {
                table: table.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<StoreRecord>, StoreError> {
        self.queries
            .lock()
            .expect("queries lock")
            .push((table.to_string(), query.clone()));
        self.check_available(table)?;

        if let Some(formula) = &query.filter_formula {
            let rejected = self.rejected_columns.lock().expect("rejected lock");
            if let Some(column) = rejected
                .iter()
                .find(|column| formula.contains(&format!("{{{column}}}")))
            {
                return Err(unknown_field(table, column));
            }
        }
        Ok(self
            .tables
            .lock()
            .expect("tables lock")
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        self.check_available(table)?;
        Ok(self
            .tables
            .lock()
            .expect("tables lock")
            .get(table)
            .and_then(|records| records.iter().find(|record| record.id == id).cloned()))
    }

    async fn create(&self, table: &str, fields: FieldMap) -> Result<StoreRecord, StoreError> {
        self.check_available(table)?;

        let rejected = self.rejected_columns.lock().expect("rejected lock");
        if let Some(column) = fields.keys().find(|key| rejected.contains(*key)) {
            return Err(unknown_field(table, column));
        }
        drop(rejected);

        let mut created = self.created.lock().expect("created lock");
        created.push((table.to_string(), fields.clone()));
        let record = StoreRecord {
            id: format!("recNew{:08}", created.len()),
            fields,
        };
        drop(created);

        self.insert(table, record.clone());
        Ok(record)
    }
}

fn unknown_field(table: &str, column: &str) -> StoreError {
    StoreError::RequestFailed {
        table: table.to_string(),
        status: 422,
        body: format!(r#"{{"error":{{"type":"UNKNOWN_FIELD_NAME","message":"{column}"}}}}"#),
    }
}

pub fn record(id: &str, fields: &[(&str, FieldValue)]) -> StoreRecord {
    StoreRecord {
        id: id.to_string(),
        fields: fields
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
    }
}

pub fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

pub fn ids(values: &[&str]) -> FieldValue {
    FieldValue::List(values.iter().map(|value| text(value)).collect())
}

pub fn product(id: &str, name: &str, vendor: &str, rating: f64, categories: &[&str]) -> StoreRecord {
    record(
        id,
        &[
            ("Product Name", text(name)),
            ("Vendor Name", text(vendor)),
            ("Short Description", text(&format!("{name} for charter operators"))),
            ("Categories", ids(categories)),
            ("Star Rating Rollup (from Reviews)", FieldValue::Number(rating)),
            ("Review Count", FieldValue::Number(2.0)),
            ("Recommend %", text("80%")),
        ],
    )
}

pub struct ReviewSeed<'a> {
    pub id: &'a str,
    pub product_id: &'a str,
    pub rating: f64,
    pub date: &'a str,
    pub approved: bool,
    pub role: &'a str,
    pub fleet: &'a str,
}

pub fn review(seed: ReviewSeed<'_>) -> StoreRecord {
    record(
        seed.id,
        &[
            ("Product", ids(&[seed.product_id])),
            ("Reviewer Name", text("Jordan")),
            ("Role", text(seed.role)),
            ("Fleet Size", text(seed.fleet)),
            ("Star Rating", FieldValue::Number(seed.rating)),
            ("Pros", text("Fast quoting")),
            ("Would Recommend", FieldValue::Bool(true)),
            ("Date", text(seed.date)),
            (APPROVED_FIELD, FieldValue::Bool(seed.approved)),
        ],
    )
}

pub fn tables() -> TableSettings {
    TableSettings::default()
}

pub fn catalog_service(store: &Arc<FakeStore>) -> CatalogService {
    CatalogService::new(store.clone(), tables(), APPROVED_FIELD)
}

pub fn submission_service(store: &Arc<FakeStore>) -> SubmissionService {
    SubmissionService::new(store.clone(), tables(), APPROVED_FIELD)
}

pub fn router(store: &Arc<FakeStore>) -> Router {
    http::build_router(RouterState {
        catalog: Arc::new(catalog_service(store)),
        submissions: Arc::new(submission_service(store)),
    })
}

/// Categories, three products and a mix of approved and pending reviews.
pub fn seeded_store() -> Arc<FakeStore> {
    let store = FakeStore::new();
    store.insert(
        "Categories",
        record("recCatSched00001", &[("Name", text("Scheduling"))]),
    );
    store.insert(
        "Categories",
        record("recCatQuote00001", &[("Name", text("Quoting"))]),
    );

    store.insert(
        "Products",
        product("recProdSky000001", "Sky & Sea / Air", "Horizon Labs", 4.6, &["recCatSched00001"]),
    );
    store.insert(
        "Products",
        product("recProdQuo000001", "QuoteJet", "Jetline", 3.0, &["recCatQuote00001"]),
    );
    store.insert(
        "Products",
        product("recProdLeg000001", "Legacy Planner", "OldCo", 4.8, &["Scheduling"]),
    );

    for seed in [
        ReviewSeed {
            id: "recRevOld0000001",
            product_id: "recProdSky000001",
            rating: 4.0,
            date: "2024-01-01",
            approved: true,
            role: "DOM",
            fleet: "Medium",
        },
        ReviewSeed {
            id: "recRevNew0000001",
            product_id: "recProdSky000001",
            rating: 5.0,
            date: "2024-03-01",
            approved: true,
            role: "Dispatcher",
            fleet: "Large",
        },
        ReviewSeed {
            id: "recRevMid0000001",
            product_id: "recProdQuo000001",
            rating: 3.0,
            date: "2024-02-01",
            approved: true,
            role: "Broker",
            fleet: "Small",
        },
        ReviewSeed {
            id: "recRevPend000001",
            product_id: "recProdSky000001",
            rating: 1.0,
            date: "2024-04-01",
            approved: false,
            role: "Safety",
            fleet: "Small",
        },
    ] {
        store.insert("Reviews", review(seed));
    }

    store
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn send_form(app: &Router, uri: &str, form: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("request should build");

    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}
