//! reqwest-backed [`RecordStore`] speaking the hosted store's REST API.

use async_trait::async_trait;
use metrics::counter;
use reqwest::{
    Client, Method, RequestBuilder, StatusCode, Url,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::application::store::{ListQuery, RecordStore, StoreError};
use crate::config::{ApiKey, StoreSettings};
use crate::domain::fields::{FieldMap, StoreRecord};
use crate::infra::error::InfraError;

pub const METRIC_STORE_REQUESTS: &str = "avtools_store_requests_total";
pub const METRIC_STORE_FAILURES: &str = "avtools_store_failures_total";

#[derive(Clone, Debug)]
pub struct HttpRecordStore {
    client: Client,
    base: Url,
    base_id: String,
    api_key: ApiKey,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<StoreRecord>,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    fields: &'a FieldMap,
}

impl HttpRecordStore {
    pub fn new(settings: &StoreSettings) -> Result<Self, InfraError> {
        if settings.api_url.cannot_be_a_base() {
            return Err(InfraError::store_client(format!(
                "store URL `{}` cannot carry a path",
                settings.api_url
            )));
        }

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::store_client(err.to_string()))?;

        Ok(Self {
            client,
            base: settings.api_url.clone(),
            base_id: settings.base_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("avtools/", env!("CARGO_PKG_VERSION"))
    }

    /// `{api_url}/{base_id}/{table}[/{id}]`, each segment percent-encoded.
    ///
    /// `new` refuses bases that cannot carry a path, so the error arm only
    /// guards against `base` being swapped out afterwards.
    fn table_url(&self, table: &str, id: Option<&str>) -> Result<Url, StoreError> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| StoreError::Transport {
                table: table.to_string(),
                message: format!("store URL `{}` cannot carry a path", self.base),
            })?;
            segments.pop_if_empty().push(&self.base_id).push(table);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(self.api_key.expose())
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-cache")
    }

    /// Send `request` and decode a successful body. With `missing_ok`, a 404
    /// is reported as `Ok(None)` instead of a failure.
    async fn execute<T: DeserializeOwned>(
        &self,
        table: &str,
        op: &'static str,
        request: RequestBuilder,
        missing_ok: bool,
    ) -> Result<Option<T>, StoreError> {
        counter!(METRIC_STORE_REQUESTS, "table" => table.to_string(), "op" => op).increment(1);

        let response = request.send().await.map_err(|err| {
            failure(
                op,
                StoreError::Transport {
                    table: table.to_string(),
                    message: err.to_string(),
                },
            )
        })?;

        let status = response.status();
        if missing_ok && status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = response.bytes().await.map_err(|err| {
            failure(
                op,
                StoreError::Transport {
                    table: table.to_string(),
                    message: err.to_string(),
                },
            )
        })?;

        if !status.is_success() {
            return Err(failure(
                op,
                StoreError::RequestFailed {
                    table: table.to_string(),
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                },
            ));
        }

        serde_json::from_slice(&body).map(Some).map_err(|err| {
            failure(
                op,
                StoreError::Decode {
                    table: table.to_string(),
                    message: err.to_string(),
                },
            )
        })
    }
}

fn failure(op: &'static str, err: StoreError) -> StoreError {
    counter!(METRIC_STORE_FAILURES, "table" => err.table().to_string(), "op" => op).increment(1);
    debug!(
        target = "avtools::store",
        op,
        table = err.table(),
        status = ?err.status(),
        error = %err,
        "store request failed"
    );
    err
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<StoreRecord>, StoreError> {
        let mut url = self.table_url(table, None)?;
        if query.filter_formula.is_some() || query.max_records.is_some() {
            let mut pairs = url.query_pairs_mut();
            if let Some(formula) = query.filter_formula.as_deref() {
                pairs.append_pair("filterByFormula", formula);
            }
            if let Some(max) = query.max_records {
                pairs.append_pair("maxRecords", &max.to_string());
            }
        }

        let request = self.request(Method::GET, url);
        let response: Option<ListResponse> = self.execute(table, "list", request, false).await?;
        Ok(response.map(|body| body.records).unwrap_or_default())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<StoreRecord>, StoreError> {
        let url = self.table_url(table, Some(id))?;
        let request = self.request(Method::GET, url);
        self.execute(table, "get", request, true).await
    }

    async fn create(&self, table: &str, fields: FieldMap) -> Result<StoreRecord, StoreError> {
        let url = self.table_url(table, None)?;
        let request = self
            .request(Method::POST, url)
            .json(&CreateRequest { fields: &fields });
        let created: Option<StoreRecord> = self.execute(table, "create", request, false).await?;
        created.ok_or_else(|| StoreError::Decode {
            table: table.to_string(),
            message: "empty create response".to_string(),
        })
    }
}
