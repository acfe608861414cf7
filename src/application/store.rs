//! Port to the external record store.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::fields::{FieldMap, StoreRecord};

/// Optional parameters for listing a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter_formula: Option<String>,
    pub max_records: Option<u32>,
}

impl ListQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(formula: impl Into<String>) -> Self {
        Self {
            filter_formula: Some(formula.into()),
            max_records: None,
        }
    }

    pub fn with_max_records(mut self, max: u32) -> Self {
        self.max_records = Some(max);
        self
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store request to `{table}` failed with status {status}: {body}")]
    RequestFailed {
        table: String,
        status: u16,
        body: String,
    },
    #[error("store request to `{table}` could not be sent: {message}")]
    Transport { table: String, message: String },
    #[error("store response from `{table}` could not be decoded: {message}")]
    Decode { table: String, message: String },
}

impl StoreError {
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::RequestFailed { status, .. } => Some(*status),
            StoreError::Transport { .. } | StoreError::Decode { .. } => None,
        }
    }

    /// The store understood the request and refused it (4xx), typically
    /// because a field name or value does not fit the table's schema.
    pub fn is_rejection(&self) -> bool {
        self.status().is_some_and(|status| (400..500).contains(&status))
    }

    pub fn table(&self) -> &str {
        match self {
            StoreError::RequestFailed { table, .. }
            | StoreError::Transport { table, .. }
            | StoreError::Decode { table, .. } => table,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First page of records in `table` matching `query`.
    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<StoreRecord>, StoreError>;

    /// A single record by store id; `Ok(None)` when the store reports it missing.
    async fn get(&self, table: &str, id: &str) -> Result<Option<StoreRecord>, StoreError>;

    async fn create(&self, table: &str, fields: FieldMap) -> Result<StoreRecord, StoreError>;
}
