//! Write side: review and lead submissions.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::store::{RecordStore, StoreError};
use crate::config::TableSettings;
use crate::domain::leads::LeadSubmission;
use crate::domain::reviews::{PRODUCT_LINK_CANDIDATES, ReviewSubmission};
use crate::domain::validation::ValidationErrors;

const SOURCE: &str = "application::submissions::SubmissionService";

pub const METRIC_REVIEWS_SUBMITTED: &str = "avtools_reviews_submitted_total";
pub const METRIC_LEADS_SUBMITTED: &str = "avtools_leads_submitted_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Review,
    Lead,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Review => f.write_str("review"),
            Entity::Lead => f.write_str("lead"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("failed to create {entity}")]
    Store {
        entity: Entity,
        #[source]
        source: StoreError,
    },
    #[error("no product link field accepted the review (tried {})", .attempted.join(", "))]
    SchemaBinding {
        attempted: Vec<&'static str>,
        #[source]
        last: Option<StoreError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedReview {
    pub id: String,
    /// Column that accepted the product reference.
    pub link_field: &'static str,
}

#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn RecordStore>,
    tables: TableSettings,
    approved_field: String,
}

impl SubmissionService {
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

    pub async fn create_lead(&self, submission: LeadSubmission) -> Result<String, SubmissionError> {
        let lead = submission.validate()?;

        let record = self
            .store
            .create(&self.tables.leads, lead.to_fields())
            .await
            .map_err(|source| {
                warn!(
                    target = "avtools::submissions",
                    source = SOURCE,
                    table = %self.tables.leads,
                    error = %source,
                    "lead creation failed"
                );
                SubmissionError::Store {
                    entity: Entity::Lead,
                    source,
                }
            })?;

        counter!(METRIC_LEADS_SUBMITTED).increment(1);
        info!(
            target = "avtools::submissions",
            lead_id = %record.id,
            product_id = %lead.product_id,
            "lead created"
        );
        Ok(record.id)
    }

    /// Create a pending review. The product reference is written through
    /// each candidate column in turn until the store accepts one; a schema
    /// rejection (4xx) moves on, any other failure stops immediately.
    pub async fn create_review(
        &self,
        submission: ReviewSubmission,
    ) -> Result<CreatedReview, SubmissionError> {
        let review = submission.validate()?;
        let submitted_at = OffsetDateTime::now_utc();

        let mut attempted = Vec::with_capacity(PRODUCT_LINK_CANDIDATES.len());
        let mut last = None;

        for link in PRODUCT_LINK_CANDIDATES {
            attempted.push(link.column);
            let fields = review.to_fields(link, &self.approved_field, submitted_at);

            match self.store.create(&self.tables.reviews, fields).await {
                Ok(record) => {
                    counter!(METRIC_REVIEWS_SUBMITTED).increment(1);
                    info!(
                        target = "avtools::submissions",
                        review_id = %record.id,
                        product_id = %review.product_id,
                        link_field = link.column,
                        rating = review.rating,
                        "review created pending moderation"
                    );
                    return Ok(CreatedReview {
                        id: record.id,
                        link_field: link.column,
                    });
                }
                Err(err) if err.is_rejection() => {
                    warn!(
                        target = "avtools::submissions",
                        source = SOURCE,
                        link_field = link.column,
                        error = %err,
                        "store rejected review link field; trying next candidate"
                    );
                    last = Some(err);
                }
                Err(err) => {
                    warn!(
                        target = "avtools::submissions",
                        source = SOURCE,
                        link_field = link.column,
                        error = %err,
                        "review creation failed"
                    );
                    return Err(SubmissionError::Store {
                        entity: Entity::Review,
                        source: err,
                    });
                }
            }
        }

        Err(SubmissionError::SchemaBinding { attempted, last })
    }
}
