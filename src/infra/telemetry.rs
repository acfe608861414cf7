use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing::{Subscriber, debug};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::application::submissions::{METRIC_LEADS_SUBMITTED, METRIC_REVIEWS_SUBMITTED};
use crate::config::{LogFormat, LoggingSettings};
use crate::infra::store::{METRIC_STORE_FAILURES, METRIC_STORE_REQUESTS};

use super::error::InfraError;

static DESCRIBE_ONCE: Once = Once::new();

/// Install the process-wide subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(output_layer(logging.format))
        .try_init()
        .map_err(|err| InfraError::telemetry(format!("failed to install tracing subscriber: {err}")))?;

    debug!(
        target = "avtools::telemetry",
        level = %logging.level,
        format = ?logging.format,
        "tracing initialised"
    );
    Ok(())
}

fn output_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
    }
}

fn describe_metrics() {
    DESCRIBE_ONCE.call_once(|| {
        describe_counter!(
            METRIC_STORE_REQUESTS,
            Unit::Count,
            "Requests sent to the record store, labelled by table and operation."
        );
        describe_counter!(
            METRIC_STORE_FAILURES,
            Unit::Count,
            "Record store requests that failed or returned a non-success status."
        );
        describe_counter!(
            METRIC_REVIEWS_SUBMITTED,
            Unit::Count,
            "Reviews accepted into the moderation queue."
        );
        describe_counter!(
            METRIC_LEADS_SUBMITTED,
            Unit::Count,
            "Leads captured from product pages."
        );
    });
}
