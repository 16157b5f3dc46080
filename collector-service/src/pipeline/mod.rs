pub mod orchestrator;

use async_trait::async_trait;

use crate::sinks::TelemetryStore;
use crate::sources::Fetch;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("transport failure: {0}")]
    TransportFailure(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("meter payload has no unique_id")]
    MissingIdentity,
    #[error("storage rejected write: {0}")]
    StorageRejected(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::StorageUnavailable(e.to_string()),
            _ => Self::StorageRejected(e.to_string()),
        }
    }
}

/// One telemetry source: where to fetch it, how to read it, how to keep it.
#[async_trait]
pub trait Source: Send + Sync {
    type Reading: Send + Sync;

    /// Short label used in run summaries and metric labels.
    fn label(&self) -> &'static str;

    fn endpoint(&self) -> &str;

    fn parse(&self, payload: &[u8]) -> Result<Self::Reading, PipelineError>;

    /// Persist one reading, resolving any identity it depends on first.
    async fn store(
        &self,
        store: &dyn TelemetryStore,
        reading: &Self::Reading,
    ) -> Result<(), PipelineError>;

    /// One-line, human readable description of a stored reading.
    fn summarize(&self, reading: &Self::Reading) -> String;
}

/// Outcome of one source within a collection cycle.
#[derive(Debug)]
pub struct SourceOutcome {
    pub label: &'static str,
    pub result: Result<String, PipelineError>,
}

impl SourceOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Fragment used in the combined run message.
    pub fn fragment(&self) -> String {
        match &self.result {
            Ok(summary) => format!("{}: {summary}", self.label),
            Err(e) => format!("{}: FAILED ({e})", self.label),
        }
    }
}

/// Fetch, parse and store a single reading from `source`.
///
/// Failures never escape: they are folded into the returned outcome so the
/// caller can continue with the next source.
pub async fn run_source<S: Source>(
    source: &S,
    fetcher: &dyn Fetch,
    store: &dyn TelemetryStore,
) -> SourceOutcome {
    let label = source.label();
    let result = collect_one(source, fetcher, store).await;

    match &result {
        Ok(summary) => {
            tracing::info!(source = label, "{summary}");
            metrics::counter!("collector_source_runs_total", "source" => label, "outcome" => "success")
                .increment(1);
            metrics::counter!("collector_records_stored_total", "source" => label).increment(1);
        }
        Err(e) => {
            tracing::error!(source = label, error = %e, "collection failed");
            metrics::counter!("collector_source_runs_total", "source" => label, "outcome" => "failure")
                .increment(1);
        }
    }

    SourceOutcome { label, result }
}

async fn collect_one<S: Source>(
    source: &S,
    fetcher: &dyn Fetch,
    store: &dyn TelemetryStore,
) -> Result<String, PipelineError> {
    tracing::debug!(source = source.label(), endpoint = source.endpoint(), "fetching");
    let payload = fetcher.fetch(source.endpoint()).await?;
    let reading = source.parse(&payload)?;
    source.store(store, &reading).await?;
    Ok(source.summarize(&reading))
}
