//! One collection cycle: every configured source is fetched, parsed and
//! stored in turn, then a single `collection_logs` row records the outcome.

use std::{any::Any, panic::AssertUnwindSafe, time::Instant};

use futures::FutureExt;
use telemetry_client::domain::{CollectionRun, RunStatus};
use time::OffsetDateTime;

use super::{run_source, SourceOutcome};
use crate::config::SourcesConfig;
use crate::sinks::TelemetryStore;
use crate::sources::{Fetch, InverterSource, P1Source};

pub const SUMMARY_SEPARATOR: &str = " | ";

/// Per-source outcomes of one cycle, in collection order.
#[derive(Debug)]
pub struct CycleReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl CycleReport {
    /// Success only when every configured source succeeded.
    pub fn status(&self) -> RunStatus {
        if self.outcomes.iter().all(SourceOutcome::succeeded) {
            RunStatus::Success
        } else {
            RunStatus::Error
        }
    }

    pub fn message(&self) -> String {
        self.outcomes
            .iter()
            .map(SourceOutcome::fragment)
            .collect::<Vec<_>>()
            .join(SUMMARY_SEPARATOR)
    }

    pub fn records_processed(&self) -> i32 {
        self.outcomes.iter().filter(|o| o.succeeded()).count() as i32
    }
}

pub struct Collector<'a> {
    fetcher: &'a dyn Fetch,
    store: &'a dyn TelemetryStore,
    inverter: InverterSource,
    p1: Option<P1Source>,
}

impl<'a> Collector<'a> {
    pub fn new(sources: &SourcesConfig, fetcher: &'a dyn Fetch, store: &'a dyn TelemetryStore) -> Self {
        let p1 = sources
            .p1_enabled()
            .then(|| P1Source::new(sources.p1_endpoint.trim()));

        Self {
            fetcher,
            store,
            inverter: InverterSource::new(sources.inverter_endpoint.trim()),
            p1,
        }
    }

    /// Collect from the inverter, then from the P1 meter when configured.
    pub async fn collect(&self) -> CycleReport {
        let mut outcomes = Vec::new();
        self.collect_into(&mut outcomes).await;
        CycleReport { outcomes }
    }

    /// Push each source's outcome as soon as it finishes, so outcomes already
    /// recorded survive a panic in a later source.
    async fn collect_into(&self, outcomes: &mut Vec<SourceOutcome>) {
        outcomes.push(run_source(&self.inverter, self.fetcher, self.store).await);

        match &self.p1 {
            Some(p1) => outcomes.push(run_source(p1, self.fetcher, self.store).await),
            None => tracing::debug!("P1 endpoint not configured, skipping meter collection"),
        }
    }

    /// Run one full cycle and record it. Never panics and never skips the
    /// `collection_logs` row.
    pub async fn run_cycle(&self) -> RunStatus {
        let started = Instant::now();
        tracing::info!("starting collection cycle");

        let mut outcomes = Vec::new();
        let result = AssertUnwindSafe(self.collect_into(&mut outcomes))
            .catch_unwind()
            .await;
        let report = CycleReport { outcomes };

        let (status, message) = match result {
            Ok(()) => (report.status(), report.message()),
            Err(panic) => {
                let message = format!("Unexpected error: {}", panic_message(panic.as_ref()));
                tracing::error!("{message}");
                (RunStatus::Error, message)
            }
        };
        let records_processed = report.records_processed();

        finish(self.store, started, status, message, records_processed).await
    }
}

/// Record a cycle that could not start, e.g. because the HTTP client could not
/// be built.
pub async fn log_failed_start(
    store: &dyn TelemetryStore,
    started: Instant,
    reason: &dyn std::fmt::Display,
) -> RunStatus {
    let message = format!("Unexpected error: {reason}");
    tracing::error!("{message}");
    finish(store, started, RunStatus::Error, message, 0).await
}

async fn finish(
    store: &dyn TelemetryStore,
    started: Instant,
    status: RunStatus,
    message: String,
    records_processed: i32,
) -> RunStatus {
    let elapsed = started.elapsed();
    metrics::histogram!("collector_cycle_duration_seconds").record(elapsed.as_secs_f64());

    match status {
        RunStatus::Success => tracing::info!(%status, records_processed, "{message}"),
        _ => tracing::error!(%status, records_processed, "{message}"),
    }

    let run = CollectionRun {
        ts: OffsetDateTime::now_utc(),
        status,
        message,
        execution_time_ms: i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        records_processed,
    };
    log_run(store, &run).await;

    status
}

/// Best-effort write of the audit row. A failure here is logged and dropped;
/// it must never change the cycle's outcome.
pub async fn log_run(store: &dyn TelemetryStore, run: &CollectionRun) {
    if let Err(e) = store.store_collection_run(run).await {
        metrics::counter!("collector_run_log_failures_total").increment(1);
        tracing::error!(error = %e, status = %run.status, "failed to log collection result");
    }
}

/// Process exit status for a finished cycle.
pub fn exit_status(status: RunStatus) -> u8 {
    match status {
        RunStatus::Success => 0,
        _ => 1,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
