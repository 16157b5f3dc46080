use std::{path::Path, process::ExitCode, time::Instant};

use collector_service::{
    config::AppConfig,
    observability,
    pipeline::orchestrator::{self, Collector},
    sinks::PgTelemetryStore,
    sources::HttpFetcher,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let started = Instant::now();

    // Load configuration
    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            observability::init_tracing("info");
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    observability::init_tracing(&cfg.log_level);

    let metrics = cfg.metrics.as_ref().and_then(|m| {
        observability::init_metrics().map(|handle| (handle, Path::new(&m.textfile_path)))
    });

    let store = match PgTelemetryStore::connect_lazy(&cfg.database, cfg.sources.request_timeout()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "invalid database configuration");
            return ExitCode::FAILURE;
        }
    };

    let status = match HttpFetcher::new(cfg.sources.request_timeout()) {
        Ok(fetcher) => Collector::new(&cfg.sources, &fetcher, &store).run_cycle().await,
        Err(e) => orchestrator::log_failed_start(&store, started, &e).await,
    };

    if let Some((handle, path)) = &metrics {
        if let Err(e) = observability::write_textfile(handle, path) {
            tracing::warn!(error = %e, path = %path.display(), "failed to write metrics textfile");
        }
    }

    ExitCode::from(orchestrator::exit_status(status))
}
