use std::{fs, path::Path};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins when set; otherwise the
/// collector logs at `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!("collector_service={level},collect={level}"))
            .unwrap_or_else(|_| EnvFilter::new("collector_service=info,collect=info"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Install the Prometheus recorder. The collector exits after one cycle, so
/// nothing is served; the rendered text is written out by [`write_textfile`].
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "failed to install Prometheus metrics recorder");
            None
        }
    }
}

/// Write the exposition text for node-exporter's textfile collector, via a
/// temporary file renamed into place.
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, handle.render())?;
    fs::rename(&tmp, path)
}
