pub mod inverter_xml;
pub mod p1_json;

use std::time::Duration;

use async_trait::async_trait;

use crate::pipeline::PipelineError;

pub use inverter_xml::{parse_inverter, InverterSource};
pub use p1_json::{parse_meter, P1Source};

/// Render an optional measurement for run summaries.
fn display_opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

/// Fetch the raw body served at `url`.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError>;
}

/// Plain HTTP GET with a per-request timeout and no retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::TransportFailure(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PipelineError::TransportFailure(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::TransportFailure(format!("failed to read body: {e}")))?;

        Ok(body.to_vec())
    }
}
