//! reqwest implementation of [`SimulationService`].

use crate::service::SimulationService;
use crate::types::{
    decode_catalog, decode_envelope, decode_running, decode_snapshot, decode_step,
    rejection_message, Decoded, InitializeRequest, SelectResponse, StepRequest,
};
use crate::ClientError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use simbridge_types::{PendingWrites, PointCatalog, Snapshot};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the HTTP simulation client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address of the simulation service, e.g. `http://localhost:5000`.
    /// A bare `host:port` is treated as plain HTTP.
    pub base_url: String,

    /// Upper bound on any single request, including advance.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Create a config for the given service address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Stateless client for the simulation service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpSimulationClient {
    client: Client,
    base_url: String,
}

impl HttpSimulationClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url),
        })
    }

    /// The normalized service address requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder, url: &str) -> Result<String, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientError::Unavailable {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Unavailable {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(ClientError::Rejected {
                url: url.to_string(),
                status: status.as_u16(),
                message: rejection_message(&body),
            });
        }

        debug!(url, status = status.as_u16(), "Simulation service responded");
        Ok(body)
    }
}

/// Turn a decode outcome into the caller's result.
fn finish<T>(url: &str, decoded: Result<Decoded<T>, String>) -> Result<T, ClientError> {
    match decoded {
        Ok(Decoded::Payload(payload)) => Ok(payload),
        Ok(Decoded::Rejected { status, message }) => Err(ClientError::Rejected {
            url: url.to_string(),
            status,
            message,
        }),
        Err(reason) => Err(ClientError::Decode {
            url: url.to_string(),
            reason,
        }),
    }
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl SimulationService for HttpSimulationClient {
    async fn select(&self, name: &str) -> Result<String, ClientError> {
        let url = self.url(&format!("testcases/{}/select", name));
        let body = self.send(self.client.post(&url), &url).await?;

        let selected: SelectResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        info!(test_case = name, case_id = %selected.testid, "Selected test case");
        Ok(selected.testid)
    }

    async fn initialize(
        &self,
        case_id: &str,
        start_time: u64,
        warmup_period: u64,
    ) -> Result<Snapshot, ClientError> {
        let url = self.url(&format!("initialize/{}", case_id));
        let request = self.client.put(&url).json(&InitializeRequest {
            start_time,
            warmup_period,
        });
        let body = self.send(request, &url).await?;
        finish(&url, decode_snapshot(&body))
    }

    async fn advance(
        &self,
        case_id: &str,
        inputs: &PendingWrites,
    ) -> Result<Snapshot, ClientError> {
        let url = self.url(&format!("advance/{}", case_id));
        let body = self.send(self.client.post(&url).json(inputs), &url).await?;
        finish(&url, decode_snapshot(&body))
    }

    async fn step(&self, case_id: &str) -> Result<u64, ClientError> {
        let url = self.url(&format!("step/{}", case_id));
        let body = self.send(self.client.get(&url), &url).await?;
        finish(&url, decode_step(&body))
    }

    async fn set_step(&self, case_id: &str, seconds: u64) -> Result<(), ClientError> {
        let url = self.url(&format!("step/{}", case_id));
        let request = self.client.put(&url).json(&StepRequest { step: seconds });
        let body = self.send(request, &url).await?;
        finish(&url, decode_envelope::<serde_json::Value>(&body)).map(|_| ())
    }

    async fn status(&self, case_id: &str) -> Result<bool, ClientError> {
        let url = self.url(&format!("status/{}", case_id));
        let body = self.send(self.client.get(&url), &url).await?;
        decode_running(&body).map_err(|reason| ClientError::Decode { url, reason })
    }

    async fn measurements(&self, case_id: &str) -> Result<PointCatalog, ClientError> {
        let url = self.url(&format!("measurements/{}", case_id));
        let body = self.send(self.client.get(&url), &url).await?;
        finish(&url, decode_catalog(&body))
    }

    async fn inputs(&self, case_id: &str) -> Result<PointCatalog, ClientError> {
        let url = self.url(&format!("inputs/{}", case_id));
        let body = self.send(self.client.get(&url), &url).await?;
        finish(&url, decode_catalog(&body))
    }

    async fn stop(&self, case_id: &str) -> Result<(), ClientError> {
        let url = self.url(&format!("stop/{}", case_id));
        self.send(self.client.put(&url), &url).await?;
        info!(case_id, "Stopped test case");
        Ok(())
    }
}
