//! `reqwest`-backed analysis client.

use super::{
    AnalysisService, AnalyzeRequest, AnalyzeResponse, ClientError, HealthResponse, RetryPolicy,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::Value;
use std::time::Instant;

/// HTTP client for the face-analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
    health_policy: RetryPolicy,
    analyze_policy: RetryPolicy,
}

impl AnalysisClient {
    /// Creates a client with the default health (5 s) and analyze (30 s)
    /// policies.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_policies(base_url, RetryPolicy::health(), RetryPolicy::analyze())
    }

    /// Creates a client with explicit retry policies.
    pub fn with_policies(
        base_url: &str,
        health_policy: RetryPolicy,
        analyze_policy: RetryPolicy,
    ) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ClientError::Build(format!("invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Build(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_policy,
            analyze_policy,
        })
    }

    /// Returns the full URL for an endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Policy used for `GET /health`.
    pub fn health_policy(&self) -> &RetryPolicy {
        &self.health_policy
    }

    /// Policy used for `POST /analyze`.
    pub fn analyze_policy(&self) -> &RetryPolicy {
        &self.analyze_policy
    }

    /// Issues a request under `policy`, retrying transient failures.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&AnalyzeRequest>,
        policy: &RetryPolicy,
    ) -> Result<Value, ClientError> {
        let attempts = policy.attempts();
        let mut attempt = 0;

        loop {
            let timeout = policy.timeout_for(attempt);
            let mut request = self.http.request(method.clone(), url).timeout(timeout);
            if let Some(body) = body {
                request = request.json(body);
            }

            let started = Instant::now();
            match self.send_once(request, url, attempt + 1).await {
                Ok(value) => {
                    tracing::debug!(
                        %url,
                        attempt = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Request completed"
                    );
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt + 1 < attempts => {
                    tracing::warn!(
                        %url,
                        attempt = attempt + 1,
                        timeout_ms = timeout.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying"
                    );
                    attempt += 1;
                }
                Err(err) => {
                    tracing::error!(%url, attempt = attempt + 1, error = %err, "Request failed");
                    return Err(err);
                }
            }
        }
    }

    async fn send_once(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        attempt: u32,
    ) -> Result<Value, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(url, attempt, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(url, attempt, e))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::error!(status = status.as_u16(), %body, "Service returned an error");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl AnalysisService for AnalysisClient {
    async fn check_health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.endpoint("health");
        tracing::info!(%url, "Checking service health");

        let value = self
            .execute(Method::GET, &url, None, &self.health_policy)
            .await?;
        let health: HealthResponse = serde_json::from_value(value)?;

        tracing::info!(
            status = %health.status,
            message = %health.message,
            models_loaded = health.models_loaded,
            "Service health received"
        );
        Ok(health)
    }

    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, ClientError> {
        let url = self.endpoint("analyze");
        tracing::info!(%url, image_len = request.image.len(), "Submitting photo for analysis");

        let value = self
            .execute(Method::POST, &url, Some(&request), &self.analyze_policy)
            .await?;
        Ok(AnalyzeResponse::from_value(&value))
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
