//! Remote face-analysis service client.
//!
//! Two operations are supported against a configured base URL:
//!
//! - `GET /health` reports whether the service is up and its models are
//!   loaded.
//! - `POST /analyze` submits a base64 JPEG and returns the annotated image
//!   plus one record per detected face.
//!
//! Both run under a [`RetryPolicy`] and classify transport failures into
//! [`TransportKind`] so the view can tell the user what to check.

mod error;
mod http;
mod retry;
mod types;

pub use error::{ClientError, TransportKind};
pub use http::AnalysisClient;
pub use retry::{RetryPolicy, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_MAX_RETRIES};
pub use types::{AnalyzeRequest, AnalyzeResponse, FaceResult, Field, HealthResponse};

use async_trait::async_trait;

/// The analysis service as seen by the view.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Runs the health check.
    async fn check_health(&self) -> Result<HealthResponse, ClientError>;

    /// Submits one photo for analysis.
    async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResponse, ClientError>;

    /// Base URL the service is reached at, for user-facing messages.
    fn base_url(&self) -> &str;
}
