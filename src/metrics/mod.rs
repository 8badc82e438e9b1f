//! Prometheus metrics exporter for client activity.
//!
//! # Metrics Exposed
//!
//! ## Capture Metrics
//! - `face_client_captures_total{outcome}` - Capture attempts by outcome
//!
//! ## Service Metrics
//! - `face_client_health_checks_total` - Health checks completed
//! - `face_client_service_models_loaded` - Last reported model state (1/0/-1)
//! - `face_client_analyze_requests_total` - Analyze requests submitted
//! - `face_client_analyze_failures_total{kind}` - Failures by classification
//! - `face_client_analyze_round_trip_seconds` - Round-trip histogram
//! - `face_client_faces_detected_total` - Faces reported by the service
//!
//! ## View Metrics
//! - `face_client_processing` - 1 while an analyze cycle is in progress
//! - `face_client_notifications_total{kind}` - Notifications raised
//!
//! The registry is always available; serving it over HTTP requires the
//! `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
