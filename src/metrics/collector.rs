//! Metrics collection and registry.

use crate::client::TransportKind;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Prometheus metrics registry for client activity.
pub struct MetricsRegistry {
    registry: Registry,

    // Capture metrics
    captures_total: IntCounterVec,

    // Service metrics
    health_checks_total: IntCounter,
    models_loaded: IntGauge,
    analyze_requests_total: IntCounter,
    analyze_failures_total: IntCounterVec,
    round_trip_seconds: Histogram,
    faces_detected_total: IntCounter,

    // View metrics
    processing: IntGauge,
    notifications_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all client metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let captures_total = IntCounterVec::new(
            Opts::new(
                "face_client_captures_total",
                "Capture attempts by outcome (photo, cancelled, failed, denied)",
            ),
            &["outcome"],
        )?;

        let health_checks_total = IntCounter::new(
            "face_client_health_checks_total",
            "Health checks completed",
        )?;
        let models_loaded = IntGauge::new(
            "face_client_service_models_loaded",
            "Whether the service last reported its models loaded (1=yes, 0=no, -1=unknown)",
        )?;
        models_loaded.set(-1);
        let analyze_requests_total = IntCounter::new(
            "face_client_analyze_requests_total",
            "Analyze requests submitted",
        )?;
        let analyze_failures_total = IntCounterVec::new(
            Opts::new(
                "face_client_analyze_failures_total",
                "Analyze requests that failed, by transport classification",
            ),
            &["kind"],
        )?;
        let round_trip_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "face_client_analyze_round_trip_seconds",
                "Analyze round-trip time including retries",
            )
            .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;
        let faces_detected_total = IntCounter::new(
            "face_client_faces_detected_total",
            "Faces reported by the service",
        )?;

        let processing = IntGauge::new(
            "face_client_processing",
            "Whether an analyze cycle is in progress (1=processing, 0=idle)",
        )?;
        let notifications_total = IntCounterVec::new(
            Opts::new(
                "face_client_notifications_total",
                "User notifications raised, by kind",
            ),
            &["kind"],
        )?;

        registry.register(Box::new(captures_total.clone()))?;
        registry.register(Box::new(health_checks_total.clone()))?;
        registry.register(Box::new(models_loaded.clone()))?;
        registry.register(Box::new(analyze_requests_total.clone()))?;
        registry.register(Box::new(analyze_failures_total.clone()))?;
        registry.register(Box::new(round_trip_seconds.clone()))?;
        registry.register(Box::new(faces_detected_total.clone()))?;
        registry.register(Box::new(processing.clone()))?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            registry,
            captures_total,
            health_checks_total,
            models_loaded,
            analyze_requests_total,
            analyze_failures_total,
            round_trip_seconds,
            faces_detected_total,
            processing,
            notifications_total,
        })
    }

    /// Counts one capture flow by outcome.
    pub fn record_capture(&self, outcome: &str) {
        self.captures_total.with_label_values(&[outcome]).inc();
    }

    /// Counts a health check; `None` when it failed.
    pub fn record_health(&self, models_loaded: Option<bool>) {
        self.health_checks_total.inc();
        self.models_loaded.set(match models_loaded {
            Some(true) => 1,
            Some(false) => 0,
            None => -1,
        });
    }

    /// Counts a submitted photo.
    pub fn record_analyze_submitted(&self) {
        self.analyze_requests_total.inc();
    }

    /// Records a completed analyze round trip.
    pub fn record_analyze_completed(&self, elapsed: Duration, faces: usize) {
        self.round_trip_seconds.observe(elapsed.as_secs_f64());
        self.faces_detected_total.inc_by(faces as u64);
    }

    /// Counts a failed round trip by transport kind.
    pub fn record_analyze_failed(&self, kind: TransportKind) {
        let label = match kind {
            TransportKind::Unreachable => "unreachable",
            TransportKind::Timeout => "timeout",
            TransportKind::Other => "other",
        };
        self.analyze_failures_total.with_label_values(&[label]).inc();
    }

    /// Mirrors the view state.
    pub fn set_processing(&self, processing: bool) {
        self.processing.set(i64::from(processing));
    }

    /// Counts a notification by kind.
    pub fn record_notification(&self, kind: &str) {
        self.notifications_total.with_label_values(&[kind]).inc();
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
