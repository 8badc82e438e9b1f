//! Screen state machine and event loop.
//!
//! All view state lives in [`ViewController`] and is only touched from the
//! task that drives it. Camera captures and service calls run elsewhere and
//! report back as [`ViewEvent`]s through the controller's channel.

use super::{Notice, Notification, Operation, Surface};
use crate::capture::{
    CameraError, CaptureController, CaptureOutcome, CaptureStart, CapturedPhoto,
    PermissionFollowUp,
};
use crate::client::{
    AnalysisService, AnalyzeRequest, AnalyzeResponse, ClientError, Field, HealthResponse,
};
use crate::codec;
use crate::metrics::MetricsRegistry;
use image::DynamicImage;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Whether an analyze cycle is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Waiting for a tap.
    Idle,
    /// A capture-encode-analyze cycle is running.
    Processing,
}

/// Input to the view: user actions, lifecycle changes and completions.
#[derive(Debug)]
pub enum ViewEvent {
    /// The capture trigger was pressed.
    Tap,
    /// Re-run the service health check.
    CheckHealth,
    /// The permission prompt issued under `ticket` was answered.
    PermissionResolved {
        /// Capture slot ticket the prompt belongs to.
        ticket: u64,
        /// Whether the user granted the permission.
        granted: bool,
    },
    /// The capture launched under `ticket` finished.
    CaptureResolved {
        /// Capture slot ticket the capture belongs to.
        ticket: u64,
        /// Photo or camera error.
        result: Result<CapturedPhoto, CameraError>,
    },
    /// A health check finished.
    HealthCompleted {
        /// Controller generation the check was started in.
        generation: u64,
        /// Parsed health body or transport error.
        result: Result<HealthResponse, ClientError>,
    },
    /// An analyze round trip finished.
    AnalyzeCompleted {
        /// Controller generation the request was started in.
        generation: u64,
        /// Parsed response or transport error.
        result: Result<AnalyzeResponse, ClientError>,
        /// Time from submission to completion.
        elapsed: Duration,
    },
    /// The screen went to the background.
    Pause,
    /// The screen came back to the foreground.
    Resume,
    /// Stop the event loop.
    Shutdown,
}

/// Owns the screen state and orchestrates capture, encoding and analysis.
pub struct ViewController<S: Surface> {
    surface: S,
    state: ViewState,
    capture: CaptureController,
    service: Arc<dyn AnalysisService>,
    jpeg_quality: u8,
    displayed: Option<DynamicImage>,
    /// Bumped on pause and resume; completions from older generations are
    /// dropped.
    generation: u64,
    in_flight: Vec<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<ViewEvent>,
    events_rx: mpsc::UnboundedReceiver<ViewEvent>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<S: Surface> ViewController<S> {
    /// Creates an idle controller drawing on `surface`.
    pub fn new(
        mut surface: S,
        capture: CaptureController,
        service: Arc<dyn AnalysisService>,
        jpeg_quality: u8,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        surface.set_busy(false);
        surface.set_trigger_enabled(true);

        Self {
            surface,
            state: ViewState::Idle,
            capture,
            service,
            jpeg_quality,
            displayed: None,
            generation: 0,
            in_flight: Vec::new(),
            events_tx,
            events_rx,
            metrics: None,
        }
    }

    /// Attaches a metrics registry.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns a sender for feeding events from other tasks or threads.
    pub fn sender(&self) -> mpsc::UnboundedSender<ViewEvent> {
        self.events_tx.clone()
    }

    /// Current screen state.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Current generation; bumped whenever outstanding work is cancelled.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The surface being drawn on.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The image currently on screen.
    pub fn displayed_image(&self) -> Option<&DynamicImage> {
        self.displayed.as_ref()
    }

    /// Number of service calls still running.
    pub fn in_flight(&mut self) -> usize {
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.len()
    }

    /// Screen creation: checks the service before the first capture.
    pub fn start(&mut self) {
        self.spawn_health_check();
    }

    /// Runs until [`ViewEvent::Shutdown`].
    pub async fn run(mut self) -> S {
        self.start();
        while self.step().await {}
        self.cancel_outstanding();
        self.surface
    }

    /// Waits for the next event and applies it.
    ///
    /// Returns false once the controller should stop.
    pub async fn step(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle(event),
            None => false,
        }
    }

    /// Applies one event. Returns false on shutdown.
    pub fn handle(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::Tap => self.on_tap(),
            ViewEvent::CheckHealth => self.spawn_health_check(),
            ViewEvent::PermissionResolved { ticket, granted } => {
                self.on_permission(ticket, granted)
            }
            ViewEvent::CaptureResolved { ticket, result } => self.on_capture(ticket, result),
            ViewEvent::HealthCompleted { generation, result } => {
                if self.is_current(generation, "health") {
                    self.on_health(result);
                }
            }
            ViewEvent::AnalyzeCompleted {
                generation,
                result,
                elapsed,
            } => {
                if self.is_current(generation, "analyze") {
                    self.on_analyze(result, elapsed);
                }
            }
            ViewEvent::Pause => self.on_pause(),
            ViewEvent::Resume => self.on_resume(),
            ViewEvent::Shutdown => {
                tracing::info!("View shutting down");
                self.cancel_outstanding();
                return false;
            }
        }
        true
    }

    fn on_tap(&mut self) {
        if self.state == ViewState::Processing {
            tracing::debug!("Tap ignored while processing");
            return;
        }

        match self.capture.begin() {
            CaptureStart::Launch => self.launch_capture(),
            CaptureStart::RequestPermission => {
                let Some(ticket) = self.capture.ticket() else {
                    return;
                };
                let granted = self.capture.request_permission();
                // Delivered like a platform callback, after this event
                let _ = self
                    .events_tx
                    .send(ViewEvent::PermissionResolved { ticket, granted });
            }
            CaptureStart::Busy => tracing::debug!("Tap ignored, capture flow outstanding"),
        }
    }

    fn on_permission(&mut self, ticket: u64, granted: bool) {
        match self.capture.resolve_permission(ticket, granted) {
            Some(PermissionFollowUp::Launch) => self.launch_capture(),
            Some(PermissionFollowUp::Denied) => {
                self.record_capture("denied");
                self.notify(Notice::PermissionDenied);
                self.notify(Notice::PermissionSettingsHint);
                self.enter_idle();
            }
            None => {}
        }
    }

    fn launch_capture(&mut self) {
        let Some(task) = self.capture.launch() else {
            tracing::warn!("No capture outstanding to launch");
            return;
        };
        self.enter_processing();
        tracing::info!(ticket = task.ticket(), "Launching capture");

        let tx = self.events_tx.clone();
        tokio::task::spawn_blocking(move || {
            let ticket = task.ticket();
            let result = task.run();
            let _ = tx.send(ViewEvent::CaptureResolved { ticket, result });
        });
    }

    fn on_capture(&mut self, ticket: u64, result: Result<CapturedPhoto, CameraError>) {
        let Some(outcome) = self.capture.resolve_capture(ticket, result) else {
            return;
        };

        match outcome {
            CaptureOutcome::Photo(photo) => {
                self.record_capture("photo");
                let shown = DynamicImage::ImageRgb8(photo.image().clone());
                self.show(shown);
                self.submit(&photo);
            }
            CaptureOutcome::Cancelled => {
                self.record_capture("cancelled");
                self.notify(Notice::CaptureCancelled);
                self.enter_idle();
            }
            CaptureOutcome::Failed(reason) => {
                self.record_capture("failed");
                self.notify(Notice::CaptureFailed(reason));
                self.enter_idle();
            }
        }
    }

    /// Encodes the photo and starts the analyze round trip.
    fn submit(&mut self, photo: &CapturedPhoto) {
        let encoded = match codec::encode_photo(photo, self.jpeg_quality) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode photo");
                self.notify(Notice::EncodeFailed(e.to_string()));
                self.enter_idle();
                return;
            }
        };
        tracing::info!(base64_len = encoded.len(), "Photo encoded, submitting");

        if let Some(metrics) = &self.metrics {
            metrics.record_analyze_submitted();
        }

        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        let generation = self.generation;
        let request = AnalyzeRequest::new(encoded);
        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let result = service.analyze(request).await;
            let _ = tx.send(ViewEvent::AnalyzeCompleted {
                generation,
                result,
                elapsed: started.elapsed(),
            });
        });
        self.track(handle);
    }

    fn on_analyze(&mut self, result: Result<AnalyzeResponse, ClientError>, elapsed: Duration) {
        self.enter_idle();

        match result {
            Ok(response) => self.render_response(response, elapsed),
            Err(e) => {
                tracing::error!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Analyze failed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_analyze_failed(e.kind());
                }
                let notice = Notice::for_error(Operation::Analyze, &e, self.service.base_url());
                self.notify(notice);
            }
        }
    }

    fn render_response(&mut self, response: AnalyzeResponse, elapsed: Duration) {
        tracing::info!(
            status = ?response.status.present(),
            message = ?response.message.present(),
            faces_count = ?response.faces_count.present(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis received"
        );
        if let Some(metrics) = &self.metrics {
            let faces = response.faces.present().map_or(0, Vec::len);
            metrics.record_analyze_completed(elapsed, faces);
        }

        for (field, reason) in response.required_field_problems() {
            self.notify(Notice::FieldMalformed {
                field: field.to_string(),
                reason,
            });
        }

        match response.processed_image {
            Field::Present(encoded) => match codec::decode_image(&encoded) {
                Ok(image) => self.show(image),
                Err(e) => {
                    tracing::error!(error = %e, "Processed image undecodable");
                    self.notify(Notice::ProcessedImageUndecodable(e.to_string()));
                }
            },
            Field::Missing => self.notify(Notice::ProcessedImageUnavailable),
            Field::Malformed(reason) => self.notify(Notice::FieldMalformed {
                field: "processed_image".to_string(),
                reason,
            }),
        }

        match response.faces {
            Field::Present(faces) => self.notify(Notice::FaceSummary(faces)),
            Field::Missing => self.notify(Notice::FacesUnavailable),
            Field::Malformed(reason) => self.notify(Notice::FieldMalformed {
                field: "faces".to_string(),
                reason,
            }),
        }
    }

    fn spawn_health_check(&mut self) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        let generation = self.generation;
        let handle = tokio::spawn(async move {
            let result = service.check_health().await;
            let _ = tx.send(ViewEvent::HealthCompleted { generation, result });
        });
        self.track(handle);
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.push(handle);
    }

    fn on_health(&mut self, result: Result<HealthResponse, ClientError>) {
        match result {
            Ok(health) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_health(Some(health.models_loaded));
                }
                if !health.models_loaded {
                    tracing::warn!(status = %health.status, "Service reachable but models not loaded");
                    self.notify(Notice::ModelsNotLoaded);
                }
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_health(None);
                }
                let notice = Notice::for_error(Operation::Health, &e, self.service.base_url());
                self.notify(notice);
            }
        }
    }

    fn on_pause(&mut self) {
        let cancelled = self.cancel_outstanding();
        tracing::info!(cancelled, "Screen paused");
    }

    fn on_resume(&mut self) {
        self.cancel_outstanding();
        self.capture.reset();
        self.enter_idle();
        tracing::info!(generation = self.generation, "Screen resumed, state reset");
    }

    /// Aborts every running service call and invalidates their completions.
    fn cancel_outstanding(&mut self) -> usize {
        let count = self.in_flight();
        for handle in self.in_flight.drain(..) {
            handle.abort();
        }
        self.generation += 1;
        count
    }

    fn is_current(&self, generation: u64, operation: &str) -> bool {
        if generation != self.generation {
            tracing::warn!(
                operation,
                generation,
                current = self.generation,
                "Ignoring late completion"
            );
            return false;
        }
        true
    }

    fn enter_processing(&mut self) {
        self.state = ViewState::Processing;
        self.surface.set_busy(true);
        self.surface.set_trigger_enabled(false);
        if let Some(metrics) = &self.metrics {
            metrics.set_processing(true);
        }
    }

    fn enter_idle(&mut self) {
        self.state = ViewState::Idle;
        self.surface.set_busy(false);
        self.surface.set_trigger_enabled(true);
        if let Some(metrics) = &self.metrics {
            metrics.set_processing(false);
        }
    }

    fn show(&mut self, image: DynamicImage) {
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            "Displaying image"
        );
        self.surface.show_image(&image);
        self.displayed = Some(image);
    }

    fn notify(&mut self, notice: Notice) {
        if notice.is_error() {
            tracing::warn!(kind = notice.kind(), "{}", notice.message());
        } else {
            tracing::info!(kind = notice.kind(), "{}", notice.message());
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_notification(notice.kind());
        }
        self.surface.notify(&Notification::new(notice));
    }

    fn record_capture(&self, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_capture(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        Camera, CaptureConfig, MockCamera, MockShot, PermissionPolicy, StaticPermission,
    };
    use crate::client::{FaceResult, HealthResponse};
    use crate::view::RecordingSurface;
    use async_trait::async_trait;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type Reply<T> = Box<dyn Fn() -> Result<T, ClientError> + Send + Sync>;

    struct FakeService {
        health: Reply<HealthResponse>,
        analyze: Reply<AnalyzeResponse>,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn new(analyze: Reply<AnalyzeResponse>) -> Self {
            Self {
                health: Box::new(|| Ok(health(true))),
                analyze,
                gate: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn with_health(mut self, reply: Reply<HealthResponse>) -> Self {
            self.health = reply;
            self
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl AnalysisService for FakeService {
        async fn check_health(&self) -> Result<HealthResponse, ClientError> {
            (self.health)()
        }

        async fn analyze(&self, _request: AnalyzeRequest) -> Result<AnalyzeResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            (self.analyze)()
        }

        fn base_url(&self) -> &str {
            "http://10.0.0.1:5000"
        }
    }

    fn health(models_loaded: bool) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            message: "Server is running".to_string(),
            models_loaded,
        }
    }

    fn faces() -> Vec<FaceResult> {
        vec![
            FaceResult {
                age: 25,
                gender: "Male".to_string(),
                confidence: 0.93,
            },
            FaceResult {
                age: 31,
                gender: "Female".to_string(),
                confidence: 0.88,
            },
        ]
    }

    fn response(processed_image: Field<String>, faces: Field<Vec<FaceResult>>) -> AnalyzeResponse {
        AnalyzeResponse {
            status: Field::Present("success".to_string()),
            message: Field::Present("Image processed successfully".to_string()),
            faces_count: Field::Present(2),
            processed_image,
            faces,
        }
    }

    fn processed_jpeg() -> String {
        codec::encode_rgb(&RgbImage::new(40, 30), 90).unwrap()
    }

    fn full_response() -> AnalyzeResponse {
        response(Field::Present(processed_jpeg()), Field::Present(faces()))
    }

    fn controller(
        policy: PermissionPolicy,
        shots: Vec<MockShot>,
        service: Arc<FakeService>,
    ) -> ViewController<RecordingSurface> {
        let mut camera = MockCamera::new().script(shots);
        camera.open(&CaptureConfig::with_dimensions(32, 24)).unwrap();
        let capture =
            CaptureController::new(Box::new(StaticPermission::new(policy)), Box::new(camera));
        ViewController::new(RecordingSurface::new(), capture, service, 100)
    }

    async fn next(view: &mut ViewController<RecordingSurface>) {
        let stepped = tokio::time::timeout(Duration::from_secs(5), view.step())
            .await
            .expect("no event within 5s");
        assert!(stepped);
    }

    fn assert_idle(view: &ViewController<RecordingSurface>) {
        assert_eq!(view.state(), ViewState::Idle);
        assert!(view.surface().trigger_enabled);
        assert!(!view.surface().busy);
    }

    #[tokio::test]
    async fn test_successful_cycle() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);
        assert!(view.surface().busy);
        assert!(!view.surface().trigger_enabled);

        next(&mut view).await; // capture
        assert_eq!(view.surface().shown, vec![(32, 24)]);
        next(&mut view).await; // analyze

        assert_idle(&view);
        assert_eq!(view.surface().shown, vec![(32, 24), (40, 30)]);
        assert_eq!(view.surface().kinds(), vec!["face_summary"]);
        let summary = view.surface().notifications[0].message();
        let first = summary.find("Age: 25").unwrap();
        let second = summary.find("Age: 31").unwrap();
        assert!(first < second);
        assert!(summary.contains("Confidence: 0.88"));
        let displayed = view.displayed_image().unwrap();
        assert_eq!((displayed.width(), displayed.height()), (40, 30));
    }

    #[tokio::test]
    async fn test_second_tap_ignored_while_processing() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response()))).gated(Arc::clone(&gate)),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], Arc::clone(&service));

        view.handle(ViewEvent::Tap);
        next(&mut view).await; // capture, analyze now in flight
        view.handle(ViewEvent::Tap);
        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);

        gate.notify_one();
        next(&mut view).await;
        assert_idle(&view);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.surface().shown.len(), 2);
    }

    #[tokio::test]
    async fn test_capture_cancel_returns_idle() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(
            PermissionPolicy::Granted,
            vec![MockShot::Cancel],
            Arc::clone(&service),
        );

        view.handle(ViewEvent::Tap);
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["capture_cancelled"]);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_capture_failure_returns_idle() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(
            PermissionPolicy::Granted,
            vec![MockShot::Fail("no camera app".to_string())],
            service,
        );

        view.handle(ViewEvent::Tap);
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["capture_failed"]);
    }

    #[tokio::test]
    async fn test_permission_denied_stays_idle() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(PermissionPolicy::Denied, vec![], service);

        view.handle(ViewEvent::Tap);
        assert_idle(&view);
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(
            view.surface().kinds(),
            vec!["permission_denied", "permission_settings_hint"]
        );
        assert!(view.surface().shown.is_empty());
    }

    #[tokio::test]
    async fn test_permission_prompt_then_capture() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(PermissionPolicy::GrantOnRequest, vec![], service);

        view.handle(ViewEvent::Tap);
        view.handle(ViewEvent::Tap); // prompt outstanding
        next(&mut view).await; // permission granted, capture launched
        assert_eq!(view.state(), ViewState::Processing);

        next(&mut view).await;
        next(&mut view).await;
        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["face_summary"]);
    }

    #[tokio::test]
    async fn test_missing_processed_image_keeps_prior() {
        let service = Arc::new(FakeService::new(Box::new(|| {
            Ok(response(Field::Missing, Field::Present(faces())))
        })));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().shown, vec![(32, 24)]);
        let displayed = view.displayed_image().unwrap();
        assert_eq!((displayed.width(), displayed.height()), (32, 24));
        assert_eq!(
            view.surface().kinds(),
            vec!["processed_image_unavailable", "face_summary"]
        );
    }

    #[tokio::test]
    async fn test_undecodable_processed_image_keeps_prior() {
        let service = Arc::new(FakeService::new(Box::new(|| {
            Ok(response(
                Field::Present("bm90IGEganBlZw==".to_string()),
                Field::Missing,
            ))
        })));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().shown.len(), 1);
        assert_eq!(
            view.surface().kinds(),
            vec!["processed_image_undecodable", "faces_unavailable"]
        );
    }

    #[tokio::test]
    async fn test_malformed_fields_reported_individually() {
        let service = Arc::new(FakeService::new(Box::new(|| {
            let mut reply = full_response();
            reply.status = Field::Missing;
            reply.faces_count = Field::Malformed("expected u32".to_string());
            Ok(reply)
        })));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(
            view.surface().kinds(),
            vec!["field_malformed", "field_malformed", "face_summary"]
        );
        assert_eq!(view.surface().shown.len(), 2);
    }

    #[tokio::test]
    async fn test_no_connection_notice() {
        let service = Arc::new(FakeService::new(Box::new(|| {
            Err(ClientError::Unreachable {
                url: "http://10.0.0.1:5000/analyze".to_string(),
                reason: "connection refused".to_string(),
            })
        })));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["unreachable"]);
        assert!(matches!(
            view.surface().notifications[0].notice,
            Notice::Unreachable {
                operation: Operation::Analyze,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout_notice() {
        let service = Arc::new(FakeService::new(Box::new(|| {
            Err(ClientError::Timeout {
                url: "http://10.0.0.1:5000/analyze".to_string(),
                attempts: 2,
            })
        })));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["timeout"]);
    }

    #[tokio::test]
    async fn test_models_not_loaded_warns_but_allows_capture() {
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response())))
                .with_health(Box::new(|| Ok(health(false)))),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.start();
        next(&mut view).await;
        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["models_not_loaded"]);

        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);
    }

    #[tokio::test]
    async fn test_health_unparseable() {
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response()))).with_health(Box::new(|| {
                Err(ClientError::Body(
                    serde_json::from_str::<HealthResponse>("{}").unwrap_err(),
                ))
            })),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::CheckHealth);
        next(&mut view).await;
        assert_eq!(view.surface().kinds(), vec!["health_malformed"]);
    }

    #[tokio::test]
    async fn test_resume_resets_and_drops_late_completion() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response()))).gated(Arc::clone(&gate)),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        assert_eq!(view.state(), ViewState::Processing);
        let stale = view.generation();

        view.handle(ViewEvent::Resume);
        assert_idle(&view);
        assert_eq!(view.in_flight(), 0);

        view.handle(ViewEvent::AnalyzeCompleted {
            generation: stale,
            result: Ok(full_response()),
            elapsed: Duration::ZERO,
        });
        assert_idle(&view);
        assert!(view.surface().notifications.is_empty());
        assert_eq!(view.surface().shown.len(), 1);
    }

    #[tokio::test]
    async fn test_pause_then_resume_allows_new_capture() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response()))).gated(Arc::clone(&gate)),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;
        let before = view.generation();

        view.handle(ViewEvent::Pause);
        assert!(view.generation() > before);
        assert_eq!(view.in_flight(), 0);

        view.handle(ViewEvent::Resume);
        assert_idle(&view);

        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);
    }

    #[tokio::test]
    async fn test_capture_from_before_resume_is_dropped() {
        let gate = Arc::new(Notify::new());
        let service = Arc::new(
            FakeService::new(Box::new(|| Ok(full_response()))).gated(Arc::clone(&gate)),
        );
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        view.handle(ViewEvent::Tap);
        let stale = view.capture.ticket().unwrap();
        view.handle(ViewEvent::Resume);
        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);

        // A late photo from the first tap must not stand in for the new one
        view.handle(ViewEvent::CaptureResolved {
            ticket: stale,
            result: Ok(CapturedPhoto::new(RgbImage::new(8, 8), 99)),
        });
        assert!(view.surface().shown.is_empty());
        assert_eq!(view.state(), ViewState::Processing);

        next(&mut view).await;
        next(&mut view).await;
        assert_eq!(view.surface().shown, vec![(32, 24)]);
        assert_eq!(view.in_flight(), 1);
        assert!(!view.capture.is_pending());
    }

    #[tokio::test]
    async fn test_encode_failure_returns_idle() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        // Wider than a JPEG can be
        let mut camera = MockCamera::new();
        camera
            .open(&CaptureConfig::with_dimensions(70_000, 1))
            .unwrap();
        let capture = CaptureController::new(
            Box::new(StaticPermission::new(PermissionPolicy::Granted)),
            Box::new(camera),
        );
        let mut view =
            ViewController::new(RecordingSurface::new(), capture, Arc::clone(&service) as Arc<dyn AnalysisService>, 100);

        view.handle(ViewEvent::Tap);
        next(&mut view).await;

        assert_idle(&view);
        assert_eq!(view.surface().kinds(), vec!["encode_failed"]);
        assert_eq!(view.in_flight(), 0);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        view.handle(ViewEvent::Tap);
        assert_eq!(view.state(), ViewState::Processing);
    }

    #[tokio::test]
    async fn test_finished_calls_not_retained() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);

        for _ in 0..5 {
            view.handle(ViewEvent::CheckHealth);
            next(&mut view).await;
        }
        assert!(view.in_flight.len() <= 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let service = Arc::new(FakeService::new(Box::new(|| Ok(full_response()))));
        let mut view = controller(PermissionPolicy::Granted, vec![], service);
        assert!(!view.handle(ViewEvent::Shutdown));
    }
}
