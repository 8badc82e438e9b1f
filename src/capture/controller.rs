//! Capture flow coordination.
//!
//! The permission prompt and the capture flow both complete
//! asynchronously. The controller keeps a single pending slot, stamped
//! with a ticket each time it is filled. A completion is only accepted if
//! its ticket answers the operation currently outstanding; anything else is
//! stale and dropped, even when a newer operation of the same kind is
//! waiting.

use super::{Camera, CameraError, CapturedPhoto, PermissionGate};
use std::sync::{Arc, Mutex};

/// Result of one capture flow, as seen by the view.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// A photo was taken.
    Photo(CapturedPhoto),
    /// The user backed out of the capture flow.
    Cancelled,
    /// The camera failed.
    Failed(String),
}

/// What the caller must do after [`CaptureController::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStart {
    /// Permission held: launch the capture flow.
    Launch,
    /// Permission missing: prompt, then report via `resolve_permission`.
    RequestPermission,
    /// Another permission prompt or capture is already outstanding.
    Busy,
}

/// What the caller must do after a permission prompt completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionFollowUp {
    /// Permission granted: launch the capture flow.
    Launch,
    /// Permission refused; the slot is clear again.
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Permission(u64),
    Capture(u64),
}

/// Handle to run one capture on a blocking thread.
pub struct CaptureTask {
    camera: Arc<Mutex<Box<dyn Camera + Send>>>,
    ticket: u64,
}

impl CaptureTask {
    /// Ticket to hand back to [`CaptureController::resolve_capture`].
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// Runs the capture flow. Blocks until the camera answers.
    pub fn run(self) -> Result<CapturedPhoto, CameraError> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| CameraError::CaptureFailed("camera lock poisoned".to_string()))?;
        if !camera.is_open() {
            return Err(CameraError::NotInitialized);
        }
        camera.capture()
    }
}

/// Owns the permission gate, the camera and the pending-operation slot.
pub struct CaptureController {
    gate: Box<dyn PermissionGate + Send>,
    camera: Arc<Mutex<Box<dyn Camera + Send>>>,
    pending: Option<Pending>,
    last_ticket: u64,
}

impl CaptureController {
    /// Creates a controller over an opened camera.
    pub fn new(gate: Box<dyn PermissionGate + Send>, camera: Box<dyn Camera + Send>) -> Self {
        Self {
            gate,
            camera: Arc::new(Mutex::new(camera)),
            pending: None,
            last_ticket: 0,
        }
    }

    /// Ticket of the outstanding operation, if any.
    pub fn ticket(&self) -> Option<u64> {
        match self.pending {
            Some(Pending::Permission(ticket) | Pending::Capture(ticket)) => Some(ticket),
            None => None,
        }
    }

    /// Starts a capture attempt.
    pub fn begin(&mut self) -> CaptureStart {
        if self.pending.is_some() {
            return CaptureStart::Busy;
        }

        self.last_ticket += 1;
        let ticket = self.last_ticket;
        let granted = self.gate.is_granted();
        tracing::debug!(granted, ticket, "Camera permission check");
        if granted {
            self.pending = Some(Pending::Capture(ticket));
            CaptureStart::Launch
        } else {
            self.pending = Some(Pending::Permission(ticket));
            CaptureStart::RequestPermission
        }
    }

    /// Prompts for the camera permission.
    pub fn request_permission(&mut self) -> bool {
        tracing::info!("Requesting camera permission");
        self.gate.request()
    }

    /// Accepts the answer to the prompt issued under `ticket`.
    ///
    /// Returns `None` if that prompt is no longer outstanding.
    pub fn resolve_permission(&mut self, ticket: u64, granted: bool) -> Option<PermissionFollowUp> {
        if self.pending != Some(Pending::Permission(ticket)) {
            tracing::debug!(ticket, granted, "Ignoring stale permission result");
            return None;
        }

        if granted {
            tracing::info!("Camera permission granted");
            self.pending = Some(Pending::Capture(ticket));
            Some(PermissionFollowUp::Launch)
        } else {
            tracing::info!("Camera permission denied");
            self.pending = None;
            Some(PermissionFollowUp::Denied)
        }
    }

    /// Returns a task that performs the capture the slot is waiting for.
    ///
    /// Returns `None` unless a capture is outstanding.
    pub fn launch(&self) -> Option<CaptureTask> {
        match self.pending {
            Some(Pending::Capture(ticket)) => Some(CaptureTask {
                camera: Arc::clone(&self.camera),
                ticket,
            }),
            _ => None,
        }
    }

    /// Accepts the result of the capture launched under `ticket`.
    ///
    /// Returns `None` if that capture is no longer outstanding.
    pub fn resolve_capture(
        &mut self,
        ticket: u64,
        result: Result<CapturedPhoto, CameraError>,
    ) -> Option<CaptureOutcome> {
        if self.pending != Some(Pending::Capture(ticket)) {
            tracing::debug!(ticket, "Ignoring stale capture result");
            return None;
        }
        self.pending = None;

        let outcome = match result {
            Ok(photo) if photo.is_valid() => {
                tracing::info!(
                    width = photo.width(),
                    height = photo.height(),
                    sequence = photo.sequence(),
                    "Photo captured"
                );
                CaptureOutcome::Photo(photo)
            }
            Ok(_) => {
                tracing::error!("Camera returned an empty photo");
                CaptureOutcome::Failed("empty photo".to_string())
            }
            Err(CameraError::Cancelled) => {
                tracing::info!("Capture cancelled");
                CaptureOutcome::Cancelled
            }
            Err(e) => {
                tracing::error!(error = %e, "Capture failed");
                CaptureOutcome::Failed(e.to_string())
            }
        };
        Some(outcome)
    }

    /// Returns true while a permission prompt or capture is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops whatever is outstanding.
    pub fn reset(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(?pending, "Capture slot cleared");
        }
    }
}
