//! User-facing notifications.

use crate::client::{ClientError, FaceResult, TransportKind};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

/// Which service call a transport notice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `GET /health`.
    Health,
    /// `POST /analyze`.
    Analyze,
}

/// How long a notification stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// A few seconds.
    Short,
    /// Long enough to read a checklist.
    Long,
}

/// Everything the view can tell the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The camera permission was refused.
    PermissionDenied,
    /// Follows a refusal: where to grant it.
    PermissionSettingsHint,
    /// The capture flow returned no photo.
    CaptureCancelled,
    /// The camera failed.
    CaptureFailed(String),
    /// The request body could not be built.
    EncodeFailed(String),
    /// No connection to the service.
    Unreachable {
        /// Call that failed.
        operation: Operation,
        /// Endpoint that could not be reached.
        url: String,
    },
    /// The service did not answer in time.
    Timeout {
        /// Call that timed out.
        operation: Operation,
    },
    /// Any other request failure.
    TransportOther {
        /// Call that failed.
        operation: Operation,
        /// Raw error text.
        message: String,
    },
    /// One response field was missing or unreadable.
    FieldMalformed {
        /// Response field name.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The response had no annotated image.
    ProcessedImageUnavailable,
    /// The annotated image could not be decoded.
    ProcessedImageUndecodable(String),
    /// The response had no face list.
    FacesUnavailable,
    /// Per-face results, in response order.
    FaceSummary(Vec<FaceResult>),
    /// The service is up but cannot analyze.
    ModelsNotLoaded,
    /// The health body could not be read.
    HealthMalformed(String),
}

impl Notice {
    /// Notice for a failed service call.
    ///
    /// `base_url` is used when the error does not name the URL itself.
    pub fn for_error(operation: Operation, error: &ClientError, base_url: &str) -> Self {
        if let (Operation::Health, ClientError::Body(e)) = (operation, error) {
            return Notice::HealthMalformed(e.to_string());
        }
        match error.kind() {
            TransportKind::Unreachable => Notice::Unreachable {
                operation,
                url: match error {
                    ClientError::Unreachable { url, .. } => url.clone(),
                    _ => base_url.to_string(),
                },
            },
            TransportKind::Timeout => Notice::Timeout { operation },
            TransportKind::Other => Notice::TransportOther {
                operation,
                message: error.to_string(),
            },
        }
    }

    /// Stable identifier, used for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::PermissionDenied => "permission_denied",
            Notice::PermissionSettingsHint => "permission_settings_hint",
            Notice::CaptureCancelled => "capture_cancelled",
            Notice::CaptureFailed(_) => "capture_failed",
            Notice::EncodeFailed(_) => "encode_failed",
            Notice::Unreachable { .. } => "unreachable",
            Notice::Timeout { .. } => "timeout",
            Notice::TransportOther { .. } => "transport_other",
            Notice::FieldMalformed { .. } => "field_malformed",
            Notice::ProcessedImageUnavailable => "processed_image_unavailable",
            Notice::ProcessedImageUndecodable(_) => "processed_image_undecodable",
            Notice::FacesUnavailable => "faces_unavailable",
            Notice::FaceSummary(_) => "face_summary",
            Notice::ModelsNotLoaded => "models_not_loaded",
            Notice::HealthMalformed(_) => "health_malformed",
        }
    }

    /// How long the notice stays up.
    pub fn length(&self) -> Length {
        match self {
            Notice::PermissionSettingsHint
            | Notice::Unreachable { .. }
            | Notice::Timeout { .. }
            | Notice::FaceSummary(_)
            | Notice::ModelsNotLoaded
            | Notice::HealthMalformed(_) => Length::Long,
            Notice::TransportOther { operation, .. } => match operation {
                Operation::Health => Length::Long,
                Operation::Analyze => Length::Short,
            },
            _ => Length::Short,
        }
    }

    /// True for notices that report something going wrong.
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::FaceSummary(_))
    }

    /// True when the cycle ended without an analysis result.
    pub fn aborts_cycle(&self) -> bool {
        matches!(
            self,
            Notice::PermissionDenied
                | Notice::CaptureCancelled
                | Notice::CaptureFailed(_)
                | Notice::EncodeFailed(_)
                | Notice::Unreachable { .. }
                | Notice::Timeout { .. }
                | Notice::TransportOther { .. }
        )
    }

    /// Text shown to the user.
    pub fn message(&self) -> String {
        match self {
            Notice::PermissionDenied => "Camera permission is required".to_string(),
            Notice::PermissionSettingsHint => {
                "Please enable the camera permission in your settings".to_string()
            }
            Notice::CaptureCancelled => "Could not capture a photo".to_string(),
            Notice::CaptureFailed(reason) => format!("Could not capture a photo: {reason}"),
            Notice::EncodeFailed(reason) => format!("Could not build the request: {reason}"),
            Notice::Unreachable { operation, url } => {
                let mut text = String::from(
                    "Cannot connect to the server. Please check that:\n\
                     1. The analysis server is running\n\
                     2. It is listening on the right port (5000)\n\
                     3. It listens on all interfaces (host='0.0.0.0')\n\
                     4. You are on the same network\n\
                     5. Your firewall allows the connection",
                );
                if *operation == Operation::Health {
                    let _ = write!(text, "\n6. The server address is correct: {url}");
                }
                text
            }
            Notice::Timeout { operation } => {
                let mut text = String::from(
                    "The server did not respond. Please check that:\n\
                     1. The analysis server is running\n\
                     2. The server responds in reasonable time",
                );
                if *operation == Operation::Health {
                    text.push_str("\n3. Your network connection works");
                }
                text
            }
            Notice::TransportOther { operation, message } => match operation {
                Operation::Health => format!("Connection error: {message}"),
                Operation::Analyze => format!("Error: {message}"),
            },
            Notice::FieldMalformed { field, reason } => {
                format!("Response field '{field}' could not be read: {reason}")
            }
            Notice::ProcessedImageUnavailable => "Processed image unavailable".to_string(),
            Notice::ProcessedImageUndecodable(_) => {
                "Processed image could not be decoded".to_string()
            }
            Notice::FacesUnavailable => "Face details unavailable".to_string(),
            Notice::FaceSummary(faces) => face_summary(faces),
            Notice::ModelsNotLoaded => {
                "The server could not load its models. Please check the server logs.".to_string()
            }
            Notice::HealthMalformed(reason) => {
                format!("Could not process the server response: {reason}")
            }
        }
    }
}

fn face_summary(faces: &[FaceResult]) -> String {
    if faces.is_empty() {
        return "No faces detected".to_string();
    }

    let mut text = String::new();
    for face in faces {
        let _ = write!(
            text,
            "Age: {}\nGender: {}\nConfidence: {}\n\n",
            face.age, face.gender, face.confidence
        );
    }
    text.truncate(text.trim_end().len());
    text
}

/// A notice as raised at a point in time.
#[derive(Debug, Clone)]
pub struct Notification {
    /// What happened.
    pub notice: Notice,
    /// When it was raised.
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    /// Stamps `notice` with the current time.
    pub fn new(notice: Notice) -> Self {
        Self {
            notice,
            raised_at: Utc::now(),
        }
    }

    /// Text shown to the user.
    pub fn message(&self) -> String {
        self.notice.message()
    }

    /// How long the notice stays up.
    pub fn length(&self) -> Length {
        self.notice.length()
    }
}
