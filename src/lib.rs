//! Face Analysis Client Library
//!
//! A single-screen client for a remote face-analysis service. It captures a
//! photo, sends it as base64 JPEG to the service, and shows the annotated
//! image together with the age, gender and confidence of every detected
//! face. All detection and inference happen server-side.
//!
//! # Architecture
//!
//! ```text
//! view ─► capture (permission + photo) ─► codec (encode) ─► client (POST /analyze)
//!   ▲                                                            │
//!   └──────────────── codec (decode) ◄───────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single owner**: all screen state lives in one task; everything
//!   asynchronous reports back through a channel
//! - **One analyze at a time**: the `Processing` state gates new captures
//! - **Never fatal**: every failure becomes a notification and the screen
//!   returns to `Idle`
//! - **Field-by-field parsing**: one bad response field never hides the rest
//!
//! # Example
//!
//! ```no_run
//! use face_analysis_client::{
//!     capture::{Camera, CaptureConfig, CaptureController, MockCamera, PermissionPolicy, StaticPermission},
//!     client::AnalysisClient,
//!     view::{RecordingSurface, ViewController, ViewEvent},
//! };
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut camera = MockCamera::new();
//! camera.open(&CaptureConfig::default())?;
//! let capture = CaptureController::new(
//!     Box::new(StaticPermission::new(PermissionPolicy::Granted)),
//!     Box::new(camera),
//! );
//! let client = Arc::new(AnalysisClient::new("http://192.168.1.105:5000")?);
//!
//! let view = ViewController::new(RecordingSurface::new(), capture, client, 100);
//! let events = view.sender();
//! events.send(ViewEvent::Tap)?;
//! let surface = view.run().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod client;
pub mod codec;
pub mod config;
pub mod metrics;
pub mod view;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, CaptureController, CapturedPhoto, MockCamera};
pub use client::{AnalysisClient, AnalysisService, AnalyzeResponse, FaceResult, HealthResponse};
pub use config::FileConfig;
pub use view::{Notice, Surface, ViewController, ViewEvent, ViewState};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
