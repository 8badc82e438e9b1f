//! Camera permission, photo capture and capture-flow coordination.
//!
//! This module provides the camera abstraction, the permission gate, and
//! the controller that ties a permission prompt and a capture flow to a
//! single pending-operation slot.

mod camera;
mod config;
mod controller;
mod permission;
mod photo;

#[cfg(feature = "camera")]
pub use camera::DeviceCamera;
pub use camera::{open_camera, Camera, CameraError, FileCamera, MockCamera, MockShot};
pub use config::{CameraSource, CaptureConfig, PermissionPolicy};
pub use controller::{
    CaptureController, CaptureOutcome, CaptureStart, CaptureTask, PermissionFollowUp,
};
pub use permission::{PermissionGate, StaticPermission};
pub use photo::CapturedPhoto;
