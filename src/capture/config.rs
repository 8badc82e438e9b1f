//! Camera capture configuration.
//!
//! The capture flow needs to know which camera source to launch, the frame
//! size to request from it, how the camera permission behaves, and the JPEG
//! quality used when the photo is handed to the codec.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Which camera source the capture flow launches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum CameraSource {
    /// Synthetic frames, no hardware required.
    Mock,
    /// A still image on disk, re-read on every capture.
    File { path: PathBuf },
    /// A physical camera (requires the `camera` feature).
    Device,
}

impl Default for CameraSource {
    fn default() -> Self {
        CameraSource::Mock
    }
}

impl FromStr for CameraSource {
    type Err = ConfigError;

    /// Parses `mock`, `device` or `file:<path>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mock" => Ok(CameraSource::Mock),
            "device" => Ok(CameraSource::Device),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(CameraSource::File {
                    path: PathBuf::from(path),
                }),
                _ => Err(ConfigError::InvalidSource(other.to_string())),
            },
        }
    }
}

/// How the camera permission gate answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    /// Permission already held.
    Granted,
    /// Every request is refused.
    Denied,
    /// Not held until requested once, then remembered.
    GrantOnRequest,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        PermissionPolicy::GrantOnRequest
    }
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera source to launch.
    pub source: CameraSource,
    /// Camera device index (device source only).
    pub device_id: u32,
    /// Requested frame width in pixels.
    pub width: u32,
    /// Requested frame height in pixels.
    pub height: u32,
    /// Frames discarded after opening the stream while exposure settles.
    pub warmup_frames: u32,
    /// JPEG quality used for upload (1-100).
    pub jpeg_quality: u8,
    /// Camera permission behaviour.
    pub permission: PermissionPolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CameraSource::default(),
            device_id: 0,
            width: 640,
            height: 480,
            warmup_frames: 5,
            jpeg_quality: 100,
            permission: PermissionPolicy::default(),
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }
}
