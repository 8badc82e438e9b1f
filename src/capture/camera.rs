//! Camera abstraction for photo capture.
//!
//! This module provides a trait-based abstraction over the capture flow,
//! allowing real camera hardware, still images on disk and mock
//! implementations for testing to be swapped freely.

use super::{CameraSource, CaptureConfig, CapturedPhoto};
use image::{Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No camera matches the configured source.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The camera exists but could not be opened.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The capture settings were rejected.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// The camera failed while taking a photo.
    #[error("failed to capture photo: {0}")]
    CaptureFailed(String),
    /// The capture flow ended without a photo.
    #[error("capture cancelled")]
    Cancelled,
    /// Capture was attempted before `open`.
    #[error("camera not initialized")]
    NotInitialized,
}

/// Trait for camera implementations.
///
/// `capture` is a blocking call that plays the role of the platform capture
/// flow: it either yields a photo, reports that the user backed out
/// ([`CameraError::Cancelled`]), or fails.
pub trait Camera {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single photo.
    fn capture(&mut self) -> Result<CapturedPhoto, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Scripted result for the next [`MockCamera`] capture.
#[derive(Debug, Clone)]
pub enum MockShot {
    /// Produce a synthetic photo.
    Photo,
    /// Behave as if the user backed out.
    Cancel,
    /// Fail with the given reason.
    Fail(String),
}

/// Mock camera for testing that generates synthetic photos.
///
/// By default every capture succeeds; [`MockCamera::script`] queues
/// cancellations or failures for upcoming captures.
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
    script: VecDeque<MockShot>,
}

impl MockCamera {
    /// Creates a closed camera.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues outcomes for upcoming captures, consumed in order.
    pub fn script(mut self, shots: impl IntoIterator<Item = MockShot>) -> Self {
        self.script.extend(shots);
        self
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(
            width = config.width,
            height = config.height,
            "MockCamera opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<CapturedPhoto, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        match self.script.pop_front().unwrap_or(MockShot::Photo) {
            MockShot::Photo => {}
            MockShot::Cancel => return Err(CameraError::Cancelled),
            MockShot::Fail(reason) => return Err(CameraError::CaptureFailed(reason)),
        }

        // Gradient shifted by sequence so consecutive photos differ
        let seq = self.sequence;
        let image = RgbImage::from_fn(config.width, config.height, |x, y| {
            Rgb([
                ((x as u64 + seq) % 256) as u8,
                ((y as u64 + seq) % 256) as u8,
                ((x as u64 ^ y as u64) % 256) as u8,
            ])
        });

        self.sequence += 1;
        Ok(CapturedPhoto::new(image, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}

/// Camera that "captures" a still image from disk.
///
/// The file is re-read on every capture so it can be swapped between
/// shots. A missing file is reported as a cancelled capture.
#[derive(Debug)]
pub struct FileCamera {
    path: PathBuf,
    open: bool,
    sequence: u64,
}

impl FileCamera {
    /// Creates a camera that reads `path` on every capture.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            open: false,
            sequence: 0,
        }
    }
}

impl Camera for FileCamera {
    fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
        if !self.path.is_file() {
            return Err(CameraError::DeviceNotFound(self.path.display().to_string()));
        }
        self.open = true;
        self.sequence = 0;
        tracing::info!(path = %self.path.display(), "FileCamera opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<CapturedPhoto, CameraError> {
        if !self.open {
            return Err(CameraError::NotInitialized);
        }
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Source image vanished");
            return Err(CameraError::Cancelled);
        }

        let image = image::open(&self.path)
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?
            .to_rgb8();

        self.sequence += 1;
        Ok(CapturedPhoto::new(image, self.sequence))
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
        tracing::info!("FileCamera closed");
    }
}

/// Physical camera backed by `nokhwa`.
///
/// A stream is opened per capture and closed again afterwards, mirroring a
/// capture flow that is launched, returns one photo, and goes away.
#[cfg(feature = "camera")]
#[derive(Debug, Default)]
pub struct DeviceCamera {
    config: Option<CaptureConfig>,
    sequence: u64,
}

#[cfg(feature = "camera")]
impl DeviceCamera {
    /// Creates a closed camera.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "camera")]
impl Camera for DeviceCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        use nokhwa::utils::ApiBackend;

        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;

        let devices =
            nokhwa::query(ApiBackend::Auto).map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        if devices.len() <= config.device_id as usize {
            return Err(CameraError::DeviceNotFound(format!(
                "index {} ({} devices present)",
                config.device_id,
                devices.len()
            )));
        }

        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(device = config.device_id, "DeviceCamera ready");
        Ok(())
    }

    fn capture(&mut self) -> Result<CapturedPhoto, CameraError> {
        use nokhwa::pixel_format::RgbFormat;
        use nokhwa::utils::{
            CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
            Resolution,
        };

        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            30,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));
        let mut camera = nokhwa::Camera::new(CameraIndex::Index(config.device_id), requested)
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        for _ in 0..config.warmup_frames {
            camera
                .frame()
                .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;
        }

        let frame = camera
            .frame()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()));
        if let Err(e) = camera.stop_stream() {
            tracing::warn!(error = %e, "Failed to stop camera stream");
        }
        let decoded = frame?
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::CaptureFailed(e.to_string()))?;

        // nokhwa links its own `image` version; rebuild from the raw buffer
        let (width, height) = (decoded.width(), decoded.height());
        self.sequence += 1;
        CapturedPhoto::from_rgb(decoded.into_raw(), width, height, self.sequence).ok_or_else(
            || CameraError::CaptureFailed("frame buffer does not match resolution".to_string()),
        )
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("DeviceCamera closed");
    }
}

/// Builds and opens the camera selected by the configuration.
pub fn open_camera(config: &CaptureConfig) -> Result<Box<dyn Camera + Send>, CameraError> {
    let mut camera: Box<dyn Camera + Send> = match &config.source {
        CameraSource::Mock => Box::new(MockCamera::new()),
        CameraSource::File { path } => Box::new(FileCamera::new(path)),
        #[cfg(feature = "camera")]
        CameraSource::Device => Box::new(DeviceCamera::new()),
        #[cfg(not(feature = "camera"))]
        CameraSource::Device => {
            return Err(CameraError::DeviceNotFound(
                "built without the `camera` feature".to_string(),
            ))
        }
    };
    camera.open(config)?;
    Ok(camera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_camera_lifecycle() {
        let mut camera = MockCamera::new();
        let config = CaptureConfig::with_dimensions(32, 24);

        assert!(!camera.is_open());

        camera.open(&config).unwrap();
        assert!(camera.is_open());

        let photo = camera.capture().unwrap();
        assert!(photo.is_valid());
        assert_eq!((photo.width(), photo.height()), (32, 24));
        assert_eq!(photo.sequence(), 1);

        let photo2 = camera.capture().unwrap();
        assert_eq!(photo2.sequence(), 2);

        camera.close();
        assert!(!camera.is_open());
    }

    #[test]
    fn test_capture_without_open() {
        let mut camera = MockCamera::new();
        assert!(matches!(camera.capture(), Err(CameraError::NotInitialized)));
    }

    #[test]
    fn test_scripted_outcomes() {
        let mut camera = MockCamera::new().script([
            MockShot::Cancel,
            MockShot::Fail("lens cap".to_string()),
        ]);
        camera.open(&CaptureConfig::with_dimensions(8, 8)).unwrap();

        assert!(matches!(camera.capture(), Err(CameraError::Cancelled)));
        assert!(matches!(
            camera.capture(),
            Err(CameraError::CaptureFailed(reason)) if reason == "lens cap"
        ));
        assert!(camera.capture().is_ok());
    }

    #[test]
    fn test_file_camera_reads_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        RgbImage::new(20, 10).save(&path).unwrap();

        let mut camera = FileCamera::new(&path);
        camera.open(&CaptureConfig::default()).unwrap();
        let photo = camera.capture().unwrap();
        assert_eq!((photo.width(), photo.height()), (20, 10));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(camera.capture(), Err(CameraError::Cancelled)));
    }

    #[test]
    fn test_file_camera_missing_file() {
        let mut camera = FileCamera::new("/nonexistent/face.jpg");
        assert!(matches!(
            camera.open(&CaptureConfig::default()),
            Err(CameraError::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_open_camera_from_config() {
        let camera = open_camera(&CaptureConfig::default()).unwrap();
        assert!(camera.is_open());
    }
}
