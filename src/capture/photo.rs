//! Captured photo type with capture metadata.

use chrono::{DateTime, Utc};
use image::RgbImage;

/// A single photo handed back by the capture flow.
///
/// Owned by the view for one capture-analyze cycle and replaced by the
/// next capture.
#[derive(Clone)]
pub struct CapturedPhoto {
    /// RGB pixel data.
    image: RgbImage,
    /// Wall-clock capture time.
    captured_at: DateTime<Utc>,
    /// Monotonic sequence number assigned by the camera.
    sequence: u64,
}

impl CapturedPhoto {
    /// Creates a new photo from an RGB bitmap.
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
            sequence,
        }
    }

    /// Builds a photo from a packed RGB8 buffer.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Option<Self> {
        RgbImage::from_raw(width, height, pixels).map(|image| Self::new(image, sequence))
    }

    /// Returns the bitmap.
    #[inline]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes the photo and returns the bitmap.
    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// A photo with a zero dimension cannot be encoded.
    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }
}

impl std::fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedPhoto")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_from_rgb() {
        let photo = CapturedPhoto::from_rgb(vec![0u8; 64 * 48 * 3], 64, 48, 1).unwrap();

        assert_eq!(photo.width(), 64);
        assert_eq!(photo.height(), 48);
        assert_eq!(photo.sequence(), 1);
        assert!(photo.is_valid());
    }

    #[test]
    fn test_photo_buffer_mismatch() {
        assert!(CapturedPhoto::from_rgb(vec![0u8; 100], 64, 48, 1).is_none());
    }

    #[test]
    fn test_empty_photo_invalid() {
        let photo = CapturedPhoto::new(RgbImage::new(0, 0), 1);
        assert!(!photo.is_valid());
    }
}
