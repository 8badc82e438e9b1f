//! Image transport encoding.
//!
//! Photos travel to the analysis service as base64 text wrapping a JPEG,
//! and the annotated result comes back the same way.

mod jpeg;

pub use jpeg::{decode_image, encode_photo, encode_rgb, MAX_QUALITY};

use thiserror::Error;

/// Errors that can occur while encoding or decoding images.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bitmap has no pixels.
    #[error("image has zero dimensions")]
    ZeroDimensions,
    /// JPEG compression failed.
    #[error("failed to encode JPEG: {0}")]
    Encode(String),
    #[error("malformed base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The bytes are not a decodable image.
    #[error("failed to decode image bytes: {0}")]
    Decode(String),
}
