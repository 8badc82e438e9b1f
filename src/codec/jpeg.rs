use super::CodecError;
use crate::capture::CapturedPhoto;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

/// Highest JPEG quality setting.
pub const MAX_QUALITY: u8 = 100;

/// Compresses a photo to JPEG and wraps it in base64.
pub fn encode_photo(photo: &CapturedPhoto, quality: u8) -> Result<String, CodecError> {
    encode_rgb(photo.image(), quality)
}

/// Compresses an RGB bitmap to JPEG and wraps it in base64.
pub fn encode_rgb(image: &RgbImage, quality: u8) -> Result<String, CodecError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CodecError::ZeroDimensions);
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, MAX_QUALITY))
        .encode_image(image)
        .map_err(|e| CodecError::Encode(e.to_string()))?;

    let encoded = general_purpose::STANDARD.encode(&jpeg);
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        jpeg_bytes = jpeg.len(),
        base64_len = encoded.len(),
        "Photo encoded"
    );
    Ok(encoded)
}

/// Decodes base64 image text back into a displayable bitmap.
pub fn decode_image(encoded: &str) -> Result<DynamicImage, CodecError> {
    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
    tracing::debug!(bytes = bytes.len(), "Base64 decoded");

    let image = image::load_from_memory(&bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded"
    );
    Ok(image)
}
