//! Conversion of local image files into data URLs

use crate::error::{Result, ScannerError};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

/// MIME type guessed from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as `data:<mime>;base64,<payload>`
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, general_purpose::STANDARD.encode(bytes))
}

/// Read an image file and return it as a data URL
pub async fn read_image_as_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ScannerError::Processing(format!("Failed to read image file {}: {}", path.display(), e))
    })?;

    if bytes.is_empty() {
        return Err(ScannerError::Validation(format!(
            "Image file {} is empty",
            path.display()
        )));
    }

    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(to_data_url(&bytes, mime_type_for(path)))
}
