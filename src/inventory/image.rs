//! Attach photos to records as `data:` URLs.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

use super::error::StoreError;

/// Read an image file and encode it as a `data:` URL.
pub fn load_data_url(path: &Path, max_bytes: u64) -> Result<String, StoreError> {
  let mime = mime_for(path).ok_or_else(|| {
    StoreError::Validation(format!("{} is not a supported image type", path.display()))
  })?;

  let cannot_read =
    |e: std::io::Error| StoreError::Validation(format!("Cannot read {}: {}", path.display(), e));
  let too_large = |len: u64| {
    StoreError::Validation(format!(
      "{} is {} bytes, the limit is {}",
      path.display(),
      len,
      max_bytes
    ))
  };

  let len = std::fs::metadata(path).map_err(cannot_read)?.len();
  if len > max_bytes {
    return Err(too_large(len));
  }
  // The file may have grown since
  let bytes = std::fs::read(path).map_err(cannot_read)?;
  if bytes.len() as u64 > max_bytes {
    return Err(too_large(bytes.len() as u64));
  }

  Ok(encode(mime, &bytes))
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
  format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn mime_for(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  let mime = match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "bmp" => "image/bmp",
    "svg" => "image/svg+xml",
    _ => return None,
  };
  Some(mime)
}
