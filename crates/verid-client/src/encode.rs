//! Payload encoding for captured images on the local filesystem.

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use sha2::{Digest, Sha256};
use verid_core::{
  Error, Result,
  backend::PayloadEncoder,
  evidence::{EncodedPayload, ResourceHandle},
};

/// Default ceiling on the size of one captured image.
pub const DEFAULT_MAX_BYTES: u64 = 20 * 1024 * 1024;

/// Reads a captured image from disk and base64-encodes it.
///
/// Handles are plain paths or `file://` URIs.
#[derive(Debug, Clone)]
pub struct FileEncoder {
  max_bytes: u64,
}

impl Default for FileEncoder {
  fn default() -> Self { Self { max_bytes: DEFAULT_MAX_BYTES } }
}

impl FileEncoder {
  pub fn with_max_bytes(max_bytes: u64) -> Self { Self { max_bytes } }
}

impl PayloadEncoder for FileEncoder {
  async fn encode(&self, handle: &ResourceHandle) -> Result<EncodedPayload> {
    let path = resolve(handle);

    match tokio::fs::try_exists(&path).await {
      Ok(true) => {}
      Ok(false) => return Err(Error::ResourceNotFound(handle.to_string())),
      Err(e) => return Err(Error::Encoding(format!("cannot access {handle}: {e}"))),
    }

    let meta = tokio::fs::metadata(&path).await.map_err(|e| read_error(handle, e))?;
    if !meta.is_file() {
      return Err(Error::Encoding(format!("{handle} is not a regular file")));
    }
    if meta.len() > self.max_bytes {
      return Err(Error::Encoding(format!(
        "{handle} is {} bytes, limit is {}",
        meta.len(),
        self.max_bytes
      )));
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| read_error(handle, e))?;
    if bytes.is_empty() {
      return Err(Error::Encoding(format!("{handle} is empty")));
    }
    let mime_type = sniff_image_type(&bytes)
      .ok_or_else(|| Error::Encoding(format!("{handle} is not a supported image")))?;

    let digest = hex::encode(Sha256::digest(&bytes));
    tracing::debug!(%handle, bytes = bytes.len(), mime_type, %digest, "encoded capture");

    EncodedPayload::new(B64.encode(&bytes), mime_type, digest)
  }
}

/// Decode a payload back to its raw bytes.
pub fn decode(payload: &EncodedPayload) -> Result<Vec<u8>> {
  B64
    .decode(payload.data())
    .map_err(|e| Error::Encoding(format!("invalid base64 payload: {e}")))
}

fn resolve(handle: &ResourceHandle) -> PathBuf {
  let raw = handle.as_str();
  Path::new(raw.strip_prefix("file://").unwrap_or(raw)).to_path_buf()
}

fn read_error(handle: &ResourceHandle, err: std::io::Error) -> Error {
  // The file can disappear between the existence check and the read.
  if err.kind() == ErrorKind::NotFound {
    Error::ResourceNotFound(handle.to_string())
  } else {
    Error::Encoding(format!("cannot read {handle}: {err}"))
  }
}

/// Identify an image by its magic bytes.
fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
  match bytes {
    [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
    [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
    [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
    [_, _, _, _, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c' | b'f', ..] => {
      Some("image/heic")
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

  fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
  }

  fn handle_for(file: &tempfile::NamedTempFile) -> ResourceHandle {
    ResourceHandle::new(file.path().to_string_lossy())
  }

  #[tokio::test]
  async fn encode_then_decode_round_trips() {
    let mut image = JPEG.to_vec();
    image.extend((0..=255u8).cycle().take(4096));
    let file = write_temp(&image);

    let payload = FileEncoder::default().encode(&handle_for(&file)).await.unwrap();
    assert_eq!(payload.mime_type, "image/jpeg");
    assert_eq!(payload.digest.len(), 64);
    assert_eq!(decode(&payload).unwrap(), image);
  }

  #[tokio::test]
  async fn file_uri_is_accepted() {
    let file = write_temp(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]);
    let handle = ResourceHandle::new(format!("file://{}", file.path().display()));
    let payload = FileEncoder::default().encode(&handle).await.unwrap();
    assert_eq!(payload.mime_type, "image/png");
  }

  #[tokio::test]
  async fn missing_file_is_resource_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let handle = ResourceHandle::new(dir.path().join("gone.jpg").to_string_lossy());
    let err = FileEncoder::default().encode(&handle).await.unwrap_err();
    assert!(matches!(err, Error::ResourceNotFound(_)), "{err}");
  }

  #[tokio::test]
  async fn empty_file_is_encoding_error() {
    let file = write_temp(&[]);
    let err = FileEncoder::default().encode(&handle_for(&file)).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "{err}");
  }

  #[tokio::test]
  async fn non_image_is_encoding_error() {
    let file = write_temp(b"%PDF-1.7 not an image");
    let err = FileEncoder::default().encode(&handle_for(&file)).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(ref m) if m.contains("supported")), "{err}");
  }

  #[tokio::test]
  async fn oversized_file_is_encoding_error() {
    let mut image = JPEG.to_vec();
    image.extend([0u8; 64]);
    let file = write_temp(&image);
    let err = FileEncoder::with_max_bytes(16)
      .encode(&handle_for(&file))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "{err}");
  }

  #[tokio::test]
  async fn directory_is_encoding_error() {
    let dir = tempfile::tempdir().unwrap();
    let handle = ResourceHandle::new(dir.path().to_string_lossy());
    let err = FileEncoder::default().encode(&handle).await.unwrap_err();
    assert!(matches!(err, Error::Encoding(_)), "{err}");
  }

  #[test]
  fn sniffs_known_formats() {
    assert_eq!(sniff_image_type(JPEG), Some("image/jpeg"));
    assert_eq!(sniff_image_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
    assert_eq!(sniff_image_type(b"\x00\x00\x00\x18ftypheic"), Some("image/heic"));
    assert_eq!(sniff_image_type(b"GIF89a"), None);
  }
}
