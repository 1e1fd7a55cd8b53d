//! Evidence and payload types.
//!
//! An [`EvidenceItem`] is what the capture adapter hands over: an opaque
//! handle to a local image. The encoder turns it into an [`EncodedPayload`],
//! and two payloads make a [`VerificationRequest`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{Error, Result};

// ─── Evidence ────────────────────────────────────────────────────────────────

/// Which capture screen produced a piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EvidenceKind {
  Selfie,
  Document,
}

/// Opaque locator for a captured image (a path or `file://` URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
  pub fn new(locator: impl Into<String>) -> Self { Self(locator.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ResourceHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// A captured image prior to transport. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
  pub kind:        EvidenceKind,
  pub handle:      ResourceHandle,
  pub captured_at: DateTime<Utc>,
}

impl EvidenceItem {
  /// Build an item, rejecting blank handles before they reach the workflow.
  pub fn new(kind: EvidenceKind, handle: impl Into<String>) -> Result<Self> {
    let handle: String = handle.into();
    if handle.trim().is_empty() {
      return Err(Error::InvalidEvidence(format!("{kind} handle is empty")));
    }
    Ok(Self {
      kind,
      handle: ResourceHandle(handle),
      captured_at: Utc::now(),
    })
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The transport-encoded form of one piece of evidence.
///
/// Never empty: [`EncodedPayload::new`] refuses empty data.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPayload {
  /// Base64 (standard alphabet, padded) image bytes.
  data:         String,
  pub mime_type: String,
  /// SHA-256 hex digest of the raw bytes; safe to log.
  pub digest:    String,
}

impl EncodedPayload {
  pub fn new(
    data: String,
    mime_type: impl Into<String>,
    digest: impl Into<String>,
  ) -> Result<Self> {
    if data.is_empty() {
      return Err(Error::Encoding("encoded payload is empty".into()));
    }
    Ok(Self {
      data,
      mime_type: mime_type.into(),
      digest: digest.into(),
    })
  }

  pub fn data(&self) -> &str { &self.data }

  pub fn len(&self) -> usize { self.data.len() }

  pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

// Keep image data out of debug logs.
impl fmt::Debug for EncodedPayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EncodedPayload")
      .field("len", &self.data.len())
      .field("mime_type", &self.mime_type)
      .field("digest", &self.digest)
      .finish()
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A verification request. Both payloads are required; the option wrappers
/// exist so an incomplete request can be represented and rejected.
#[derive(Debug, Clone, Default)]
pub struct VerificationRequest {
  pub document: Option<EncodedPayload>,
  pub selfie:   Option<EncodedPayload>,
}

impl VerificationRequest {
  pub fn new(document: EncodedPayload, selfie: EncodedPayload) -> Self {
    Self {
      document: Some(document),
      selfie:   Some(selfie),
    }
  }

  /// Return `(document, selfie)` if both are present and non-empty.
  pub fn validate(&self) -> Result<(&EncodedPayload, &EncodedPayload)> {
    let document = self
      .document
      .as_ref()
      .filter(|p| !p.is_empty())
      .ok_or_else(|| Error::InvalidRequest("document payload missing".into()))?;
    let selfie = self
      .selfie
      .as_ref()
      .filter(|p| !p.is_empty())
      .ok_or_else(|| Error::InvalidRequest("selfie payload missing".into()))?;
    Ok((document, selfie))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn payload(data: &str) -> EncodedPayload {
    EncodedPayload::new(data.to_string(), "image/jpeg", "00").unwrap()
  }

  #[test]
  fn blank_handle_is_rejected() {
    let err = EvidenceItem::new(EvidenceKind::Selfie, "  ").unwrap_err();
    assert!(matches!(err, Error::InvalidEvidence(_)));
  }

  #[test]
  fn empty_payload_is_rejected() {
    let err = EncodedPayload::new(String::new(), "image/png", "00").unwrap_err();
    assert!(matches!(err, Error::Encoding(_)));
  }

  #[test]
  fn request_requires_both_payloads() {
    let only_selfie = VerificationRequest {
      document: None,
      selfie:   Some(payload("AAAA")),
    };
    let err = only_selfie.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(ref m) if m.contains("document")));

    let only_document = VerificationRequest {
      document: Some(payload("AAAA")),
      selfie:   None,
    };
    assert!(matches!(
      only_document.validate(),
      Err(Error::InvalidRequest(_))
    ));

    let full = VerificationRequest::new(payload("AAAA"), payload("BBBB"));
    let (doc, selfie) = full.validate().unwrap();
    assert_eq!(doc.data(), "AAAA");
    assert_eq!(selfie.data(), "BBBB");
  }

  #[test]
  fn debug_output_omits_image_data() {
    let rendered = format!("{:?}", payload("c2VjcmV0LWZhY2U="));
    assert!(!rendered.contains("c2VjcmV0LWZhY2U="));
    assert!(rendered.contains("len"));
  }
}
