//! Backend response types.
//!
//! The verification service is untrusted: only `verification_id` and
//! `face_verified` are required, everything else defaults when absent.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Verification response ───────────────────────────────────────────────────

/// Raw response body of `POST /id-verify-base64`.
///
/// Serialised with the wire field names so it can be stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
  pub verification_id: String,
  pub face_verified:   bool,
  /// Nominally in `[0, 1]`; see [`VerificationResponse::confidence`].
  #[serde(default)]
  pub face_confidence: f64,
  /// Semi-structured: JSON, fenced JSON, or free text.
  #[serde(default)]
  pub extracted_info:  String,
  #[serde(default)]
  pub status:          String,
  #[serde(default)]
  pub message:         String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timestamp:       Option<String>,
}

impl VerificationResponse {
  /// Face-match confidence clamped into `[0, 1]`. Non-finite values read as 0.
  pub fn confidence(&self) -> f64 {
    if self.face_confidence.is_finite() {
      self.face_confidence.clamp(0.0, 1.0)
    } else {
      0.0
    }
  }

  /// The backend-reported time of verification, if it can be parsed.
  pub fn reported_at(&self) -> Option<DateTime<Utc>> {
    self.timestamp.as_deref().and_then(parse_timestamp)
  }

  /// Review status of the submitted document, derived from `status`.
  pub fn document_status(&self) -> DocumentStatus {
    DocumentStatus::from_status(&self.status)
  }
}

/// Parse the timestamp formats the backend is known to emit.
///
/// Accepts RFC 3339, naive ISO 8601 (taken as UTC) and the compact
/// `YYYYMMDD_HHMMSS` form.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y%m%d_%H%M%S"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| naive.and_utc())
}

// ─── Document status ─────────────────────────────────────────────────────────

/// Whether the backend has finished reviewing the document.
///
/// Anything other than a recognised success marker maps to `Pending`, never
/// to a hard failure, so a user mid-review is not blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
  Accepted,
  Pending,
}

impl DocumentStatus {
  const SUCCESS_MARKER: &'static str = "success";

  pub fn from_status(status: &str) -> Self {
    if status.trim().eq_ignore_ascii_case(Self::SUCCESS_MARKER) {
      Self::Accepted
    } else {
      Self::Pending
    }
  }
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// Body of `GET /health`. Unknown fields are kept for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
  pub status: String,
  #[serde(flatten)]
  pub details: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
  pub fn is_healthy(&self) -> bool { self.status.eq_ignore_ascii_case("healthy") }
}
