//! The persisted user identity record and its merge rules.
//!
//! A record is never replaced wholesale: each verification produces a
//! [`RecordPatch`] that is merged into the previous record, so a name the user
//! typed in is never overwritten by one a machine extracted.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, response::VerificationResponse};

/// Display name used when nothing better is known.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

// ─── Name provenance ─────────────────────────────────────────────────────────

/// Where the current display name came from.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NameSource {
  /// The literal fallback name.
  #[default]
  Default,
  /// Read off a document by the verification service.
  Extracted,
  /// Explicitly set by the user; wins over every later extraction.
  User,
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The durable profile read by presentation layers.
///
/// Field names on disk follow the layout older clients wrote (`name`,
/// `verificationResult`, ...); fields they did not write default on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentityRecord {
  #[serde(rename = "name")]
  pub display_name:      String,
  #[serde(default)]
  pub name_source:       NameSource,
  #[serde(rename = "verificationResult", default)]
  pub last_verification: Option<VerificationResponse>,
  /// Mirrors `last_verification.face_verified`; false when absent.
  #[serde(default)]
  pub is_verified:       bool,
  /// RFC 3339; empty when no verification has happened.
  #[serde(default)]
  pub verification_date: String,
  /// Incremented on every merge or user edit.
  #[serde(default)]
  pub revision:          u64,
}

impl Default for UserIdentityRecord {
  fn default() -> Self {
    Self {
      display_name:      DEFAULT_DISPLAY_NAME.to_owned(),
      name_source:       NameSource::Default,
      last_verification: None,
      is_verified:       false,
      verification_date: String::new(),
      revision:          0,
    }
  }
}

/// The interpretation of one verification, ready to merge.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatch {
  pub extracted_name: Option<String>,
  pub verification:   VerificationResponse,
  /// Backend-reported verification time, if parseable.
  pub reported_at:    Option<DateTime<Utc>>,
  /// When the evidence was captured; used if the backend gave no time.
  pub captured_at:    Option<DateTime<Utc>>,
}

impl RecordPatch {
  pub fn with_captured_at(mut self, at: DateTime<Utc>) -> Self {
    self.captured_at = Some(at);
    self
  }
}

impl UserIdentityRecord {
  /// Combine `previous` (if any) with `patch`.
  ///
  /// Display name precedence: user-set previous name, then the newly
  /// extracted name, then any previous name, then [`DEFAULT_DISPLAY_NAME`].
  /// Verification fields always come from the patch.
  pub fn merge(previous: Option<&Self>, patch: RecordPatch) -> Self {
    let extracted = patch
      .extracted_name
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty());

    let (display_name, name_source) = match (previous, extracted) {
      (Some(prev), _) if prev.name_source == NameSource::User => {
        (prev.display_name.clone(), NameSource::User)
      }
      (_, Some(name)) => (name, NameSource::Extracted),
      (Some(prev), None) => (prev.display_name.clone(), prev.name_source),
      (None, None) => (DEFAULT_DISPLAY_NAME.to_owned(), NameSource::Default),
    };

    let verification_date = patch
      .reported_at
      .or(patch.captured_at)
      .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
      .unwrap_or_default();

    Self {
      display_name,
      name_source,
      is_verified: patch.verification.face_verified,
      last_verification: Some(patch.verification),
      verification_date,
      revision: previous.map_or(0, |p| p.revision) + 1,
    }
  }

  /// Return a copy carrying an explicit, user-chosen display name.
  pub fn with_user_name(&self, name: &str) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::InvalidRequest("display name must not be empty".into()));
    }
    Ok(Self {
      display_name: name.to_owned(),
      name_source: NameSource::User,
      revision: self.revision + 1,
      ..self.clone()
    })
  }
}
