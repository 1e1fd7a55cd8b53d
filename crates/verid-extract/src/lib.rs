//! Interpretation of verification responses.
//!
//! Pipeline:
//!   extracted_info: &str
//!     └─ strip_code_fence()          → &str
//!          └─ serde_json::from_str()  → Some(object) | None
//!               ├─ object: TopLevelKeys, then NestedKeys
//!               └─ none:   LabelPatterns over the raw text
//!                    └─ ExtractedIdentityFields (absent fields stay None)
//!
//! Everything here is pure: the same response always yields the same
//! interpretation, and no input makes it fail.

pub mod fence;
pub mod strategy;
pub mod variants;

use serde_json::{Map, Value};
use strum::IntoEnumIterator as _;
use verid_core::{
  fields::{ExtractedIdentityFields, IdentityField},
  record::RecordPatch,
  response::{DocumentStatus, VerificationResponse},
};

use crate::{
  fence::strip_code_fence,
  strategy::{ExtractionStrategy, LabelPatterns, NestedKeys, Source, TopLevelKeys},
};

/// Strategies used when `extracted_info` holds a JSON object.
const STRUCTURED: &[&dyn ExtractionStrategy] = &[&TopLevelKeys, &NestedKeys];

/// Strategies used when it does not.
const FREE_TEXT: &[&dyn ExtractionStrategy] = &[&LabelPatterns];

/// The outcome of interpreting one response.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
  pub fields:          ExtractedIdentityFields,
  /// Decided by `face_verified` alone.
  pub is_verified:     bool,
  pub confidence:      f64,
  pub document_status: DocumentStatus,
  pub patch:           RecordPatch,
}

/// Interpret a raw response into identity fields and a record patch.
///
/// The patch carries no capture time; callers add it with
/// [`RecordPatch::with_captured_at`].
pub fn interpret(response: &VerificationResponse) -> Interpretation {
  let fields = extract_fields(&response.extracted_info);
  Interpretation {
    is_verified: response.face_verified,
    confidence: response.confidence(),
    document_status: response.document_status(),
    patch: RecordPatch {
      extracted_name: fields.name.clone(),
      verification:   response.clone(),
      reported_at:    response.reported_at(),
      captured_at:    None,
    },
    fields,
  }
}

/// Extract identity fields from `extracted_info` text.
pub fn extract_fields(extracted_info: &str) -> ExtractedIdentityFields {
  let parsed = parse_object(strip_code_fence(extracted_info));
  let source = Source {
    raw:        extracted_info,
    structured: parsed.as_ref(),
  };
  let strategies = if parsed.is_some() { STRUCTURED } else { FREE_TEXT };

  let mut fields = ExtractedIdentityFields::default();
  for field in IdentityField::iter() {
    if let Some(value) = strategies.iter().find_map(|s| s.extract(field, &source)) {
      fields.set(field, value);
    }
  }
  fields
}

/// Parse `text` as a JSON object. Any other JSON value counts as unparsed.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
  match serde_json::from_str(text) {
    Ok(Value::Object(object)) => Some(object),
    _ => None,
  }
}
