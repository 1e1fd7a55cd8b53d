//! Extraction strategies.
//!
//! Each strategy answers one question: "given this source, what is the value
//! of this field?" The interpreter evaluates them in a fixed order, first
//! answer wins.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use strum::IntoEnumIterator as _;
use verid_core::fields::IdentityField;

use crate::variants::{key_variants, label_variants};

/// What strategies look at.
pub struct Source<'a> {
  /// `extracted_info` exactly as received.
  pub raw:        &'a str,
  /// The parsed object, when the unfenced text is a JSON object.
  pub structured: Option<&'a Map<String, Value>>,
}

pub trait ExtractionStrategy {
  fn extract(&self, field: IdentityField, source: &Source<'_>) -> Option<String>;
}

// ─── Structured ──────────────────────────────────────────────────────────────

/// Look the field up among the object's top-level keys.
pub struct TopLevelKeys;

impl ExtractionStrategy for TopLevelKeys {
  fn extract(&self, field: IdentityField, source: &Source<'_>) -> Option<String> {
    find_in_object(source.structured?, field)
  }
}

/// Look the field up one level down, inside any nested object value, in
/// document order.
pub struct NestedKeys;

impl ExtractionStrategy for NestedKeys {
  fn extract(&self, field: IdentityField, source: &Source<'_>) -> Option<String> {
    source
      .structured?
      .values()
      .filter_map(Value::as_object)
      .find_map(|nested| find_in_object(nested, field))
  }
}

fn find_in_object(object: &Map<String, Value>, field: IdentityField) -> Option<String> {
  key_variants(field)
    .iter()
    .find_map(|key| object.get(*key).and_then(scalar_text))
}

/// Render a scalar JSON value as trimmed text. Null, blank strings, arrays and
/// objects yield nothing.
fn scalar_text(value: &Value) -> Option<String> {
  let text = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Null | Value::Array(_) | Value::Object(_) => return None,
  };
  (!text.is_empty()).then_some(text)
}

// ─── Free text ───────────────────────────────────────────────────────────────

/// Match `Label: value` lines in free text.
///
/// A label must open a line or follow a `,`/`;`, optionally behind bullets,
/// heading marks, a list number (`1.`, `2)`) or markdown emphasis. The value runs to the next newline, comma or semicolon
/// and must be longer than one character.
pub struct LabelPatterns;

static LABEL_RULES: LazyLock<HashMap<IdentityField, Vec<Regex>>> = LazyLock::new(|| {
  IdentityField::iter()
    .map(|field| {
      let rules = label_variants(field)
        .iter()
        .map(|label| {
          Regex::new(&label_pattern(label)).expect("label patterns are valid regexes")
        })
        .collect();
      (field, rules)
    })
    .collect()
});

fn label_pattern(label: &str) -> String {
  let label = label
    .split_whitespace()
    .map(regex::escape)
    .collect::<Vec<_>>()
    .join(r"[ \t]+");
  format!(r"(?im)(?:^|[,;])[ \t*•#>-]*(?:\d+[.)][ \t*]*)?{label}[ \t*]*:[ \t*]*([^\n,;]+)")
}

impl ExtractionStrategy for LabelPatterns {
  fn extract(&self, field: IdentityField, source: &Source<'_>) -> Option<String> {
    LABEL_RULES.get(&field)?.iter().find_map(|rule| {
      rule
        .captures_iter(source.raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches('*').trim_end())
        .find(|value| value.chars().count() > 1)
        .map(str::to_owned)
    })
  }
}
