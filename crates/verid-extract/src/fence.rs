//! Removal of documentation-style code fencing around extracted text.

/// Strip a surrounding ```` ```json ... ``` ```` or ```` ``` ... ``` ```` wrapper.
///
/// Text that does not start with a fence is returned trimmed but otherwise
/// untouched. A missing closing fence is tolerated.
pub fn strip_code_fence(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(body) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  let body = match body.get(..4) {
    Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
    _ => body,
  };
  let body = body.trim_end();
  body.strip_suffix("```").unwrap_or(body).trim()
}
