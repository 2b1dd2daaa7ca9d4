use std::sync::LazyLock;

use regex::Regex;

/// Create a regex that never matches anything.
///
/// Used as a fallback when a static pattern fails to compile, so callers
/// degrade to "no match" instead of panicking.
#[must_use]
pub fn never_matching_regex() -> Regex {
  #[allow(
    clippy::expect_used,
    reason = "This pattern is guaranteed to be valid"
  )]
  Regex::new(r"[^\s\S]").expect("regex pattern [^\\s\\S] should always compile")
}

/// Compile a static pattern, logging and falling back to
/// [`never_matching_regex`] on failure.
///
/// Meant for `LazyLock` statics, where `name` identifies the static in the
/// log.
#[must_use]
pub fn static_regex(name: &str, pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile {name} regex: {e}\n Falling back to never matching \
       regex."
    );
    never_matching_regex()
  })
}

/// Collapse every run of whitespace into a single space.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
  static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| static_regex("WHITESPACE_RE", r"\s+"));
  WHITESPACE_RE.replace_all(text, " ").into_owned()
}
