use std::sync::LazyLock;

use regex::Regex;

use crate::utils::{collapse_whitespace, static_regex};

/// Turn a `JMOLSCRIPT{...}` block into a single-line viewer script.
///
/// Line breaks become `; ` statement separators, double quotes and `<br>`
/// markup are dropped, and whitespace runs collapse to one space.
#[must_use]
pub fn sanitize_init_script(raw: &str) -> String {
  static BREAK_MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| static_regex("BREAK_MARKUP_RE", r"(?i)<br\s*/?>"));

  let script = raw.replace("\r\n", "\n").replace('\n', "; ").replace('"', "");
  let script = BREAK_MARKUP_RE.replace_all(&script, "");
  collapse_whitespace(&script)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_single_line_passthrough() {
    assert_eq!(sanitize_init_script("spin on"), "spin on");
  }

  #[test]
  fn test_newlines_become_separators() {
    assert_eq!(
      sanitize_init_script("\nspin on\ncolor atoms cpk\n"),
      "; spin on; color atoms cpk; "
    );
    assert_eq!(sanitize_init_script("a\r\nb"), "a; b");
  }

  #[test]
  fn test_quotes_and_breaks_removed() {
    assert_eq!(
      sanitize_init_script("echo \"hi\"<br />\nzoom 50<BR>"),
      "echo hi; zoom 50"
    );
  }

  #[test]
  fn test_whitespace_collapsed() {
    assert_eq!(
      sanitize_init_script("select   all;\t\twireframe"),
      "select all; wireframe"
    );
  }
}
