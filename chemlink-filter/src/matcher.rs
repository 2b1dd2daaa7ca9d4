//! Finds links to chemistry structure files in rendered page text.
//!
//! This is a single pattern over raw text, not an HTML parser. It only
//! recognizes a plain `<a ... href="...">...</a>` element with a double-quoted
//! `href`; nested anchors, single-quoted or unquoted attributes and anchors
//! that are never closed are not matched.

use regex::{Captures, Regex};

use crate::{
  error::FilterError,
  types::{ChemLinkMatch, FileExtension},
};

/// Compiled matcher for one host and one set of supported extensions.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
  pattern: Regex,
}

impl LinkMatcher {
  /// Build a matcher accepting links that are relative, protocol-relative or
  /// absolute on `host`, and that end in one of `extensions`.
  ///
  /// # Errors
  ///
  /// Returns an error if the generated pattern fails to compile, which can
  /// only happen if the pattern exceeds the regex size limit.
  pub fn new(
    host: &str,
    extensions: &[FileExtension],
  ) -> Result<Self, FilterError> {
    let pattern = build_pattern(host, extensions);
    log::debug!("Link pattern: {pattern}");
    Ok(Self {
      pattern: Regex::new(&pattern)?,
    })
  }

  /// Lazily iterate over every qualifying link in `text`.
  ///
  /// Calling `scan` again restarts from the beginning of the text.
  pub fn scan<'t>(
    &self,
    text: &'t str,
  ) -> impl Iterator<Item = ChemLinkMatch<'t>> {
    self
      .pattern
      .captures_iter(text)
      .filter_map(|caps| to_match(&caps))
  }

  /// Whether `text` holds at least one qualifying link.
  #[must_use]
  pub fn is_match(&self, text: &str) -> bool {
    self.pattern.is_match(text)
  }
}

fn build_pattern(host: &str, extensions: &[FileExtension]) -> String {
  let mut suffixes: Vec<String> =
    extensions.iter().map(ToString::to_string).collect();
  // Longest first, so `pdb.gz` wins over `pdb` and `mol.png` over `mol`.
  suffixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
  suffixes.dedup();

  let alternation = if suffixes.is_empty() {
    // An empty set must never match; `[^\s\S]` can't.
    r"[^\s\S]".to_string()
  } else {
    suffixes
      .iter()
      .map(|s| regex::escape(s))
      .collect::<Vec<_>>()
      .join("|")
  };
  let host = regex::escape(host.trim());

  format!(
    r##"(?s)(?P<anchor><(?i:a)\b[^>]*?(?i:href)="(?P<url>(?:\.|\\|//(?i:{host})[:/]|https?://(?i:{host})[:/])[^"]+\.(?P<ext>{alternation}))(?:\?(?P<query>[^"#]*))?(?:#[^"]*)?"[^>]*>(?P<text>.*?)</(?i:a)>)(?:\s*JMOLSCRIPT\{{(?P<script>.*?)\}})?"##
  )
}

fn to_match<'t>(caps: &Captures<'t>) -> Option<ChemLinkMatch<'t>> {
  let whole = caps.get(0)?;
  let extension = caps.name("ext")?.as_str().parse().ok()?;

  Some(ChemLinkMatch {
    full_url: caps.name("url")?.as_str(),
    extension,
    query: caps.name("query").map_or("", |m| m.as_str()),
    link_text: caps.name("text").map_or("", |m| m.as_str()),
    inline_script: caps.name("script").map(|m| m.as_str()),
    anchor: caps.name("anchor")?.as_str(),
    span: whole.range(),
  })
}
