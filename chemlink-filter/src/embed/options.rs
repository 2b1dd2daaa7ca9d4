use std::sync::LazyLock;

use regex::Regex;

use super::script::sanitize_init_script;
use crate::{types::ChemLinkMatch, utils::static_regex};

/// Control set used when the link doesn't ask for one.
pub const DEFAULT_CONTROL_SET: u8 = 1;

/// Viewer width and height in pixels when the link doesn't ask for one.
pub const DEFAULT_SIZE: u16 = 350;

/// Per-link viewer settings.
///
/// Derived from the link's query string (`?c=2&s=500`) and its trailing
/// `JMOLSCRIPT{...}` block. The values come from page authors and are not
/// range checked; the resize widget bounds the size client side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
  pub control_set: u8,
  pub size:        u16,
  pub language:    String,
  pub init_script: String,
}

impl DisplayOptions {
  /// Settings from a raw query string alone, falling back to the defaults
  /// for anything absent or malformed.
  #[must_use]
  pub fn from_query(
    query: &str,
    language: String,
    default_control_set: u8,
    default_size: u16,
  ) -> Self {
    Self {
      control_set: parse_control_set(query).unwrap_or(default_control_set),
      size: parse_size(query).unwrap_or(default_size),
      language,
      init_script: String::new(),
    }
  }

  /// Settings for `link`, including its inline script.
  #[must_use]
  pub fn derive(
    link: &ChemLinkMatch<'_>,
    language: String,
    default_control_set: u8,
    default_size: u16,
  ) -> Self {
    Self {
      init_script: link
        .inline_script
        .map(sanitize_init_script)
        .unwrap_or_default(),
      ..Self::from_query(
        link.query,
        language,
        default_control_set,
        default_size,
      )
    }
  }
}

/// `c=<1-2 digits>` anywhere in the query.
#[must_use]
pub fn parse_control_set(query: &str) -> Option<u8> {
  static CONTROL_SET_RE: LazyLock<Regex> =
    LazyLock::new(|| static_regex("CONTROL_SET_RE", r"c=(\d{1,2})"));
  CONTROL_SET_RE
    .captures(query)
    .and_then(|caps| caps[1].parse().ok())
}

/// `s=<1-3 digits>` anywhere in the query.
#[must_use]
pub fn parse_size(query: &str) -> Option<u16> {
  static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| static_regex("SIZE_RE", r"s=(\d{1,3})"));
  SIZE_RE.captures(query).and_then(|caps| caps[1].parse().ok())
}
