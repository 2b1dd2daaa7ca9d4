//! Maps platform locales onto the languages the JSmol popup menu supports.

use std::collections::{HashMap, HashSet};

/// Languages the JSmol popup menu is translated into.
pub const JSMOL_LANGUAGES: &[&str] = &[
  "ar", "ca", "cs", "da", "de", "el", "en_GB", "en_US", "es", "eu", "et", "fi",
  "fo", "fr", "hu", "id", "it", "ja", "jv", "ko", "nb", "nl", "oc", "pl", "pt",
  "pt_BR", "ru", "sl", "sv", "ta", "tr", "uk", "zh_CN", "zh_TW",
];

/// Language used when nothing else matches.
pub const DEFAULT_LANGUAGE: &str = "en_GB";

/// Ordered lookup from a platform locale to a viewer language code.
///
/// Resolution order:
///
/// 1. explicit exceptions (`en` becomes `en_GB`)
/// 2. exact membership in the supported set
/// 3. membership ignoring case and `-`/`_` differences (`pt-br` is `pt_BR`)
/// 4. membership of the language part alone (`de-AT` is `de`)
/// 5. the default language
#[derive(Debug, Clone)]
pub struct LanguageTable {
  exceptions: HashMap<String, String>,
  supported:  HashSet<String>,
  default:    String,
}

impl LanguageTable {
  /// The table shipped with JSmol.
  #[must_use]
  pub fn jsmol() -> Self {
    Self {
      exceptions: HashMap::from([("en".to_string(), "en_GB".to_string())]),
      supported:  JSMOL_LANGUAGES.iter().map(ToString::to_string).collect(),
      default:    DEFAULT_LANGUAGE.to_string(),
    }
  }

  /// Replace the fallback language.
  #[must_use]
  pub fn with_default(mut self, language: impl Into<String>) -> Self {
    self.default = language.into();
    self
  }

  /// Add or replace an exception mapping.
  #[must_use]
  pub fn with_exception(
    mut self,
    locale: impl Into<String>,
    language: impl Into<String>,
  ) -> Self {
    self.exceptions.insert(locale.into(), language.into());
    self
  }

  #[must_use]
  pub fn default_language(&self) -> &str {
    &self.default
  }

  #[must_use]
  pub fn is_supported(&self, language: &str) -> bool {
    self.supported.contains(language)
  }

  /// Resolve `locale` to a viewer language code. Never fails.
  #[must_use]
  pub fn resolve(&self, locale: &str) -> String {
    let locale = locale.trim();

    if let Some(language) = self.exceptions.get(locale) {
      return language.clone();
    }

    if self.supported.contains(locale) {
      return locale.to_string();
    }

    let normalized = normalize(locale);
    if let Some(language) =
      self.supported.iter().find(|code| normalize(code) == normalized)
    {
      return language.clone();
    }

    if let Some((base, _region)) = locale.split_once(['-', '_'])
      && self.supported.contains(base)
    {
      return base.to_string();
    }

    log::debug!(
      "No viewer language for locale '{locale}', using {}",
      self.default
    );
    self.default.clone()
  }
}

impl Default for LanguageTable {
  fn default() -> Self {
    Self::jsmol()
  }
}

fn normalize(code: &str) -> String {
  code.to_ascii_lowercase().replace('-', "_")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exception_wins() {
    let table = LanguageTable::jsmol();
    assert_eq!(table.resolve("en"), "en_GB");
  }

  #[test]
  fn test_exact_and_normalized() {
    let table = LanguageTable::jsmol();
    assert_eq!(table.resolve("fr"), "fr");
    assert_eq!(table.resolve("pt_BR"), "pt_BR");
    assert_eq!(table.resolve("pt_br"), "pt_BR");
    assert_eq!(table.resolve("zh-tw"), "zh_TW");
  }

  #[test]
  fn test_region_is_stripped() {
    let table = LanguageTable::jsmol();
    assert_eq!(table.resolve("de-AT"), "de");
    assert_eq!(table.resolve("fr_ca"), "fr");
  }

  #[test]
  fn test_unknown_falls_back() {
    let table = LanguageTable::jsmol();
    assert_eq!(table.resolve("xx"), DEFAULT_LANGUAGE);
    assert_eq!(table.resolve(""), DEFAULT_LANGUAGE);
    assert_eq!(table.resolve("kl-GL"), DEFAULT_LANGUAGE);
  }

  #[test]
  fn test_supported_codes_map_to_themselves() {
    let table = LanguageTable::jsmol();
    for code in JSMOL_LANGUAGES {
      assert_eq!(table.resolve(code), *code);
    }
  }

  #[test]
  fn test_resolution_is_idempotent() {
    let table = LanguageTable::jsmol();
    for locale in ["en", "en-AU", "de_du", "pt-br", "xx", "", "zh_cn", "ar"] {
      let once = table.resolve(locale);
      assert!(table.is_supported(&once), "{locale} -> {once}");
      assert_eq!(table.resolve(&once), once);
    }
  }

  #[test]
  fn test_custom_default_and_exception() {
    let table = LanguageTable::jsmol()
      .with_default("en_US")
      .with_exception("nn", "nb");
    assert_eq!(table.resolve("nn"), "nb");
    assert_eq!(table.resolve("xx"), "en_US");
    assert_eq!(table.default_language(), "en_US");
  }
}
