use std::collections::HashMap;

use chemlink_filter::LanguageTable;
use serde::{Deserialize, Serialize};

/// Configuration for mapping platform locales to viewer languages.
///
/// ```toml
/// [language]
/// default = "en_US"
///
/// [language.exceptions]
/// no = "nb"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
  /// Viewer language used when a locale cannot be resolved.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<String>,

  /// Locales that map to a specific language, checked before anything else.
  pub exceptions: HashMap<String, String>,
}

impl LanguageConfig {
  /// Build the lookup table on top of the built-in one.
  #[must_use]
  pub fn table(&self) -> LanguageTable {
    let mut table = LanguageTable::jsmol();
    if let Some(ref default) = self.default {
      if table.is_supported(default) {
        table = table.with_default(default);
      } else {
        log::warn!(
          "Ignoring unsupported default viewer language '{default}', using \
           '{}'",
          table.default_language()
        );
      }
    }
    for (locale, language) in &self.exceptions {
      if table.is_supported(language) {
        table = table.with_exception(locale, language);
      } else {
        log::warn!(
          "Ignoring unsupported viewer language '{language}' for locale \
           '{locale}'"
        );
      }
    }
    table
  }

  /// Merge `other` into this config, `other` taking precedence.
  pub fn merge(&mut self, other: Self) {
    if other.default.is_some() {
      self.default = other.default;
    }
    self.exceptions.extend(other.exceptions);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_table_is_builtin() {
    let table = LanguageConfig::default().table();
    assert_eq!(table.resolve("en"), "en_GB");
    assert_eq!(table.resolve("xx"), "en_GB");
  }

  #[test]
  fn test_unsupported_exception_is_ignored() {
    let config = LanguageConfig {
      default:    None,
      exceptions: HashMap::from([
        ("no".to_string(), "nynorsk".to_string()),
        ("de_CH".to_string(), "de".to_string()),
      ]),
    };
    let table = config.table();
    assert_eq!(table.resolve("no"), "en_GB");
    assert_eq!(table.resolve("de_CH"), "de");
  }

  #[test]
  fn test_custom_default_and_exceptions() {
    let config = LanguageConfig {
      default:    Some("en_US".to_string()),
      exceptions: HashMap::from([("no".to_string(), "nb".to_string())]),
    };
    let table = config.table();
    assert_eq!(table.resolve("xx"), "en_US");
    assert_eq!(table.resolve("no"), "nb");
  }

  #[test]
  fn test_unsupported_default_is_ignored() {
    let config = LanguageConfig {
      default: Some("klingon".to_string()),
      ..Default::default()
    };
    assert_eq!(config.table().default_language(), "en_GB");
  }

  #[test]
  fn test_merge() {
    let mut base = LanguageConfig {
      default:    Some("de".to_string()),
      exceptions: HashMap::from([("a".to_string(), "fr".to_string())]),
    };
    base.merge(LanguageConfig {
      default:    None,
      exceptions: HashMap::from([("b".to_string(), "es".to_string())]),
    });
    assert_eq!(base.default.as_deref(), Some("de"));
    assert_eq!(base.exceptions.len(), 2);
  }
}
