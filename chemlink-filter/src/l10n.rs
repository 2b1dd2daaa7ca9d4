use std::collections::HashMap;

/// Source of user-facing strings.
pub trait LocalizationProvider {
  /// Look up `key`. Must always return something displayable.
  fn translate(&self, key: &str) -> String;
}

/// Built-in English strings, with optional per-key overrides.
#[derive(Debug, Clone, Default)]
pub struct DefaultStrings {
  overrides: HashMap<String, String>,
}

impl DefaultStrings {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
    Self { overrides }
  }

  fn builtin(key: &str) -> Option<&'static str> {
    Some(match key {
      "downloadstructurefile" => "Download structure file",
      "filenotfound" => "Structure file not available",
      "fullscreen" => "Full screen",
      "hydrogens" => "Hydrogens",
      "jmolhelp" => "Jmol help",
      "jsdisabled" => {
        "JavaScript is disabled. Enable it to see the interactive 3D \
         structure."
      },
      _ => return None,
    })
  }
}

impl LocalizationProvider for DefaultStrings {
  fn translate(&self, key: &str) -> String {
    if let Some(value) = self.overrides.get(key) {
      return value.clone();
    }
    Self::builtin(key).map_or_else(
      || {
        log::warn!("Missing string for key '{key}'");
        format!("[[{key}]]")
      },
      ToString::to_string,
    )
  }
}

impl LocalizationProvider for HashMap<String, String> {
  fn translate(&self, key: &str) -> String {
    self
      .get(key)
      .cloned()
      .unwrap_or_else(|| format!("[[{key}]]"))
  }
}
