use std::{fs, path::Path};

use chemlink_config::Config;
use chemlink_filter::{
  DisplayOptions,
  FileExtension,
  LinkMatcher,
  ResolvedFile,
  resolver::parse_pluginfile_url,
};
use color_eyre::eyre::{Context, Result};

/// One link found by [`scan_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
  pub url:       String,
  pub extension: FileExtension,
  /// Viewer settings the link would get.
  pub options:   DisplayOptions,
  /// Storage coordinates, for links into host file storage.
  pub stored:    Option<ResolvedFile>,
}

/// List the links in `text` that would be rewritten under `config`.
///
/// # Errors
///
/// Returns an error if the link pattern cannot be built.
pub fn scan_text(config: &Config, text: &str) -> Result<Vec<ScanEntry>> {
  let options = config.filter_options();
  let matcher = LinkMatcher::new(&options.host, &options.formats)
    .wrap_err("Failed to build the link pattern")?;
  let language = options.languages.resolve(&config.locale);

  Ok(
    matcher
      .scan(text)
      .map(|link| {
        ScanEntry {
          url:       link.full_url.to_string(),
          extension: link.extension,
          options:   DisplayOptions::derive(
            &link,
            language.clone(),
            options.default_control_set,
            options.default_size,
          ),
          stored:    parse_pluginfile_url(link.full_url),
        }
      })
      .collect(),
  )
}

/// Like [`scan_text`], for the page at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn scan_file(config: &Config, path: &Path) -> Result<Vec<ScanEntry>> {
  let text = fs::read_to_string(path)
    .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
  scan_text(config, &text)
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use super::*;

  #[test]
  fn test_scan_reports_options() {
    let config = Config {
      wwwroot: "https://example.com".to_string(),
      locale: "pt-BR".to_string(),
      ..Default::default()
    };
    let text = r#"
      <a href="https://example.com/pluginfile.php/9/mod_page/content/1/1crn.pdb?c=3">crambin</a>
      JMOLSCRIPT{cartoon only}
      <a href="https://elsewhere.org/x.pdb">x</a>
      <a href="./caffeine.mol.png?s=200">caffeine</a>
    "#;

    let entries = scan_text(&config, text).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].extension.to_string(), "pdb");
    assert_eq!(entries[0].options.control_set, 3);
    assert_eq!(entries[0].options.language, "pt_BR");
    assert_eq!(entries[0].options.init_script, "cartoon only");
    assert_eq!(entries[0].stored.as_ref().unwrap().context_id, 9);

    assert_eq!(entries[1].url, "./caffeine.mol.png");
    assert_eq!(entries[1].options.size, 200);
    assert_eq!(entries[1].stored, None);
  }
}
