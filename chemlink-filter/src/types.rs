use std::{fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

/// Chemistry structure formats understood by the JSmol viewer.
///
/// See <http://wiki.jmol.org/index.php/File_formats> for the full list; only
/// the formats authors commonly upload are recognized here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChemFormat {
  Cif,
  Cml,
  Csmol,
  Jmol,
  Mcif,
  Mol,
  Mol2,
  Pdb,
  PdbGz,
  Pse,
  Sdf,
  Xyz,
}

impl ChemFormat {
  pub const ALL: [Self; 12] = [
    Self::Cif,
    Self::Cml,
    Self::Csmol,
    Self::Jmol,
    Self::Mcif,
    Self::Mol,
    Self::Mol2,
    Self::Pdb,
    Self::PdbGz,
    Self::Pse,
    Self::Sdf,
    Self::Xyz,
  ];

  /// File suffix without the leading dot.
  #[must_use]
  pub const fn suffix(self) -> &'static str {
    match self {
      Self::Cif => "cif",
      Self::Cml => "cml",
      Self::Csmol => "csmol",
      Self::Jmol => "jmol",
      Self::Mcif => "mcif",
      Self::Mol => "mol",
      Self::Mol2 => "mol2",
      Self::Pdb => "pdb",
      Self::PdbGz => "pdb.gz",
      Self::Pse => "pse",
      Self::Sdf => "sdf",
      Self::Xyz => "xyz",
    }
  }
}

/// A recognized structure-file extension.
///
/// Jmol can export structures embedded in PNG images (`water.mol.png`), so
/// every format may carry an extra `.png` suffix.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct FileExtension {
  pub format: ChemFormat,
  pub png:    bool,
}

impl FileExtension {
  #[must_use]
  pub const fn new(format: ChemFormat) -> Self {
    Self { format, png: false }
  }

  #[must_use]
  pub const fn png(format: ChemFormat) -> Self {
    Self { format, png: true }
  }

  /// Every supported extension, plain and PNG-wrapped.
  #[must_use]
  pub fn all() -> Vec<Self> {
    ChemFormat::ALL
      .iter()
      .flat_map(|&format| [Self::new(format), Self::png(format)])
      .collect()
  }
}

impl fmt::Display for FileExtension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.format.suffix())?;
    if self.png {
      f.write_str(".png")?;
    }
    Ok(())
  }
}

/// Error returned when a string is not a supported structure-file extension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported structure file extension: {0}")]
pub struct UnknownExtension(pub String);

impl FromStr for FileExtension {
  type Err = UnknownExtension;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim().trim_start_matches('.');
    let (base, png) = trimmed
      .strip_suffix(".png")
      .map_or((trimmed, false), |base| (base, true));

    ChemFormat::ALL
      .iter()
      .find(|format| format.suffix() == base)
      .map(|&format| Self { format, png })
      .ok_or_else(|| UnknownExtension(s.to_string()))
  }
}

impl TryFrom<String> for FileExtension {
  type Error = UnknownExtension;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<FileExtension> for String {
  fn from(value: FileExtension) -> Self {
    value.to_string()
  }
}

/// One link to a structure file found in page text.
///
/// Borrows from the scanned text; `span` covers the anchor and any trailing
/// `JMOLSCRIPT{...}` block, which is what gets replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChemLinkMatch<'t> {
  /// The `href` value up to and including the extension.
  pub full_url:      &'t str,
  pub extension:     FileExtension,
  /// Raw query string following the extension, without the `?`.
  pub query:         &'t str,
  pub link_text:     &'t str,
  /// Content of a `JMOLSCRIPT{...}` block directly after the anchor.
  pub inline_script: Option<&'t str>,
  /// The `<a ...>...</a>` element on its own.
  pub anchor:        &'t str,
  pub span:          Range<usize>,
}

/// What to do when a linked structure file cannot be found in host storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFilePolicy {
  /// Emit the viewer anyway; it will fail to load the file client side.
  #[default]
  Embed,
  /// Keep the original link and mark it as unavailable.
  Placeholder,
}

impl FromStr for MissingFilePolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "embed" => Ok(Self::Embed),
      "placeholder" => Ok(Self::Placeholder),
      other => {
        Err(format!(
          "unknown missing file policy '{other}', expected 'embed' or \
           'placeholder'"
        ))
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extension_parse_png_and_gz() {
    assert_eq!(
      "pdb.gz".parse::<FileExtension>(),
      Ok(FileExtension::new(ChemFormat::PdbGz))
    );
    assert_eq!(
      ".mol.png".parse::<FileExtension>(),
      Ok(FileExtension::png(ChemFormat::Mol))
    );
    assert!("png".parse::<FileExtension>().is_err());
    assert!("txt".parse::<FileExtension>().is_err());
  }

  #[test]
  fn test_all_has_plain_and_png_variants() {
    let all = FileExtension::all();
    assert_eq!(all.len(), 24);
    assert!(all.contains(&FileExtension::png(ChemFormat::Xyz)));
  }

  #[test]
  fn test_missing_file_policy_parse() {
    assert_eq!(
      "Placeholder".parse::<MissingFilePolicy>(),
      Ok(MissingFilePolicy::Placeholder)
    );
    assert_eq!(
      "embed".parse::<MissingFilePolicy>(),
      Ok(MissingFilePolicy::Embed)
    );
    assert!("drop".parse::<MissingFilePolicy>().is_err());
  }
}
