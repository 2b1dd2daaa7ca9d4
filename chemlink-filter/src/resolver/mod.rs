//! Locating linked structure files and staging them for the viewer.
//!
//! The viewer runs in a sandboxed iframe that can only load plain URLs, so a
//! file kept in host storage has to be copied to an ordinary path first.
//!
//! - [`FileResolver`]: the capability the embed generator talks to
//! - [`pluginfile`]: resolver for `.../pluginfile.php/<context>/...` URLs
//! - [`store`]: host storage backends
//! - [`staging`]: the copy / freshness check itself
pub mod pluginfile;
pub mod staging;
pub mod store;

use std::path::PathBuf;

pub use pluginfile::{PluginFileResolver, parse_pluginfile_url};
pub use staging::{StageOutcome, content_hash, stage_file};
pub use store::{DirectoryStore, FileStore, MemoryStore};

use crate::{error::StagingError, types::FileExtension};

/// Host storage coordinates of a linked file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedFile {
  pub context_id: u64,
  pub component:  String,
  pub area:       String,
  pub item_id:    u64,
  /// Directory inside the area, always starting and ending with `/`.
  pub file_path:  String,
  /// Percent-decoded file name.
  pub filename:   String,
  /// The link's path below the file endpoint, as written in the link.
  pub short_path: String,
}

impl ResolvedFile {
  /// File name without its structure-file extension.
  #[must_use]
  pub fn file_stem(&self, extension: FileExtension) -> &str {
    self
      .filename
      .strip_suffix(&extension.to_string())
      .and_then(|stem| stem.strip_suffix('.'))
      .unwrap_or(&self.filename)
  }
}

/// Where a resolved file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
  pub local_path: PathBuf,
  /// URL the viewer loads the staged copy from.
  pub public_url: String,
  pub outcome:    StageOutcome,
}

/// Turns link URLs into files the viewer can load.
pub trait FileResolver {
  /// Map a link URL onto host storage coordinates.
  ///
  /// Returns [`None`] when the URL does not point into host storage.
  fn resolve(&self, url: &str) -> Option<ResolvedFile>;

  /// Make sure an up to date copy of `file` exists at a plain path.
  ///
  /// A file that is missing from host storage is not an error; the returned
  /// outcome is [`StageOutcome::Missing`].
  ///
  /// # Errors
  ///
  /// Returns an error if host storage cannot be read or the copy cannot be
  /// written.
  fn materialize(
    &self,
    file: &ResolvedFile,
  ) -> Result<StagedFile, StagingError>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::ChemFormat;

  fn resolved(filename: &str) -> ResolvedFile {
    ResolvedFile {
      context_id: 5,
      component:  "mod_resource".to_string(),
      area:       "content".to_string(),
      item_id:    0,
      file_path:  "/".to_string(),
      filename:   filename.to_string(),
      short_path: format!("/5/mod_resource/content/0/{filename}"),
    }
  }

  #[test]
  fn test_file_stem_strips_extension() {
    assert_eq!(
      resolved("water.pdb").file_stem(FileExtension::new(ChemFormat::Pdb)),
      "water"
    );
    assert_eq!(
      resolved("1crn.pdb.gz")
        .file_stem(FileExtension::new(ChemFormat::PdbGz)),
      "1crn"
    );
    assert_eq!(
      resolved("caffeine.mol.png")
        .file_stem(FileExtension::png(ChemFormat::Mol)),
      "caffeine"
    );
  }

  #[test]
  fn test_file_stem_only_strips_suffix() {
    assert_eq!(
      resolved("pdb.files.pdb").file_stem(FileExtension::new(ChemFormat::Pdb)),
      "pdb.files"
    );
    assert_eq!(
      resolved("water.xyz").file_stem(FileExtension::new(ChemFormat::Pdb)),
      "water.xyz"
    );
  }
}
