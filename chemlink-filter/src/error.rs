use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while building a filter.
#[derive(Debug, Error)]
pub enum FilterError {
  #[error("Regex error: {0}")]
  Regex(#[from] regex::Error),

  #[error("Template error: {0}")]
  Template(String),
}

impl From<tera::Error> for FilterError {
  fn from(e: tera::Error) -> Self {
    Self::Template(e.to_string())
  }
}

/// Errors raised while copying a structure file out of host storage.
///
/// These never abort a page render; the affected embed degrades to a
/// placeholder.
#[derive(Debug, Error)]
pub enum StagingError {
  #[error("Failed to read {file} from file storage: {source}")]
  Storage {
    file:   String,
    #[source]
    source: io::Error,
  },

  #[error("Failed to create staging directory {}: {source}", path.display())]
  CreateDir {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to read staged file {}: {source}", path.display())]
  ReadStaged {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to write staged file {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to refresh timestamp of {}: {source}", path.display())]
  Touch {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}
