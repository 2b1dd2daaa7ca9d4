use std::{io, path::PathBuf};

use thiserror::Error;

use crate::templates::TemplateError;

/// Errors raised while loading, checking or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Invalid keys, values or settings.
  #[error("Configuration error: {0}")]
  Config(String),

  #[error(transparent)]
  Template(#[from] TemplateError),

  #[error("Failed to access {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to parse JSON config {}: {source}", path.display())]
  Json {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("Failed to parse TOML config {}: {source}", path.display())]
  Toml {
    path:   PathBuf,
    #[source]
    source: toml::de::Error,
  },
}
