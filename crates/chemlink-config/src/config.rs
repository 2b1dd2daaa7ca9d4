use std::{
  collections::HashMap,
  fmt::Display,
  fs,
  path::{Path, PathBuf},
  str::FromStr,
  sync::OnceLock,
};

use chemlink_filter::{
  DefaultStrings,
  FileExtension,
  FilterOptions,
  MissingFilePolicy,
  embed::{DEFAULT_CONTROL_SET, DEFAULT_SIZE},
};
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, language::LanguageConfig};

/// Configuration for the chemlink page filter.
///
/// Fields are typically loaded from a TOML or JSON config file, but can also
/// be set via CLI arguments or `--config KEY=VALUE` overrides. Several
/// locations default to paths derived from [`Config::wwwroot`] and
/// [`Config::output_dir`]; use the accessor methods to read them resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Input directory containing rendered HTML pages.
  pub input_dir: Option<PathBuf>,

  /// Output directory for filtered pages.
  pub output_dir: PathBuf,

  /// Public root URL of the site.
  pub wwwroot: String,

  /// Platform locale the pages are rendered in.
  pub locale: String,

  /// Number of threads to use for parallel processing.
  pub jobs: Option<usize>,

  /// Directory mirroring `pluginfile.php` URLs.
  pub storage_dir: Option<PathBuf>,

  /// Directory stored files are staged into.
  pub staging_dir: Option<PathBuf>,

  /// Public URL of the staging directory.
  pub staging_url: Option<String>,

  /// URL of the viewer bootstrap page.
  pub viewer_url: Option<String>,

  /// URL pages load the fullscreen script from.
  pub asset_url: String,

  /// Structure formats to embed. All of them when unset.
  pub formats: Option<Vec<FileExtension>>,

  /// How links to files missing from storage are rendered.
  pub missing_file: MissingFilePolicy,

  /// Viewer size in pixels when a link has no `s=` parameter.
  pub default_size: u16,

  /// Control set when a link has no `c=` parameter.
  pub default_control_set: u8,

  /// Viewer language lookup.
  pub language: LanguageConfig,

  /// Overrides for user-facing strings, by key.
  pub strings: HashMap<String, String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      input_dir:           None,
      output_dir:          PathBuf::from("build"),
      wwwroot:             "http://localhost".to_string(),
      locale:              "en".to_string(),
      jobs:                None,
      storage_dir:         None,
      staging_dir:         None,
      staging_url:         None,
      viewer_url:          None,
      asset_url:           "assets/bigscreen.js".to_string(),
      formats:             None,
      missing_file:        MissingFilePolicy::default(),
      default_size:        DEFAULT_SIZE,
      default_control_set: DEFAULT_CONTROL_SET,
      language:            LanguageConfig::default(),
      strings:             HashMap::new(),
    }
  }
}

impl Config {
  /// Load configuration from a file (TOML or JSON, by extension).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content =
      fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
      })?;

    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
      return Err(ConfigError::Config(format!(
        "Config file has no extension: {}",
        path.display()
      )));
    };

    match ext.to_lowercase().as_str() {
      "json" => {
        serde_json::from_str(&content).map_err(|source| {
          ConfigError::Json {
            path: path.to_path_buf(),
            source,
          }
        })
      },
      "toml" => {
        toml::from_str(&content).map_err(|source| {
          ConfigError::Toml {
            path: path.to_path_buf(),
            source,
          }
        })
      },
      _ => {
        Err(ConfigError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
    }
  }

  /// Load configuration from the given files, or a discovered one, then apply
  /// `KEY=VALUE` overrides.
  ///
  /// Multiple files are merged in order, later files taking precedence.
  ///
  /// # Errors
  ///
  /// Returns an error if a file cannot be loaded or an override is invalid.
  pub fn load(
    config_files: &[PathBuf],
    config_overrides: &[String],
  ) -> Result<Self, ConfigError> {
    let mut config = if let Some((first, rest)) = config_files.split_first() {
      let mut merged_config = Self::from_file(first)?;
      for config_path in rest {
        merged_config.merge(Self::from_file(config_path)?);
      }

      if config_files.len() > 1 {
        log::info!("Loaded and merged {} config files", config_files.len());
      }

      merged_config
    } else if let Some(discovered_config) = Self::find_config_file() {
      log::info!(
        "Using discovered config file: {}",
        discovered_config.display()
      );
      Self::from_file(&discovered_config)?
    } else {
      Self::default()
    };

    if !config_overrides.is_empty() {
      config.apply_overrides(config_overrides)?;
    }

    Ok(config)
  }

  /// Apply configuration overrides from KEY=VALUE strings.
  ///
  /// # Errors
  ///
  /// Returns an error if:
  ///
  /// - An override string is not in KEY=VALUE format
  /// - A key is not recognized
  /// - A value cannot be parsed as the expected type
  ///
  /// # Example
  ///
  /// ```rust, ignore
  /// config.apply_overrides(&vec![
  ///     "missing_file=placeholder".to_string(),
  ///     "language.exceptions.no=nb".to_string(),
  /// ])?;
  /// ```
  pub fn apply_overrides(
    &mut self,
    overrides: &[String],
  ) -> Result<(), ConfigError> {
    for override_str in overrides {
      let (key, value) = override_str.split_once('=').ok_or_else(|| {
        ConfigError::Config(format!(
          "Invalid config override format: '{override_str}'. Expected \
           KEY=VALUE"
        ))
      })?;

      self.apply_override(key.trim(), value.trim())?;
    }

    Ok(())
  }

  /// Apply a single override. Empty values clear optional fields.
  ///
  /// # Errors
  ///
  /// Returns an error if `key` is unknown or `value` does not parse.
  pub fn apply_override(
    &mut self,
    key: &str,
    value: &str,
  ) -> Result<(), ConfigError> {
    match key {
      "input_dir" => self.input_dir = optional(value).map(PathBuf::from),
      "output_dir" => self.output_dir = PathBuf::from(value),
      "wwwroot" => self.wwwroot = value.to_string(),
      "locale" => self.locale = value.to_string(),
      "jobs" => {
        self.jobs = optional(value)
          .map(|v| parse_value(key, v))
          .transpose()?;
      },
      "storage_dir" => self.storage_dir = optional(value).map(PathBuf::from),
      "staging_dir" => self.staging_dir = optional(value).map(PathBuf::from),
      "staging_url" => self.staging_url = optional(value).map(str::to_string),
      "viewer_url" => self.viewer_url = optional(value).map(str::to_string),
      "asset_url" => self.asset_url = value.to_string(),
      "formats" => {
        self.formats = optional(value)
          .map(|v| {
            v.split(',')
              .map(|ext| parse_value(key, ext.trim()))
              .collect::<Result<Vec<_>, _>>()
          })
          .transpose()?;
      },
      "missing_file" => self.missing_file = parse_value(key, value)?,
      "default_size" => self.default_size = parse_value(key, value)?,
      "default_control_set" => {
        self.default_control_set = parse_value(key, value)?;
      },
      "language.default" => {
        self.language.default = optional(value).map(str::to_string);
      },
      _ => {
        if let Some(locale) = key.strip_prefix("language.exceptions.") {
          self
            .language
            .exceptions
            .insert(locale.to_string(), value.to_string());
        } else if let Some(name) = key.strip_prefix("strings.") {
          self.strings.insert(name.to_string(), value.to_string());
        } else {
          return Err(ConfigError::Config(format!(
            "Unknown configuration key: '{key}'"
          )));
        }
      },
    }

    Ok(())
  }

  /// Merge another config into this one, with the other config's values taking
  /// precedence.
  ///
  /// # Merge Rules
  ///
  /// - [`Option<T>`] fields: Other's [`Some`] value replaces this config's
  ///   value
  /// - Plain fields: Other's value replaces this config's value unless it is
  ///   the default
  /// - [`HashMap`] fields: Other's entries are merged in (can override
  ///   individual keys)
  pub fn merge(&mut self, other: Self) {
    fn replace<T: PartialEq>(current: &mut T, other: T, default: &T) {
      if other != *default {
        *current = other;
      }
    }

    fn replace_some<T>(current: &mut Option<T>, other: Option<T>) {
      if other.is_some() {
        *current = other;
      }
    }

    let defaults = Self::default();

    replace_some(&mut self.input_dir, other.input_dir);
    replace(&mut self.output_dir, other.output_dir, &defaults.output_dir);
    replace(&mut self.wwwroot, other.wwwroot, &defaults.wwwroot);
    replace(&mut self.locale, other.locale, &defaults.locale);
    replace_some(&mut self.jobs, other.jobs);
    replace_some(&mut self.storage_dir, other.storage_dir);
    replace_some(&mut self.staging_dir, other.staging_dir);
    replace_some(&mut self.staging_url, other.staging_url);
    replace_some(&mut self.viewer_url, other.viewer_url);
    replace(&mut self.asset_url, other.asset_url, &defaults.asset_url);
    replace_some(&mut self.formats, other.formats);
    replace(
      &mut self.missing_file,
      other.missing_file,
      &defaults.missing_file,
    );
    replace(
      &mut self.default_size,
      other.default_size,
      &defaults.default_size,
    );
    replace(
      &mut self.default_control_set,
      other.default_control_set,
      &defaults.default_control_set,
    );
    self.language.merge(other.language);
    self.strings.extend(other.strings);
  }

  /// Search for config files in common locations
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    static RESULT: OnceLock<Option<PathBuf>> = OnceLock::new();
    RESULT
      .get_or_init(|| {
        let config_filenames = [
          "chemlink.toml",
          "chemlink.json",
          ".chemlink.toml",
          ".chemlink.json",
          ".config/chemlink.toml",
          ".config/chemlink.json",
        ];

        let current_dir = std::env::current_dir().ok()?;
        for filename in &config_filenames {
          let config_path = current_dir.join(filename);
          if config_path.exists() {
            return Some(config_path);
          }
        }

        if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
          let xdg_config_dir = PathBuf::from(xdg_config_home);
          for filename in &["chemlink.toml", "chemlink.json"] {
            let config_path = xdg_config_dir.join(filename);
            if config_path.exists() {
              return Some(config_path);
            }
          }
        }

        None
      })
      .clone()
  }

  /// Check the settings a filter run depends on.
  ///
  /// # Errors
  ///
  /// Returns an error listing every problem found.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    match self.input_dir {
      Some(ref dir) if !dir.is_dir() => {
        errors
          .push(format!("Input directory does not exist: {}", dir.display()));
      },
      Some(_) => {},
      None => errors.push("No input directory given".to_string()),
    }

    if self.host().is_empty() {
      errors.push(format!("wwwroot has no host: '{}'", self.wwwroot));
    }

    if self.default_size == 0 {
      errors.push("default_size must be greater than 0".to_string());
    }

    if let Some(ref formats) = self.formats
      && formats.is_empty()
    {
      log::warn!("No structure formats enabled, no links will be rewritten");
    }

    if errors.is_empty() {
      Ok(())
    } else {
      Err(ConfigError::Config(errors.join("\n")))
    }
  }

  /// Host part of [`Config::wwwroot`], without scheme, credentials or port.
  #[must_use]
  pub fn host(&self) -> String {
    let rest = self
      .wwwroot
      .split_once("://")
      .map_or(self.wwwroot.as_str(), |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority
      .rsplit_once('@')
      .map_or(authority, |(_, host)| host);
    authority
      .split(':')
      .next()
      .unwrap_or_default()
      .to_lowercase()
  }

  fn wwwroot_join(&self, path: &str) -> String {
    format!("{}/{path}", self.wwwroot.trim_end_matches('/'))
  }

  /// Where stored files are read from.
  #[must_use]
  pub fn storage_dir(&self) -> Option<PathBuf> {
    self.storage_dir.clone().or_else(|| {
      self
        .input_dir
        .as_ref()
        .map(|dir| dir.join("pluginfile.php"))
    })
  }

  /// Where stored files are staged.
  ///
  /// Defaults to the directory the default [`Config::staging_url`] names
  /// below the output root.
  #[must_use]
  pub fn staging_dir(&self) -> PathBuf {
    self
      .staging_dir
      .clone()
      .unwrap_or_else(|| self.output_dir.join("filter/jmol/temp"))
  }

  /// Public URL of [`Config::staging_dir`].
  #[must_use]
  pub fn staging_url(&self) -> String {
    self
      .staging_url
      .clone()
      .unwrap_or_else(|| self.wwwroot_join("filter/jmol/temp"))
  }

  /// URL of the viewer bootstrap page.
  #[must_use]
  pub fn viewer_url(&self) -> String {
    self
      .viewer_url
      .clone()
      .unwrap_or_else(|| self.wwwroot_join("filter/jmol/iframe.php"))
  }

  /// Localized strings with the configured overrides applied.
  #[must_use]
  pub fn strings(&self) -> DefaultStrings {
    DefaultStrings::with_overrides(self.strings.clone())
  }

  /// Options for the core filter.
  #[must_use]
  pub fn filter_options(&self) -> FilterOptions {
    FilterOptions {
      host: self.host(),
      formats: self.formats.clone().unwrap_or_else(FileExtension::all),
      viewer_url: self.viewer_url(),
      languages: self.language.table(),
      missing_file: self.missing_file,
      default_control_set: self.default_control_set,
      default_size: self.default_size,
      ..FilterOptions::default()
    }
  }

  /// Generate a default configuration file with commented explanations
  ///
  /// # Errors
  ///
  /// Returns an error if the format is unsupported or the file cannot be
  /// written.
  pub fn generate_default_config(
    format: &str,
    path: &Path,
  ) -> Result<(), ConfigError> {
    let config_content = crate::templates::get_template(format)?;

    fs::write(path, config_content).map_err(|source| {
      ConfigError::Io {
        path: path.to_path_buf(),
        source,
      }
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

fn optional(value: &str) -> Option<&str> {
  (!value.is_empty()).then_some(value)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T: FromStr,
  T::Err: Display,
{
  value.parse().map_err(|e| {
    ConfigError::Config(format!("Invalid value for '{key}': '{value}' ({e})"))
  })
}
