use std::fmt;

/// Error type for template operations.
#[derive(Debug)]
pub enum TemplateError {
  /// The requested configuration format is not supported.
  UnsupportedFormat(String),
}

impl fmt::Display for TemplateError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::UnsupportedFormat(format) => {
        write!(f, "Unsupported config format: {format}")
      },
    }
  }
}

impl std::error::Error for TemplateError {}

/// Default configuration in TOML, commented so a new user knows what each
/// field does.
pub const DEFAULT_TOML_TEMPLATE: &str = r#"# chemlink configuration file

# Directory containing the rendered HTML pages to filter
input_dir = "site"

# Output directory for filtered pages
output_dir = "build"

# Public root URL of the site. Absolute links are only rewritten when they
# point at this host.
wwwroot = "http://localhost"

# Platform locale used to pick the viewer language
locale = "en"

# Number of threads to use for parallel processing (defaults to number of CPU cores)
# jobs = 4

# Directory mirroring pluginfile.php URLs (defaults to <input_dir>/pluginfile.php)
# storage_dir = "site/pluginfile.php"

# Where stored files are copied for the viewer (defaults to <output_dir>/filter/jmol/temp)
# staging_dir = "build/filter/jmol/temp"

# Public URL of staging_dir (defaults to <wwwroot>/filter/jmol/temp)
# staging_url = "http://localhost/filter/jmol/temp"

# Viewer bootstrap page (defaults to <wwwroot>/filter/jmol/iframe.php)
# viewer_url = "http://localhost/filter/jmol/iframe.php"

# Where pages load the fullscreen script from
asset_url = "assets/bigscreen.js"

# Structure formats to embed (defaults to all of them, with and without .png)
# formats = ["pdb", "pdb.gz", "cif", "mol", "xyz"]

# What to do with links to files missing from storage: "embed" or "placeholder"
missing_file = "embed"

# Viewer size in pixels when a link has no s= parameter
default_size = 350

# Control set when a link has no c= parameter
default_control_set = 1

# Viewer language lookup
[language]
# Fallback when a locale is not supported
# default = "en_GB"

# Locales that map to a specific viewer language
[language.exceptions]
# no = "nb"

# Overrides for user-facing strings
[strings]
# jsdisabled = "JavaScript is disabled."
# downloadstructurefile = "Download structure file"
# filenotfound = "Structure file not available"
"#;

/// Default configuration in JSON.
pub const DEFAULT_JSON_TEMPLATE: &str = r#"{
  "input_dir": "site",
  "output_dir": "build",
  "wwwroot": "http://localhost",
  "locale": "en",
  "asset_url": "assets/bigscreen.js",
  "missing_file": "embed",
  "default_size": 350,
  "default_control_set": 1,
  "language": {
    "exceptions": {}
  },
  "strings": {}
}
"#;

/// Get the default configuration in `format`.
///
/// # Errors
///
/// Returns [`TemplateError::UnsupportedFormat`] for anything but `toml` and
/// `json`.
pub fn get_template(format: &str) -> Result<&'static str, TemplateError> {
  match format.to_lowercase().as_str() {
    "toml" => Ok(DEFAULT_TOML_TEMPLATE),
    "json" => Ok(DEFAULT_JSON_TEMPLATE),
    _ => Err(TemplateError::UnsupportedFormat(format.to_string())),
  }
}
