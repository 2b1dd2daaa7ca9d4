//! Generates the viewer markup that replaces a structure-file link.
//!
//! - [`locale`]: platform locale to viewer language
//! - [`options`]: per-link size / control set from the query string
//! - [`script`]: `JMOLSCRIPT{...}` cleanup
pub mod locale;
pub mod options;
pub mod script;

use chemlink_templates as templates;
use html_escape::{encode_double_quoted_attribute, encode_text};
use log::{debug, error, warn};
use tera::Tera;

pub use self::{
  locale::LanguageTable,
  options::{DEFAULT_CONTROL_SET, DEFAULT_SIZE, DisplayOptions},
  script::sanitize_init_script,
};
use crate::{
  error::{FilterError, StagingError},
  filter::{FilterOptions, PageRender},
  l10n::LocalizationProvider,
  resolver::{FileResolver, StageOutcome},
  types::{ChemLinkMatch, FileExtension, MissingFilePolicy},
};

const EMBED: &str = "embed";
const PLACEHOLDER: &str = "placeholder";

/// Where the viewer will load a structure from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
  file_url:  String,
  stem:      String,
  available: bool,
}

/// Renders one [`ChemLinkMatch`] into viewer markup.
pub struct EmbedGenerator {
  options:  FilterOptions,
  resolver: Box<dyn FileResolver + Send + Sync>,
  strings:  Box<dyn LocalizationProvider + Send + Sync>,
  tera:     Tera,
}

impl EmbedGenerator {
  /// # Errors
  ///
  /// Returns an error if the built-in templates fail to parse.
  pub fn new(
    options: FilterOptions,
    resolver: Box<dyn FileResolver + Send + Sync>,
    strings: Box<dyn LocalizationProvider + Send + Sync>,
  ) -> Result<Self, FilterError> {
    // Fragments are spliced into running text, so no trailing newline.
    let mut tera = Tera::default();
    tera.add_raw_template(EMBED, templates::EMBED_TEMPLATE.trim_end())?;
    tera.add_raw_template(
      PLACEHOLDER,
      templates::PLACEHOLDER_TEMPLATE.trim_end(),
    )?;

    Ok(Self {
      options,
      resolver,
      strings,
      tera,
    })
  }

  pub(crate) fn set_strings(
    &mut self,
    strings: Box<dyn LocalizationProvider + Send + Sync>,
  ) {
    self.strings = strings;
  }

  #[must_use]
  pub const fn options(&self) -> &FilterOptions {
    &self.options
  }

  /// Viewer settings for `link` under `locale`.
  #[must_use]
  pub fn display_options(
    &self,
    link: &ChemLinkMatch<'_>,
    locale: &str,
  ) -> DisplayOptions {
    DisplayOptions::derive(
      link,
      self.options.languages.resolve(locale),
      self.options.default_control_set,
      self.options.default_size,
    )
  }

  /// Produce the replacement markup for `link`.
  ///
  /// Never fails: staging and template problems degrade this one embed to a
  /// placeholder that keeps the original link.
  pub fn render(
    &self,
    link: &ChemLinkMatch<'_>,
    page: &mut PageRender<'_>,
  ) -> String {
    let options = self.display_options(link, page.locale());

    let target = match self.locate(link) {
      Ok(target) => target,
      Err(e) => {
        warn!("Could not stage {}: {e}", link.full_url);
        return self.placeholder(link);
      },
    };

    if !target.available
      && self.options.missing_file == MissingFilePolicy::Placeholder
    {
      return self.placeholder(link);
    }

    let id = page.next_id();
    let src = self.viewer_src(&target, link.extension, &options, &id);
    debug!("Embedding {} as iframe{id}", link.full_url);

    let mut context = tera::Context::new();
    context.insert("id", &id);
    context.insert("title", &encode_double_quoted_attribute(&target.stem));
    context.insert("src", &encode_double_quoted_attribute(&src));
    context.insert("size", &options.size);
    context.insert("min_size", &self.options.min_size);
    context.insert("max_size", &self.options.max_size);
    context.insert(
      "js_disabled",
      &encode_text(&self.strings.translate("jsdisabled")),
    );
    context.insert(
      "download_url",
      &encode_double_quoted_attribute(&target.file_url),
    );
    context.insert(
      "download_label",
      &encode_text(&self.strings.translate("downloadstructurefile")),
    );

    self.tera.render(EMBED, &context).unwrap_or_else(|e| {
      error!("Failed to render viewer for {}: {e}", link.full_url);
      self.placeholder(link)
    })
  }

  /// Keep the original link, marked as unavailable.
  fn placeholder(&self, link: &ChemLinkMatch<'_>) -> String {
    let message = self.strings.translate("filenotfound");

    let mut context = tera::Context::new();
    context.insert("anchor", link.anchor);
    context.insert("message", &encode_double_quoted_attribute(&message));

    self.tera.render(PLACEHOLDER, &context).unwrap_or_else(|e| {
      error!("Failed to render placeholder for {}: {e}", link.full_url);
      link.anchor.to_string()
    })
  }

  fn locate(&self, link: &ChemLinkMatch<'_>) -> Result<Target, StagingError> {
    let Some(file) = self.resolver.resolve(link.full_url) else {
      // Not in host storage, so already a plain URL the viewer can load.
      debug!("{} is outside file storage, linking directly", link.full_url);
      return Ok(Target {
        file_url:  link.full_url.to_string(),
        stem:      url_stem(link.full_url, link.extension),
        available: true,
      });
    };

    let staged = self.resolver.materialize(&file)?;
    Ok(Target {
      file_url:  staged.public_url,
      stem:      file.file_stem(link.extension).to_string(),
      available: staged.outcome != StageOutcome::Missing,
    })
  }

  fn viewer_src(
    &self,
    target: &Target,
    extension: FileExtension,
    options: &DisplayOptions,
    id: &str,
  ) -> String {
    let extension = extension.to_string();
    let control_set = options.control_set.to_string();
    let params = [
      ("p", target.file_url.as_str()),
      ("n", target.stem.as_str()),
      ("f", extension.as_str()),
      ("l", options.language.as_str()),
      ("c", control_set.as_str()),
      ("i", options.init_script.as_str()),
      ("id", id),
      ("_USE", "HTML5"),
      ("DEFER", "1"),
    ];

    let query = params
      .iter()
      .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
      .collect::<Vec<_>>()
      .join("&");
    let separator = if self.options.viewer_url.contains('?') {
      '&'
    } else {
      '?'
    };

    format!("{}{separator}{query}", self.options.viewer_url)
  }
}

/// Decoded last path segment of `url` without its structure extension.
fn url_stem(url: &str, extension: FileExtension) -> String {
  let name = url.rsplit(['/', '\\']).next().unwrap_or(url);
  let name = urlencoding::decode(name)
    .map_or_else(|_| name.to_string(), std::borrow::Cow::into_owned);
  let suffix = format!(".{extension}");
  name
    .strip_suffix(&suffix)
    .map(str::to_string)
    .unwrap_or(name)
}
