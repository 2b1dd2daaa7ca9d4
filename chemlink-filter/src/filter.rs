use std::collections::BTreeSet;

use log::debug;

use crate::{
  embed::{DEFAULT_CONTROL_SET, DEFAULT_SIZE, EmbedGenerator, LanguageTable},
  error::FilterError,
  l10n::{DefaultStrings, LocalizationProvider},
  matcher::LinkMatcher,
  resolver::FileResolver,
  types::{FileExtension, MissingFilePolicy},
};

/// Asset id of the fullscreen shim every page with a viewer needs.
pub const BIGSCREEN_ASSET: &str = "bigscreen";

/// Options for configuring a [`JmolFilter`].
#[derive(Debug, Clone)]
pub struct FilterOptions {
  /// Host whose absolute links are rewritten.
  pub host: String,

  /// Structure-file extensions to recognize.
  pub formats: Vec<FileExtension>,

  /// Viewer bootstrap page the iframe points at.
  pub viewer_url: String,

  /// Platform locale to viewer language lookup.
  pub languages: LanguageTable,

  /// What to emit for files missing from host storage.
  pub missing_file: MissingFilePolicy,

  /// Control set when a link has no `c=` parameter.
  pub default_control_set: u8,

  /// Viewer size in pixels when a link has no `s=` parameter.
  pub default_size: u16,

  /// Bounds of the client-side resize handle.
  pub min_size: u16,
  pub max_size: u16,
}

impl Default for FilterOptions {
  fn default() -> Self {
    Self {
      host:                "localhost".to_string(),
      formats:             FileExtension::all(),
      viewer_url:          "/filter/jmol/iframe.php".to_string(),
      languages:           LanguageTable::jsmol(),
      missing_file:        MissingFilePolicy::Embed,
      default_control_set: DEFAULT_CONTROL_SET,
      default_size:        DEFAULT_SIZE,
      min_size:            100,
      max_size:            1000,
    }
  }
}

/// Receives requests for page-level assets (scripts, stylesheets).
pub trait AssetInjector {
  /// Ask for `asset_id` to be included on the page. Repeated requests for
  /// the same id within one page must have no further effect.
  fn request_once(&mut self, asset_id: &str);
}

/// Collects requested asset ids for the caller to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAssets {
  requested: BTreeSet<String>,
  order:     Vec<String>,
}

impl PageAssets {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Requested ids, in request order.
  #[must_use]
  pub fn requested(&self) -> &[String] {
    &self.order
  }

  #[must_use]
  pub fn contains(&self, asset_id: &str) -> bool {
    self.requested.contains(asset_id)
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }
}

impl AssetInjector for PageAssets {
  fn request_once(&mut self, asset_id: &str) {
    if self.requested.insert(asset_id.to_string()) {
      self.order.push(asset_id.to_string());
    }
  }
}

/// Unique viewer ids for one page: a time-based seed followed by a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedIds {
  seed:  i64,
  count: u32,
}

impl EmbedIds {
  /// Seed from the current time.
  #[must_use]
  pub fn new() -> Self {
    Self::with_seed(jiff::Timestamp::now().as_second())
  }

  #[must_use]
  pub const fn with_seed(seed: i64) -> Self {
    Self { seed, count: 0 }
  }

  pub fn next_id(&mut self) -> String {
    self.count += 1;
    format!("{}{}", self.seed, self.count)
  }

  /// Ids handed out so far.
  #[must_use]
  pub const fn issued(&self) -> u32 {
    self.count
  }
}

impl Default for EmbedIds {
  fn default() -> Self {
    Self::new()
  }
}

/// State scoped to rendering one page.
///
/// Create one per page and pass it to every [`JmolFilter::filter`] call for
/// that page; it guards the one-time asset request and numbers the viewers.
pub struct PageRender<'a> {
  locale:              String,
  ids:                 EmbedIds,
  assets:              &'a mut dyn AssetInjector,
  bigscreen_requested: bool,
  rewrites:            usize,
}

impl<'a> PageRender<'a> {
  pub fn new(
    locale: impl Into<String>,
    assets: &'a mut dyn AssetInjector,
  ) -> Self {
    Self {
      locale: locale.into(),
      ids: EmbedIds::new(),
      assets,
      bigscreen_requested: false,
      rewrites: 0,
    }
  }

  #[must_use]
  pub fn with_ids(mut self, ids: EmbedIds) -> Self {
    self.ids = ids;
    self
  }

  #[must_use]
  pub fn locale(&self) -> &str {
    &self.locale
  }

  pub fn next_id(&mut self) -> String {
    self.ids.next_id()
  }

  /// Links rewritten on this page so far.
  #[must_use]
  pub const fn rewrites(&self) -> usize {
    self.rewrites
  }

  fn record_rewrites(&mut self, count: usize) {
    self.rewrites += count;
    if count > 0 && !self.bigscreen_requested {
      self.assets.request_once(BIGSCREEN_ASSET);
      self.bigscreen_requested = true;
    }
  }
}

/// Rewrites structure-file links in page text into embedded viewers.
pub struct JmolFilter {
  matcher:   LinkMatcher,
  generator: EmbedGenerator,
}

impl JmolFilter {
  /// # Errors
  ///
  /// Returns an error if the link pattern or the built-in templates fail to
  /// compile.
  pub fn new<R>(
    options: FilterOptions,
    resolver: R,
  ) -> Result<Self, FilterError>
  where
    R: FileResolver + Send + Sync + 'static,
  {
    let matcher = LinkMatcher::new(&options.host, &options.formats)?;
    let generator = EmbedGenerator::new(
      options,
      Box::new(resolver),
      Box::new(DefaultStrings::new()),
    )?;
    Ok(Self { matcher, generator })
  }

  /// Use `strings` for user-facing text.
  #[must_use]
  pub fn with_strings<L>(mut self, strings: L) -> Self
  where
    L: LocalizationProvider + Send + Sync + 'static,
  {
    self.generator.set_strings(Box::new(strings));
    self
  }

  #[must_use]
  pub const fn matcher(&self) -> &LinkMatcher {
    &self.matcher
  }

  #[must_use]
  pub const fn generator(&self) -> &EmbedGenerator {
    &self.generator
  }

  /// Replace every qualifying link in `text` with a viewer.
  ///
  /// Text without qualifying links comes back unchanged. The first rewrite on
  /// a page requests [`BIGSCREEN_ASSET`] through the page's injector.
  pub fn filter(&self, text: &str, page: &mut PageRender<'_>) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    let mut rewrites = 0;

    for link in self.matcher.scan(text) {
      debug!(
        "Found {} link to {} (query '{}')",
        link.extension, link.full_url, link.query
      );
      output.push_str(&text[last..link.span.start]);
      output.push_str(&self.generator.render(&link, page));
      last = link.span.end;
      rewrites += 1;
    }

    if rewrites == 0 {
      return text.to_string();
    }

    output.push_str(&text[last..]);
    page.record_rewrites(rewrites);
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct CountingInjector(Vec<String>);

  impl AssetInjector for CountingInjector {
    fn request_once(&mut self, asset_id: &str) {
      self.0.push(asset_id.to_string());
    }
  }

  #[test]
  fn test_embed_ids_are_distinct() {
    let mut ids = EmbedIds::with_seed(1_700_000_000);
    assert_eq!(ids.next_id(), "17000000001");
    assert_eq!(ids.next_id(), "17000000002");
    assert_eq!(ids.issued(), 2);
  }

  #[test]
  fn test_page_assets_dedup() {
    let mut assets = PageAssets::new();
    assets.request_once("bigscreen");
    assets.request_once("other");
    assets.request_once("bigscreen");
    assert_eq!(assets.requested(), ["bigscreen", "other"]);
    assert!(assets.contains("other"));
  }

  #[test]
  fn test_page_render_requests_once() {
    let mut injector = CountingInjector(Vec::new());
    {
      let mut page = PageRender::new("en", &mut injector);
      page.record_rewrites(0);
      page.record_rewrites(2);
      page.record_rewrites(1);
      assert_eq!(page.rewrites(), 3);
    }
    assert_eq!(injector.0, [BIGSCREEN_ASSET]);
  }
}
