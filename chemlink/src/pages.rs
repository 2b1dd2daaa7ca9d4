use std::{
  fs,
  path::{Path, PathBuf},
  sync::LazyLock,
};

use chemlink_config::Config;
use chemlink_filter::{
  BIGSCREEN_ASSET,
  JmolFilter,
  PageAssets,
  PageRender,
  resolver::{DirectoryStore, PluginFileResolver},
  utils::static_regex,
};
use color_eyre::eyre::{Context, Result, eyre};
use html_escape::encode_double_quoted_attribute;
use log::{debug, info};
use rayon::prelude::*;
use regex::Regex;
use walkdir::WalkDir;

/// Totals for one run over a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteReport {
  /// HTML pages read.
  pub pages:     usize,
  /// Pages that got at least one viewer.
  pub rewritten: usize,
  /// Links replaced across all pages.
  pub links:     usize,
  /// Other files copied through unchanged.
  pub copied:    usize,
}

/// What happened to a single input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
  Page { links: usize },
  Copied,
}

/// Build the core filter from `config`, reading stored files from
/// [`Config::storage_dir`].
///
/// # Errors
///
/// Returns an error if the filter cannot be constructed.
pub fn build_filter(config: &Config) -> Result<JmolFilter> {
  let storage_dir = config
    .storage_dir()
    .unwrap_or_else(|| PathBuf::from("pluginfile.php"));
  debug!("Reading stored files from {}", storage_dir.display());

  let resolver = PluginFileResolver::new(
    DirectoryStore::new(storage_dir),
    config.staging_dir(),
    config.staging_url(),
  );

  let filter = JmolFilter::new(config.filter_options(), resolver)
    .wrap_err("Failed to set up the link filter")?;
  Ok(filter.with_strings(config.strings()))
}

/// Filter one page and add the fullscreen script when needed.
///
/// `script_src` is the `src` the page should load the script from. Returns
/// the new page and the number of links replaced.
pub fn filter_page(
  filter: &JmolFilter,
  html: &str,
  locale: &str,
  script_src: &str,
) -> (String, usize) {
  let mut assets = PageAssets::new();
  let (output, links) = {
    let mut page = PageRender::new(locale, &mut assets);
    let output = filter.filter(html, &mut page);
    (output, page.rewrites())
  };

  if assets.contains(BIGSCREEN_ASSET) {
    (inject_script(&output, script_src), links)
  } else {
    (output, links)
  }
}

/// Insert a `<script>` tag for `src` before `</head>`, or append it when the
/// page has no head.
#[must_use]
pub fn inject_script(html: &str, src: &str) -> String {
  static HEAD_END_RE: LazyLock<Regex> =
    LazyLock::new(|| static_regex("HEAD_END_RE", r"(?i)</head\s*>"));

  let tag = format!(
    "<script src=\"{}\"></script>\n",
    encode_double_quoted_attribute(src)
  );

  match HEAD_END_RE.find(html) {
    Some(head_end) => {
      let mut output = String::with_capacity(html.len() + tag.len());
      output.push_str(&html[..head_end.start()]);
      output.push_str(&tag);
      output.push_str(&html[head_end.start()..]);
      output
    },
    None => format!("{html}\n{tag}"),
  }
}

/// `asset_url` as seen from the page at `rel_path` below the output root.
///
/// Absolute and root-relative URLs are used as is; relative ones get one `../`
/// per directory level of the page.
#[must_use]
pub fn script_src(asset_url: &str, rel_path: &Path) -> String {
  if asset_url.contains("://") || asset_url.starts_with('/') {
    return asset_url.to_string();
  }
  let depth = rel_path.components().count().saturating_sub(1);
  format!("{}{asset_url}", "../".repeat(depth))
}

fn is_html(path: &Path) -> bool {
  path.extension().is_some_and(|ext| {
    ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm")
  })
}

/// Every file below `input_dir`, skipping `output_dir` if it is nested inside.
fn collect_files(input_dir: &Path, output_dir: &Path) -> Vec<PathBuf> {
  let output_dir = output_dir.canonicalize().ok();
  let mut files = Vec::with_capacity(100);

  for entry in WalkDir::new(input_dir)
    .follow_links(true)
    .into_iter()
    .filter_entry(|entry| {
      output_dir
        .as_ref()
        .is_none_or(|out| entry.path().canonicalize().ok().as_ref() != Some(out))
    })
    .filter_map(Result::ok)
  {
    if entry.file_type().is_file() {
      files.push(entry.into_path());
    }
  }

  files.sort();
  files
}

fn process_file(
  filter: &JmolFilter,
  config: &Config,
  input_dir: &Path,
  path: &Path,
) -> Result<FileOutcome> {
  let rel_path = path.strip_prefix(input_dir).wrap_err_with(|| {
    format!("Failed to determine relative path for {}", path.display())
  })?;
  let output_path = config.output_dir.join(rel_path);
  if let Some(parent) = output_path.parent() {
    fs::create_dir_all(parent).wrap_err_with(|| {
      format!("Failed to create output directory: {}", parent.display())
    })?;
  }

  if !is_html(path) {
    fs::copy(path, &output_path).wrap_err_with(|| {
      format!(
        "Failed to copy {} to {}",
        path.display(),
        output_path.display()
      )
    })?;
    return Ok(FileOutcome::Copied);
  }

  let html = fs::read_to_string(path)
    .wrap_err_with(|| format!("Failed to read page: {}", path.display()))?;
  let src = script_src(&config.asset_url, rel_path);
  let (output, links) = filter_page(filter, &html, &config.locale, &src);
  if links > 0 {
    debug!("Replaced {links} link(s) in {}", rel_path.display());
  }

  fs::write(&output_path, output).wrap_err_with(|| {
    format!("Failed to write output page: {}", output_path.display())
  })?;
  Ok(FileOutcome::Page { links })
}

/// Write the fullscreen script to `<output_dir>/assets/bigscreen.js`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_assets(output_dir: &Path) -> Result<PathBuf> {
  let assets_dir = output_dir.join("assets");
  fs::create_dir_all(&assets_dir).wrap_err_with(|| {
    format!("Failed to create assets directory: {}", assets_dir.display())
  })?;

  let path = assets_dir.join("bigscreen.js");
  fs::write(&path, chemlink_templates::BIGSCREEN_JS)
    .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}

/// Filter every page below `config.input_dir` into `config.output_dir`.
///
/// HTML pages are filtered, everything else is copied unchanged. Pages are
/// processed in parallel on `config.jobs` threads.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete, or if any file cannot
/// be read or written.
pub fn filter_site(config: &Config) -> Result<SiteReport> {
  let input_dir = config
    .input_dir
    .as_deref()
    .ok_or_else(|| eyre!("No input directory given"))?;
  info!("Input directory: {}", input_dir.display());

  fs::create_dir_all(&config.output_dir).wrap_err_with(|| {
    format!(
      "Failed to create output directory: {}",
      config.output_dir.display()
    )
  })?;
  info!("Output directory: {}", config.output_dir.display());

  let filter = build_filter(config)?;
  let files = collect_files(input_dir, &config.output_dir);
  info!("Found {} files", files.len());

  let thread_count = config.jobs.unwrap_or_else(num_cpus::get);
  let pool = rayon::ThreadPoolBuilder::new()
    .num_threads(thread_count)
    .build()
    .wrap_err("Failed to build thread pool")?;

  let outcomes = pool.install(|| {
    files
      .par_iter()
      .map(|path| process_file(&filter, config, input_dir, path))
      .collect::<Result<Vec<_>>>()
  })?;

  let mut report = SiteReport::default();
  for outcome in outcomes {
    match outcome {
      FileOutcome::Page { links } => {
        report.pages += 1;
        report.links += links;
        if links > 0 {
          report.rewritten += 1;
        }
      },
      FileOutcome::Copied => report.copied += 1,
    }
  }

  if report.rewritten > 0 {
    let path = write_assets(&config.output_dir)?;
    debug!("Wrote {}", path.display());
  }

  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_inject_script_before_head_end() {
    let html = "<html><head><title>x</title></HEAD ><body></body></html>";
    assert_eq!(
      inject_script(html, "assets/bigscreen.js"),
      "<html><head><title>x</title><script \
       src=\"assets/bigscreen.js\"></script>\n</HEAD ><body></body></html>"
    );
  }

  #[test]
  fn test_inject_script_without_head() {
    assert_eq!(
      inject_script("<p>x</p>", "/a.js?v=1&b=2"),
      "<p>x</p>\n<script src=\"/a.js?v=1&amp;b=2\"></script>\n"
    );
  }

  #[test]
  fn test_script_src_depth() {
    let asset = "assets/bigscreen.js";
    assert_eq!(script_src(asset, Path::new("index.html")), asset);
    assert_eq!(
      script_src(asset, Path::new("course/5/view.html")),
      "../../assets/bigscreen.js"
    );
    assert_eq!(
      script_src("/static/bs.js", Path::new("a/b.html")),
      "/static/bs.js"
    );
    assert_eq!(
      script_src("https://cdn.example/bs.js", Path::new("a/b.html")),
      "https://cdn.example/bs.js"
    );
  }

  #[test]
  fn test_is_html() {
    assert!(is_html(Path::new("a/index.HTML")));
    assert!(is_html(Path::new("page.htm")));
    assert!(!is_html(Path::new("water.pdb")));
    assert!(!is_html(Path::new("README")));
  }
}
