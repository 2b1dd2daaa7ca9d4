//! # chemlink-filter
//!
//! Rewrites links to chemistry structure files (`.pdb`, `.mol`, `.cif`,
//! `.xyz`, ...) in rendered HTML into embedded JSmol viewers.
//!
//! ## Quick Start
//!
//! ```rust
//! use chemlink_filter::{
//!   FilterOptions, JmolFilter, PageAssets, PageRender,
//!   resolver::{MemoryStore, PluginFileResolver},
//! };
//!
//! let resolver =
//!   PluginFileResolver::new(MemoryStore::new(), "/tmp/jmol", "/filter/jmol/temp");
//! let options = FilterOptions {
//!   host: "example.com".to_string(),
//!   ..Default::default()
//! };
//! let filter = JmolFilter::new(options, resolver).unwrap();
//!
//! let mut assets = PageAssets::new();
//! let mut page = PageRender::new("de", &mut assets);
//! let html = filter.filter(r#"<a href="./water.xyz">water</a>"#, &mut page);
//!
//! assert!(html.contains("<iframe"));
//! drop(page);
//! assert_eq!(assets.requested(), ["bigscreen"]);
//! ```
//!
//! ## Link options
//!
//! - `?c=N` selects control set `N` (default 1)
//! - `?s=N` sets the viewer size to `N` pixels (default 350)
//! - a `JMOLSCRIPT{...}` block right after the link runs as the initial
//!   viewer script
//!
//! ## Limits
//!
//! Links are found with one pattern over raw text. Only double-quoted `href`
//! attributes on plain `<a>` elements are recognized, and nested or unclosed
//! anchors are left alone.

pub mod embed;
pub mod error;
pub mod filter;
pub mod l10n;
pub mod matcher;
pub mod resolver;
mod types;
pub mod utils;

pub use crate::{
  embed::{DisplayOptions, EmbedGenerator, LanguageTable},
  error::{FilterError, StagingError},
  filter::{
    AssetInjector,
    BIGSCREEN_ASSET,
    EmbedIds,
    FilterOptions,
    JmolFilter,
    PageAssets,
    PageRender,
  },
  l10n::{DefaultStrings, LocalizationProvider},
  matcher::LinkMatcher,
  resolver::{FileResolver, ResolvedFile, StageOutcome, StagedFile},
  types::{
    ChemFormat,
    ChemLinkMatch,
    FileExtension,
    MissingFilePolicy,
    UnknownExtension,
  },
};
