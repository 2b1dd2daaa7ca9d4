use std::path::PathBuf;

use log::{debug, warn};

use super::{
  FileResolver,
  ResolvedFile,
  StagedFile,
  staging::{StageOutcome, stage_file},
  store::FileStore,
};
use crate::error::StagingError;

/// Path segment host storage files are served under.
pub const FILE_ENDPOINT: &str = "/pluginfile.php/";

/// Parse a `.../pluginfile.php/<context>/<component>/<area>/[<item>/][<path>/]<file>`
/// URL.
///
/// The item id is optional: when the segment after the area is not numeric it
/// is treated as part of the path and the item id is 0. The `content` area has
/// no item ids, so it is always 0 there.
///
/// Returns [`None`] for URLs outside the endpoint, malformed coordinates,
/// undecodable segments, and `.`/`..` segments.
#[must_use]
pub fn parse_pluginfile_url(url: &str) -> Option<ResolvedFile> {
  let (_, tail) = url.split_once(FILE_ENDPOINT)?;
  let tail = tail.split(['?', '#']).next().unwrap_or_default();

  let mut segments = Vec::new();
  for raw in tail.split('/') {
    let decoded = urlencoding::decode(raw).ok()?;
    if decoded.is_empty()
      || decoded == "."
      || decoded == ".."
      || decoded.contains(['/', '\\'])
    {
      debug!("Rejecting file URL {url}: bad segment '{raw}'");
      return None;
    }
    segments.push(decoded.into_owned());
  }

  if segments.len() < 4 {
    return None;
  }
  let filename = segments.pop()?;
  let mut rest = segments.into_iter();
  let context_id = rest.next()?.parse().ok()?;
  let component = rest.next()?;
  let area = rest.next()?;
  let mut rest: Vec<String> = rest.collect();

  let mut item_id = match rest.first().map(|s| s.parse::<u64>()) {
    Some(Ok(id)) => {
      rest.remove(0);
      id
    },
    _ => 0,
  };
  if area == "content" {
    item_id = 0;
  }

  let file_path = if rest.is_empty() {
    "/".to_string()
  } else {
    format!("/{}/", rest.join("/"))
  };

  Some(ResolvedFile {
    context_id,
    component,
    area,
    item_id,
    file_path,
    filename,
    short_path: format!("/{tail}"),
  })
}

/// Resolves `pluginfile.php` links against a [`FileStore`] and stages files
/// below a public directory.
#[derive(Debug, Clone)]
pub struct PluginFileResolver<S> {
  store:       S,
  staging_dir: PathBuf,
  staging_url: String,
}

impl<S: FileStore> PluginFileResolver<S> {
  /// Files are staged to `staging_dir` + the link's short path and served
  /// from `staging_url` + the same path.
  pub fn new(
    store: S,
    staging_dir: impl Into<PathBuf>,
    staging_url: impl Into<String>,
  ) -> Self {
    Self {
      store,
      staging_dir: staging_dir.into(),
      staging_url: staging_url.into(),
    }
  }

  pub const fn store(&self) -> &S {
    &self.store
  }

  pub const fn store_mut(&mut self) -> &mut S {
    &mut self.store
  }

  /// Where `file` is staged on disk.
  #[must_use]
  pub fn local_path(&self, file: &ResolvedFile) -> PathBuf {
    let mut path = self.staging_dir.clone();
    path.push(file.context_id.to_string());
    path.push(&file.component);
    path.push(&file.area);
    // Only plain segments below the area; nothing may escape staging_dir.
    path.extend(
      file
        .short_path
        .split('/')
        .skip(4)
        .filter_map(|s| urlencoding::decode(s).ok())
        .filter(|s| !s.is_empty() && s != "." && s != ".." && !s.contains('/'))
        .map(std::borrow::Cow::into_owned),
    );
    path
  }

  /// Where the viewer loads `file` from.
  #[must_use]
  pub fn public_url(&self, file: &ResolvedFile) -> String {
    format!("{}{}", self.staging_url.trim_end_matches('/'), file.short_path)
  }
}

impl<S: FileStore> FileResolver for PluginFileResolver<S> {
  fn resolve(&self, url: &str) -> Option<ResolvedFile> {
    parse_pluginfile_url(url)
  }

  fn materialize(
    &self,
    file: &ResolvedFile,
  ) -> Result<StagedFile, StagingError> {
    let local_path = self.local_path(file);
    let public_url = self.public_url(file);

    let content = self.store.read(file).map_err(|source| {
      StagingError::Storage {
        file: file.short_path.clone(),
        source,
      }
    })?;

    let outcome = match content {
      Some(content) => stage_file(&local_path, &content)?,
      None => {
        warn!("{} is not in file storage", file.short_path);
        StageOutcome::Missing
      },
    };

    Ok(StagedFile {
      local_path,
      public_url,
      outcome,
    })
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use tempfile::TempDir;

  use super::*;
  use crate::resolver::store::MemoryStore;

  #[test]
  fn test_parse_resource_url() {
    let file = parse_pluginfile_url(
      "http://example.com/pluginfile.php/5/mod_resource/content/0/water.pdb",
    )
    .unwrap();
    assert_eq!(file.context_id, 5);
    assert_eq!(file.component, "mod_resource");
    assert_eq!(file.area, "content");
    assert_eq!(file.item_id, 0);
    assert_eq!(file.file_path, "/");
    assert_eq!(file.filename, "water.pdb");
    assert_eq!(file.short_path, "/5/mod_resource/content/0/water.pdb");
  }

  #[test]
  fn test_parse_item_and_subdirectories() {
    let file = parse_pluginfile_url(
      "https://example.com/pluginfile.php/42/mod_forum/attachment/7/a/b/caf%20feine.mol",
    )
    .unwrap();
    assert_eq!(file.item_id, 7);
    assert_eq!(file.file_path, "/a/b/");
    assert_eq!(file.filename, "caf feine.mol");
  }

  #[test]
  fn test_parse_without_item_id() {
    let file =
      parse_pluginfile_url("./pluginfile.php/9/block_html/intro/dna.pdb")
        .unwrap();
    assert_eq!(file.item_id, 0);
    assert_eq!(file.file_path, "/");

    let file =
      parse_pluginfile_url("./pluginfile.php/9/user/private/mols/dna.pdb")
        .unwrap();
    assert_eq!(file.item_id, 0);
    assert_eq!(file.file_path, "/mols/");
  }

  #[test]
  fn test_content_area_ignores_item_id() {
    let file = parse_pluginfile_url(
      "http://example.com/pluginfile.php/3/mod_page/content/12/x.xyz",
    )
    .unwrap();
    assert_eq!(file.item_id, 0);
    assert_eq!(file.file_path, "/");
  }

  #[test]
  fn test_parse_rejects_bad_urls() {
    for url in [
      "http://example.com/files/water.pdb",
      "http://example.com/pluginfile.php/abc/mod_page/content/water.pdb",
      "http://example.com/pluginfile.php/5/mod_page/water.pdb",
      "http://example.com/pluginfile.php/5/mod_page/content/../../../etc.pdb",
      "http://example.com/pluginfile.php/5/mod_page/content/%2e%2e/etc.pdb",
      "http://example.com/pluginfile.php/5/mod_page/content/a%2Fb.pdb",
      "http://example.com/pluginfile.php/5/mod_page//water.pdb",
    ] {
      assert_eq!(parse_pluginfile_url(url), None, "{url}");
    }
  }

  #[test]
  fn test_staging_paths() {
    let resolver = PluginFileResolver::new(
      MemoryStore::new(),
      "/var/www/temp",
      "http://example.com/filter/jmol/temp/",
    );
    let file = parse_pluginfile_url(
      "http://example.com/pluginfile.php/5/mod_resource/content/0/my%20water.pdb",
    )
    .unwrap();
    assert_eq!(
      resolver.local_path(&file),
      PathBuf::from("/var/www/temp/5/mod_resource/content/0/my water.pdb")
    );
    assert_eq!(
      resolver.public_url(&file),
      "http://example.com/filter/jmol/temp/5/mod_resource/content/0/my%20water.pdb"
    );
  }

  #[test]
  fn test_materialize_copies_then_refreshes() {
    let dir = TempDir::new().unwrap();
    let mut resolver = PluginFileResolver::new(
      MemoryStore::new(),
      dir.path(),
      "/filter/jmol/temp",
    );
    let file = resolver
      .resolve("./pluginfile.php/5/mod_resource/content/0/water.pdb")
      .unwrap();
    resolver.store_mut().insert(&file, "HETATM O");

    let first = resolver.materialize(&file).unwrap();
    assert_eq!(first.outcome, StageOutcome::Copied);
    assert_eq!(
      first.public_url,
      "/filter/jmol/temp/5/mod_resource/content/0/water.pdb"
    );

    let second = resolver.materialize(&file).unwrap();
    assert_eq!(second.outcome, StageOutcome::Refreshed);
    assert_eq!(second.local_path, first.local_path);

    resolver.store_mut().insert(&file, "HETATM O\nEND");
    let third = resolver.materialize(&file).unwrap();
    assert_eq!(third.outcome, StageOutcome::Replaced);
  }

  #[test]
  fn test_materialize_missing_file() {
    let dir = TempDir::new().unwrap();
    let resolver =
      PluginFileResolver::new(MemoryStore::new(), dir.path(), "/temp");
    let file = resolver
      .resolve("./pluginfile.php/5/mod_resource/content/0/gone.pdb")
      .unwrap();

    let staged = resolver.materialize(&file).unwrap();

    assert_eq!(staged.outcome, StageOutcome::Missing);
    assert!(!staged.local_path.exists());
  }
}
