use std::{
  collections::HashMap,
  fs,
  io,
  path::{Path, PathBuf},
};

use super::ResolvedFile;

/// Read access to host file storage.
pub trait FileStore {
  /// Read the content of `file`.
  ///
  /// Returns `Ok(None)` when the file does not exist.
  ///
  /// # Errors
  ///
  /// Returns an error if the file exists but cannot be read.
  fn read(&self, file: &ResolvedFile) -> io::Result<Option<Vec<u8>>>;
}

/// Storage laid out on disk as
/// `<root>/<context>/<component>/<area>/<item><path><filename>`.
///
/// This is the layout a static mirror of `pluginfile.php` URLs produces.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
  root: PathBuf,
}

impl DirectoryStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// On-disk location of `file`.
  #[must_use]
  pub fn path_of(&self, file: &ResolvedFile) -> PathBuf {
    let mut path = self
      .root
      .join(file.context_id.to_string())
      .join(&file.component)
      .join(&file.area)
      .join(file.item_id.to_string());
    path.extend(file.file_path.split('/').filter(|s| !s.is_empty()));
    path.push(&file.filename);
    path
  }
}

impl FileStore for DirectoryStore {
  fn read(&self, file: &ResolvedFile) -> io::Result<Option<Vec<u8>>> {
    match fs::read(self.path_of(file)) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e),
    }
  }
}

/// In-process storage keyed by storage coordinates.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  files: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, file: &ResolvedFile, content: impl Into<Vec<u8>>) {
    self.files.insert(key(file), content.into());
  }

  pub fn remove(&mut self, file: &ResolvedFile) -> Option<Vec<u8>> {
    self.files.remove(&key(file))
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.files.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

impl FileStore for MemoryStore {
  fn read(&self, file: &ResolvedFile) -> io::Result<Option<Vec<u8>>> {
    Ok(self.files.get(&key(file)).cloned())
  }
}

fn key(file: &ResolvedFile) -> String {
  format!(
    "{}/{}/{}/{}{}{}",
    file.context_id,
    file.component,
    file.area,
    file.item_id,
    file.file_path,
    file.filename
  )
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use tempfile::TempDir;

  use super::*;

  fn resolved() -> ResolvedFile {
    ResolvedFile {
      context_id: 12,
      component:  "mod_page".to_string(),
      area:       "content".to_string(),
      item_id:    0,
      file_path:  "/proteins/".to_string(),
      filename:   "1crn.pdb".to_string(),
      short_path: "/12/mod_page/content/0/proteins/1crn.pdb".to_string(),
    }
  }

  #[test]
  fn test_directory_store_layout() {
    let store = DirectoryStore::new("/srv/files");
    assert_eq!(
      store.path_of(&resolved()),
      PathBuf::from("/srv/files/12/mod_page/content/0/proteins/1crn.pdb")
    );
  }

  #[test]
  fn test_directory_store_reads() {
    let dir = TempDir::new().unwrap();
    let store = DirectoryStore::new(dir.path());
    assert_eq!(store.read(&resolved()).unwrap(), None);

    let path = store.path_of(&resolved());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"ATOM").unwrap();

    assert_eq!(store.read(&resolved()).unwrap(), Some(b"ATOM".to_vec()));
  }

  #[test]
  fn test_memory_store() {
    let mut store = MemoryStore::new();
    assert!(store.is_empty());
    store.insert(&resolved(), "ATOM");
    assert_eq!(store.len(), 1);
    assert_eq!(store.read(&resolved()).unwrap(), Some(b"ATOM".to_vec()));

    let mut other = resolved();
    other.item_id = 3;
    assert_eq!(store.read(&other).unwrap(), None);

    assert!(store.remove(&resolved()).is_some());
    assert_eq!(store.read(&resolved()).unwrap(), None);
  }
}
