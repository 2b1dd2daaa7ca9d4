use std::{
  fs,
  io::ErrorKind,
  path::Path,
  time::SystemTime,
};

use log::{debug, info};
use sha2::{Digest, Sha256};

use crate::error::StagingError;

/// What [`stage_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
  /// No staged copy existed; one was written.
  Copied,
  /// The staged copy differed from the source and was overwritten.
  Replaced,
  /// The staged copy was current; only its modification time was bumped so
  /// cleanup jobs keep it.
  Refreshed,
  /// The source is not in host storage. Nothing was written.
  Missing,
}

/// Hex encoded SHA-256 of `bytes`.
#[must_use]
pub fn content_hash(bytes: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  format!("{:x}", hasher.finalize())
}

/// Ensure `dest` holds exactly `content`.
///
/// Concurrent calls for the same destination are not serialized; the last
/// writer wins.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the existing
/// copy cannot be read, or the copy cannot be written or touched.
pub fn stage_file(
  dest: &Path,
  content: &[u8],
) -> Result<StageOutcome, StagingError> {
  let existing = match fs::read(dest) {
    Ok(bytes) => Some(bytes),
    Err(e) if e.kind() == ErrorKind::NotFound => None,
    Err(source) => {
      return Err(StagingError::ReadStaged {
        path: dest.to_path_buf(),
        source,
      });
    },
  };

  let Some(existing) = existing else {
    if let Some(parent) = dest.parent() {
      fs::create_dir_all(parent).map_err(|source| {
        StagingError::CreateDir {
          path: parent.to_path_buf(),
          source,
        }
      })?;
    }
    write(dest, content)?;
    info!("Staged {}", dest.display());
    return Ok(StageOutcome::Copied);
  };

  let source_hash = content_hash(content);
  let staged_hash = content_hash(&existing);
  if source_hash != staged_hash {
    debug!(
      "Staged copy {} is stale ({staged_hash} != {source_hash})",
      dest.display()
    );
    write(dest, content)?;
    info!("Restaged {}", dest.display());
    return Ok(StageOutcome::Replaced);
  }

  touch(dest)?;
  Ok(StageOutcome::Refreshed)
}

fn write(dest: &Path, content: &[u8]) -> Result<(), StagingError> {
  fs::write(dest, content).map_err(|source| {
    StagingError::Write {
      path: dest.to_path_buf(),
      source,
    }
  })
}

fn touch(dest: &Path) -> Result<(), StagingError> {
  fs::File::options()
    .write(true)
    .open(dest)
    .and_then(|file| file.set_modified(SystemTime::now()))
    .map_err(|source| {
      StagingError::Touch {
        path: dest.to_path_buf(),
        source,
      }
    })
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Tests can unwrap")]

  use std::time::Duration;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn test_content_hash_is_content_based() {
    assert_eq!(content_hash(b"ATOM"), content_hash(b"ATOM"));
    assert_ne!(content_hash(b"ATOM"), content_hash(b"HETATM"));
    assert_eq!(
      content_hash(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }

  #[test]
  fn test_first_stage_creates_directories() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("5/mod_resource/content/0/water.pdb");

    let outcome = stage_file(&dest, b"HETATM O").unwrap();

    assert_eq!(outcome, StageOutcome::Copied);
    assert_eq!(fs::read(&dest).unwrap(), b"HETATM O");
  }

  #[test]
  fn test_unchanged_source_only_touches() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("water.pdb");
    stage_file(&dest, b"HETATM O").unwrap();

    let old = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options()
      .write(true)
      .open(&dest)
      .unwrap()
      .set_modified(old)
      .unwrap();

    let outcome = stage_file(&dest, b"HETATM O").unwrap();

    assert_eq!(outcome, StageOutcome::Refreshed);
    assert_eq!(fs::read(&dest).unwrap(), b"HETATM O");
    let mtime = fs::metadata(&dest).unwrap().modified().unwrap();
    assert!(mtime > old + Duration::from_secs(60));
  }

  #[test]
  fn test_changed_source_is_recopied() {
    let dir = TempDir::new().unwrap();
    let dest = dir.path().join("water.pdb");
    stage_file(&dest, b"old").unwrap();

    let outcome = stage_file(&dest, b"new contents").unwrap();

    assert_eq!(outcome, StageOutcome::Replaced);
    assert_eq!(fs::read(&dest).unwrap(), b"new contents");
  }

  #[test]
  fn test_unwritable_destination_is_an_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a directory").unwrap();

    let err = stage_file(&blocker.join("water.pdb"), b"x").unwrap_err();

    assert!(
      matches!(
        err,
        StagingError::CreateDir { .. } | StagingError::ReadStaged { .. }
      ),
      "{err}"
    );
  }
}
