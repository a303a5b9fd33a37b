use crate::error::{Error, Result};
use crate::hasher::digest::normalize_sha256;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const SHARD_DEPTH: usize = 4;

#[cfg(unix)]
const DIR_MODE: u32 = 0o770;

/// Outcome of a [`Repository::store`] call. Both variants carry the canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stored {
    Written(PathBuf),
    AlreadyStored(PathBuf),
}

impl Stored {
    pub fn path(&self) -> &Path {
        match self {
            Stored::Written(p) | Stored::AlreadyStored(p) => p,
        }
    }
}

/// Content-addressed byte store: `root/a/b/c/d/<sha256>`.
///
/// Knows nothing about the catalog. A file here with no catalog row (or the
/// reverse) is a legal state; callers treat a miss here as authoritative.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory with the same restricted mode as the shards.
    pub fn create_root(&self) -> Result<()> {
        create_dirs(&self.root)
    }

    fn shard_dir(&self, sha256: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for c in sha256.chars().take(SHARD_DEPTH) {
            dir.push(c.to_string());
        }
        dir
    }

    /// Canonical location for a digest. Pure path arithmetic, no filesystem access.
    pub fn sample_path(&self, sha256: &str) -> Result<PathBuf> {
        let sha256 = normalize_sha256(sha256)?;
        Ok(self.shard_dir(&sha256).join(&sha256))
    }

    /// Streams `content` to the canonical path for `sha256`.
    ///
    /// The bytes land in a temporary file next to the destination and are
    /// linked into place only once fully written and synced, so a reader never
    /// sees a partial sample. If the destination already exists (including
    /// when a concurrent writer wins the race) nothing is overwritten.
    pub fn store<R: Read>(&self, sha256: &str, mut content: R) -> Result<Stored> {
        let sha256 = normalize_sha256(sha256)?;
        let dir = self.shard_dir(&sha256);
        let dest = dir.join(&sha256);

        if dest.exists() {
            debug!("{} already in repository", sha256);
            return Ok(Stored::AlreadyStored(dest));
        }

        create_dirs(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| Error::storage_io(&dir, e))?;
        io::copy(&mut content, tmp.as_file_mut()).map_err(|e| Error::storage_io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| Error::storage_io(tmp.path(), e))?;

        match tmp.persist_noclobber(&dest) {
            Ok(_) => {
                debug!("Stored {} at {}", sha256, dest.display());
                Ok(Stored::Written(dest))
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Lost store race for {}, keeping existing copy", sha256);
                Ok(Stored::AlreadyStored(dest))
            }
            Err(e) => Err(Error::storage_io(&dest, e.error)),
        }
    }

    /// Copies the file at `source` into the repository.
    pub fn store_file(&self, sha256: &str, source: &Path) -> Result<Stored> {
        let file = fs::File::open(source).map_err(|e| Error::storage_io(source, e))?;
        self.store(sha256, file)
    }

    /// Path of the stored bytes, or `NotFound`. Never creates directories.
    pub fn retrieve(&self, sha256: &str) -> Result<PathBuf> {
        let path = self.sample_path(sha256)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(format!("{} is not in the repository", sha256)))
        }
    }

    /// Removes stored bytes. The catalog row, if any, is left alone.
    pub fn unlink(&self, sha256: &str) -> Result<()> {
        let path = self.sample_path(sha256)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Unlinked {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Nothing to unlink for {}", sha256);
                Err(Error::NotFound(format!("{} is not in the repository", sha256)))
            }
            Err(e) => Err(Error::storage_io(&path, e)),
        }
    }
}

#[cfg(unix)]
fn create_dirs(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| Error::storage_io(dir, e))
}

#[cfg(not(unix))]
fn create_dirs(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::storage_io(dir, e))
}
