use crate::error::{Error, Result};
use crate::hasher::FileInfo;
use crate::storage::Sample;
use crate::vault::Vault;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, info};

pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Materializes remote content for `open --url`. Blocking; no timeout.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, use_tor: bool) -> std::result::Result<Vec<u8>, FetchError>;
}

/// Fetcher for front ends without network access.
pub struct NoFetcher;

impl Fetcher for NoFetcher {
    fn fetch(&self, url: &str, _use_tor: bool) -> std::result::Result<Vec<u8>, FetchError> {
        Err(format!("no fetcher configured, cannot download {}", url).into())
    }
}

/// Immutable view of the active sample, rebuilt from scratch on every open.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    pub file: FileInfo,
    /// Catalog id, when the sample is cataloged.
    pub id: Option<i64>,
    pub tags: Vec<String>,
    pub parent: Option<String>,
}

impl Snapshot {
    pub fn is_stored(&self) -> bool {
        self.id.is_some()
    }
}

/// Per-client session: at most one open sample plus the last find results.
///
/// Not meant to be shared between clients; each console or connection that
/// needs "current sample" semantics owns its own.
#[derive(Default)]
pub struct Session {
    current: Option<Snapshot>,
    scratch: Option<TempPath>,
    find_cache: Vec<Sample>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn require_open(&self) -> Result<&Snapshot> {
        self.current.as_ref().ok_or(Error::SessionRequired)
    }

    fn snapshot(vault: &Vault, path: &Path, name: Option<String>) -> Result<Snapshot> {
        if !path.is_file() {
            return Err(Error::SourceUnavailable(format!(
                "File not found: {}",
                path.display()
            )));
        }
        let mut file = FileInfo::from_path(path)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
        if let Some(name) = name {
            file.name = name;
        }

        let cataloged = vault.catalog.get_by_sha256(&file.sha256)?;
        let (id, tags, parent) = match cataloged {
            Some(sample) => (Some(sample.id), sample.tags, sample.parent),
            None => (None, Vec::new(), None),
        };

        Ok(Snapshot {
            path: path.to_path_buf(),
            file,
            id,
            tags,
            parent,
        })
    }

    /// Opens a session on a local file, replacing any open session.
    pub fn open(&mut self, vault: &Vault, path: &Path) -> Result<&Snapshot> {
        self.open_named(vault, path, None)
    }

    fn open_named(&mut self, vault: &Vault, path: &Path, name: Option<String>) -> Result<&Snapshot> {
        let snapshot = Self::snapshot(vault, path, name)?;
        info!("Session opened on {}", snapshot.path.display());
        self.scratch = None;
        Ok(self.current.insert(snapshot))
    }

    /// Downloads `url` into a temporary file that lives as long as the session
    /// stays on it. On failure the current session is left untouched.
    pub fn open_url(
        &mut self,
        vault: &Vault,
        fetcher: &dyn Fetcher,
        url: &str,
        use_tor: bool,
    ) -> Result<&Snapshot> {
        let data = fetcher
            .fetch(url, use_tor)
            .map_err(|e| Error::SourceUnavailable(format!("{}: {}", url, e)))?;

        let mut tmp = tempfile::Builder::new()
            .prefix("vault-download-")
            .tempfile()
            .map_err(|e| Error::SourceUnavailable(format!("temporary file: {}", e)))?;
        tmp.write_all(&data)
            .and_then(|_| tmp.flush())
            .map_err(|e| Error::SourceUnavailable(format!("temporary file: {}", e)))?;
        let tmp = tmp.into_temp_path();

        let name = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or(url)
            .to_string();
        let snapshot = Self::snapshot(vault, &tmp, Some(name))?;
        info!("Session opened on {} (downloaded from {})", tmp.display(), url);
        self.scratch = Some(tmp);
        Ok(self.current.insert(snapshot))
    }

    /// Opens a previously stored sample by md5, sha1, sha256 or sha512.
    pub fn open_hash(&mut self, vault: &Vault, hash: &str) -> Result<&Snapshot> {
        let sample = vault
            .catalog
            .find_by_hash(hash)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("No file found with the given hash {}", hash)))?;
        let path = vault.repository.retrieve(&sample.sha256)?;
        self.open_named(vault, &path, Some(sample.name))
    }

    /// Opens the `index`-th (1-based) result of the most recent find.
    pub fn open_from_find_cache(&mut self, vault: &Vault, index: usize) -> Result<&Snapshot> {
        if self.find_cache.is_empty() {
            return Err(Error::Index(
                "No results from a previous find to open".to_string(),
            ));
        }
        if index == 0 || index > self.find_cache.len() {
            return Err(Error::Index(format!(
                "Invalid entry number {}, the last find returned {} results",
                index,
                self.find_cache.len()
            )));
        }

        let sample = &self.find_cache[index - 1];
        let name = sample.name.clone();
        let path = vault.repository.retrieve(&sample.sha256)?;
        self.open_named(vault, &path, Some(name))
    }

    /// Rebuilds the snapshot from the same path, picking up catalog changes.
    pub fn refresh(&mut self, vault: &Vault) -> Result<&Snapshot> {
        let current = self.require_open()?;
        let (path, name) = (current.path.clone(), current.file.name.clone());
        let snapshot = Self::snapshot(vault, &path, Some(name))?;
        debug!("Session refreshed on {}", path.display());
        Ok(self.current.insert(snapshot))
    }

    pub fn close(&mut self) {
        if self.current.take().is_some() {
            debug!("Session closed");
        }
        self.scratch = None;
    }

    pub fn record_find_results(&mut self, samples: Vec<Sample>) {
        self.find_cache = samples;
    }

    pub fn find_results(&self) -> &[Sample] {
        &self.find_cache
    }
}
