use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::hasher::FileInfo;
use crate::progress::ProgressReporter;
use crate::scanner::{self, ImportFilter};
use crate::storage::{Added, Catalog, Repository, Stored};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, error, info};

/// The process-wide shared pair of byte repository and catalog.
pub struct Vault {
    pub repository: Repository,
    pub catalog: Catalog,
}

/// What an ingest did to each of the two stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingest {
    pub sha256: String,
    pub bytes: Stored,
    pub row: Added,
}

impl Ingest {
    pub fn path(&self) -> &Path {
        self.bytes.path()
    }

    /// True when a new catalog row was created.
    pub fn is_new(&self) -> bool {
        matches!(self.row, Added::Created(_))
    }
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub stored: Vec<(String, PathBuf)>,
    pub already_stored: Vec<String>,
    pub too_big: Vec<PathBuf>,
    pub type_mismatch: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl Vault {
    pub fn new(repository: Repository, catalog: Catalog) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    /// Opens the repository root (creating it if needed) and the catalog file.
    pub fn open(config: &AppConfig) -> Result<Self> {
        let repository = Repository::new(&config.repository_root);
        repository.create_root()?;
        let catalog = Catalog::open(config.catalog_path())?;
        info!(
            "Vault opened at {} (catalog {})",
            config.repository_root.display(),
            config.catalog_path().display()
        );
        Ok(Self::new(repository, catalog))
    }

    /// Bytes first, then the catalog row. A crash in between leaves bytes
    /// without a row, which the next ingest of the same content repairs.
    pub fn ingest_file(&self, info: &FileInfo, source: &Path, tags: Option<&str>) -> Result<Ingest> {
        let bytes = self.repository.store_file(&info.sha256, source)?;
        let row = self.catalog.add_sample(info, tags)?;
        self.log_ingest(info, &bytes, &row);
        Ok(Ingest {
            sha256: info.sha256.clone(),
            bytes,
            row,
        })
    }

    pub fn ingest_bytes(&self, info: &FileInfo, data: &[u8], tags: Option<&str>) -> Result<Ingest> {
        let bytes = self.repository.store(&info.sha256, data)?;
        let row = self.catalog.add_sample(info, tags)?;
        self.log_ingest(info, &bytes, &row);
        Ok(Ingest {
            sha256: info.sha256.clone(),
            bytes,
            row,
        })
    }

    fn log_ingest(&self, info: &FileInfo, bytes: &Stored, row: &Added) {
        match (bytes, row) {
            (Stored::Written(_), Added::Created(id)) => {
                debug!("Ingested {} as sample {}", info.sha256, id)
            }
            (Stored::AlreadyStored(_), Added::Created(id)) => {
                info!("Cataloged orphaned bytes {} as sample {}", info.sha256, id)
            }
            (Stored::Written(_), Added::DuplicateDigest) => {
                info!("Restored missing bytes for cataloged sample {}", info.sha256)
            }
            (Stored::AlreadyStored(_), Added::DuplicateDigest) => {
                debug!("{} already stored and cataloged", info.sha256)
            }
        }
    }

    /// Recursively ingests `folder`. Digests are computed in parallel;
    /// writes happen one file at a time. Individual failures are collected,
    /// not propagated.
    pub fn import_folder(
        &self,
        folder: &Path,
        filter: &ImportFilter,
        tags: Option<&str>,
        delete_source: bool,
        reporter: &dyn ProgressReporter,
    ) -> Result<ImportSummary> {
        reporter.on_walk_start(&folder.to_string_lossy());
        let walked = scanner::collect_candidates(folder, filter)
            .map_err(|e| Error::SourceUnavailable(e.to_string()))?;
        reporter.on_walk_complete(walked.candidates.len());

        let mut summary = ImportSummary {
            too_big: walked.too_big,
            ..Default::default()
        };

        let hash_start = Instant::now();
        let total = walked.candidates.len();
        let hashed_count = AtomicUsize::new(0);
        let hashed: Vec<(PathBuf, std::io::Result<FileInfo>)> = walked
            .candidates
            .into_par_iter()
            .map(|path| {
                let info = FileInfo::from_path(&path);
                let done = hashed_count.fetch_add(1, Ordering::Relaxed) + 1;
                reporter.on_hash_progress(done, total);
                (path, info)
            })
            .collect();
        reporter.on_hash_complete(total, hash_start.elapsed().as_secs_f64());

        let store_start = Instant::now();
        for (n, (path, info)) in hashed.into_iter().enumerate() {
            reporter.on_store_progress(n + 1, total);
            let info = match info {
                Ok(info) => info,
                Err(e) => {
                    error!("Error processing file '{}': {}", path.display(), e);
                    summary.failed.push((path, e.to_string()));
                    continue;
                }
            };

            if let Some(wanted) = &filter.file_type {
                if !info.file_type.contains(wanted.as_str()) {
                    summary.type_mismatch += 1;
                    continue;
                }
            }

            match self.ingest_file(&info, &path, tags) {
                Ok(ingest) => {
                    if ingest.is_new() {
                        summary
                            .stored
                            .push((info.name.clone(), ingest.path().to_path_buf()));
                    } else {
                        summary.already_stored.push(info.name.clone());
                    }
                    if delete_source {
                        if let Err(e) = fs::remove_file(&path) {
                            summary
                                .failed
                                .push((path, format!("Failed deleting file: {}", e)));
                        }
                    }
                }
                Err(e) => {
                    error!("Error storing file '{}': {}", path.display(), e);
                    summary.failed.push((path, e.to_string()));
                }
            }
        }
        reporter.on_store_complete(summary.stored.len(), store_start.elapsed().as_secs_f64());

        Ok(summary)
    }
}
