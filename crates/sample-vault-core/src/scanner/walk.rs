use glob::Pattern;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

/// Selection rules for a recursive folder import.
#[derive(Debug, Clone, Default)]
pub struct ImportFilter {
    /// Glob matched against the file name only.
    pub file_name: Option<String>,
    /// Substring that must appear in the sniffed type description.
    pub file_type: Option<String>,
    /// Files larger than this many bytes are skipped.
    pub max_size: Option<u64>,
}

/// Result of walking an import folder.
#[derive(Debug, Default)]
pub struct WalkResult {
    pub candidates: Vec<PathBuf>,
    pub too_big: Vec<PathBuf>,
}

/// Recursive traversal of `root`. Keeps regular, non-empty files whose name
/// matches the filter. Symlinks are not followed; unreadable entries are
/// logged and skipped.
pub fn collect_candidates(root: &Path, filter: &ImportFilter) -> io::Result<WalkResult> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", root.display()),
        ));
    }

    let name_pattern = match filter.file_name.as_deref().map(Pattern::new) {
        Some(Ok(p)) => Some(p),
        Some(Err(e)) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid file name pattern: {}", e),
            ))
        }
        None => None,
    };

    let mut result = WalkResult::default();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                error!("Error reading entry under {}: {}", root.display(), err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                error!("Error getting metadata for {}: {}", entry.path().display(), err);
                continue;
            }
        };
        if metadata.len() == 0 {
            continue;
        }

        if let Some(pattern) = &name_pattern {
            let name = entry.file_name().to_string_lossy();
            if !pattern.matches(&name) {
                continue;
            }
        }

        if let Some(max) = filter.max_size {
            if metadata.len() > max {
                warn!("Skip, file {} is too big", entry.path().display());
                result.too_big.push(entry.into_path());
                continue;
            }
        }

        result.candidates.push(entry.into_path());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn create_test_tree(root: &Path) {
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.join("one.exe"), "one").unwrap();
        fs::write(root.join("empty.exe"), "").unwrap();
        fs::write(nested.join("two.exe"), "two two two").unwrap();
        fs::write(nested.join("notes.txt"), "notes").unwrap();
    }

    #[test]
    fn test_collects_recursively_and_skips_empty() {
        let dir = tempdir().unwrap();
        create_test_tree(dir.path());

        let result = collect_candidates(dir.path(), &ImportFilter::default()).unwrap();
        assert_eq!(result.candidates.len(), 3);
        assert!(result
            .candidates
            .iter()
            .all(|p| p.file_name().unwrap() != "empty.exe"));
    }

    #[test]
    fn test_name_and_size_filters() {
        let dir = tempdir().unwrap();
        create_test_tree(dir.path());

        let filter = ImportFilter {
            file_name: Some("*.exe".to_string()),
            max_size: Some(5),
            ..Default::default()
        };
        let result = collect_candidates(dir.path(), &filter).unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert!(result.candidates[0].ends_with("one.exe"));
        assert_eq!(result.too_big.len(), 1);
        assert!(result.too_big[0].ends_with("two.exe"));
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect_candidates(&dir.path().join("nope"), &ImportFilter::default()).is_err());
    }
}
