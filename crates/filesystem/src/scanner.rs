//! Directory scanner producing the files to sync.

use std::path::{Path, PathBuf};

use siteship_common::{key_for_path, lexical_normalize, to_absolute, PathError};
use walkdir::WalkDir;

/// Options for scanning a directory tree.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to follow symlinks to files and directories.
    /// When false, symlinks are skipped.
    pub follow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

/// A regular file discovered below the sync root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path to the file.
    pub absolute_path: PathBuf,
    /// Object key: POSIX-style path relative to the root, no leading slash.
    pub key: String,
    /// File size in bytes at scan time.
    pub size: u64,
}

/// An entry below the root that could not be read or mapped to a key.
///
/// Files under an unreadable directory are never enumerated, so callers
/// must report these rather than treat the scan as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    /// Path of the entry, as far as the walk got.
    pub path: PathBuf,
    /// Object key (or key prefix for a directory), when one can be derived.
    pub key: Option<String>,
    /// What went wrong.
    pub message: String,
}

/// Files found by a scan plus the entries that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Regular files, ordered by key.
    pub files: Vec<FileEntry>,
    /// Unreadable entries, in walk order.
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    /// Whether every entry below the root was read.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolve a sync root to an absolute, lexically normalized directory path.
///
/// # Errors
/// - `PathError::NotFound` if nothing exists at `path`
/// - `PathError::NotADirectory` if it is not a directory
/// - `PathError::IoError` if it cannot be inspected or listed
pub fn resolve_root(path: &Path) -> Result<PathBuf, PathError> {
    let root: PathBuf = lexical_normalize(&to_absolute(path)?);

    let metadata: std::fs::Metadata = std::fs::metadata(&root).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PathError::NotFound {
                path: root.display().to_string(),
            }
        } else {
            PathError::from_io(root.display().to_string(), e)
        }
    })?;

    if !metadata.is_dir() {
        return Err(PathError::NotADirectory {
            path: root.display().to_string(),
        });
    }

    // Listing once up front turns an unreadable root into a path error
    // instead of an empty sync.
    std::fs::read_dir(&root).map_err(|e| PathError::from_io(root.display().to_string(), e))?;

    Ok(root)
}

/// File system scanner for sync operations.
#[derive(Debug, Clone, Default)]
pub struct FileSystemScanner {
    options: ScanOptions,
}

impl FileSystemScanner {
    /// Create a new scanner.
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Enumerate every regular file below `root`.
    ///
    /// The walk is iterative (walkdir keeps an explicit stack of open
    /// directories), so tree depth is not bounded by the call stack.
    /// Entries that cannot be read, including broken symlinks when links are
    /// followed, and names that are not valid UTF-8 are logged and returned
    /// in [`ScanResult::errors`]. Files are ordered by key.
    ///
    /// # Errors
    /// Returns error if `root` cannot be resolved (see [`resolve_root`]).
    pub fn scan(&self, root: &Path) -> Result<ScanResult, PathError> {
        let root: PathBuf = resolve_root(root)?;
        let mut files: Vec<FileEntry> = Vec::new();
        let mut errors: Vec<ScanError> = Vec::new();

        let walker = WalkDir::new(&root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name();

        for entry in walker {
            let entry: walkdir::DirEntry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path: PathBuf = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    log::warn!("Unreadable entry {}: {}", path.display(), e);
                    errors.push(ScanError {
                        key: key_for_path(&path, &root).ok().filter(|k| !k.is_empty()),
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            // With follow_links the file type is that of the target; without
            // it symlinks report as neither file nor directory.
            if !entry.file_type().is_file() {
                continue;
            }

            let path: &Path = entry.path();
            let key: String = match key_for_path(path, &root) {
                Ok(key) => key,
                Err(e) => {
                    log::warn!("Cannot derive a key for {}: {}", path.display(), e);
                    errors.push(ScanError {
                        path: path.to_path_buf(),
                        key: None,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let size: u64 = entry.metadata().map(|m| m.len()).unwrap_or(0);

            files.push(FileEntry {
                absolute_path: path.to_path_buf(),
                key,
                size,
            });
        }

        files.sort_by(|a, b| a.key.cmp(&b.key));
        log::debug!(
            "Scanned {} files under {} ({} unreadable)",
            files.len(),
            root.display(),
            errors.len()
        );

        Ok(ScanResult { files, errors })
    }
}
