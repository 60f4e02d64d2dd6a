//! Path normalization and object key derivation.

use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Convert a path to absolute without resolving symlinks.
///
/// # Errors
/// Returns error if current directory cannot be determined.
pub fn to_absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::env::current_dir()
            .map(|cwd: PathBuf| cwd.join(path))
            .map_err(|e: std::io::Error| PathError::from_io(path.display().to_string(), e))
    }
}

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` components lexically.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::ParentDir) | Some(Component::RootDir)
                    )
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Derive the object key of a file below a sync root.
///
/// Both paths are made absolute and lexically normalized, then the root is
/// stripped and the remainder joined with forward slashes. The result never
/// starts with a slash and is the same on every platform.
///
/// # Arguments
/// * `path` - File path
/// * `root` - Sync root directory
///
/// # Errors
/// - `PathError::PathOutsideRoot` if path is outside the root directory
/// - `PathError::InvalidUtf8` if the relative path is not valid UTF-8
pub fn key_for_path(path: &Path, root: &Path) -> Result<String, PathError> {
    let normalized: PathBuf = lexical_normalize(&to_absolute(path)?);
    let normalized_root: PathBuf = lexical_normalize(&to_absolute(root)?);

    let relative: &Path = normalized
        .strip_prefix(&normalized_root)
        .map_err(|_| PathError::PathOutsideRoot {
            path: normalized.display().to_string(),
            root: normalized_root.display().to_string(),
        })?;

    to_posix_path(relative)
}

/// Convert a path to POSIX-style string (forward slashes).
///
/// Components are never replaced lossily: two distinct non-UTF-8 names
/// would otherwise collapse into the same key.
///
/// # Errors
/// Returns `PathError::InvalidUtf8` if any component is not valid UTF-8.
pub fn to_posix_path(path: &Path) -> Result<String, PathError> {
    let parts: Vec<&str> = path
        .components()
        .map(|c: Component| c.as_os_str().to_str())
        .collect::<Option<Vec<&str>>>()
        .ok_or_else(|| PathError::InvalidUtf8 {
            path: path.display().to_string(),
        })?;

    Ok(parts.join("/"))
}
