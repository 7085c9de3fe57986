//! Filesystem tools with path traversal protection.
//!
//! Tools in this module operate within a configured `base_path` directory.
//! Every operation validates paths with [`validate_path`] before touching
//! the filesystem:
//!
//! - Paths are resolved relative to `base_path` (or used directly if absolute)
//! - The resolved path is canonicalized to eliminate `..`, `.`, and symlinks
//! - The canonical path must start with the canonical `base_path`
//!
//! Path validation is a guardrail for agents, not a standalone sandbox;
//! the authorizing policy in `toolgate-core` decides whether the agent may
//! call the tool at all, and this layer decides which files the call may
//! touch.

mod read_file;

pub use read_file::ReadFileTool;

use std::path::{Path, PathBuf};

use toolgate_core::{box_tool, DynTool, OperationType, ToolError};

/// Validates that a path stays within the base directory.
///
/// Symlinks are resolved via canonicalization, so a link pointing outside
/// `base_path` is rejected, and crafted paths like `sub/../../etc/passwd`
/// are caught after resolution. For paths that do not exist yet, the nearest
/// existing ancestor is validated instead.
///
/// # Example
///
/// ```
/// use toolgate_tools::filesystem::validate_path;
/// use std::path::Path;
///
/// let base = Path::new("/app/data");
/// assert!(validate_path(base, Path::new("../etc/passwd")).is_err());
/// ```
pub fn validate_path(base_path: &Path, target_path: &Path) -> Result<PathBuf, ToolError> {
    let full_path = if target_path.is_absolute() {
        target_path.to_path_buf()
    } else {
        base_path.join(target_path)
    };

    let canonical_base = base_path.canonicalize().map_err(|e| {
        ToolError::from(format!(
            "Failed to canonicalize base path '{}': {}",
            base_path.display(),
            e
        ))
    })?;

    if full_path.exists() {
        let canonical = full_path.canonicalize().map_err(|e| {
            ToolError::from(format!(
                "Failed to canonicalize '{}': {}",
                full_path.display(),
                e
            ))
        })?;

        if !canonical.starts_with(&canonical_base) {
            return Err(ToolError::from(format!(
                "Path '{}' escapes base directory '{}' (resolved to '{}')",
                target_path.display(),
                canonical_base.display(),
                canonical.display()
            )));
        }

        Ok(canonical)
    } else {
        // Validate the nearest existing ancestor instead.
        let mut check_path = full_path.clone();
        while !check_path.exists() {
            match check_path.parent() {
                Some(parent) => check_path = parent.to_path_buf(),
                None => {
                    return Err(ToolError::from(format!(
                        "Invalid path '{}': no valid parent directory exists",
                        target_path.display()
                    )))
                }
            }
        }

        let canonical_ancestor = check_path.canonicalize().map_err(|e| {
            ToolError::from(format!(
                "Failed to canonicalize ancestor '{}': {}",
                check_path.display(),
                e
            ))
        })?;

        if !canonical_ancestor.starts_with(&canonical_base) {
            return Err(ToolError::from(format!(
                "Path '{}' escapes base directory '{}' (nearest ancestor '{}' is outside)",
                target_path.display(),
                canonical_base.display(),
                canonical_ancestor.display()
            )));
        }

        Ok(full_path)
    }
}

/// The filesystem tools, each paired with the operation class it should be
/// checked under when registered with a `SecureExecutor`.
pub fn read_only_tools(base_path: PathBuf) -> Vec<(Box<dyn DynTool>, OperationType)> {
    vec![(
        box_tool(ReadFileTool::with_base_path(base_path)),
        OperationType::Read,
    )]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_path_accepts_relative_path_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("test.txt"), "content").unwrap();

        let result = validate_path(temp_dir.path(), Path::new("test.txt"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_path_rejects_parent_traversal() {
        let temp_dir = TempDir::new().unwrap();

        let result = validate_path(temp_dir.path(), Path::new("../../../etc/passwd"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_path_rejects_absolute_path_outside_base() {
        let temp_dir = TempDir::new().unwrap();

        let result = validate_path(temp_dir.path(), Path::new("/etc/passwd"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_path_allows_nonexistent_file_inside_base() {
        let temp_dir = TempDir::new().unwrap();

        let result = validate_path(temp_dir.path(), Path::new("not_yet_written.txt"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_path_rejects_traversal_inside_path() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let result = validate_path(temp_dir.path(), Path::new("sub/../../outside.txt"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_path_rejects_symlink_escape() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            temp_dir.path().join("link.txt"),
        )
        .unwrap();

        let result = validate_path(temp_dir.path(), Path::new("link.txt"));
        assert!(result.is_err());
    }
}
