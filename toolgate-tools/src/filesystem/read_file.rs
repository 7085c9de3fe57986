use std::path::PathBuf;

use crate::filesystem::validate_path;
use crate::prelude::*;

/// Input for [`ReadFileTool`].
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileInput {
    /// File to read, relative to the tool's base directory.
    pub path: PathBuf,

    /// First line to return, 1-based. Defaults to the start of the file.
    #[serde(default)]
    pub start_line: Option<usize>,

    /// Maximum number of lines to return. Defaults to the whole file.
    #[serde(default)]
    pub max_lines: Option<usize>,
}

/// Reads UTF-8 text files, constrained to a base directory.
///
/// Paths are validated against the base directory before any I/O happens,
/// so a `..` component or a symlink cannot reach outside it.
pub struct ReadFileTool {
    base_path: PathBuf,
}

impl ReadFileTool {
    /// Tool rooted at the current working directory.
    ///
    /// # Panics
    ///
    /// Panics if the current working directory cannot be determined.
    pub fn new() -> Self {
        Self {
            base_path: std::env::current_dir().expect("Failed to get current working directory"),
        }
    }

    /// Tool rooted at `base_path`. Reads never leave this directory.
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ReadFileTool {
    type Input = ReadFileInput;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a text file inside the sandbox directory, optionally limited to a line window"
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let path = validate_path(&self.base_path, &input.path)?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ToolError::from(format!("Failed to read {}: {}", input.path.display(), e))
        })?;

        if input.start_line.is_none() && input.max_lines.is_none() {
            return Ok(content.into());
        }

        let skip = input.start_line.map_or(0, |n| n.saturating_sub(1));
        let window = content
            .lines()
            .skip(skip)
            .take(input.max_lines.unwrap_or(usize::MAX))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(window.into())
    }
}
