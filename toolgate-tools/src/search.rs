//! Content search over files inside a base directory.

use std::fs;
use std::path::PathBuf;

use regex::RegexBuilder;
use serde::Serialize;

use crate::filesystem::validate_path;
use crate::prelude::*;

/// One matching line.
#[derive(Debug, Serialize)]
pub struct SearchMatch {
    pub file_path: String,
    pub line_number: usize,
    pub line_content: String,
}

/// Input for content search
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Search pattern (regular expression)
    pub pattern: String,

    /// Glob selecting which files to search, relative to the base path
    /// (e.g., "**/*.rs"). Defaults to every file under the base path.
    #[serde(default = "default_file_glob")]
    pub file_glob: String,

    /// Case-insensitive matching (default: true)
    #[serde(default = "default_ignore_case")]
    pub ignore_case: bool,

    /// Maximum number of matches to return (default: 100)
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_file_glob() -> String {
    "**/*".to_string()
}

fn default_ignore_case() -> bool {
    true
}

fn default_max_results() -> usize {
    100
}

/// Tool for searching file contents under a base directory.
///
/// Files are selected with a glob pattern and lines are matched with a
/// regular expression. Binary files (anything that is not valid UTF-8) are
/// skipped silently.
pub struct SearchTool {
    base_path: PathBuf,
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTool {
    /// Create a tool using the current working directory as the base path.
    ///
    /// # Panics
    ///
    /// Panics if the current working directory cannot be determined.
    pub fn new() -> Self {
        Self {
            base_path: std::env::current_dir().expect("Failed to get current working directory"),
        }
    }

    /// Create a tool with a custom base directory.
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

impl Tool for SearchTool {
    type Input = SearchInput;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search file contents under the base directory. Selects files with a glob pattern and matches lines with a regular expression."
    }

    async fn execute(&self, input: Self::Input) -> std::result::Result<ToolResult, ToolError> {
        let regex = RegexBuilder::new(&input.pattern)
            .case_insensitive(input.ignore_case)
            .build()
            .map_err(|e| ToolError::from(format!("Invalid search pattern: {}", e)))?;

        let glob_pattern = self.base_path.join(&input.file_glob);
        let glob_str = glob_pattern.to_string_lossy();
        let paths = glob::glob(&glob_str)
            .map_err(|e| ToolError::from(format!("Invalid file glob: {}", e)))?;

        let mut matches = Vec::new();
        'files: for entry in paths.flatten() {
            if !entry.is_file() {
                continue;
            }
            // Globs with `..` components could step outside the base.
            if validate_path(&self.base_path, &entry).is_err() {
                continue;
            }

            let Ok(content) = fs::read_to_string(&entry) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    matches.push(SearchMatch {
                        file_path: entry.display().to_string(),
                        line_number: idx + 1,
                        line_content: line.to_string(),
                    });
                    if matches.len() >= input.max_results {
                        break 'files;
                    }
                }
            }
        }

        ToolResult::json(serde_json::json!({
            "match_count": matches.len(),
            "matches": matches,
        }))
        .map_err(ToolError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("alpha.txt"),
            "needle in line one\nnothing here\nNEEDLE again",
        )
        .unwrap();
        fs::write(temp_dir.path().join("beta.rs"), "fn needle() {}").unwrap();
        temp_dir
    }

    fn input(pattern: &str) -> SearchInput {
        SearchInput {
            pattern: pattern.to_string(),
            file_glob: default_file_glob(),
            ignore_case: true,
            max_results: 100,
        }
    }

    #[tokio::test]
    async fn test_search_finds_matches_across_files() {
        let temp_dir = fixture();
        let tool = SearchTool::with_base_path(temp_dir.path().to_path_buf());

        let result = tool.execute(input("needle")).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(json["match_count"], 3);
    }

    #[tokio::test]
    async fn test_search_respects_case_sensitivity() {
        let temp_dir = fixture();
        let tool = SearchTool::with_base_path(temp_dir.path().to_path_buf());

        let mut i = input("NEEDLE");
        i.ignore_case = false;
        let result = tool.execute(i).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(json["match_count"], 1);
    }

    #[tokio::test]
    async fn test_search_filters_by_glob() {
        let temp_dir = fixture();
        let tool = SearchTool::with_base_path(temp_dir.path().to_path_buf());

        let mut i = input("needle");
        i.file_glob = "*.rs".to_string();
        let result = tool.execute(i).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(json["match_count"], 1);
    }

    #[tokio::test]
    async fn test_search_caps_results() {
        let temp_dir = fixture();
        let tool = SearchTool::with_base_path(temp_dir.path().to_path_buf());

        let mut i = input("needle");
        i.max_results = 2;
        let result = tool.execute(i).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&result.as_text()).unwrap();
        assert_eq!(json["match_count"], 2);
    }

    #[tokio::test]
    async fn test_search_rejects_bad_regex() {
        let temp_dir = fixture();
        let tool = SearchTool::with_base_path(temp_dir.path().to_path_buf());

        let result = tool.execute(input("(unclosed")).await;
        assert!(result.is_err());
    }
}
