//! Policy configuration loading.
//!
//! Policies arrive as a JSON document, typically read once at startup.
//! The recognized fields are:
//!
//! ```json
//! {
//!   "agent_id": "researcher",
//!   "allowed_tools": ["sqlite_query", "search"],
//!   "allowed_operations": ["database_query", "search"],
//!   "forbidden_operations": ["delete"],
//!   "approval_requirements": {"sqlite_query": "confirmation"},
//!   "max_tool_calls_per_session": 50,
//!   "rate_limit_seconds": 0.5,
//!   "description": "read-only research agent"
//! }
//! ```
//!
//! Unknown operation or approval names are load-time errors, not silent
//! defaults.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use super::policy::{ApprovalLevel, OperationType, PermissionPolicy, PolicyError};

/// Errors that can occur while loading policy configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the configuration source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse or shape error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parsed policy failed validation.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// One policy as it appears in a configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    pub agent_id: String,

    #[serde(default)]
    pub allowed_tools: HashSet<String>,

    #[serde(default)]
    pub allowed_operations: HashSet<OperationType>,

    #[serde(default)]
    pub forbidden_operations: HashSet<OperationType>,

    #[serde(default)]
    pub approval_requirements: HashMap<String, ApprovalLevel>,

    /// Absent means unlimited.
    #[serde(default)]
    pub max_tool_calls_per_session: Option<u32>,

    #[serde(default)]
    pub rate_limit_seconds: f64,

    #[serde(default)]
    pub description: String,
}

impl PolicyConfig {
    /// Convert into a validated [`PermissionPolicy`].
    pub fn into_policy(self) -> Result<PermissionPolicy, PolicyError> {
        let policy = PermissionPolicy {
            agent_id: self.agent_id,
            allowed_tools: self.allowed_tools,
            allowed_operations: self.allowed_operations,
            forbidden_operations: self.forbidden_operations,
            approval_requirements: self.approval_requirements,
            max_calls_per_session: self.max_tool_calls_per_session.unwrap_or(u32::MAX),
            min_interval_seconds: self.rate_limit_seconds,
            description: self.description,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Parse a JSON array of policy configurations.
pub fn load_policies(json: &str) -> Result<Vec<PermissionPolicy>, ConfigError> {
    let configs: Vec<PolicyConfig> = serde_json::from_str(json)?;
    configs
        .into_iter()
        .map(|c| c.into_policy().map_err(ConfigError::from))
        .collect()
}

/// Read and parse a JSON policy file.
pub fn load_policies_from_file(path: impl AsRef<Path>) -> Result<Vec<PermissionPolicy>, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    load_policies(&contents)
}
