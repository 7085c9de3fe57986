//! Top-level error types for toolgate
//!
//! This module provides a simplified, user-facing error type that flattens
//! the internal error hierarchy into actionable categories.

use thiserror::Error;

use crate::executor::ExecutorError;
use crate::policy::{ConfigError, PolicyError};
use crate::tool::ToolError;

/// Top-level error type for toolgate operations
///
/// This enum provides a flattened view of errors, categorized by how users
/// typically need to handle them:
///
/// - [`Error::Policy`] - Fix the policy definition
/// - [`Error::Config`] - Fix the configuration file
/// - [`Error::Invocation`] - Fix how the call was made (bad input, unknown tool)
/// - [`Error::Tool`] - The tool itself failed
///
/// Permission denials never surface as errors; they are ordinary
/// [`Decision`](crate::Decision) and [`ToolOutcome`](crate::ToolOutcome)
/// values.
#[derive(Debug, Error)]
pub enum Error {
    /// Policy definition is invalid
    #[error("policy error: {0}")]
    Policy(String),

    /// Configuration could not be loaded or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// Invocation was malformed (bad input shape, unregistered tool)
    #[error("invocation error: {0}")]
    Invocation(String),

    /// Tool execution failed
    #[error("tool error: {0}")]
    Tool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if this is a policy definition error
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// Returns true if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an invocation error
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Invocation(_))
    }

    /// Returns true if this is a tool error
    pub fn is_tool(&self) -> bool {
        matches!(self, Self::Tool(_))
    }
}

impl From<PolicyError> for Error {
    fn from(err: PolicyError) -> Self {
        Self::Policy(err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Policy(e) => e.into(),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<ToolError> for Error {
    fn from(err: ToolError) -> Self {
        Self::Tool(err.to_string())
    }
}

impl From<ExecutorError> for Error {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Tool(e) => e.into(),
            ExecutorError::InvalidInput(msg) => Self::Invocation(format!("invalid input: {}", msg)),
            ExecutorError::ToolNotFound(name) => Self::Invocation(format!("not found: {}", name)),
        }
    }
}

/// Result type for toolgate operations
pub type Result<T> = std::result::Result<T, Error>;
