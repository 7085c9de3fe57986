//! Permission policy types.
//!
//! A policy is the authorization rule set bound to one agent identity:
//! which tools and operation categories it may use, which are forbidden,
//! what approval each tool needs, and its rate/quota limits.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Semantic category of a tool invocation.
///
/// Closed enumeration; every tool the executor knows is mapped to exactly
/// one of these at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Read,
    Write,
    Delete,
    Execute,
    ExternalApi,
    DatabaseQuery,
    DatabaseWrite,
    Search,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OperationType::Read => "read",
            OperationType::Write => "write",
            OperationType::Delete => "delete",
            OperationType::Execute => "execute",
            OperationType::ExternalApi => "external_api",
            OperationType::DatabaseQuery => "database_query",
            OperationType::DatabaseWrite => "database_write",
            OperationType::Search => "search",
        };
        write!(f, "{}", s)
    }
}

/// How much approval a tool needs before an agent may invoke it.
///
/// Levels are ordered from least to most restrictive. `Blocked` is an
/// absolute veto: it denies regardless of every other policy field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalLevel {
    /// No approval needed.
    #[default]
    None,

    /// No approval needed; the decision is recorded like any other.
    Logging,

    /// Requires a resolved confirmation in the call context.
    Confirmation,

    /// Requires a resolved human approval in the call context.
    Human,

    /// Tool may never run for this agent.
    Blocked,
}

impl ApprovalLevel {
    /// Whether this level gates on a pre-resolved approval in the call context.
    ///
    /// The approval workflow itself (UI, human reviewer) is external; the
    /// core only checks for the resolved boolean.
    pub fn requires_resolved_approval(&self) -> bool {
        matches!(self, ApprovalLevel::Confirmation | ApprovalLevel::Human)
    }

    /// Whether this level vetoes the tool outright.
    pub fn is_blocked(&self) -> bool {
        matches!(self, ApprovalLevel::Blocked)
    }
}

impl std::fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApprovalLevel::None => "none",
            ApprovalLevel::Logging => "logging",
            ApprovalLevel::Confirmation => "confirmation",
            ApprovalLevel::Human => "human",
            ApprovalLevel::Blocked => "blocked",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised when a policy is malformed.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The policy failed validation at registration time.
    #[error("Invalid policy configuration for '{agent_id}': {reason}")]
    InvalidConfiguration {
        /// Agent the rejected policy was bound to.
        agent_id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// The authorization rule set for one agent identity.
///
/// Policies are registered with a [`crate::PermissionManager`] at startup or
/// hot-reloaded later. They are immutable between registrations; replacing a
/// policy does not implicitly reset the agent's session counters
/// ([`crate::PermissionManager::reset_session`] is the explicit boundary).
///
/// # Example
///
/// ```rust
/// use toolgate_core::{ApprovalLevel, OperationType, PermissionPolicy};
///
/// let policy = PermissionPolicy::new("researcher")
///     .allow_tool("sqlite_query")
///     .allow_operation(OperationType::DatabaseQuery)
///     .require_approval("sqlite_query", ApprovalLevel::Logging)
///     .with_max_calls_per_session(50)
///     .with_min_interval_seconds(0.5);
///
/// assert!(policy.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionPolicy {
    /// Opaque, pre-authenticated agent identity this policy binds to.
    pub agent_id: String,

    /// Tools the agent may invoke.
    pub allowed_tools: HashSet<String>,

    /// Operation categories the agent may perform.
    pub allowed_operations: HashSet<OperationType>,

    /// Operation categories the agent may never perform.
    ///
    /// Forbidden always overrides allowed for the same operation.
    pub forbidden_operations: HashSet<OperationType>,

    /// Per-tool approval requirements. Tools not listed default to
    /// [`ApprovalLevel::None`].
    pub approval_requirements: HashMap<String, ApprovalLevel>,

    /// Maximum allowed calls per session.
    pub max_calls_per_session: u32,

    /// Minimum seconds between two calls to the same tool.
    pub min_interval_seconds: f64,

    /// Human-readable note on what this policy is for.
    pub description: String,
}

impl PermissionPolicy {
    /// Create an empty policy for an agent.
    ///
    /// The empty policy allows nothing: no tools and no operations. The
    /// quota defaults to `u32::MAX` and the rate limit to zero so that limits
    /// only apply where a policy author sets them.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            allowed_tools: HashSet::new(),
            allowed_operations: HashSet::new(),
            forbidden_operations: HashSet::new(),
            approval_requirements: HashMap::new(),
            max_calls_per_session: u32::MAX,
            min_interval_seconds: 0.0,
            description: String::new(),
        }
    }

    /// Allow a tool by name.
    pub fn allow_tool(mut self, tool: impl Into<String>) -> Self {
        self.allowed_tools.insert(tool.into());
        self
    }

    /// Allow an operation category.
    pub fn allow_operation(mut self, op: OperationType) -> Self {
        self.allowed_operations.insert(op);
        self
    }

    /// Forbid an operation category. Forbidden wins over allowed.
    pub fn forbid_operation(mut self, op: OperationType) -> Self {
        self.forbidden_operations.insert(op);
        self
    }

    /// Set the approval level required for a tool.
    pub fn require_approval(mut self, tool: impl Into<String>, level: ApprovalLevel) -> Self {
        self.approval_requirements.insert(tool.into(), level);
        self
    }

    /// Set the per-session call quota.
    pub fn with_max_calls_per_session(mut self, max: u32) -> Self {
        self.max_calls_per_session = max;
        self
    }

    /// Set the minimum interval between calls to the same tool.
    pub fn with_min_interval_seconds(mut self, seconds: f64) -> Self {
        self.min_interval_seconds = seconds;
        self
    }

    /// Set the policy description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The approval level for a tool under this policy.
    pub fn approval_for(&self, tool: &str) -> ApprovalLevel {
        self.approval_requirements
            .get(tool)
            .copied()
            .unwrap_or_default()
    }

    /// Validate field constraints.
    ///
    /// Runs eagerly at registration; a malformed policy is rejected there
    /// and never silently accepted.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.agent_id.is_empty() {
            return Err(PolicyError::InvalidConfiguration {
                agent_id: self.agent_id.clone(),
                reason: "agent_id must not be empty".to_string(),
            });
        }
        if !self.min_interval_seconds.is_finite() || self.min_interval_seconds < 0.0 {
            return Err(PolicyError::InvalidConfiguration {
                agent_id: self.agent_id.clone(),
                reason: format!(
                    "min_interval_seconds must be a non-negative finite number, got {}",
                    self.min_interval_seconds
                ),
            });
        }
        Ok(())
    }
}
