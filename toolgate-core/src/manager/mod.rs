//! The permission manager: the decision function at the center of the core.
//!
//! [`PermissionManager`] owns the [`PolicyStore`], per-agent session state,
//! the audit log and the metrics counters, all behind one lock. Every
//! [`check_permission`](PermissionManager::check_permission) call evaluates
//! the policy rules in a fixed order, short-circuits on the first failing
//! rule, and records exactly one audit entry and one metrics update for the
//! branch taken.
//!
//! # Decisions are values
//!
//! Denial is a frequent, expected outcome that agent loops must branch on,
//! so `check_permission` returns a [`Decision`], never an error. Only
//! setup-time misconfiguration (registering a malformed policy) is a hard
//! failure.
//!
//! # Concurrency
//!
//! Agents run as independent tasks and may check permissions concurrently.
//! The whole evaluate-and-mutate sequence runs under a single manager-wide
//! `parking_lot::Mutex`, which makes each evaluation atomic with respect to
//! every other call - the simple, correct baseline. No step blocks on I/O
//! or waits for an external resource while the lock is held.
//!
//! # Example
//!
//! ```rust
//! use toolgate_core::{CallContext, OperationType, PermissionManager, PermissionPolicy};
//!
//! let manager = PermissionManager::new();
//! manager.register_policy(
//!     PermissionPolicy::new("researcher")
//!         .allow_tool("search")
//!         .allow_operation(OperationType::Search),
//! ).unwrap();
//!
//! let decision = manager.check_permission(
//!     "researcher", "search", OperationType::Search, &CallContext::new(),
//! );
//! assert!(decision.is_allowed());
//!
//! // No policy: fail-secure deny, not a crash.
//! let decision = manager.check_permission(
//!     "stranger", "search", OperationType::Search, &CallContext::new(),
//! );
//! assert!(decision.is_denied());
//! ```

mod context;
mod session;

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::audit::{AuditEntry, AuditLog};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::policy::{OperationType, PermissionPolicy, PolicyError, PolicyStore};

pub use context::CallContext;
pub(crate) use session::SessionState;

/// Why a permission check denied the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No policy is registered for the agent.
    NoPolicy,
    /// The tool's approval requirement is `Blocked`.
    ToolBlocked,
    /// The operation is in the policy's forbidden set.
    ForbiddenOperation,
    /// The tool is not in the policy's allowed set.
    ToolNotPermitted,
    /// The operation is not in the policy's allowed set.
    OperationNotPermitted,
    /// The tool was called again before the minimum interval elapsed.
    RateLimitExceeded,
    /// The session call quota is exhausted.
    SessionQuotaExceeded,
    /// The tool requires an approval the context does not carry.
    ApprovalRequired,
}

impl DenialReason {
    /// The stable reason string recorded in the audit trail.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NoPolicy => "no policy registered",
            DenialReason::ToolBlocked => "tool blocked",
            DenialReason::ForbiddenOperation => "forbidden operation",
            DenialReason::ToolNotPermitted => "tool not permitted",
            DenialReason::OperationNotPermitted => "operation not permitted",
            DenialReason::RateLimitExceeded => "rate limit exceeded",
            DenialReason::SessionQuotaExceeded => "session quota exceeded",
            DenialReason::ApprovalRequired => "approval required",
        }
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The call may proceed.
    Allowed,
    /// The call must not proceed.
    Denied {
        /// Which rule denied it.
        reason: DenialReason,
    },
}

impl Decision {
    /// Check if the call was allowed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Check if the call was denied.
    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Denied { .. })
    }

    /// The reason string recorded in the audit trail.
    pub fn reason(&self) -> &'static str {
        match self {
            Decision::Allowed => "allowed",
            Decision::Denied { reason } => reason.as_str(),
        }
    }

    /// The denial reason, if the call was denied.
    pub fn reason_denied(&self) -> Option<DenialReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied { reason } => Some(*reason),
        }
    }
}

/// A consistent view of accumulated state, taken under the manager lock.
///
/// The anomaly monitor consumes this instead of reading the live structures
/// so that a scan never observes a torn mid-update state.
#[derive(Debug, Clone)]
pub struct ObservationSnapshot {
    /// Every decision recorded so far, in arrival order.
    pub audit: Vec<AuditEntry>,
    /// Counters at snapshot time.
    pub metrics: MetricsSnapshot,
    /// Session quota usage per agent with an active session and a policy.
    pub quotas: Vec<QuotaUsage>,
}

/// One agent's session quota usage at snapshot time.
#[derive(Debug, Clone)]
pub struct QuotaUsage {
    pub agent_id: String,
    pub call_count: u32,
    pub max_calls_per_session: u32,
    /// When the agent's current session began.
    pub session_start: chrono::DateTime<chrono::Utc>,
}

impl QuotaUsage {
    /// Fraction of the quota consumed.
    pub fn ratio(&self) -> f64 {
        if self.max_calls_per_session == 0 {
            1.0
        } else {
            self.call_count as f64 / self.max_calls_per_session as f64
        }
    }
}

#[derive(Default)]
struct ManagerState {
    store: PolicyStore,
    sessions: HashMap<String, SessionState>,
    audit: AuditLog,
    metrics: MetricsAggregator,
}

/// Mediates every tool invocation against per-agent policies.
///
/// Not a process-wide singleton: construct one per orchestrator (or per
/// tenant, or per test) and share it via `Arc`. The [`crate::SecureExecutor`]
/// and [`crate::AnomalyMonitor`] hold shared references to it, never
/// ownership of its internals.
pub struct PermissionManager {
    state: Mutex<ManagerState>,
}

impl PermissionManager {
    /// Create a manager with no policies registered.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Create a manager pre-loaded with policies.
    ///
    /// Fails eagerly on the first malformed policy.
    pub fn with_policies(
        policies: impl IntoIterator<Item = PermissionPolicy>,
    ) -> Result<Self, PolicyError> {
        let manager = Self::new();
        for policy in policies {
            manager.register_policy(policy)?;
        }
        Ok(manager)
    }

    /// Register or hot-reload the policy for an agent.
    ///
    /// Replacing a policy does not reset the agent's session counters;
    /// call [`reset_session`](Self::reset_session) for that.
    pub fn register_policy(&self, policy: PermissionPolicy) -> Result<(), PolicyError> {
        let agent_id = policy.agent_id.clone();
        self.state.lock().store.register(policy)?;
        info!(agent_id = %agent_id, "policy registered");
        Ok(())
    }

    /// Remove the policy for an agent. Returns whether one existed.
    pub fn remove_policy(&self, agent_id: &str) -> bool {
        self.state.lock().store.remove(agent_id).is_some()
    }

    /// Clear the session counters for an agent.
    ///
    /// This is the explicit session boundary; quotas and rate-limit stamps
    /// start over on the agent's next check.
    pub fn reset_session(&self, agent_id: &str) {
        self.state.lock().sessions.remove(agent_id);
        info!(agent_id = %agent_id, "session reset");
    }

    /// Evaluate whether `agent_id` may invoke `tool_name` as `operation`.
    ///
    /// Rules run in a fixed order and short-circuit on the first failure:
    /// missing policy, blocked tool, forbidden operation, tool allowlist,
    /// operation allowlist, rate limit, session quota, approval. Exactly one
    /// audit entry and one metrics update are recorded per call, for
    /// whichever terminal branch was taken; session state mutates only on
    /// the allow path.
    pub fn check_permission(
        &self,
        agent_id: &str,
        tool_name: &str,
        operation: OperationType,
        context: &CallContext,
    ) -> Decision {
        let mut state = self.state.lock();
        let state = &mut *state;

        let decision = Self::evaluate(
            &state.store,
            &mut state.sessions,
            agent_id,
            tool_name,
            operation,
            context,
        );

        state.audit.append(AuditEntry::new(
            agent_id,
            tool_name,
            operation,
            decision.is_allowed(),
            decision.reason(),
            context.snapshot(),
        ));
        state.metrics.record(agent_id, decision.is_allowed());

        debug!(
            agent_id = %agent_id,
            tool = %tool_name,
            operation = %operation,
            allowed = decision.is_allowed(),
            reason = decision.reason(),
            "permission decision"
        );

        decision
    }

    fn evaluate(
        store: &PolicyStore,
        sessions: &mut HashMap<String, SessionState>,
        agent_id: &str,
        tool_name: &str,
        operation: OperationType,
        context: &CallContext,
    ) -> Decision {
        let deny = |reason| Decision::Denied { reason };

        let policy = match store.lookup(agent_id) {
            Some(policy) => policy,
            None => return deny(DenialReason::NoPolicy),
        };

        let approval = policy.approval_for(tool_name);
        if approval.is_blocked() {
            return deny(DenialReason::ToolBlocked);
        }

        // Forbidden wins even when the operation is also in the allowed set.
        if policy.forbidden_operations.contains(&operation) {
            return deny(DenialReason::ForbiddenOperation);
        }

        if !policy.allowed_tools.contains(tool_name) {
            return deny(DenialReason::ToolNotPermitted);
        }

        if !policy.allowed_operations.contains(&operation) {
            return deny(DenialReason::OperationNotPermitted);
        }

        let session = sessions
            .entry(agent_id.to_string())
            .or_insert_with(SessionState::new);

        if let Some(elapsed) = session.seconds_since_last_call(tool_name) {
            if elapsed < policy.min_interval_seconds {
                return deny(DenialReason::RateLimitExceeded);
            }
        }

        if session.call_count() >= policy.max_calls_per_session {
            return deny(DenialReason::SessionQuotaExceeded);
        }

        if approval.requires_resolved_approval() && !context.approval_granted() {
            return deny(DenialReason::ApprovalRequired);
        }

        session.record_allowed(tool_name);
        Decision::Allowed
    }

    /// Audit entries matching the filters, in arrival order.
    pub fn get_audit_log(
        &self,
        agent_id: Option<&str>,
        allowed: Option<bool>,
    ) -> Vec<AuditEntry> {
        self.state.lock().audit.query(agent_id, allowed)
    }

    /// Current metrics. Snapshotting never mutates the counters.
    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.state.lock().metrics.snapshot()
    }

    /// Take a single consistent snapshot of audit, metrics and quota usage.
    ///
    /// Everything is captured under one lock acquisition, so a monitor scan
    /// running concurrently with live checks still sees counters and trail
    /// that agree with each other.
    pub fn observe(&self) -> ObservationSnapshot {
        let state = self.state.lock();
        let quotas = state
            .sessions
            .iter()
            .filter_map(|(agent_id, session)| {
                state.store.lookup(agent_id).map(|policy| QuotaUsage {
                    agent_id: agent_id.clone(),
                    call_count: session.call_count(),
                    max_calls_per_session: policy.max_calls_per_session,
                    session_start: session.session_start(),
                })
            })
            .collect();

        ObservationSnapshot {
            audit: state.audit.entries().to_vec(),
            metrics: state.metrics.snapshot(),
            quotas,
        }
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}
